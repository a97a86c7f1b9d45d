//! Rendering from and to the local filesystem.

use crate::error::EnvironmentError;
use async_trait::async_trait;
use log::debug;
use schsvg_core::traits::{AsyncWriteSink, SourceProvider};
use schsvg_core::{
    Cancellation, DocumentSource, OutputSink, RenderEnvironment, RenderError, RenderSettings,
    SourceError,
};
use schsvg_resource::FilesystemSourceProvider;
use std::path::{Path, PathBuf};

/// Where the SVG goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

/// A schematic on disk. Libraries are looked up next to the schematic
/// first, then in each extra library directory in the order given.
///
/// Library names never leave their directory: a `LIBS:` entry such as
/// `../secret` is refused by the filesystem provider and the library is
/// skipped.
#[derive(Debug)]
pub struct FileEnvironment {
    root_name: String,
    schematic_dir: FilesystemSourceProvider,
    library_dirs: Vec<FilesystemSourceProvider>,
    output: OutputTarget,
    settings: RenderSettings,
}

impl FileEnvironment {
    pub fn new(schematic: impl AsRef<Path>, output: OutputTarget) -> Result<Self, EnvironmentError> {
        let path = schematic.as_ref();
        let root_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| EnvironmentError::InvalidPath(path.to_path_buf()))?
            .to_string();
        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        Ok(Self {
            root_name,
            schematic_dir: FilesystemSourceProvider::new(dir),
            library_dirs: Vec::new(),
            output,
            settings: RenderSettings::default(),
        })
    }

    pub fn with_library_dir(mut self, dir: impl AsRef<Path>) -> Result<Self, EnvironmentError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(EnvironmentError::MissingLibraryDir(dir.to_path_buf()));
        }
        self.library_dirs.push(FilesystemSourceProvider::new(dir));
        Ok(self)
    }

    pub fn with_settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn output(&self) -> &OutputTarget {
        &self.output
    }
}

#[async_trait]
impl RenderEnvironment for FileEnvironment {
    async fn create_source(&self, cancel: &Cancellation) -> Result<DocumentSource, SourceError> {
        self.schematic_dir.open(&self.root_name, cancel).await
    }

    async fn create_library_source(
        &self,
        name: &str,
        cancel: &Cancellation,
    ) -> Result<DocumentSource, SourceError> {
        let location = self.schematic_dir.resolve(&self.root_name, name);
        let providers = std::iter::once(&self.schematic_dir).chain(&self.library_dirs);
        for provider in providers {
            match provider.open(&location, cancel).await {
                Err(SourceError::NotFound(_)) => {
                    debug!("{name} not in {}", provider.base().display());
                }
                result => return result,
            }
        }
        Err(SourceError::NotFound(name.to_string()))
    }

    async fn create_sink(&self, _cancel: &Cancellation) -> Result<Box<dyn OutputSink>, RenderError> {
        match &self.output {
            OutputTarget::Stdout => Ok(Box::new(AsyncWriteSink::new(tokio::io::stdout()))),
            OutputTarget::File(path) => {
                let file = tokio::fs::File::create(path)
                    .await
                    .map_err(|e| RenderError::Internal(format!("{}: {e}", path.display())))?;
                Ok(Box::new(AsyncWriteSink::new(file)))
            }
        }
    }

    fn render_settings(&self) -> RenderSettings {
        self.settings.clone()
    }
}
