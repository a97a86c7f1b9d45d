//! Filesystem-based document provider for native platforms.
//!
//! Documents are opened relative to a base directory with security measures
//! to prevent path traversal attacks.
//!
//! # Security
//!
//! The provider validates that all resolved paths remain within the base path
//! to prevent directory traversal attacks (e.g., `../../../etc/passwd`).

use async_trait::async_trait;
use log::debug;
use schsvg_traits::{Cancellation, DocumentSource, SourceError, SourceProvider};
use std::path::{Component, Path, PathBuf};

/// A source provider that opens documents from the local filesystem.
///
/// Locations are resolved relative to a base path, typically the directory
/// containing the root schematic. Files are streamed, not read up front.
///
/// # Security
///
/// Paths are canonicalized and must stay inside the base directory.
/// Absolute paths and `..` components are rejected with
/// [`SourceError::AccessDenied`].
#[derive(Debug)]
pub struct FilesystemSourceProvider {
    base_path: PathBuf,
    /// Canonicalized base path for security checks
    canonical_base: Option<PathBuf>,
}

impl FilesystemSourceProvider {
    /// Creates a provider rooted at `base_path`.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        let base = base_path.as_ref().to_path_buf();
        // May fail if the directory doesn't exist yet
        let canonical = base.canonicalize().ok();
        Self {
            base_path: base,
            canonical_base: canonical,
        }
    }

    /// Returns the base path for this provider.
    pub fn base(&self) -> &Path {
        &self.base_path
    }

    /// Resolves `location` below the base path.
    ///
    /// Returns `None` if the path would escape the base directory.
    fn resolve_path_safe(&self, location: &str) -> Option<PathBuf> {
        if Path::new(location).is_absolute() {
            return None;
        }

        let full_path = self.base_path.join(location);

        if let Ok(canonical) = full_path.canonicalize()
            && let Some(ref base) = self.canonical_base
        {
            return canonical.starts_with(base).then_some(canonical);
        }

        // The file doesn't exist (yet); fall back to a component check.
        if Path::new(location)
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return None;
        }

        Some(full_path)
    }
}

#[async_trait]
impl SourceProvider for FilesystemSourceProvider {
    async fn open(
        &self,
        location: &str,
        cancel: &Cancellation,
    ) -> Result<DocumentSource, SourceError> {
        let full_path = self.resolve_path_safe(location).ok_or_else(|| {
            SourceError::AccessDenied(format!("{location} (path traversal blocked)"))
        })?;

        let file = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(SourceError::Io(format!("opening '{location}' was cancelled")));
            }
            result = tokio::fs::File::open(&full_path) => result,
        };

        let file = file.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::NotFound(location.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                SourceError::AccessDenied(location.to_string())
            }
            _ => SourceError::Io(format!("{location}: {e}")),
        })?;

        debug!("opened {}", full_path.display());
        Ok(DocumentSource::new(location, Box::new(file)))
    }

    fn name(&self) -> &'static str {
        "FilesystemSourceProvider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;
    use tokio::io::AsyncReadExt;

    async fn read(provider: &FilesystemSourceProvider, location: &str) -> Result<String, SourceError> {
        let mut source = provider.open(location, &Cancellation::never()).await?;
        let mut text = String::new();
        source.reader.read_to_string(&mut text).await?;
        Ok(text)
    }

    #[tokio::test]
    async fn test_filesystem_provider_open_existing_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("test.sch"), b"EESchema Schematic File Version 2\n").unwrap();

        let provider = FilesystemSourceProvider::new(dir.path());
        let text = read(&provider, "test.sch").await.unwrap();
        assert_eq!(text, "EESchema Schematic File Version 2\n");
    }

    #[tokio::test]
    async fn test_filesystem_provider_not_found() {
        let dir = tempdir().unwrap();
        let provider = FilesystemSourceProvider::new(dir.path());

        let result = read(&provider, "missing.lib").await;
        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_filesystem_provider_blocks_path_traversal() {
        let dir = tempdir().unwrap();
        let provider = FilesystemSourceProvider::new(dir.path());

        for location in ["../../../etc/passwd", "/etc/passwd", "foo/../../../bar", ".."] {
            let result = read(&provider, location).await;
            assert!(
                matches!(result, Err(SourceError::AccessDenied(_))),
                "location {location}"
            );
        }
    }

    #[tokio::test]
    async fn test_filesystem_provider_allows_nested_paths() {
        let dir = tempdir().unwrap();
        let nested_dir = dir.path().join("libs");
        fs::create_dir(&nested_dir).unwrap();
        fs::write(nested_dir.join("device.lib"), b"EESchema-LIBRARY Version 2.3\n").unwrap();

        let provider = FilesystemSourceProvider::new(dir.path());
        let text = read(&provider, "libs/device.lib").await.unwrap();
        assert!(text.starts_with("EESchema-LIBRARY"));
    }

    #[test]
    fn test_filesystem_provider_resolves_siblings() {
        let provider = FilesystemSourceProvider::new(".");
        assert_eq!(provider.resolve("boards/main.sch", "power.lib"), "boards/power.lib");
        assert_eq!(provider.resolve("main.sch", "power.lib"), "power.lib");
    }
}
