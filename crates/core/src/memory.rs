//! A render environment that keeps everything in memory.

use crate::environment::{FailureOutput, RenderEnvironment};
use crate::error::RenderError;
use crate::settings::RenderSettings;
use async_trait::async_trait;
use log::{debug, warn};
use schsvg_traits::{
    Cancellation, DocumentSource, InMemorySourceProvider, MemorySink, OutputSink, SourceError,
    SourceProvider,
};
use std::sync::Mutex;

/// The location under which the root schematic is stored.
const ROOT: &str = "schematic.sch";

/// Inline schematic and library text in, SVG captured in a [`MemorySink`].
///
/// ```
/// use schsvg_core::{Cancellation, InMemoryEnvironment, render};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let environment = InMemoryEnvironment::new(
///     "EESchema Schematic File Version 2\n$Descr A4 11693 8268\n$EndDescr\n$EndSCHEMATC\n",
/// );
/// render(&environment, Cancellation::never()).await.unwrap();
/// assert!(environment.output().contains("viewBox=\"0 0 11693 8268\""));
/// # });
/// ```
#[derive(Debug)]
pub struct InMemoryEnvironment {
    documents: InMemorySourceProvider,
    settings: RenderSettings,
    sink: MemorySink,
    source_validator: Option<String>,
    request_validator: Option<String>,
    response_validator: Mutex<Option<String>>,
    last_error: Mutex<Option<String>>,
}

impl InMemoryEnvironment {
    pub fn new(schematic: impl Into<String>) -> Self {
        let documents = InMemorySourceProvider::new();
        store(&documents, ROOT, schematic.into());
        Self {
            documents,
            settings: RenderSettings::default(),
            sink: MemorySink::new(),
            source_validator: None,
            request_validator: None,
            response_validator: Mutex::new(None),
            last_error: Mutex::new(None),
        }
    }

    /// Adds a library under its file name, e.g. `device.lib`.
    pub fn with_library(self, name: &str, text: impl Into<String>) -> Self {
        store(&self.documents, name, text.into());
        self
    }

    pub fn with_settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Gives the root schematic a validator, as an upstream `ETag` would.
    pub fn with_source_validator(mut self, validator: impl Into<String>) -> Self {
        self.source_validator = Some(validator.into());
        self
    }

    /// Simulates a caller that already holds `validator`.
    pub fn with_request_validator(mut self, validator: impl Into<String>) -> Self {
        self.request_validator = Some(validator.into());
        self
    }

    /// Everything written to the sink so far.
    pub fn output(&self) -> String {
        self.sink.contents_string()
    }

    pub fn sink(&self) -> &MemorySink {
        &self.sink
    }

    /// The validator reported by the last render, if any.
    pub fn response_validator(&self) -> Option<String> {
        self.response_validator.lock().ok()?.clone()
    }

    /// The message of the last failed render, if any.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok()?.clone()
    }
}

fn store(documents: &InMemorySourceProvider, name: &str, text: String) {
    if let Err(err) = documents.add(name, text) {
        warn!("could not store {name}: {err}");
    }
}

#[async_trait]
impl RenderEnvironment for InMemoryEnvironment {
    async fn create_source(&self, cancel: &Cancellation) -> Result<DocumentSource, SourceError> {
        let source = self.documents.open(ROOT, cancel).await?;
        Ok(source.with_validator(self.source_validator.clone()))
    }

    async fn create_library_source(
        &self,
        name: &str,
        cancel: &Cancellation,
    ) -> Result<DocumentSource, SourceError> {
        self.documents.open(name, cancel).await
    }

    async fn create_sink(&self, _cancel: &Cancellation) -> Result<Box<dyn OutputSink>, RenderError> {
        Ok(Box::new(self.sink.clone()))
    }

    fn render_settings(&self) -> RenderSettings {
        self.settings.clone()
    }

    fn request_validator(&self) -> Option<String> {
        self.request_validator.clone()
    }

    fn set_response_validator(&self, validator: &str) {
        if let Ok(mut slot) = self.response_validator.lock() {
            *slot = Some(validator.to_string());
        }
    }

    fn handle_matching_validators(&self) -> bool {
        self.request_validator.is_some()
    }

    async fn handle_error(&self, error: &RenderError, output: &mut FailureOutput<'_>) -> bool {
        if let Ok(mut slot) = self.last_error.lock() {
            *slot = Some(error.to_string());
        }
        if let Err(err) = output.recover_in_band(error).await {
            debug!("in-band error annotation failed: {err}");
        }
        false
    }
}
