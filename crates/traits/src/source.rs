//! SourceProvider trait for abstracting document retrieval.
//!
//! This trait allows the renderer to read schematic and library documents
//! without being tied to filesystem or network access.

use crate::cancel::Cancellation;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::io::Cursor;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::io::AsyncRead;

/// Error type for document retrieval.
///
/// Every variant maps to a status classification through
/// [`SourceError::status_code`], which lets an environment report the failure
/// differently from a malformed document.
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Access to '{0}' was denied")]
    AccessDenied(String),

    #[error("Invalid document location: {0}")]
    InvalidLocation(String),

    #[error("Failed to fetch '{location}': upstream answered {status}")]
    Upstream { location: String, status: u16 },

    #[error("I/O error: {0}")]
    Io(String),
}

impl SourceError {
    /// The HTTP-style status that best describes this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            SourceError::NotFound(_) => 404,
            SourceError::AccessDenied(_) => 403,
            SourceError::InvalidLocation(_) => 400,
            SourceError::Upstream { status, .. } => *status,
            SourceError::Io(_) => 502,
        }
    }
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::Io(err.to_string())
    }
}

/// A readable character stream, as handed to the tokenizer.
pub type SourceReader = Box<dyn AsyncRead + Send + Unpin>;

/// An opened document: its byte stream plus what the environment knows about it.
pub struct DocumentSource {
    /// Human-readable name used in log lines and error messages.
    pub name: String,
    pub reader: SourceReader,
    /// Cache validator (for example an HTTP `ETag`) reported by the origin.
    pub validator: Option<String>,
}

impl DocumentSource {
    pub fn new(name: impl Into<String>, reader: SourceReader) -> Self {
        Self {
            name: name.into(),
            reader,
            validator: None,
        }
    }

    /// Wraps an in-memory document.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(name, Box::new(Cursor::new(bytes)))
    }

    pub fn with_validator(mut self, validator: Option<String>) -> Self {
        self.validator = validator;
        self
    }
}

impl Debug for DocumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSource")
            .field("name", &self.name)
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}

/// A trait for opening documents from various origins.
///
/// # Implementations
///
/// - `FilesystemSourceProvider` (schsvg-resource): local files under a base directory
/// - `HttpSourceProvider` (schsvg-resource): `http`/`https` URLs
/// - [`InMemorySourceProvider`]: pre-populated memory, always available
#[async_trait]
pub trait SourceProvider: Send + Sync + Debug {
    /// Open the document at `location`.
    ///
    /// Implementations must give up promptly once `cancel` fires.
    async fn open(
        &self,
        location: &str,
        cancel: &Cancellation,
    ) -> Result<DocumentSource, SourceError>;

    /// Resolve `name` relative to the document at `base`.
    ///
    /// The default treats locations as `/`-separated paths and replaces the
    /// last segment.
    fn resolve(&self, base: &str, name: &str) -> String {
        match base.rfind('/') {
            Some(index) => format!("{}{}", &base[..=index], name),
            None => name.to_string(),
        }
    }

    /// Returns a human-readable name for this provider (for logging/debugging).
    fn name(&self) -> &'static str;
}

/// An in-memory source provider.
///
/// Documents are stored in memory and must be pre-populated before use. This
/// is how inline documents and tests feed the renderer.
#[derive(Debug, Default)]
pub struct InMemorySourceProvider {
    documents: RwLock<HashMap<String, Arc<Vec<u8>>>>,
}

impl InMemorySourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document to the in-memory store.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Io` if the internal lock is poisoned.
    pub fn add(&self, location: impl Into<String>, data: impl Into<Vec<u8>>) -> Result<(), SourceError> {
        let mut documents = self
            .documents
            .write()
            .map_err(|_| SourceError::Io("document store lock poisoned".to_string()))?;
        documents.insert(location.into(), Arc::new(data.into()));
        Ok(())
    }

    /// Remove a document from the store.
    ///
    /// Returns `None` if the lock is poisoned or the document doesn't exist.
    pub fn remove(&self, location: &str) -> Option<Arc<Vec<u8>>> {
        self.documents.write().ok()?.remove(location)
    }

    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SourceProvider for InMemorySourceProvider {
    async fn open(
        &self,
        location: &str,
        _cancel: &Cancellation,
    ) -> Result<DocumentSource, SourceError> {
        let documents = self
            .documents
            .read()
            .map_err(|_| SourceError::Io("document store lock poisoned".to_string()))?;
        let data = documents
            .get(location)
            .ok_or_else(|| SourceError::NotFound(location.to_string()))?;
        Ok(DocumentSource::from_bytes(location, data.as_ref().clone()))
    }

    fn name(&self) -> &'static str {
        "InMemorySourceProvider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    async fn read_all(mut source: DocumentSource) -> String {
        let mut text = String::new();
        source.reader.read_to_string(&mut text).await.unwrap();
        text
    }

    #[tokio::test]
    async fn test_in_memory_provider_add_and_open() {
        let provider = InMemorySourceProvider::new();
        provider.add("root.sch", "EESchema Schematic File Version 2\n").unwrap();

        let source = provider.open("root.sch", &Cancellation::never()).await.unwrap();
        assert_eq!(source.name, "root.sch");
        assert!(source.validator.is_none());
        assert_eq!(read_all(source).await, "EESchema Schematic File Version 2\n");
    }

    #[tokio::test]
    async fn test_in_memory_provider_not_found() {
        let provider = InMemorySourceProvider::new();
        let result = provider.open("missing.lib", &Cancellation::never()).await;
        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_in_memory_provider_overwrite_and_remove() {
        let provider = InMemorySourceProvider::new();
        provider.add("a.lib", "original").unwrap();
        provider.add("a.lib", "updated").unwrap();
        assert_eq!(provider.len(), 1);

        let source = provider.open("a.lib", &Cancellation::never()).await.unwrap();
        assert_eq!(read_all(source).await, "updated");

        assert!(provider.remove("a.lib").is_some());
        assert!(provider.is_empty());
        assert!(provider.remove("a.lib").is_none());
    }

    #[test]
    fn test_default_resolve_replaces_last_segment() {
        let provider = InMemorySourceProvider::new();
        assert_eq!(provider.resolve("boards/main.sch", "main-cache.lib"), "boards/main-cache.lib");
        assert_eq!(provider.resolve("main.sch", "power.lib"), "power.lib");
    }

    #[test]
    fn test_source_error_status_codes() {
        assert_eq!(SourceError::NotFound("x".into()).status_code(), 404);
        assert_eq!(SourceError::AccessDenied("x".into()).status_code(), 403);
        assert_eq!(SourceError::InvalidLocation("x".into()).status_code(), 400);
        assert_eq!(
            SourceError::Upstream { location: "x".into(), status: 410 }.status_code(),
            410
        );
        assert_eq!(SourceError::Io("boom".into()).status_code(), 502);
    }

    #[test]
    fn test_source_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err: SourceError = io_err.into();
        assert!(matches!(err, SourceError::Io(_)));
        assert!(err.to_string().contains("disk on fire"));
    }
}
