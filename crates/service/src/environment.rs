//! The render environment behind one HTTP request.
//!
//! The render runs on its own task. It talks back to the handler through two
//! channels: a one-shot [`ResponseHead`] that decides the status line and
//! headers, and a bounded body channel that carries SVG chunks.

use async_trait::async_trait;
use axum::body::Bytes;
use schsvg_core::{
    FailureOutput, RenderEnvironment, RenderError, RenderFailure, RenderOutcome, RenderSettings,
};
use schsvg_core::traits::{Cancellation, DocumentSource, OutputSink, SourceError, SourceProvider};
use schsvg_resource::HttpSourceProvider;
use std::io;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

/// How the handler should answer, decided by the render task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseHead {
    /// SVG follows on the body channel.
    Streaming { validator: Option<String> },
    /// The caller's `If-None-Match` matched the upstream validator.
    NotModified { validator: Option<String> },
    /// The render failed before any byte was produced.
    Failed { status: u16, message: String },
}

/// State shared by the environment and its sink. The head is sent at most
/// once; whoever sends first wins.
#[derive(Debug)]
struct ResponseState {
    head: Mutex<Option<oneshot::Sender<ResponseHead>>>,
    validator: Mutex<Option<String>>,
}

impl ResponseState {
    fn send(&self, head: ResponseHead) -> bool {
        let sender = match self.head.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        match sender {
            Some(sender) => {
                tracing::debug!("response head: {:?}", head);
                // The handler may be gone; the render still runs to its end.
                let _ = sender.send(head);
                true
            }
            None => false,
        }
    }

    fn validator(&self) -> Option<String> {
        self.validator.lock().ok()?.clone()
    }

    fn start_streaming(&self) {
        self.send(ResponseHead::Streaming {
            validator: self.validator(),
        });
    }
}

/// Fetched documents in, streamed response out.
#[derive(Debug)]
pub struct HttpRenderEnvironment {
    provider: Arc<HttpSourceProvider>,
    location: String,
    settings: RenderSettings,
    request_validator: Option<String>,
    response: Arc<ResponseState>,
    body: Mutex<Option<mpsc::Sender<Bytes>>>,
}

/// The handler's ends of the channels.
#[derive(Debug)]
pub struct ResponseChannels {
    pub head: oneshot::Receiver<ResponseHead>,
    pub body: mpsc::Receiver<Bytes>,
}

impl HttpRenderEnvironment {
    /// `buffered_chunks` bounds how far the render may run ahead of a slow
    /// client.
    pub fn new(
        provider: Arc<HttpSourceProvider>,
        location: impl Into<String>,
        settings: RenderSettings,
        request_validator: Option<String>,
        buffered_chunks: usize,
    ) -> (Self, ResponseChannels) {
        let (head_tx, head_rx) = oneshot::channel();
        let (body_tx, body_rx) = mpsc::channel(buffered_chunks.max(1));
        let response = Arc::new(ResponseState {
            head: Mutex::new(Some(head_tx)),
            validator: Mutex::new(None),
        });
        let environment = Self {
            provider,
            location: location.into(),
            settings,
            request_validator,
            response,
            body: Mutex::new(Some(body_tx)),
        };
        let channels = ResponseChannels {
            head: head_rx,
            body: body_rx,
        };
        (environment, channels)
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Sends the head if the render never did, e.g. for a document that
    /// produced no output or matched the caller's validator.
    pub fn finish(&self, result: &Result<RenderOutcome, RenderFailure>) {
        let validator = self.response.validator();
        let head = match result {
            Ok(RenderOutcome::NotModified) => ResponseHead::NotModified { validator },
            Ok(RenderOutcome::Rendered { .. }) => ResponseHead::Streaming { validator },
            Err(failure) => ResponseHead::Failed {
                status: failure.error.status_code(),
                message: failure.error.to_string(),
            },
        };
        self.response.send(head);
    }
}

#[async_trait]
impl RenderEnvironment for HttpRenderEnvironment {
    async fn create_source(&self, cancel: &Cancellation) -> Result<DocumentSource, SourceError> {
        self.provider.open(&self.location, cancel).await
    }

    async fn create_library_source(
        &self,
        name: &str,
        cancel: &Cancellation,
    ) -> Result<DocumentSource, SourceError> {
        let location = self.provider.resolve(&self.location, name);
        self.provider.open(&location, cancel).await
    }

    async fn create_sink(&self, _cancel: &Cancellation) -> Result<Box<dyn OutputSink>, RenderError> {
        let sender = self
            .body
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .ok_or_else(|| RenderError::Internal("response body already taken".to_string()))?;
        Ok(Box::new(ChannelSink {
            sender,
            response: self.response.clone(),
        }))
    }

    fn render_settings(&self) -> RenderSettings {
        self.settings.clone()
    }

    fn request_validator(&self) -> Option<String> {
        self.request_validator.clone()
    }

    fn set_response_validator(&self, validator: &str) {
        if let Ok(mut slot) = self.response.validator.lock() {
            *slot = Some(validator.to_string());
        }
    }

    fn handle_matching_validators(&self) -> bool {
        true
    }

    async fn handle_error(&self, error: &RenderError, output: &mut FailureOutput<'_>) -> bool {
        if !output.has_output_started() {
            let head = ResponseHead::Failed {
                status: error.status_code(),
                message: error.to_string(),
            };
            if self.response.send(head) {
                return true;
            }
        }
        if let Err(err) = output.recover_in_band(error).await {
            tracing::debug!("in-band error annotation failed: {}", err);
        }
        false
    }
}

/// Forwards writer flushes to the response body.
#[derive(Debug)]
struct ChannelSink {
    sender: mpsc::Sender<Bytes>,
    response: Arc<ResponseState>,
}

#[async_trait]
impl OutputSink for ChannelSink {
    async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.response.start_streaming();
        self.sender
            .send(Bytes::copy_from_slice(bytes))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))
    }

    async fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
