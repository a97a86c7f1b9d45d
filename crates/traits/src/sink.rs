//! Output sinks the SVG writer flushes into.

use async_trait::async_trait;
use std::io;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Destination for rendered bytes.
///
/// Writes may suspend (network backpressure, disk). A sink must tolerate being
/// dropped half-way through a document.
#[async_trait]
pub trait OutputSink: Send {
    async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    async fn flush(&mut self) -> io::Result<()>;
}

/// Adapts any tokio writer (file, stdout, socket) into an [`OutputSink`].
#[derive(Debug)]
pub struct AsyncWriteSink<W> {
    inner: W,
}

impl<W> AsyncWriteSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[async_trait]
impl<W> OutputSink for AsyncWriteSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().await
    }
}

/// An in-memory sink whose clones share one buffer.
///
/// Keep a clone before handing the sink to a writer, then read the captured
/// bytes back through it.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.buffer.lock().map(|b| b.clone()).unwrap_or_default()
    }

    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().map(|b| b.is_empty()).unwrap_or(true)
    }
}

#[async_trait]
impl OutputSink for MemorySink {
    async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut buffer = self
            .buffer
            .lock()
            .map_err(|_| io::Error::other("memory sink lock poisoned"))?;
        buffer.extend_from_slice(bytes);
        Ok(())
    }

    async fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
