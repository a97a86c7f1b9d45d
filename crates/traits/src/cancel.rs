//! Request-scoped cancellation signal.
//!
//! A [`CancellationSource`] is owned by whoever started the request (an HTTP
//! handler, the CLI, a test). Every suspension point of the pipeline holds a
//! [`Cancellation`] clone and races its I/O against [`Cancellation::cancelled`].

use tokio::sync::watch;

/// The owning half of a cancellation signal.
#[derive(Debug)]
pub struct CancellationSource {
    sender: watch::Sender<bool>,
}

/// A cheap, cloneable observer of a [`CancellationSource`].
#[derive(Debug, Clone)]
pub struct Cancellation {
    receiver: watch::Receiver<bool>,
}

impl CancellationSource {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    pub fn token(&self) -> Cancellation {
        Cancellation {
            receiver: self.sender.subscribe(),
        }
    }

    /// Signals cancellation to every token. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancellation {
    /// A token that is never cancelled, for callers without a request lifecycle.
    pub fn never() -> Self {
        let (sender, receiver) = watch::channel(false);
        drop(sender);
        Self { receiver }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once the signal fires. Never resolves if the source is
    /// dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            if receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Cancels its source when dropped.
///
/// The HTTP service parks one of these inside the response body stream, so a
/// client disconnect tears down the render that feeds it.
#[derive(Debug)]
pub struct CancelOnDrop(pub CancellationSource);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}
