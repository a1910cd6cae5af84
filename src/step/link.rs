use std::sync::Arc;

use tokio::sync::mpsc::{Receiver, Sender};
use tokio::sync::Mutex;

use crate::pipeline::cancel::CancelToken;
use crate::pipeline::counter::TokenCounter;

/// Input queue end shared by all replicas of one step.
///
/// tokio mpsc receivers are single-consumer; replicas take turns holding the
/// lock while waiting, so each item is delivered to exactly one worker and
/// FIFO order per queue is preserved.
pub struct SharedReceiver<E> {
    rx: Arc<Mutex<Receiver<E>>>,
}

// Manual Clone impls so E is not required to be Clone.
impl<E> Clone for SharedReceiver<E> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<E: Send> SharedReceiver<E> {
    pub(crate) fn new(rx: Receiver<E>) -> Self {
        Self {
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Receives the next item; `None` once the queue is closed and drained.
    pub(crate) async fn recv(&self) -> Option<E> {
        self.rx.lock().await.recv().await
    }
}

/// Everything a worker needs besides the step itself: the shared input queue,
/// the sender feeding the next step (absent on the terminal step) and the
/// pipeline's counter hooks.
pub struct StepLink<E> {
    pub(crate) input: SharedReceiver<E>,
    pub(crate) output: Option<Sender<E>>,
    pub(crate) tokens: TokenCounter,
}

impl<E> Clone for StepLink<E> {
    fn clone(&self) -> Self {
        Self {
            input: self.input.clone(),
            output: self.output.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

impl<E: Send + 'static> StepLink<E> {
    /// Publishes a token downstream, blocking while the next queue is full.
    /// Returns false when the next queue is gone, the send was interrupted by
    /// cancellation, or this step has no output — a worker stuck behind a
    /// full queue must still observe shutdown.
    pub(crate) async fn forward(&self, value: E, cancel: &CancelToken) -> bool {
        match &self.output {
            Some(tx) => tokio::select! {
                _ = cancel.cancelled() => false,
                sent = tx.send(value) => sent.is_ok(),
            },
            None => false,
        }
    }
}
