pub(crate) mod base;
pub mod basic;
pub mod buffered;
pub mod filter;
pub mod fragmenter;
pub mod link;
pub mod terminal;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StepError;
use crate::pipeline::cancel::CancelToken;
use crate::step::link::StepLink;

/// Callback invoked with the step label and the error whenever a user process
/// rejects a token. Invocations happen on worker tasks; ordering across
/// replicas is unspecified.
pub type ErrorHandler = Arc<dyn Fn(&str, StepError) + Send + Sync>;

/// One stage of a pipeline.
///
/// Implementations define the per-token semantics; the pipeline wires input
/// queues, output senders and counter hooks at init time and drives
/// [`Step::run_worker`] once per replica.
#[async_trait]
pub trait Step<E: Send + 'static>: Send + Sync {
    fn label(&self) -> &'static str;

    /// Number of concurrent workers for this step, always at least 1.
    fn replicas(&self) -> u16;

    /// Explicit input queue capacity, if one was configured.
    fn input_capacity(&self) -> Option<usize>;

    /// Whether this step consumes tokens without publishing downstream.
    fn is_terminal(&self) -> bool {
        false
    }

    /// A single worker loop. Runs until the cancel token fires or the input
    /// queue is closed and drained.
    async fn run_worker(&self, link: StepLink<E>, cancel: CancelToken);
}

impl<E: Send + 'static> std::fmt::Debug for dyn Step<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step").field("label", &self.label()).finish()
    }
}
