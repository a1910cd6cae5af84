use async_trait::async_trait;

use crate::pipeline::cancel::CancelToken;
use crate::step::base::StepBase;
use crate::step::link::StepLink;
use crate::step::Step;

/// Sink applied to every token reaching the end of the pipeline.
pub type TerminalProcess<E> = Box<dyn Fn(E) + Send + Sync>;

/// Consumes tokens; the last step of every pipeline. Has no output queue.
pub struct TerminalStep<E> {
    base: StepBase,
    process: TerminalProcess<E>,
}

impl<E> TerminalStep<E> {
    pub(crate) fn new(base: StepBase, process: TerminalProcess<E>) -> Self {
        Self { base, process }
    }
}

#[async_trait]
impl<E: Send + 'static> Step<E> for TerminalStep<E> {
    fn label(&self) -> &'static str {
        self.base.label()
    }

    fn replicas(&self) -> u16 {
        self.base.replicas()
    }

    fn input_capacity(&self) -> Option<usize> {
        self.base.input_capacity()
    }

    fn is_terminal(&self) -> bool {
        true
    }

    async fn run_worker(&self, link: StepLink<E>, cancel: CancelToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::DEBUG, event = "stagepipe.cancelled", step = self.base.label(), "stagepipe.cancelled");
                    break;
                }
                msg = link.input.recv() => {
                    let Some(item) = msg else { break; };
                    (self.process)(item);
                    link.tokens.decrement();
                }
            }
        }
    }
}
