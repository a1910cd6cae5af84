use async_trait::async_trait;

use crate::error::StepError;
use crate::pipeline::cancel::CancelToken;
use crate::step::base::StepBase;
use crate::step::link::StepLink;
use crate::step::{ErrorHandler, Step};

/// Fallible 1 -> 1 transform applied to every token.
pub type BasicProcess<E> = Box<dyn Fn(E) -> Result<E, StepError> + Send + Sync>;

/// Applies a user transform to each token and publishes the result. A failed
/// transform drops the token and reports; the worker keeps going.
pub struct BasicStep<E> {
    base: StepBase,
    process: BasicProcess<E>,
    error_handler: Option<ErrorHandler>,
}

impl<E> BasicStep<E> {
    pub(crate) fn new(
        base: StepBase,
        process: BasicProcess<E>,
        error_handler: Option<ErrorHandler>,
    ) -> Self {
        Self {
            base,
            process,
            error_handler,
        }
    }

    fn report(&self, err: StepError) {
        #[cfg(feature = "tracing")]
        tracing::event!(
            tracing::Level::WARN,
            event = "stagepipe.step.error",
            step = self.base.label(),
            error = %err,
            "stagepipe.step.error"
        );
        if let Some(handler) = &self.error_handler {
            handler(self.base.label(), err);
        }
    }
}

#[async_trait]
impl<E: Send + 'static> Step<E> for BasicStep<E> {
    fn label(&self) -> &'static str {
        self.base.label()
    }

    fn replicas(&self) -> u16 {
        self.base.replicas()
    }

    fn input_capacity(&self) -> Option<usize> {
        self.base.input_capacity()
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
                    match (self.process)(item) {
                        Ok(out) => {
                            if !link.forward(out, &cancel).await {
                                // admitted but no longer deliverable
                                link.tokens.decrement();
                                #[cfg(feature = "tracing")]
                                tracing::event!(tracing::Level::INFO, event = "stagepipe.downstream.closed", step = self.base.label(), "stagepipe.downstream.closed");
                                break;
                            }
                        }
                        Err(err) => {
                            // the token will not proceed, settle its accounting
                            link.tokens.decrement();
                            self.report(err);
                        }
                    }
                }
            }
        }
    }
}
