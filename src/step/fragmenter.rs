use async_trait::async_trait;

use crate::error::StepError;
use crate::pipeline::cancel::CancelToken;
use crate::step::base::StepBase;
use crate::step::link::StepLink;
use crate::step::{ErrorHandler, Step};

/// Turns one token into any number of successor tokens, possibly zero.
pub type FragmenterProcess<E> = Box<dyn Fn(E) -> Result<Vec<E>, StepError> + Send + Sync>;

/// Replaces each input token with the fragments the process returns. The
/// consumed input is disposed of whether it fragmented, produced nothing or
/// failed, so a fragmentation into k pieces changes the in-flight count by
/// k - 1.
pub struct FragmenterStep<E> {
    base: StepBase,
    process: FragmenterProcess<E>,
    error_handler: Option<ErrorHandler>,
}

impl<E> FragmenterStep<E> {
    pub(crate) fn new(
        base: StepBase,
        process: FragmenterProcess<E>,
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
impl<E: Send + 'static> Step<E> for FragmenterStep<E> {
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
                    let mut downstream_closed = false;
                    match (self.process)(item) {
                        Ok(fragments) => {
                            for fragment in fragments {
                                // every fragment is a new token
                                link.tokens.increment();
                                if !link.forward(fragment, &cancel).await {
                                    link.tokens.decrement();
                                    downstream_closed = true;
                                    break;
                                }
                            }
                        }
                        Err(err) => self.report(err),
                    }
                    // fragmented or rejected, the input token is gone either way
                    link.tokens.decrement();
                    if downstream_closed {
                        #[cfg(feature = "tracing")]
                        tracing::event!(tracing::Level::INFO, event = "stagepipe.downstream.closed", step = self.base.label(), "stagepipe.downstream.closed");
                        break;
                    }
                }
            }
        }
    }
}
