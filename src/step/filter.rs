use async_trait::async_trait;

use crate::pipeline::cancel::CancelToken;
use crate::step::base::StepBase;
use crate::step::link::StepLink;
use crate::step::Step;

/// Predicate deciding whether a token continues downstream.
pub type FilterCriteria<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

/// Passes tokens matching the criteria, disposes of the rest.
pub struct FilterStep<E> {
    base: StepBase,
    pass_criteria: FilterCriteria<E>,
}

impl<E> FilterStep<E> {
    pub(crate) fn new(base: StepBase, pass_criteria: FilterCriteria<E>) -> Self {
        Self {
            base,
            pass_criteria,
        }
    }
}

#[async_trait]
impl<E: Send + 'static> Step<E> for FilterStep<E> {
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
                    if (self.pass_criteria)(&item) {
                        if !link.forward(item, &cancel).await {
                            link.tokens.decrement();
                            #[cfg(feature = "tracing")]
                            tracing::event!(tracing::Level::INFO, event = "stagepipe.downstream.closed", step = self.base.label(), "stagepipe.downstream.closed");
                            break;
                        }
                    } else {
                        link.tokens.decrement();
                    }
                }
            }
        }
    }
}
