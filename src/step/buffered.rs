use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::pipeline::cancel::CancelToken;
use crate::step::base::StepBase;
use crate::step::link::StepLink;
use crate::step::Step;

/// Result of one buffered process invocation.
pub struct BufferedOutput<E> {
    /// A new token to publish downstream.
    pub emit: Option<E>,
    /// Discard the current buffer contents, settling their accounting.
    pub flush: bool,
}

impl<E> Default for BufferedOutput<E> {
    fn default() -> Self {
        Self {
            emit: None,
            flush: false,
        }
    }
}

/// Process invoked with the buffer contents, oldest first.
pub type BufferedProcess<E> = Box<dyn Fn(&[E]) -> BufferedOutput<E> + Send + Sync>;

// Stands in for "never" when no time-triggered process is configured; the tick
// arm still exists so the loop shape is uniform.
const IDLE_TICK: Duration = Duration::from_secs(1000 * 3600);

/// Sliding-window step. Admitted tokens accumulate in a bounded buffer; a
/// process runs over the window after each input and/or on a recurring timer
/// and may emit a derived token and/or flush the window. With `pass_through`
/// each admitted token is also forwarded immediately.
///
/// Tokens held in the buffer are live: they stay in the in-flight count until
/// a flush disposes of them. Overflow drops the oldest entry and hands its
/// accounting to the incoming token, so a full buffer never counts more than
/// `capacity` entries.
///
/// Replicas above 1 are legal but serialize on the buffer lock; one worker is
/// the useful configuration.
pub struct BufferedStep<E> {
    base: StepBase,
    capacity: usize,
    pass_through: bool,
    input_triggered_process: Option<BufferedProcess<E>>,
    time_triggered_process: Option<BufferedProcess<E>>,
    interval: Duration,
    buffer: Mutex<Vec<E>>,
}

impl<E> BufferedStep<E>
where
    E: Clone + Send + 'static,
{
    pub(crate) fn new(
        base: StepBase,
        capacity: usize,
        pass_through: bool,
        input_triggered_process: Option<BufferedProcess<E>>,
        time_triggered_process: Option<BufferedProcess<E>>,
        interval: Option<Duration>,
    ) -> Self {
        Self {
            base,
            capacity,
            pass_through,
            input_triggered_process,
            time_triggered_process,
            interval: interval.unwrap_or(IDLE_TICK),
            buffer: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Admission path. Returns false once the next queue is gone.
    async fn on_input(&self, item: E, link: &StepLink<E>, cancel: &CancelToken) -> bool {
        // buffering, forwarding and the input-triggered process all happen
        // under one lock acquisition
        let mut buffer = self.buffer.lock().await;

        let overwrite = if buffer.len() == self.capacity {
            // the dropped entry's accounting transfers to the incoming token
            buffer.remove(0);
            true
        } else {
            false
        };

        if self.pass_through {
            buffer.push(item.clone());
            // the token now lives in two places, buffer and downstream; the
            // overwrite case already carries the buffer slot's count
            if !overwrite {
                link.tokens.increment();
            }
            if !link.forward(item, cancel).await {
                if !overwrite {
                    link.tokens.decrement();
                }
                return false;
            }
        } else {
            buffer.push(item);
        }

        match &self.input_triggered_process {
            Some(process) => self.apply(process, &mut buffer, link, cancel).await,
            None => true,
        }
    }

    /// Timer path.
    async fn on_tick(&self, link: &StepLink<E>, cancel: &CancelToken) -> bool {
        let Some(process) = &self.time_triggered_process else {
            return true;
        };
        let mut buffer = self.buffer.lock().await;
        self.apply(process, &mut buffer, link, cancel).await
    }

    async fn apply(
        &self,
        process: &BufferedProcess<E>,
        buffer: &mut Vec<E>,
        link: &StepLink<E>,
        cancel: &CancelToken,
    ) -> bool {
        let output = process(buffer.as_slice());

        if let Some(value) = output.emit {
            // an emission is a new token, distinct from the buffered ones
            link.tokens.increment();
            if !link.forward(value, cancel).await {
                link.tokens.decrement();
                return false;
            }
        }

        if output.flush {
            for _ in 0..buffer.len() {
                link.tokens.decrement();
            }
            buffer.clear();
        }
        true
    }
}

#[async_trait]
impl<E> Step<E> for BufferedStep<E>
where
    E: Clone + Send + 'static,
{
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
        // one long-lived timer per worker, reset after every input and tick
        let tick = sleep(self.interval);
        tokio::pin!(tick);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::DEBUG, event = "stagepipe.cancelled", step = self.base.label(), "stagepipe.cancelled");
                    break;
                }
                msg = link.input.recv() => {
                    let Some(item) = msg else { break; };
                    if !self.on_input(item, &link, &cancel).await {
                        #[cfg(feature = "tracing")]
                        tracing::event!(tracing::Level::INFO, event = "stagepipe.downstream.closed", step = self.base.label(), "stagepipe.downstream.closed");
                        break;
                    }
                    tick.as_mut().reset(Instant::now() + self.interval);
                }
                _ = tick.as_mut() => {
                    if !self.on_tick(&link, &cancel).await {
                        #[cfg(feature = "tracing")]
                        tracing::event!(tracing::Level::INFO, event = "stagepipe.downstream.closed", step = self.base.label(), "stagepipe.downstream.closed");
                        break;
                    }
                    tick.as_mut().reset(Instant::now() + self.interval);
                }
            }
        }
    }
}
