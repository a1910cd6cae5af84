use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::error::{Error, Result};
use crate::pipeline::builder::BoxedStep;
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::counter::TokenCounter;
use crate::step::link::{SharedReceiver, StepLink};

/// An ordered sequence of steps wired together by bounded queues, plus the
/// shared bookkeeping: the in-flight token counter, the worker set and the
/// cancellation token driving shutdown.
///
/// Lifecycle: [`Pipeline::init`] wires, [`Pipeline::run`] spawns workers,
/// `feed_*` admit tokens, [`Pipeline::terminate`] stops workers and closes
/// every queue. `init`, `run` and `terminate` are idempotent.
pub struct Pipeline<E: Send + 'static> {
    steps: Vec<BoxedStep<E>>,
    default_capacity: usize,
    tokens: TokenCounter,
    head: Option<mpsc::Sender<E>>,
    links: Option<Vec<StepLink<E>>>,
    workers: Option<JoinSet<()>>,
    cancel_workers: Option<CancelToken>,
    closed: AtomicBool,
}

impl<E: Send + 'static> Pipeline<E> {
    pub(crate) fn new(config: PipelineConfig, steps: Vec<BoxedStep<E>>) -> Self {
        Self {
            steps,
            default_capacity: config.default_step_input_queue_capacity,
            tokens: TokenCounter::new(config.track_tokens_count),
            head: None,
            links: None,
            workers: None,
            cancel_workers: None,
            closed: AtomicBool::new(false),
        }
    }

    /// Validates the configuration and, once, allocates every input queue and
    /// wires each step's output to the next step's input.
    pub fn init(&mut self) -> Result<()> {
        if self.default_capacity == 0 {
            return Err(Error::pipeline(
                "default input queue capacity must be greater than zero",
            ));
        }
        if self.steps.is_empty() {
            return Err(Error::pipeline("a pipeline needs at least one step"));
        }
        let last = self.steps.len() - 1;
        for (index, step) in self.steps.iter().enumerate() {
            if index == last && !step.is_terminal() {
                return Err(Error::pipeline("the last step must be a terminal step"));
            }
            if index != last && step.is_terminal() {
                return Err(Error::pipeline("a terminal step can only be the last step"));
            }
        }

        if self.links.is_some() {
            return Ok(());
        }

        let mut senders = Vec::with_capacity(self.steps.len());
        let mut receivers = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let capacity = step.input_capacity().unwrap_or(self.default_capacity);
            let (tx, rx) = mpsc::channel(capacity);
            senders.push(tx);
            receivers.push(rx);
        }
        self.head = Some(senders[0].clone());

        let mut links = Vec::with_capacity(self.steps.len());
        for (index, rx) in receivers.into_iter().enumerate() {
            links.push(StepLink {
                input: SharedReceiver::new(rx),
                // the terminal step has input only
                output: senders.get(index + 1).cloned(),
                tokens: self.tokens.clone(),
            });
        }
        self.links = Some(links);
        Ok(())
    }

    /// Spawns every step's workers against a child of `parent`.
    ///
    /// Workers are spawned downstream-first so consumers are already draining
    /// when producers start.
    ///
    /// # Panics
    ///
    /// Panics when called before a successful [`Pipeline::init`].
    pub fn run(&mut self, parent: &CancelToken) {
        if self.workers.is_some() {
            return;
        }
        let links = self
            .links
            .as_ref()
            .expect("Pipeline::run called before Pipeline::init");

        let cancel = parent.child();
        let mut workers = JoinSet::new();
        for (index, step) in self.steps.iter().enumerate().rev() {
            for _ in 0..step.replicas() {
                let step = Arc::clone(step);
                let link = links[index].clone();
                let cancel = cancel.clone();
                workers.spawn(async move {
                    step.run_worker(link, cancel).await;
                });
            }
        }
        self.cancel_workers = Some(cancel);
        self.workers = Some(workers);
    }

    /// Admits one token: counted first, then sent into the head queue,
    /// blocking while that queue is full. Silently ignored after
    /// [`Pipeline::terminate`].
    pub async fn feed_one(&self, item: E) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let Some(head) = &self.head else {
            return;
        };
        // counted before the send so the counter never misses an admitted token
        self.tokens.increment();
        if head.send(item).await.is_err() {
            // terminate raced the admission; the token never entered
            self.tokens.decrement();
        }
    }

    /// Admits a batch, re-checking the closed flag per item.
    pub async fn feed_many<I>(&self, items: I)
    where
        I: IntoIterator<Item = E>,
    {
        for item in items {
            self.feed_one(item).await;
        }
    }

    /// Completes once every admitted token has been disposed of.
    ///
    /// # Panics
    ///
    /// Panics when token tracking is disabled, see
    /// [`PipelineConfig::track_tokens_count`].
    pub async fn wait_till_done(&self) {
        self.tokens.wait_until_zero().await;
    }

    /// Current in-flight token count; zero when tracking is disabled.
    pub fn tokens_count(&self) -> u64 {
        self.tokens.snapshot()
    }

    /// Refuses further admissions, stops every worker and closes every input
    /// queue exactly once. Safe to call with or without a prior cancellation
    /// of the parent token.
    pub async fn terminate(&mut self) {
        if self.workers.is_none() && self.closed.load(Ordering::SeqCst) {
            return;
        }
        self.closed.store(true, Ordering::SeqCst);
        if let Some(cancel) = self.cancel_workers.take() {
            cancel.cancel();
        }
        if let Some(mut workers) = self.workers.take() {
            while workers.join_next().await.is_some() {}
        }
        // dropping the retained senders closes each queue
        self.head = None;
        self.links = None;
        #[cfg(feature = "tracing")]
        tracing::event!(
            tracing::Level::DEBUG,
            event = "stagepipe.terminated",
            "stagepipe.terminated"
        );
    }
}
