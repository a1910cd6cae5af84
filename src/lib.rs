//! # stagepipe
//!
//! **Typed, staged, in-process data pipelines in Rust.**
//!
//! `stagepipe` is a crate for composing an ordered sequence of processing
//! *steps* into a **bounded-memory**, **backpressure-aware** and
//! **cancellable** pipeline. Tokens of a single element type flow in at the
//! head, through each step's concurrent workers, and out through a terminal
//! sink — with an in-flight counter that reaches zero exactly when every
//! admitted token has been disposed of.
//!
//! It is designed for production constraints:
//!
//! - bounded queues between steps (memory is a budget)
//! - per-step worker replicas
//! - accurate in-flight accounting and a non-spinning drain wait
//! - graceful shutdown
//!
//! ---
//!
//! ## Core Model
//!
//! A pipeline is a linear chain of steps:
//!
//! ```text
//! feed → basic → filter → fragmenter → buffered → terminal
//! ```
//!
//! Each step runs one or more workers against a shared bounded queue. Step
//! kinds: **basic** (fallible 1→1 map), **filter** (1→0|1), **fragmenter**
//! (1→N, N may be 0), **buffered** (sliding window with input- and/or
//! time-triggered processes, optional pass-through) and **terminal** (sink).
//!
//! ---
//!
//! ## Example
//!
//! ```no_run
//! use stagepipe::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> stagepipe::error::Result<()> {
//!     let builder: Builder<i64> = Builder::new();
//!     let steps = vec![
//!         builder.basic(BasicConfig::new("double", |x| Ok(x * 2))),
//!         builder.filter(FilterConfig::new("positive", |x| *x > 0)),
//!         builder.terminal(TerminalConfig::new("print", |x| println!("{x}"))),
//!     ];
//!
//!     let mut pipeline = builder.pipeline(PipelineConfig::default(), steps);
//!     pipeline.init()?;
//!
//!     let cancel = CancelToken::default();
//!     pipeline.run(&cancel);
//!
//!     pipeline.feed_many(-5..5).await;
//!     pipeline.wait_till_done().await;
//!     pipeline.terminate().await;
//!     Ok(())
//! }
//! ```
//!
//! ---
//!
//! ## Accounting Contract
//!
//! Every admitted token is counted once; filters, terminal consumption,
//! per-token errors and buffered flushes count it back out; fragmenters and
//! buffered emissions count new tokens in. [`Pipeline::wait_till_done`]
//! therefore blocks exactly until the pipeline is drained — unless a buffered
//! step without a flushing process intentionally retains its window, in which
//! case [`Pipeline::tokens_count`] stays positive and `terminate` is the way
//! out.
//!
//! ---
//!
//! ## Cancellation
//!
//! [`Pipeline::run`] derives a child of the caller's [`CancelToken`]; every
//! worker observes it each iteration. Cancelling the parent or calling
//! [`Pipeline::terminate`] stops workers after the token in hand is disposed
//! of. Buffered windows are not flushed on shutdown.
//!
//! ---
//!
//! ## Observability
//!
//! Tracing instrumentation is behind the default-on `tracing` feature:
//!
//! ```toml
//! stagepipe = { version = "0.2", features = ["tracing"] }
//! ```
//!
//! Minimal subscriber setup:
//!
//! ```ignore
//! use tracing_subscriber::fmt;
//!
//! fn main() {
//!     fmt()
//!         .with_target(false)
//!         .with_env_filter("stagepipe=debug")
//!         .init();
//! }
//! ```
//!
//! `stagepipe` emits structured events such as `stagepipe.step.error`,
//! `stagepipe.downstream.closed`, `stagepipe.cancelled` and
//! `stagepipe.terminated`.
//!
//! [`Pipeline::wait_till_done`]: pipeline::runtime::Pipeline::wait_till_done
//! [`Pipeline::tokens_count`]: pipeline::runtime::Pipeline::tokens_count
//! [`Pipeline::run`]: pipeline::runtime::Pipeline::run
//! [`Pipeline::terminate`]: pipeline::runtime::Pipeline::terminate
//! [`CancelToken`]: pipeline::cancel::CancelToken

pub mod error;
pub mod pipeline;
pub mod step;

pub mod prelude {
    //! Convenient imports for most `stagepipe` users.

    pub use crate::error::{Result, StepError};
    pub use crate::pipeline::builder::{BoxedStep, Builder};
    pub use crate::pipeline::cancel::CancelToken;
    pub use crate::pipeline::config::{
        BasicConfig, BufferedConfig, FilterConfig, FragmenterConfig, PipelineConfig,
        TerminalConfig,
    };
    pub use crate::pipeline::runtime::Pipeline;
    pub use crate::step::buffered::BufferedOutput;
}
