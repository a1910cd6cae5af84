use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::pipeline::config::{
    BasicConfig, BufferedConfig, FilterConfig, FragmenterConfig, PipelineConfig, TerminalConfig,
};
use crate::pipeline::runtime::Pipeline;
use crate::step::base::StepBase;
use crate::step::basic::BasicStep;
use crate::step::buffered::BufferedStep;
use crate::step::filter::FilterStep;
use crate::step::fragmenter::FragmenterStep;
use crate::step::terminal::TerminalStep;
use crate::step::Step;

/// Shared handle to a constructed step, ready to be wired into a pipeline.
pub type BoxedStep<E> = Arc<dyn Step<E>>;

/// Constructs steps and pipelines from typed config records.
///
/// The required process closures are enforced by the type system, so most
/// step kinds build infallibly; [`Builder::buffered`] carries the residual
/// runtime validation.
pub struct Builder<E> {
    _element: PhantomData<fn() -> E>,
}

impl<E: Send + 'static> Builder<E> {
    pub fn new() -> Self {
        Self {
            _element: PhantomData,
        }
    }

    pub fn basic(&self, config: BasicConfig<E>) -> BoxedStep<E> {
        Arc::new(BasicStep::new(
            StepBase::new(config.label, config.replicas, config.input_queue_capacity),
            config.process,
            config.error_handler,
        ))
    }

    pub fn filter(&self, config: FilterConfig<E>) -> BoxedStep<E> {
        Arc::new(FilterStep::new(
            StepBase::new(config.label, config.replicas, config.input_queue_capacity),
            config.pass_criteria,
        ))
    }

    pub fn fragmenter(&self, config: FragmenterConfig<E>) -> BoxedStep<E> {
        Arc::new(FragmenterStep::new(
            StepBase::new(config.label, config.replicas, config.input_queue_capacity),
            config.process,
            config.error_handler,
        ))
    }

    pub fn terminal(&self, config: TerminalConfig<E>) -> BoxedStep<E> {
        Arc::new(TerminalStep::new(
            StepBase::new(config.label, config.replicas, config.input_queue_capacity),
            config.process,
        ))
    }

    pub fn pipeline(&self, config: PipelineConfig, steps: Vec<BoxedStep<E>>) -> Pipeline<E> {
        Pipeline::new(config, steps)
    }
}

impl<E: Clone + Send + 'static> Builder<E> {
    /// Fails unless the config names at least one process, pairs any
    /// time-triggered process with a non-zero interval and has a positive
    /// window capacity.
    pub fn buffered(&self, config: BufferedConfig<E>) -> Result<BoxedStep<E>> {
        if config.input_triggered_process.is_none() && config.time_triggered_process.is_none() {
            return Err(Error::config(
                config.label,
                "either an input or a time triggered process is required",
            ));
        }
        if config.time_triggered_process.is_some() {
            match config.time_triggered_interval {
                Some(interval) if !interval.is_zero() => {}
                _ => {
                    return Err(Error::config(
                        config.label,
                        "a time triggered process requires a non-zero interval",
                    ));
                }
            }
        }
        if config.capacity == 0 {
            return Err(Error::config(
                config.label,
                "buffer capacity must be greater than zero",
            ));
        }
        Ok(Arc::new(BufferedStep::new(
            StepBase::new(config.label, config.replicas, config.input_queue_capacity),
            config.capacity,
            config.pass_through,
            config.input_triggered_process,
            config.time_triggered_process,
            config.time_triggered_interval,
        )))
    }
}

impl<E: Send + 'static> Default for Builder<E> {
    fn default() -> Self {
        Self::new()
    }
}
