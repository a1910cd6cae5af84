use std::sync::Arc;
use std::time::Duration;

use crate::error::StepError;
use crate::step::basic::BasicProcess;
use crate::step::buffered::{BufferedOutput, BufferedProcess};
use crate::step::filter::FilterCriteria;
use crate::step::fragmenter::FragmenterProcess;
use crate::step::terminal::TerminalProcess;
use crate::step::ErrorHandler;

/// Pipeline-wide settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Capacity used for every input queue without an explicit override.
    pub default_step_input_queue_capacity: usize,

    /// When false, the counter hooks become no-ops and `wait_till_done` is
    /// unusable. Reserved for throughput-maximised runs that never wait for
    /// the pipeline to drain.
    pub track_tokens_count: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_step_input_queue_capacity: 128,
            track_tokens_count: true,
        }
    }
}

impl PipelineConfig {
    pub fn new(default_step_input_queue_capacity: usize) -> Self {
        Self {
            default_step_input_queue_capacity,
            ..Self::default()
        }
    }

    pub fn track_tokens_count(mut self, track: bool) -> Self {
        self.track_tokens_count = track;
        self
    }
}

/// Configuration for a 1 -> 1 transform step.
pub struct BasicConfig<E> {
    pub label: &'static str,
    pub replicas: u16,
    pub input_queue_capacity: Option<usize>,
    pub process: BasicProcess<E>,
    pub error_handler: Option<ErrorHandler>,
}

impl<E> BasicConfig<E> {
    pub fn new<F>(label: &'static str, process: F) -> Self
    where
        F: Fn(E) -> Result<E, StepError> + Send + Sync + 'static,
    {
        Self {
            label,
            replicas: 1,
            input_queue_capacity: None,
            process: Box::new(process),
            error_handler: None,
        }
    }

    pub fn replicas(mut self, replicas: u16) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn input_queue_capacity(mut self, capacity: usize) -> Self {
        self.input_queue_capacity = Some(capacity);
        self
    }

    pub fn error_handler<H>(mut self, handler: H) -> Self
    where
        H: Fn(&str, StepError) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }
}

/// Configuration for a predicate step.
pub struct FilterConfig<E> {
    pub label: &'static str,
    pub replicas: u16,
    pub input_queue_capacity: Option<usize>,
    pub pass_criteria: FilterCriteria<E>,
}

impl<E> FilterConfig<E> {
    pub fn new<F>(label: &'static str, pass_criteria: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Self {
            label,
            replicas: 1,
            input_queue_capacity: None,
            pass_criteria: Box::new(pass_criteria),
        }
    }

    pub fn replicas(mut self, replicas: u16) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn input_queue_capacity(mut self, capacity: usize) -> Self {
        self.input_queue_capacity = Some(capacity);
        self
    }
}

/// Configuration for a 1 -> N step.
pub struct FragmenterConfig<E> {
    pub label: &'static str,
    pub replicas: u16,
    pub input_queue_capacity: Option<usize>,
    pub process: FragmenterProcess<E>,
    pub error_handler: Option<ErrorHandler>,
}

impl<E> FragmenterConfig<E> {
    pub fn new<F>(label: &'static str, process: F) -> Self
    where
        F: Fn(E) -> Result<Vec<E>, StepError> + Send + Sync + 'static,
    {
        Self {
            label,
            replicas: 1,
            input_queue_capacity: None,
            process: Box::new(process),
            error_handler: None,
        }
    }

    pub fn replicas(mut self, replicas: u16) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn input_queue_capacity(mut self, capacity: usize) -> Self {
        self.input_queue_capacity = Some(capacity);
        self
    }

    pub fn error_handler<H>(mut self, handler: H) -> Self
    where
        H: Fn(&str, StepError) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }
}

/// Configuration for a sliding-window step.
///
/// At least one of the two processes is required; a time-triggered process
/// additionally needs a non-zero interval. Violations fail at construction.
pub struct BufferedConfig<E> {
    pub label: &'static str,
    pub replicas: u16,
    pub input_queue_capacity: Option<usize>,
    /// Maximum window length; the oldest entry is dropped on overflow.
    pub capacity: usize,
    /// Forward each admitted token immediately in addition to buffering it.
    pub pass_through: bool,
    pub input_triggered_process: Option<BufferedProcess<E>>,
    pub time_triggered_process: Option<BufferedProcess<E>>,
    pub time_triggered_interval: Option<Duration>,
}

impl<E> BufferedConfig<E> {
    pub fn new(label: &'static str, capacity: usize) -> Self {
        Self {
            label,
            replicas: 1,
            input_queue_capacity: None,
            capacity,
            pass_through: false,
            input_triggered_process: None,
            time_triggered_process: None,
            time_triggered_interval: None,
        }
    }

    pub fn replicas(mut self, replicas: u16) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn input_queue_capacity(mut self, capacity: usize) -> Self {
        self.input_queue_capacity = Some(capacity);
        self
    }

    pub fn pass_through(mut self, pass_through: bool) -> Self {
        self.pass_through = pass_through;
        self
    }

    /// Process to run over the window after each admitted token.
    pub fn input_triggered_process<F>(mut self, process: F) -> Self
    where
        F: Fn(&[E]) -> BufferedOutput<E> + Send + Sync + 'static,
    {
        self.input_triggered_process = Some(Box::new(process));
        self
    }

    /// Process to run over the window every `interval`.
    pub fn time_triggered_process<F>(mut self, process: F, interval: Duration) -> Self
    where
        F: Fn(&[E]) -> BufferedOutput<E> + Send + Sync + 'static,
    {
        self.time_triggered_process = Some(Box::new(process));
        self.time_triggered_interval = Some(interval);
        self
    }
}

/// Configuration for the sink step ending a pipeline.
pub struct TerminalConfig<E> {
    pub label: &'static str,
    pub replicas: u16,
    pub input_queue_capacity: Option<usize>,
    pub process: TerminalProcess<E>,
}

impl<E> TerminalConfig<E> {
    pub fn new<F>(label: &'static str, process: F) -> Self
    where
        F: Fn(E) + Send + Sync + 'static,
    {
        Self {
            label,
            replicas: 1,
            input_queue_capacity: None,
            process: Box::new(process),
        }
    }

    pub fn replicas(mut self, replicas: u16) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn input_queue_capacity(mut self, capacity: usize) -> Self {
        self.input_queue_capacity = Some(capacity);
        self
    }
}
