use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Type-erased error produced by a user-supplied step process.
///
/// Per-token errors are local: the offending token is dropped and reported,
/// nothing else in the pipeline is affected.
pub type StepError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration for step `{step}`: {reason}")]
    Config {
        step: &'static str,
        reason: &'static str,
    },

    #[error("pipeline error: {context}")]
    Pipeline { context: &'static str },
}

impl Error {
    pub fn pipeline(context: &'static str) -> Self {
        Self::Pipeline { context }
    }

    pub(crate) fn config(step: &'static str, reason: &'static str) -> Self {
        Self::Config { step, reason }
    }
}
