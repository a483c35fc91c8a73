//! Errors.

use std::{any::Any, fmt::Display};

use thiserror::Error;

/// Invalid batcher configuration.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// A maximum batch size of zero would trigger processing before anything was added.
    #[error("max_batch_size must be greater than zero")]
    ZeroBatchSize,

    /// A maximum wait of zero is not a time limit.
    #[error("max_wait must be greater than zero")]
    ZeroWait,
}

/// Something went wrong while processing a batch.
///
/// Never reaches the code adding items. It gets logged, and the batch stays queued.
#[derive(Error, Debug)]
pub(crate) enum ProcessingError<E: Display> {
    #[error("The entire batch failed")]
    BatchFailed(#[source] E),

    #[error("The batch processing panicked: {0}")]
    Panic(String),
}

pub(crate) type ProcessingResult<E> = std::result::Result<(), ProcessingError<E>>;

impl<E: Display> ProcessingError<E> {
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => (*message).to_string(),
                Err(_) => "unknown panic payload".to_string(),
            },
        };
        ProcessingError::Panic(message)
    }
}
