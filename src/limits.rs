use std::{
    fmt::{self, Display},
    time::Duration,
};

use bon::bon;

use crate::error::ConfigError;

/// The default maximum time to wait before processing a batch.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(5);

/// Limits controlling when a batch gets processed.
///
/// A batch is processed when it reaches `max_batch_size` items (if set), or `max_wait` after the
/// first item was added, whichever happens first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct Limits {
    pub(crate) max_batch_size: Option<usize>,
    pub(crate) max_wait: Duration,
}

#[bon]
impl Limits {
    #[allow(missing_docs)]
    #[builder]
    pub fn new(
        /// Process the batch as soon as it holds this many items. Disabled if not set.
        max_batch_size: Option<usize>,
        /// The maximum time an item can wait in an otherwise empty batch before it gets processed.
        #[builder(default = DEFAULT_MAX_WAIT)]
        max_wait: Duration,
    ) -> Result<Self, ConfigError> {
        if max_batch_size == Some(0) {
            return Err(ConfigError::ZeroBatchSize);
        }
        if max_wait.is_zero() {
            return Err(ConfigError::ZeroWait);
        }

        Ok(Self {
            max_batch_size,
            max_wait,
        })
    }

    /// The size at which a batch gets processed immediately, if any.
    pub fn max_batch_size(&self) -> Option<usize> {
        self.max_batch_size
    }

    /// The maximum time a batch waits before being processed.
    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    pub(crate) fn is_full(&self, len: usize) -> bool {
        self.max_batch_size.is_some_and(|max| len >= max)
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_batch_size: None,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

impl Display for Limits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max_batch_size {
            Some(size) => write!(
                f,
                "batch_size: {}, max_wait: {}ms",
                size,
                self.max_wait.as_millis()
            ),
            None => write!(f, "batch_size: unlimited, max_wait: {}ms", self.max_wait.as_millis()),
        }
    }
}
