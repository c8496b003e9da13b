//! Error types for the time limiter.

use std::time::Duration;
use thiserror::Error;

/// Failure of a time-limited attempt.
#[derive(Debug, Error)]
pub enum TimeLimiterError<E> {
    /// The attempt did not complete within `timeout` and was abandoned.
    #[error("attempt timed out after {timeout:?}")]
    Timeout {
        /// The limit that was exceeded.
        timeout: Duration,
    },
    /// The attempt completed in time but failed.
    #[error("attempt failed: {0}")]
    Inner(E),
}

impl<E> TimeLimiterError<E> {
    /// Returns true if this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TimeLimiterError::Timeout { .. })
    }

    /// Converts this error into the attempt's own error, if any.
    pub fn into_inner(self) -> Option<E> {
        match self {
            TimeLimiterError::Timeout { .. } => None,
            TimeLimiterError::Inner(e) => Some(e),
        }
    }
}
