//! Resolution errors.

use thiserror::Error;

/// Failure to turn a logical service name into an address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// Nothing is registered under this name.
    #[error("no service registered under '{service}'")]
    UnknownService {
        /// Requested service name.
        service: String,
    },
    /// Instances exist but all are marked unhealthy.
    #[error("no healthy instance available for '{service}'")]
    NoHealthyInstance {
        /// Requested service name.
        service: String,
    },
    /// An address could not be used as a base URL.
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress {
        /// The rejected address.
        address: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ResolutionError {
    /// Returns true if the service name is unknown.
    pub fn is_unknown_service(&self) -> bool {
        matches!(self, ResolutionError::UnknownService { .. })
    }

    /// Returns true if every instance is unhealthy.
    pub fn is_no_healthy_instance(&self) -> bool {
        matches!(self, ResolutionError::NoHealthyInstance { .. })
    }
}
