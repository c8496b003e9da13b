use thiserror::Error;

/// Returned when a breaker refuses to admit a call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circuit breaker '{name}' is open; call not permitted")]
pub struct CircuitOpenError {
    /// Breaker group that refused the call.
    pub name: String,
}
