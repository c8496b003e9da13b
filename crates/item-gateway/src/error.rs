//! Gateway error taxonomy.

use item_gateway_circuitbreaker::CircuitOpenError;
use item_gateway_invoker::TransportError;
use item_gateway_resolver::ResolutionError;
use std::time::Duration;
use thiserror::Error;

/// Why a gateway call did not produce a remote value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// The group's breaker refused the attempt; nothing was sent.
    #[error("circuit breaker for group '{group}' is open")]
    CircuitOpen {
        /// Breaker group.
        group: String,
    },
    /// The attempt exceeded the time limit and was abandoned.
    #[error("call timed out after {timeout:?}")]
    Timeout {
        /// The limit that applied.
        timeout: Duration,
    },
    /// The remote call failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// No endpoint could be resolved for the service.
    #[error("endpoint resolution failed: {0}")]
    Resolution(#[from] ResolutionError),
    /// An item without a product was asked for its total or sent downstream.
    #[error("item has no product")]
    MissingProduct,
    /// The service answered with a value of the wrong shape for the operation.
    #[error("unexpected response to '{operation}'")]
    UnexpectedResponse {
        /// Operation name.
        operation: &'static str,
    },
}

impl GatewayError {
    /// Returns true if the breaker refused the call.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, GatewayError::CircuitOpen { .. })
    }

    /// Returns true if the call timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Timeout { .. })
    }

    /// Returns true if the remote call itself failed.
    pub fn is_transport(&self) -> bool {
        matches!(self, GatewayError::Transport(_))
    }

    /// Returns true if no endpoint was available.
    pub fn is_resolution(&self) -> bool {
        matches!(self, GatewayError::Resolution(_))
    }

    /// Returns the transport error, if this is one.
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            GatewayError::Transport(e) => Some(e),
            _ => None,
        }
    }

    /// Stable snake-case label for logs and events.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::CircuitOpen { .. } => "circuit_open",
            GatewayError::Timeout { .. } => "timeout",
            GatewayError::Transport(_) => "transport",
            GatewayError::Resolution(_) => "resolution",
            GatewayError::MissingProduct => "missing_product",
            GatewayError::UnexpectedResponse { .. } => "unexpected_response",
        }
    }
}

impl From<CircuitOpenError> for GatewayError {
    fn from(err: CircuitOpenError) -> Self {
        GatewayError::CircuitOpen { group: err.name }
    }
}

/// A gateway could not be assembled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// No resolver was supplied.
    #[error("gateway builder is missing an endpoint resolver")]
    MissingResolver,
    /// No invoker was supplied.
    #[error("gateway builder is missing a remote invoker")]
    MissingInvoker,
}
