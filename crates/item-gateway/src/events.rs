//! Events emitted by the gateway.

use crate::GatewayError;
use item_gateway_core::GatewayEvent;
use std::time::{Duration, Instant};

/// Per-call gateway events.
///
/// `source` is the breaker group the call ran under.
#[derive(Debug, Clone)]
pub enum GatewayCallEvent {
    /// The remote call returned a value.
    CallSucceeded {
        /// Breaker group.
        source: String,
        /// When the call completed.
        timestamp: Instant,
        /// Operation name.
        operation: &'static str,
        /// Time from admission to completion.
        duration: Duration,
    },
    /// The call failed or was refused.
    CallFailed {
        /// Breaker group.
        source: String,
        /// When the failure was observed.
        timestamp: Instant,
        /// Operation name.
        operation: &'static str,
        /// The failure.
        error: GatewayError,
    },
    /// A caller-supplied fallback replaced a failed call's result.
    FallbackApplied {
        /// Breaker group.
        source: String,
        /// When the fallback ran.
        timestamp: Instant,
        /// Operation name.
        operation: &'static str,
        /// Label of the error that triggered it.
        error_kind: &'static str,
    },
}

impl GatewayEvent for GatewayCallEvent {
    fn kind(&self) -> &'static str {
        match self {
            GatewayCallEvent::CallSucceeded { .. } => "call_succeeded",
            GatewayCallEvent::CallFailed { .. } => "call_failed",
            GatewayCallEvent::FallbackApplied { .. } => "fallback_applied",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            GatewayCallEvent::CallSucceeded { timestamp, .. }
            | GatewayCallEvent::CallFailed { timestamp, .. }
            | GatewayCallEvent::FallbackApplied { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            GatewayCallEvent::CallSucceeded { source, .. }
            | GatewayCallEvent::CallFailed { source, .. }
            | GatewayCallEvent::FallbackApplied { source, .. } => source,
        }
    }
}
