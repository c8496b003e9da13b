//! Event types for the time limiter.

use item_gateway_core::GatewayEvent;
use std::time::{Duration, Instant};

/// Events emitted by the time limiter.
#[derive(Debug, Clone)]
pub enum TimeLimiterEvent {
    /// The attempt succeeded within the limit.
    Success {
        /// Limiter name.
        source: String,
        /// When the attempt completed.
        timestamp: Instant,
        /// How long the attempt took.
        duration: Duration,
    },
    /// The attempt failed within the limit.
    Error {
        /// Limiter name.
        source: String,
        /// When the attempt completed.
        timestamp: Instant,
        /// How long the attempt took.
        duration: Duration,
    },
    /// The attempt was abandoned at the limit.
    Timeout {
        /// Limiter name.
        source: String,
        /// When the limit expired.
        timestamp: Instant,
        /// The limit that applied.
        timeout: Duration,
    },
}

impl GatewayEvent for TimeLimiterEvent {
    fn kind(&self) -> &'static str {
        match self {
            TimeLimiterEvent::Success { .. } => "success",
            TimeLimiterEvent::Error { .. } => "error",
            TimeLimiterEvent::Timeout { .. } => "timeout",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            TimeLimiterEvent::Success { timestamp, .. }
            | TimeLimiterEvent::Error { timestamp, .. }
            | TimeLimiterEvent::Timeout { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            TimeLimiterEvent::Success { source, .. }
            | TimeLimiterEvent::Error { source, .. }
            | TimeLimiterEvent::Timeout { source, .. } => source,
        }
    }
}
