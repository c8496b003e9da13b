//! Events emitted by the circuit breaker.

use crate::{CircuitState, OutcomeKind};
use item_gateway_core::GatewayEvent;
use std::time::{Duration, Instant};

/// Breaker lifecycle and call events.
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    /// A call was admitted.
    CallPermitted {
        /// Breaker group.
        source: String,
        /// When the permit was granted.
        timestamp: Instant,
        /// State the call was admitted in.
        state: CircuitState,
    },
    /// A call was refused without reaching the downstream service.
    CallRejected {
        /// Breaker group.
        source: String,
        /// When the call was refused.
        timestamp: Instant,
        /// State that refused the call.
        state: CircuitState,
    },
    /// An admitted call completed and its outcome entered the window.
    OutcomeRecorded {
        /// Breaker group.
        source: String,
        /// When the outcome was recorded.
        timestamp: Instant,
        /// State the outcome was recorded in.
        state: CircuitState,
        /// Classification of the call.
        kind: OutcomeKind,
        /// Wall-clock duration of the attempt.
        duration: Duration,
    },
    /// An outcome arrived for a permit granted before the last transition and was ignored.
    StaleOutcomeDiscarded {
        /// Breaker group.
        source: String,
        /// When the outcome arrived.
        timestamp: Instant,
        /// Classification of the late call.
        kind: OutcomeKind,
    },
    /// The breaker moved between states.
    StateTransition {
        /// Breaker group.
        source: String,
        /// When the transition happened.
        timestamp: Instant,
        /// Previous state.
        from_state: CircuitState,
        /// New state.
        to_state: CircuitState,
    },
}

impl GatewayEvent for CircuitBreakerEvent {
    fn kind(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::CallPermitted { .. } => "call_permitted",
            CircuitBreakerEvent::CallRejected { .. } => "call_rejected",
            CircuitBreakerEvent::OutcomeRecorded { .. } => "outcome_recorded",
            CircuitBreakerEvent::StaleOutcomeDiscarded { .. } => "stale_outcome_discarded",
            CircuitBreakerEvent::StateTransition { .. } => "state_transition",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::CallPermitted { timestamp, .. }
            | CircuitBreakerEvent::CallRejected { timestamp, .. }
            | CircuitBreakerEvent::OutcomeRecorded { timestamp, .. }
            | CircuitBreakerEvent::StaleOutcomeDiscarded { timestamp, .. }
            | CircuitBreakerEvent::StateTransition { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            CircuitBreakerEvent::CallPermitted { source, .. }
            | CircuitBreakerEvent::CallRejected { source, .. }
            | CircuitBreakerEvent::OutcomeRecorded { source, .. }
            | CircuitBreakerEvent::StaleOutcomeDiscarded { source, .. }
            | CircuitBreakerEvent::StateTransition { source, .. } => source,
        }
    }
}
