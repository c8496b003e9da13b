use crate::config::CircuitBreakerConfig;
use crate::events::CircuitBreakerEvent;
use crate::window::{Outcome, OutcomeKind, OutcomeWindow};
#[cfg(feature = "metrics")]
use metrics::{counter, gauge, histogram};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Represents the state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum CircuitState {
    /// Every call is admitted.
    Closed = 0,
    /// Every call is rejected until the open wait elapses.
    Open = 1,
    /// A bounded trial batch is admitted.
    HalfOpen = 2,
}

impl CircuitState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }

    /// Label used for metrics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "Closed",
            CircuitState::Open => "Open",
            CircuitState::HalfOpen => "HalfOpen",
        }
    }
}

/// Point-in-time view of a breaker.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CircuitMetrics {
    /// Current state.
    pub state: CircuitState,
    /// Outcomes resident in the window.
    pub total_calls: usize,
    /// Resident failures.
    pub failure_count: usize,
    /// Resident successes, slow ones included.
    pub success_count: usize,
    /// Resident slow successes.
    pub slow_call_count: usize,
    /// Failure percentage over the window.
    pub failure_rate: f64,
    /// Slow-call percentage over the window.
    pub slow_call_rate: f64,
    /// Trial permits still available (zero unless half-open).
    pub half_open_permits: usize,
    /// Calls rejected since the breaker was created.
    pub rejected_calls: u64,
    /// Outcomes discarded because their permit predates the last transition.
    pub stale_outcomes: u64,
    /// Time spent in the current state.
    pub time_since_state_change: Duration,
}

/// Admission ticket returned by [`Circuit::try_acquire`].
///
/// Carries the generation of the state it was granted in so that an outcome
/// arriving after a transition is discarded rather than counted against the
/// new state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a permit must be handed back through `record`"]
pub struct Permit {
    generation: u64,
    state: CircuitState,
}

impl Permit {
    /// State the call was admitted in.
    pub fn state(&self) -> CircuitState {
        self.state
    }
}

/// The breaker state machine.
///
/// Pure bookkeeping with the clock passed in; the async [`CircuitBreaker`]
/// handle wraps it in a mutex and feeds it `Instant::now()`.
///
/// [`CircuitBreaker`]: crate::CircuitBreaker
pub struct Circuit {
    state: CircuitState,
    state_atomic: Arc<AtomicU8>,
    window: OutcomeWindow,
    opened_at: Option<Instant>,
    half_open_permits: usize,
    trial_completed: usize,
    generation: u64,
    last_state_change: Instant,
    rejected_calls: u64,
    stale_outcomes: u64,
}

impl Circuit {
    /// Creates a closed circuit sized for `config`.
    pub fn new(config: &CircuitBreakerConfig, now: Instant) -> Self {
        Self::with_atomic(
            config,
            Arc::new(AtomicU8::new(CircuitState::Closed as u8)),
            now,
        )
    }

    pub(crate) fn with_atomic(
        config: &CircuitBreakerConfig,
        state_atomic: Arc<AtomicU8>,
        now: Instant,
    ) -> Self {
        state_atomic.store(CircuitState::Closed as u8, Ordering::Release);
        Self {
            state: CircuitState::Closed,
            state_atomic,
            window: OutcomeWindow::new(config.sliding_window_size),
            opened_at: None,
            half_open_permits: 0,
            trial_completed: 0,
            generation: 0,
            last_state_change: now,
            rejected_calls: 0,
            stale_outcomes: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// When the circuit last opened, if it is open.
    pub fn opened_at(&self) -> Option<Instant> {
        self.opened_at
    }

    /// Read access to the outcome window.
    pub fn window(&self) -> &OutcomeWindow {
        &self.window
    }

    /// Decides whether a call may proceed.
    ///
    /// An open circuit whose wait has elapsed moves to half-open here and
    /// admits the caller as the first trial call.
    pub fn try_acquire(&mut self, config: &CircuitBreakerConfig, now: Instant) -> Option<Permit> {
        if self.state == CircuitState::Open {
            let waited = self
                .opened_at
                .map(|opened| now.saturating_duration_since(opened))
                .unwrap_or_default();
            if waited >= config.wait_duration_in_open {
                self.transition_to(CircuitState::HalfOpen, config, now);
            }
        }

        let permitted = match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => {
                if self.half_open_permits > 0 {
                    self.half_open_permits -= 1;
                    true
                } else {
                    false
                }
            }
        };

        if permitted {
            config
                .event_listeners
                .emit(&CircuitBreakerEvent::CallPermitted {
                    source: config.name.clone(),
                    timestamp: now,
                    state: self.state,
                });
            Some(Permit {
                generation: self.generation,
                state: self.state,
            })
        } else {
            self.rejected_calls += 1;
            config
                .event_listeners
                .emit(&CircuitBreakerEvent::CallRejected {
                    source: config.name.clone(),
                    timestamp: now,
                    state: self.state,
                });

            #[cfg(feature = "metrics")]
            counter!("gateway_circuitbreaker_calls_total", "circuitbreaker" => config.name.clone(), "outcome" => "rejected").increment(1);

            None
        }
    }

    /// Records the outcome of an admitted call and applies any resulting transition.
    ///
    /// Returns `false` if the permit predates the last transition; such an
    /// outcome is counted as stale and does not enter the window.
    pub fn record(
        &mut self,
        config: &CircuitBreakerConfig,
        permit: Permit,
        kind: OutcomeKind,
        duration: Duration,
        now: Instant,
    ) -> bool {
        if permit.generation != self.generation {
            self.stale_outcomes += 1;
            config
                .event_listeners
                .emit(&CircuitBreakerEvent::StaleOutcomeDiscarded {
                    source: config.name.clone(),
                    timestamp: now,
                    kind,
                });
            return false;
        }

        self.window.record(Outcome::new(kind, now));

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::OutcomeRecorded {
                source: config.name.clone(),
                timestamp: now,
                state: self.state,
                kind,
                duration,
            });

        #[cfg(feature = "metrics")]
        {
            counter!("gateway_circuitbreaker_calls_total", "circuitbreaker" => config.name.clone(), "outcome" => kind.as_str()).increment(1);
            histogram!("gateway_circuitbreaker_call_duration_seconds", "circuitbreaker" => config.name.clone())
                .record(duration.as_secs_f64());
        }

        match self.state {
            CircuitState::Closed => {
                if self.window.is_full() && self.breaches(config) {
                    self.transition_to(CircuitState::Open, config, now);
                }
            }
            CircuitState::HalfOpen => {
                self.trial_completed += 1;
                if self.trial_completed >= config.permitted_calls_in_half_open {
                    let next = if self.breaches(config) {
                        CircuitState::Open
                    } else {
                        CircuitState::Closed
                    };
                    self.transition_to(next, config, now);
                }
            }
            // Unreachable in practice: no permit is ever issued in the open generation.
            CircuitState::Open => {}
        }
        true
    }

    fn breaches(&self, config: &CircuitBreakerConfig) -> bool {
        self.window.failure_rate() >= config.failure_rate_threshold
            || self.window.slow_rate() >= config.slow_call_rate_threshold
    }

    /// Trips the circuit regardless of the window.
    pub fn force_open(&mut self, config: &CircuitBreakerConfig, now: Instant) {
        self.transition_to(CircuitState::Open, config, now);
    }

    /// Closes the circuit regardless of the window.
    pub fn force_closed(&mut self, config: &CircuitBreakerConfig, now: Instant) {
        self.transition_to(CircuitState::Closed, config, now);
    }

    /// Closes the circuit and forgets all recorded outcomes.
    pub fn reset(&mut self, config: &CircuitBreakerConfig, now: Instant) {
        self.transition_to(CircuitState::Closed, config, now);
        self.window.clear();
    }

    /// Snapshot of the circuit at `now`.
    pub fn metrics(&self, now: Instant) -> CircuitMetrics {
        CircuitMetrics {
            state: self.state,
            total_calls: self.window.len(),
            failure_count: self.window.failure_count(),
            success_count: self.window.success_count(),
            slow_call_count: self.window.slow_count(),
            failure_rate: self.window.failure_rate(),
            slow_call_rate: self.window.slow_rate(),
            half_open_permits: self.half_open_permits,
            rejected_calls: self.rejected_calls,
            stale_outcomes: self.stale_outcomes,
            time_since_state_change: now.saturating_duration_since(self.last_state_change),
        }
    }

    fn transition_to(&mut self, state: CircuitState, config: &CircuitBreakerConfig, now: Instant) {
        if self.state == state {
            return;
        }

        let from_state = self.state;

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::StateTransition {
                source: config.name.clone(),
                timestamp: now,
                from_state,
                to_state: state,
            });

        #[cfg(feature = "tracing")]
        tracing::info!(
            breaker = %config.name,
            from = from_state.as_str(),
            to = state.as_str(),
            failure_rate = self.window.failure_rate(),
            slow_rate = self.window.slow_rate(),
            "circuit state transition"
        );

        #[cfg(feature = "metrics")]
        {
            counter!(
                "gateway_circuitbreaker_transitions_total",
                "circuitbreaker" => config.name.clone(),
                "from" => from_state.as_str(),
                "to" => state.as_str()
            )
            .increment(1);

            gauge!("gateway_circuitbreaker_state", "circuitbreaker" => config.name.clone())
                .set(state as u8 as f64);
        }

        self.state = state;
        self.state_atomic.store(state as u8, Ordering::Release);
        self.last_state_change = now;
        self.generation += 1;
        self.window.clear();
        self.trial_completed = 0;
        self.opened_at = None;
        self.half_open_permits = 0;

        match state {
            CircuitState::Open => self.opened_at = Some(now),
            CircuitState::HalfOpen => {
                self.half_open_permits = config.permitted_calls_in_half_open;
            }
            CircuitState::Closed => {}
        }
    }
}
