//! Count-based circuit breaker for outbound gateway calls.
//!
//! A circuit breaker keeps a caller responsive when a dependency degrades by
//! refusing calls locally once the recent failure or slow-call rate crosses a
//! threshold, then probing the dependency with a small trial batch.
//!
//! ## States
//! - **Closed**: every call is admitted; outcomes fill a sliding window of the
//!   last `sliding_window_size` calls. Once the window is full and either rate
//!   reaches its threshold the breaker opens.
//! - **Open**: calls are rejected immediately. After `wait_duration_in_open`
//!   the next caller moves the breaker to half-open and is admitted.
//! - **Half-Open**: at most `permitted_calls_in_half_open` trial calls are
//!   admitted. When all of them have completed the batch is evaluated against
//!   the same thresholds: back to open if it breaches, closed otherwise.
//!
//! ## Usage
//!
//! Admission and recording are two separate critical sections, so the
//! downstream call itself runs outside the lock:
//!
//! ```rust
//! use item_gateway_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig};
//! use std::time::{Duration, Instant};
//!
//! # async fn example() {
//! let breaker = CircuitBreaker::new(
//!     CircuitBreakerConfig::builder()
//!         .name("items")
//!         .sliding_window_size(6)
//!         .failure_rate_threshold(50.0)
//!         .build(),
//! );
//!
//! if let Ok(permit) = breaker.try_acquire().await {
//!     let started = Instant::now();
//!     let succeeded = true; // issue the real call here
//!     let elapsed = started.elapsed();
//!     let kind = breaker.classify(succeeded, elapsed);
//!     breaker.record(permit, kind, elapsed).await;
//! }
//! # }
//! ```
//!
//! ## Shared breakers
//!
//! [`CircuitBreakerRegistry`] hands out one breaker per call group, created on
//! first use, so every concurrent caller of a group sees the same state.
//!
//! ## Feature flags
//! - `tracing`: logs transitions and rejections
//! - `metrics`: `gateway_circuitbreaker_*` counters, gauge and histogram
//! - `serde`: `Serialize` for [`CircuitState`] and [`CircuitMetrics`]

mod circuit;
mod config;
mod error;
mod events;
mod registry;
mod window;

pub use circuit::{Circuit, CircuitMetrics, CircuitState, Permit};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use error::CircuitOpenError;
pub use events::CircuitBreakerEvent;
pub use registry::CircuitBreakerRegistry;
pub use window::{Outcome, OutcomeKind, OutcomeWindow};

#[cfg(feature = "metrics")]
use metrics::{describe_counter, describe_gauge, describe_histogram};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[cfg(feature = "metrics")]
static METRICS_INIT: std::sync::Once = std::sync::Once::new();

/// Shared handle to one breaker.
///
/// Cloning is cheap; all clones observe and mutate the same state.
#[derive(Clone)]
pub struct CircuitBreaker {
    circuit: Arc<Mutex<Circuit>>,
    state_atomic: Arc<AtomicU8>,
    config: Arc<CircuitBreakerConfig>,
}

impl CircuitBreaker {
    /// Creates a closed breaker.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "gateway_circuitbreaker_calls_total",
                "Calls seen by the circuit breaker, by outcome"
            );
            describe_counter!(
                "gateway_circuitbreaker_transitions_total",
                "Circuit breaker state transitions"
            );
            describe_gauge!(
                "gateway_circuitbreaker_state",
                "Current circuit state (0 closed, 1 open, 2 half-open)"
            );
            describe_histogram!(
                "gateway_circuitbreaker_call_duration_seconds",
                "Duration of calls admitted by the circuit breaker"
            );
        });

        let state_atomic = Arc::new(AtomicU8::new(CircuitState::Closed as u8));
        let circuit = Circuit::with_atomic(&config, Arc::clone(&state_atomic), Instant::now());
        Self {
            circuit: Arc::new(Mutex::new(circuit)),
            state_atomic,
            config: Arc::new(config),
        }
    }

    /// Breaker group name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Configuration this breaker runs with.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Asks for permission to issue one call.
    pub async fn try_acquire(&self) -> Result<Permit, CircuitOpenError> {
        let permit = {
            let mut circuit = self.circuit.lock().await;
            circuit.try_acquire(&self.config, Instant::now())
        };

        match permit {
            Some(permit) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(breaker = %self.config.name, state = permit.state().as_str(), "call permitted");
                Ok(permit)
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!(breaker = %self.config.name, "call rejected, circuit open");
                Err(CircuitOpenError {
                    name: self.config.name.clone(),
                })
            }
        }
    }

    /// Classifies a completed call using this breaker's slow-call threshold.
    pub fn classify(&self, succeeded: bool, duration: Duration) -> OutcomeKind {
        self.config.classify(succeeded, duration)
    }

    /// Hands back a permit together with the outcome of its call.
    ///
    /// Returns `false` if the outcome was discarded as stale.
    pub async fn record(&self, permit: Permit, kind: OutcomeKind, duration: Duration) -> bool {
        let mut circuit = self.circuit.lock().await;
        circuit.record(&self.config, permit, kind, duration, Instant::now())
    }

    /// Current state, taking the lock.
    pub async fn state(&self) -> CircuitState {
        self.circuit.lock().await.state()
    }

    /// Current state from the lock-free mirror; safe from sync code.
    pub fn state_sync(&self) -> CircuitState {
        CircuitState::from_u8(self.state_atomic.load(Ordering::Acquire))
    }

    /// Returns true if the breaker is open.
    pub fn is_open(&self) -> bool {
        self.state_sync() == CircuitState::Open
    }

    /// Snapshot of window and counters.
    pub async fn metrics(&self) -> CircuitMetrics {
        self.circuit.lock().await.metrics(Instant::now())
    }

    /// Closes the breaker and clears its window.
    pub async fn reset(&self) {
        let mut circuit = self.circuit.lock().await;
        circuit.reset(&self.config, Instant::now());
    }

    /// Forces the breaker open.
    pub async fn force_open(&self) {
        let mut circuit = self.circuit.lock().await;
        circuit.force_open(&self.config, Instant::now());
    }

    /// Forces the breaker closed.
    pub async fn force_closed(&self) {
        let mut circuit = self.circuit.lock().await;
        circuit.force_closed(&self.config, Instant::now());
    }

    /// HTTP status suitable for a readiness probe: 503 while open, 200 otherwise.
    pub fn http_status(&self) -> u16 {
        match self.state_sync() {
            CircuitState::Open => 503,
            CircuitState::Closed | CircuitState::HalfOpen => 200,
        }
    }

    /// `"healthy"`, `"degraded"` (half-open) or `"unhealthy"` (open).
    pub fn health_status(&self) -> &'static str {
        match self.state_sync() {
            CircuitState::Closed => "healthy",
            CircuitState::HalfOpen => "degraded",
            CircuitState::Open => "unhealthy",
        }
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.config.name)
            .field("state", &self.state_sync())
            .finish()
    }
}
