use crate::events::CircuitBreakerEvent;
use crate::{CircuitState, OutcomeKind};
use item_gateway_core::EventListeners;
use std::time::Duration;

/// Configuration for one breaker group.
///
/// Thresholds are percentages. The defaults match the observed production
/// settings of the items group: a window of 6 calls, 50% failure or slow-call
/// rate to trip, 1s slow-call threshold, 10s open wait, 3 half-open trial calls.
#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    pub(crate) name: String,
    pub(crate) sliding_window_size: usize,
    pub(crate) failure_rate_threshold: f64,
    pub(crate) slow_call_rate_threshold: f64,
    pub(crate) slow_call_duration_threshold: Duration,
    pub(crate) wait_duration_in_open: Duration,
    pub(crate) permitted_calls_in_half_open: usize,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreakerConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Returns a copy of this configuration under a different name.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Breaker name, used as the group key in events and metrics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of outcomes the window holds.
    pub fn sliding_window_size(&self) -> usize {
        self.sliding_window_size
    }

    /// Failure percentage at or above which the breaker opens.
    pub fn failure_rate_threshold(&self) -> f64 {
        self.failure_rate_threshold
    }

    /// Slow-call percentage at or above which the breaker opens.
    pub fn slow_call_rate_threshold(&self) -> f64 {
        self.slow_call_rate_threshold
    }

    /// Duration at or above which a successful call counts as slow.
    pub fn slow_call_duration_threshold(&self) -> Duration {
        self.slow_call_duration_threshold
    }

    /// How long the breaker stays open before admitting trial calls.
    pub fn wait_duration_in_open(&self) -> Duration {
        self.wait_duration_in_open
    }

    /// Size of the half-open trial batch.
    pub fn permitted_calls_in_half_open(&self) -> usize {
        self.permitted_calls_in_half_open
    }

    /// Classifies a completed attempt.
    ///
    /// Failures are always [`OutcomeKind::Failure`], regardless of duration.
    pub fn classify(&self, succeeded: bool, duration: Duration) -> OutcomeKind {
        if !succeeded {
            OutcomeKind::Failure
        } else if duration >= self.slow_call_duration_threshold {
            OutcomeKind::SlowSuccess
        } else {
            OutcomeKind::Success
        }
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        CircuitBreakerConfigBuilder::new().build()
    }
}

/// Builder for [`CircuitBreakerConfig`].
pub struct CircuitBreakerConfigBuilder {
    name: String,
    sliding_window_size: usize,
    failure_rate_threshold: f64,
    slow_call_rate_threshold: f64,
    slow_call_duration_threshold: Duration,
    wait_duration_in_open: Duration,
    permitted_calls_in_half_open: usize,
    event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreakerConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            name: String::from("<unnamed>"),
            sliding_window_size: 6,
            failure_rate_threshold: 50.0,
            slow_call_rate_threshold: 50.0,
            slow_call_duration_threshold: Duration::from_secs(1),
            wait_duration_in_open: Duration::from_secs(10),
            permitted_calls_in_half_open: 3,
            event_listeners: EventListeners::new(),
        }
    }

    /// Names the breaker for observability.
    ///
    /// Default: `<unnamed>`
    pub fn name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    /// Sets how many recent outcomes the window holds.
    ///
    /// Default: 6
    pub fn sliding_window_size(mut self, size: usize) -> Self {
        self.sliding_window_size = size;
        self
    }

    /// Sets the failure percentage that opens the breaker.
    ///
    /// Default: 50.0
    pub fn failure_rate_threshold(mut self, percent: f64) -> Self {
        self.failure_rate_threshold = percent;
        self
    }

    /// Sets the slow-call percentage that opens the breaker.
    ///
    /// Default: 50.0
    pub fn slow_call_rate_threshold(mut self, percent: f64) -> Self {
        self.slow_call_rate_threshold = percent;
        self
    }

    /// Sets the duration at which a successful call is classified as slow.
    ///
    /// Default: 1 second
    pub fn slow_call_duration_threshold(mut self, duration: Duration) -> Self {
        self.slow_call_duration_threshold = duration;
        self
    }

    /// Sets how long the breaker stays open.
    ///
    /// Default: 10 seconds
    pub fn wait_duration_in_open(mut self, duration: Duration) -> Self {
        self.wait_duration_in_open = duration;
        self
    }

    /// Sets the number of trial calls admitted while half-open.
    ///
    /// Default: 3
    pub fn permitted_calls_in_half_open(mut self, n: usize) -> Self {
        self.permitted_calls_in_half_open = n;
        self
    }

    /// Registers a callback for every state transition.
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add_fn(move |event: &CircuitBreakerEvent| {
            if let CircuitBreakerEvent::StateTransition {
                from_state,
                to_state,
                ..
            } = event
            {
                f(*from_state, *to_state);
            }
        });
        self
    }

    /// Registers a callback for admitted calls.
    pub fn on_call_permitted<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add_fn(move |event: &CircuitBreakerEvent| {
            if let CircuitBreakerEvent::CallPermitted { state, .. } = event {
                f(*state);
            }
        });
        self
    }

    /// Registers a callback for rejected calls.
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add_fn(move |event: &CircuitBreakerEvent| {
            if matches!(event, CircuitBreakerEvent::CallRejected { .. }) {
                f();
            }
        });
        self
    }

    /// Registers a callback for every outcome that enters the window.
    pub fn on_outcome<F>(mut self, f: F) -> Self
    where
        F: Fn(OutcomeKind, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add_fn(move |event: &CircuitBreakerEvent| {
            if let CircuitBreakerEvent::OutcomeRecorded { kind, duration, .. } = event {
                f(*kind, *duration);
            }
        });
        self
    }

    /// Registers a callback for slow successes only.
    pub fn on_slow_call<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add_fn(move |event: &CircuitBreakerEvent| {
            if let CircuitBreakerEvent::OutcomeRecorded {
                kind: OutcomeKind::SlowSuccess,
                duration,
                ..
            } = event
            {
                f(*duration);
            }
        });
        self
    }

    /// Registers a listener for every breaker event.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&CircuitBreakerEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add_fn(f);
        self
    }

    /// Builds the configuration.
    ///
    /// # Panics
    ///
    /// Panics if the window size or the half-open permit count is zero.
    pub fn build(self) -> CircuitBreakerConfig {
        assert!(
            self.sliding_window_size > 0,
            "sliding_window_size must be at least 1"
        );
        assert!(
            self.permitted_calls_in_half_open > 0,
            "permitted_calls_in_half_open must be at least 1"
        );

        CircuitBreakerConfig {
            name: self.name,
            sliding_window_size: self.sliding_window_size,
            failure_rate_threshold: self.failure_rate_threshold,
            slow_call_rate_threshold: self.slow_call_rate_threshold,
            slow_call_duration_threshold: self.slow_call_duration_threshold,
            wait_duration_in_open: self.wait_duration_in_open,
            permitted_calls_in_half_open: self.permitted_calls_in_half_open,
            event_listeners: self.event_listeners,
        }
    }
}

impl Default for CircuitBreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
