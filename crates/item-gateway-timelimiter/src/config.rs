//! Configuration for the time limiter.

use crate::events::TimeLimiterEvent;
use item_gateway_core::EventListeners;
use std::time::Duration;

/// Configuration for the time limiter.
#[derive(Clone, Debug)]
pub struct TimeLimiterConfig {
    pub(crate) timeout_duration: Duration,
    pub(crate) event_listeners: EventListeners<TimeLimiterEvent>,
    pub(crate) name: String,
}

impl TimeLimiterConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> TimeLimiterConfigBuilder {
        TimeLimiterConfigBuilder::new()
    }

    /// The per-attempt limit.
    pub fn timeout_duration(&self) -> Duration {
        self.timeout_duration
    }

    /// Limiter name used in events and metrics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates a tower layer from this configuration.
    pub fn layer(self) -> crate::TimeLimiterLayer {
        crate::TimeLimiterLayer::from(self)
    }
}

impl Default for TimeLimiterConfig {
    fn default() -> Self {
        TimeLimiterConfigBuilder::new().build()
    }
}

/// Builder for [`TimeLimiterConfig`].
pub struct TimeLimiterConfigBuilder {
    timeout_duration: Duration,
    event_listeners: EventListeners<TimeLimiterEvent>,
    name: String,
}

impl TimeLimiterConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            timeout_duration: Duration::from_secs(3),
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Sets the per-attempt limit.
    ///
    /// Default: 3 seconds
    pub fn timeout_duration(mut self, duration: Duration) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Names this limiter for observability.
    ///
    /// Default: `<unnamed>`
    pub fn name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback for attempts that succeed in time.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add_fn(move |event: &TimeLimiterEvent| {
            if let TimeLimiterEvent::Success { duration, .. } = event {
                f(*duration);
            }
        });
        self
    }

    /// Registers a callback for attempts that fail in time.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add_fn(move |event: &TimeLimiterEvent| {
            if let TimeLimiterEvent::Error { duration, .. } = event {
                f(*duration);
            }
        });
        self
    }

    /// Registers a callback for abandoned attempts.
    pub fn on_timeout<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add_fn(move |event: &TimeLimiterEvent| {
            if matches!(event, TimeLimiterEvent::Timeout { .. }) {
                f();
            }
        });
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> TimeLimiterConfig {
        TimeLimiterConfig {
            timeout_duration: self.timeout_duration,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}

impl Default for TimeLimiterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
