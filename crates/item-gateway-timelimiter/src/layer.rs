//! Tower layer for the time limiter.

use crate::config::TimeLimiterConfig;
use crate::{TimeLimited, TimeLimiter};
use tower::layer::Layer;

/// Applies a [`TimeLimiter`] to every request of the wrapped service.
#[derive(Clone)]
pub struct TimeLimiterLayer {
    limiter: TimeLimiter,
}

impl TimeLimiterLayer {
    /// Creates a new builder for configuring a time limiter layer.
    ///
    /// ```
    /// use item_gateway_timelimiter::TimeLimiterLayer;
    /// use std::time::Duration;
    ///
    /// let layer = TimeLimiterLayer::builder()
    ///     .timeout_duration(Duration::from_secs(3))
    ///     .build()
    ///     .layer();
    /// ```
    pub fn builder() -> crate::TimeLimiterConfigBuilder {
        TimeLimiterConfig::builder()
    }
}

impl From<TimeLimiterConfig> for TimeLimiterLayer {
    fn from(config: TimeLimiterConfig) -> Self {
        Self {
            limiter: TimeLimiter::new(config),
        }
    }
}

impl From<TimeLimiter> for TimeLimiterLayer {
    fn from(limiter: TimeLimiter) -> Self {
        Self { limiter }
    }
}

impl<S> Layer<S> for TimeLimiterLayer {
    type Service = TimeLimited<S>;

    fn layer(&self, service: S) -> Self::Service {
        TimeLimited::new(service, self.limiter.clone())
    }
}
