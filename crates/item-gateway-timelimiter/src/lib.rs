//! Per-attempt time limits for gateway calls.
//!
//! A [`TimeLimiter`] bounds how long a single downstream attempt may run. When
//! the limit expires the attempt's future is dropped, which cancels any work
//! it still had in flight, and the caller receives
//! [`TimeLimiterError::Timeout`].
//!
//! The limiter can be driven directly:
//!
//! ```rust
//! use item_gateway_timelimiter::{TimeLimiter, TimeLimiterConfig};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let limiter = TimeLimiter::new(
//!     TimeLimiterConfig::builder()
//!         .name("items")
//!         .timeout_duration(Duration::from_secs(3))
//!         .build(),
//! );
//!
//! let result = limiter
//!     .run(async { Ok::<_, std::io::Error>("done") })
//!     .await;
//! assert_eq!(result.unwrap(), "done");
//! # }
//! ```
//!
//! or as a tower layer around any service:
//!
//! ```rust
//! use item_gateway_timelimiter::TimeLimiterLayer;
//! use tower::{service_fn, Layer};
//! use std::time::Duration;
//!
//! let layer = TimeLimiterLayer::builder()
//!     .timeout_duration(Duration::from_millis(500))
//!     .build()
//!     .layer();
//!
//! let svc = layer.layer(service_fn(|req: String| async move {
//!     Ok::<String, ()>(req)
//! }));
//! ```
//!
//! ## Feature flags
//! - `tracing`: logs timeouts at warn level
//! - `metrics`: `gateway_timelimiter_calls_total` and `gateway_timelimiter_call_duration_seconds`

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tower::Service;

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_histogram, histogram};

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

pub use config::{TimeLimiterConfig, TimeLimiterConfigBuilder};
pub use error::TimeLimiterError;
pub use events::TimeLimiterEvent;
pub use layer::TimeLimiterLayer;

mod config;
mod error;
mod events;
mod layer;

#[cfg(feature = "metrics")]
static METRICS_INIT: std::sync::Once = std::sync::Once::new();

/// Bounds the duration of individual attempts.
///
/// Cloning is cheap; clones share configuration and listeners.
#[derive(Clone, Debug)]
pub struct TimeLimiter {
    config: Arc<TimeLimiterConfig>,
}

impl TimeLimiter {
    /// Creates a limiter from `config`.
    pub fn new(config: TimeLimiterConfig) -> Self {
        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "gateway_timelimiter_calls_total",
                "Attempts seen by the time limiter, by result (success, error, timeout)"
            );
            describe_histogram!(
                "gateway_timelimiter_call_duration_seconds",
                "Duration of attempts that completed within the limit"
            );
        });

        Self {
            config: Arc::new(config),
        }
    }

    /// Limiter name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The configured per-attempt limit.
    pub fn timeout_duration(&self) -> Duration {
        self.config.timeout_duration
    }

    /// Runs `attempt` under the configured limit.
    pub async fn run<F, T, E>(&self, attempt: F) -> Result<T, TimeLimiterError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        self.run_with_timeout(attempt, self.config.timeout_duration)
            .await
    }

    /// Runs `attempt` under an explicit limit.
    ///
    /// The attempt is dropped as soon as `limit` elapses.
    pub async fn run_with_timeout<F, T, E>(
        &self,
        attempt: F,
        limit: Duration,
    ) -> Result<T, TimeLimiterError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        let config = &self.config;
        let start = Instant::now();

        match tokio::time::timeout(limit, attempt).await {
            Ok(Ok(value)) => {
                let duration = start.elapsed();
                config.event_listeners.emit(&TimeLimiterEvent::Success {
                    source: config.name.clone(),
                    timestamp: Instant::now(),
                    duration,
                });

                #[cfg(feature = "metrics")]
                {
                    counter!("gateway_timelimiter_calls_total", "timelimiter" => config.name.clone(), "result" => "success").increment(1);
                    histogram!("gateway_timelimiter_call_duration_seconds", "timelimiter" => config.name.clone())
                        .record(duration.as_secs_f64());
                }

                #[cfg(feature = "tracing")]
                debug!(
                    timelimiter = %config.name,
                    duration_ms = duration.as_millis() as u64,
                    "attempt completed within limit"
                );

                Ok(value)
            }
            Ok(Err(err)) => {
                let duration = start.elapsed();
                config.event_listeners.emit(&TimeLimiterEvent::Error {
                    source: config.name.clone(),
                    timestamp: Instant::now(),
                    duration,
                });

                #[cfg(feature = "metrics")]
                {
                    counter!("gateway_timelimiter_calls_total", "timelimiter" => config.name.clone(), "result" => "error").increment(1);
                    histogram!("gateway_timelimiter_call_duration_seconds", "timelimiter" => config.name.clone())
                        .record(duration.as_secs_f64());
                }

                #[cfg(feature = "tracing")]
                debug!(
                    timelimiter = %config.name,
                    duration_ms = duration.as_millis() as u64,
                    "attempt failed within limit"
                );

                Err(TimeLimiterError::Inner(err))
            }
            Err(_elapsed) => {
                config.event_listeners.emit(&TimeLimiterEvent::Timeout {
                    source: config.name.clone(),
                    timestamp: Instant::now(),
                    timeout: limit,
                });

                #[cfg(feature = "metrics")]
                counter!("gateway_timelimiter_calls_total", "timelimiter" => config.name.clone(), "result" => "timeout").increment(1);

                #[cfg(feature = "tracing")]
                warn!(
                    timelimiter = %config.name,
                    timeout_ms = limit.as_millis() as u64,
                    "attempt timed out"
                );

                Err(TimeLimiterError::Timeout { timeout: limit })
            }
        }
    }
}

/// A service whose calls are bounded by a [`TimeLimiter`].
#[derive(Clone, Debug)]
pub struct TimeLimited<S> {
    inner: S,
    limiter: TimeLimiter,
}

impl<S> TimeLimited<S> {
    /// Wraps `inner`.
    pub fn new(inner: S, limiter: TimeLimiter) -> Self {
        Self { inner, limiter }
    }

    /// The limiter applied to each call.
    pub fn limiter(&self) -> &TimeLimiter {
        &self.limiter
    }
}

impl<S, Req> Service<Req> for TimeLimited<S>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = TimeLimiterError<S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(TimeLimiterError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let fut = self.inner.call(req);
        let limiter = self.limiter.clone();
        Box::pin(async move { limiter.run(fut).await })
    }
}
