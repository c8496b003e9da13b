//! The resilient call gateway.

use crate::error::{BuildError, GatewayError};
use crate::events::GatewayCallEvent;
use item_gateway_circuitbreaker::{CircuitBreaker, CircuitBreakerRegistry, OutcomeKind, Permit};
use item_gateway_core::EventListeners;
use item_gateway_invoker::{Operation, RemoteInvoker, RemoteValue};
use item_gateway_resolver::EndpointResolver;
use item_gateway_timelimiter::{TimeLimiter, TimeLimiterConfig, TimeLimiterError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Runs remote operations behind a per-group circuit breaker and a time limit.
///
/// Each call goes through the same steps:
///
/// 1. ask the group's breaker for a permit, failing fast with
///    [`GatewayError::CircuitOpen`] if it refuses;
/// 2. resolve the service name to an endpoint;
/// 3. invoke the operation under the time limiter;
/// 4. classify the outcome and hand the permit back to the breaker.
///
/// Every admitted call records exactly one outcome. Resolution failures and
/// timeouts count as failures; successes at or above the breaker's slow-call
/// threshold count as slow.
///
/// Cloning is cheap and clones share breakers, resolver and invoker.
#[derive(Clone)]
pub struct ResilientGateway {
    resolver: Arc<dyn EndpointResolver>,
    invoker: Arc<dyn RemoteInvoker>,
    breakers: Arc<CircuitBreakerRegistry>,
    limiter: TimeLimiter,
    event_listeners: EventListeners<GatewayCallEvent>,
}

impl ResilientGateway {
    /// Starts building a gateway.
    pub fn builder() -> ResilientGatewayBuilder {
        ResilientGatewayBuilder::new()
    }

    /// The breaker registry shared by this gateway.
    pub fn registry(&self) -> &Arc<CircuitBreakerRegistry> {
        &self.breakers
    }

    /// The breaker for `group`, created on first use.
    pub fn breaker(&self, group: &str) -> CircuitBreaker {
        self.breakers.get_or_create(group)
    }

    /// The time limiter applied to each attempt.
    pub fn time_limiter(&self) -> &TimeLimiter {
        &self.limiter
    }

    /// Runs `operation` against `service` under `group`'s breaker.
    pub async fn execute(
        &self,
        group: &str,
        service: &str,
        operation: Operation,
    ) -> Result<RemoteValue, GatewayError> {
        let operation_name = operation.name();
        let result = self.attempt(group, service, operation).await;

        match &result {
            Ok(_) => {}
            Err(error) => {
                if error.is_circuit_open() {
                    tracing::debug!(group, service, operation = operation_name, "call rejected by open circuit");
                } else {
                    tracing::debug!(group, service, operation = operation_name, error = %error, "call failed");
                }
                self.event_listeners.emit(&GatewayCallEvent::CallFailed {
                    source: group.to_string(),
                    timestamp: Instant::now(),
                    operation: operation_name,
                    error: error.clone(),
                });
            }
        }
        result
    }

    /// Runs `operation` and substitutes `fallback`'s value on any failure.
    ///
    /// The fallback receives the original operation and the error. It runs
    /// locally and is never gated by the breaker.
    pub async fn call<F>(
        &self,
        group: &str,
        service: &str,
        operation: Operation,
        fallback: F,
    ) -> RemoteValue
    where
        F: FnOnce(&Operation, &GatewayError) -> RemoteValue,
    {
        let original = operation.clone();
        match self.execute(group, service, operation).await {
            Ok(value) => value,
            Err(error) => {
                tracing::info!(
                    group,
                    service,
                    operation = original.name(),
                    error = %error,
                    "applying fallback"
                );
                self.event_listeners.emit(&GatewayCallEvent::FallbackApplied {
                    source: group.to_string(),
                    timestamp: Instant::now(),
                    operation: original.name(),
                    error_kind: error.kind(),
                });
                fallback(&original, &error)
            }
        }
    }

    async fn attempt(
        &self,
        group: &str,
        service: &str,
        operation: Operation,
    ) -> Result<RemoteValue, GatewayError> {
        let breaker = self.breakers.get_or_create(group);
        let permit = breaker.try_acquire().await?;
        let pending = PendingOutcome::new(breaker, permit);

        let endpoint = match self.resolver.resolve(service) {
            Ok(endpoint) => endpoint,
            Err(err) => {
                pending.complete(OutcomeKind::Failure).await;
                return Err(err.into());
            }
        };

        let operation_name = operation.name();
        let result = self
            .limiter
            .run(self.invoker.invoke(&endpoint, operation))
            .await;

        match result {
            Ok(value) => {
                let duration = pending.elapsed();
                let kind = pending.breaker.classify(true, duration);
                pending.complete(kind).await;
                self.event_listeners.emit(&GatewayCallEvent::CallSucceeded {
                    source: group.to_string(),
                    timestamp: Instant::now(),
                    operation: operation_name,
                    duration,
                });
                Ok(value)
            }
            Err(TimeLimiterError::Timeout { timeout }) => {
                pending.complete(OutcomeKind::Failure).await;
                Err(GatewayError::Timeout { timeout })
            }
            Err(TimeLimiterError::Inner(err)) => {
                pending.complete(OutcomeKind::Failure).await;
                Err(err.into())
            }
        }
    }
}

impl std::fmt::Debug for ResilientGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientGateway")
            .field("breakers", &self.breakers.names())
            .field("timeout", &self.limiter.timeout_duration())
            .finish()
    }
}

/// A permit whose outcome has not been recorded yet.
///
/// If the call is dropped before completing, the outcome is recorded as a
/// failure from a spawned task so that a half-open trial slot is never lost.
struct PendingOutcome {
    breaker: CircuitBreaker,
    permit: Option<Permit>,
    started: tokio::time::Instant,
}

impl PendingOutcome {
    fn new(breaker: CircuitBreaker, permit: Permit) -> Self {
        Self {
            breaker,
            permit: Some(permit),
            started: tokio::time::Instant::now(),
        }
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    async fn complete(mut self, kind: OutcomeKind) {
        // Cleared only once recorded; `Drop` hands it back otherwise.
        if let Some(permit) = self.permit {
            self.breaker.record(permit, kind, self.started.elapsed()).await;
            self.permit = None;
        }
    }
}

impl Drop for PendingOutcome {
    fn drop(&mut self) {
        let Some(permit) = self.permit.take() else {
            return;
        };
        let breaker = self.breaker.clone();
        let elapsed = self.started.elapsed();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::debug!(breaker = breaker.name(), "call dropped before completion; recording failure");
                handle.spawn(async move {
                    breaker.record(permit, OutcomeKind::Failure, elapsed).await;
                });
            }
            Err(_) => {
                tracing::warn!(breaker = breaker.name(), "call dropped outside a runtime; outcome lost");
            }
        }
    }
}

/// Builder for [`ResilientGateway`].
pub struct ResilientGatewayBuilder {
    resolver: Option<Arc<dyn EndpointResolver>>,
    invoker: Option<Arc<dyn RemoteInvoker>>,
    breakers: Option<Arc<CircuitBreakerRegistry>>,
    limiter: Option<TimeLimiter>,
    event_listeners: EventListeners<GatewayCallEvent>,
}

impl ResilientGatewayBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            resolver: None,
            invoker: None,
            breakers: None,
            limiter: None,
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the endpoint resolver. Required.
    pub fn resolver<R>(mut self, resolver: R) -> Self
    where
        R: EndpointResolver + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Sets the remote invoker. Required.
    pub fn invoker<I>(mut self, invoker: I) -> Self
    where
        I: RemoteInvoker + 'static,
    {
        self.invoker = Some(Arc::new(invoker));
        self
    }

    /// Shares an existing breaker registry.
    ///
    /// Default: a fresh registry with default breaker settings.
    pub fn registry(mut self, registry: Arc<CircuitBreakerRegistry>) -> Self {
        self.breakers = Some(registry);
        self
    }

    /// Sets the time limiter.
    ///
    /// Default: 3 second limit.
    pub fn time_limiter(mut self, limiter: TimeLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Shorthand for a time limiter with the given limit.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.time_limiter(TimeLimiter::new(
            TimeLimiterConfig::builder()
                .name("gateway")
                .timeout_duration(timeout)
                .build(),
        ))
    }

    /// Registers a listener for every gateway event.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&GatewayCallEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add_fn(f);
        self
    }

    /// Registers a callback for applied fallbacks with the operation and error label.
    pub fn on_fallback<F>(mut self, f: F) -> Self
    where
        F: Fn(&'static str, &'static str) + Send + Sync + 'static,
    {
        self.event_listeners.add_fn(move |event: &GatewayCallEvent| {
            if let GatewayCallEvent::FallbackApplied {
                operation,
                error_kind,
                ..
            } = event
            {
                f(operation, error_kind);
            }
        });
        self
    }

    /// Builds the gateway.
    pub fn build(self) -> Result<ResilientGateway, BuildError> {
        let resolver = self.resolver.ok_or(BuildError::MissingResolver)?;
        let invoker = self.invoker.ok_or(BuildError::MissingInvoker)?;
        let breakers = self
            .breakers
            .unwrap_or_else(|| Arc::new(CircuitBreakerRegistry::default()));
        let limiter = self
            .limiter
            .unwrap_or_else(|| TimeLimiter::new(TimeLimiterConfig::builder().name("gateway").build()));

        Ok(ResilientGateway {
            resolver,
            invoker,
            breakers,
            limiter,
            event_listeners: self.event_listeners,
        })
    }
}

impl Default for ResilientGatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
