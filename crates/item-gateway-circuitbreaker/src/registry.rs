//! Process-wide breakers keyed by call group.

use crate::{CircuitBreaker, CircuitBreakerConfig};
use dashmap::DashMap;

/// Lazily creates and shares one [`CircuitBreaker`] per group.
///
/// Every caller asking for the same group receives a handle to the same
/// breaker state. Breakers live as long as the registry; share the registry
/// behind an `Arc` for process lifetime.
pub struct CircuitBreakerRegistry {
    defaults: CircuitBreakerConfig,
    overrides: DashMap<String, CircuitBreakerConfig>,
    breakers: DashMap<String, CircuitBreaker>,
}

impl CircuitBreakerRegistry {
    /// Creates a registry whose breakers use `defaults` unless overridden.
    pub fn new(defaults: CircuitBreakerConfig) -> Self {
        Self {
            defaults,
            overrides: DashMap::new(),
            breakers: DashMap::new(),
        }
    }

    /// Uses `config` for `group` instead of the defaults.
    ///
    /// An already created breaker for the group is replaced, discarding its
    /// recorded outcomes.
    pub fn configure(&self, group: &str, config: CircuitBreakerConfig) {
        let config = config.with_name(group);
        // Override first: a breaker created from here on already sees it,
        // and one created before is replaced below.
        self.overrides.insert(group.to_string(), config.clone());
        if let Some(mut existing) = self.breakers.get_mut(group) {
            *existing = CircuitBreaker::new(config);
        }
    }

    /// Returns the breaker for `group`, creating it on first use.
    pub fn get_or_create(&self, group: &str) -> CircuitBreaker {
        if let Some(existing) = self.breakers.get(group) {
            return existing.value().clone();
        }
        self.breakers
            .entry(group.to_string())
            .or_insert_with(|| {
                let config = self
                    .overrides
                    .get(group)
                    .map(|c| c.value().clone())
                    .unwrap_or_else(|| self.defaults.with_name(group));

                #[cfg(feature = "tracing")]
                tracing::debug!(breaker = group, "creating circuit breaker");

                CircuitBreaker::new(config)
            })
            .value()
            .clone()
    }

    /// Returns the breaker for `group` if it has been created.
    pub fn get(&self, group: &str) -> Option<CircuitBreaker> {
        self.breakers.get(group).map(|b| b.value().clone())
    }

    /// Names of all created breakers, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.breakers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Number of created breakers.
    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    /// Returns true if no breaker has been created yet.
    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// Resets every created breaker to closed.
    pub async fn reset_all(&self) {
        let breakers: Vec<CircuitBreaker> = self.breakers.iter().map(|e| e.value().clone()).collect();
        for breaker in breakers {
            breaker.reset().await;
        }
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
