//! Load-balanced instance pools.

use crate::{Endpoint, EndpointResolver, ResolutionError};
use dashmap::DashMap;
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// How an instance is picked among the healthy ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// First healthy instance in registration order.
    FirstAvailable,
    /// Rotate through healthy instances.
    #[default]
    RoundRobin,
    /// Uniformly random healthy instance.
    Random,
}

/// One registered address and its health flag.
#[derive(Debug)]
pub struct Instance {
    endpoint: Endpoint,
    healthy: AtomicBool,
}

impl Instance {
    fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            healthy: AtomicBool::new(true),
        }
    }

    /// The instance's endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns true unless the instance was marked unhealthy.
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }
}

/// Instances registered under one service name.
#[derive(Debug)]
pub struct InstancePool {
    instances: Vec<Arc<Instance>>,
    strategy: SelectionStrategy,
    counter: AtomicUsize,
}

impl InstancePool {
    fn new(strategy: SelectionStrategy) -> Self {
        Self {
            instances: Vec::new(),
            strategy,
            counter: AtomicUsize::new(0),
        }
    }

    /// Registered instances in registration order.
    pub fn instances(&self) -> &[Arc<Instance>] {
        &self.instances
    }

    /// Number of healthy instances.
    pub fn healthy_count(&self) -> usize {
        self.instances.iter().filter(|i| i.is_healthy()).count()
    }

    fn select(&self) -> Option<&Arc<Instance>> {
        let len = self.instances.len();
        if len == 0 {
            return None;
        }

        match self.strategy {
            SelectionStrategy::FirstAvailable => self.instances.iter().find(|i| i.is_healthy()),
            SelectionStrategy::RoundRobin => {
                let start = self.counter.fetch_add(1, Ordering::Relaxed);
                (0..len)
                    .map(|offset| &self.instances[start.wrapping_add(offset) % len])
                    .find(|i| i.is_healthy())
            }
            SelectionStrategy::Random => {
                let healthy: Vec<&Arc<Instance>> =
                    self.instances.iter().filter(|i| i.is_healthy()).collect();
                if healthy.is_empty() {
                    return None;
                }
                let index = rand::rng().random_range(0..healthy.len());
                Some(healthy[index])
            }
        }
    }

    fn find(&self, address: &str) -> Option<&Arc<Instance>> {
        let address = address.trim_end_matches('/');
        self.instances
            .iter()
            .find(|i| i.endpoint.base_url() == address)
    }
}

/// Resolves service names against pools of instances.
///
/// Instances start healthy. Marking one unhealthy removes it from selection
/// until it is marked healthy again; a service whose instances are all
/// unhealthy fails with [`ResolutionError::NoHealthyInstance`].
#[derive(Debug, Default)]
pub struct PoolResolver {
    pools: DashMap<String, InstancePool>,
    strategy: SelectionStrategy,
}

impl PoolResolver {
    /// Creates an empty resolver using round-robin selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty resolver with the given selection strategy.
    pub fn with_strategy(strategy: SelectionStrategy) -> Self {
        Self {
            pools: DashMap::new(),
            strategy,
        }
    }

    /// Adds an instance to `service`'s pool.
    ///
    /// Registering an address that is already present is a no-op.
    pub fn register(&self, service: &str, address: &str) -> Result<(), ResolutionError> {
        let endpoint = Endpoint::parse(service, address)?;
        let mut pool = self
            .pools
            .entry(service.to_string())
            .or_insert_with(|| InstancePool::new(self.strategy));

        if pool.find(endpoint.base_url()).is_none() {
            #[cfg(feature = "tracing")]
            tracing::debug!(service, address = endpoint.base_url(), "instance registered");
            pool.instances.push(Arc::new(Instance::new(endpoint)));
        }
        Ok(())
    }

    /// Removes an instance. Returns true if it was registered.
    ///
    /// The service itself is forgotten once its last instance is removed.
    pub fn deregister(&self, service: &str, address: &str) -> bool {
        let address = address.trim_end_matches('/');
        let removed = match self.pools.get_mut(service) {
            Some(mut pool) => {
                let before = pool.instances.len();
                pool.instances.retain(|i| i.endpoint.base_url() != address);
                pool.instances.len() != before
            }
            None => false,
        };
        self.pools.remove_if(service, |_, pool| pool.instances.is_empty());
        removed
    }

    /// Returns an instance to selection. Returns false if it is not registered.
    pub fn mark_healthy(&self, service: &str, address: &str) -> bool {
        self.set_health(service, address, true)
    }

    /// Excludes an instance from selection. Returns false if it is not registered.
    pub fn mark_unhealthy(&self, service: &str, address: &str) -> bool {
        self.set_health(service, address, false)
    }

    /// Number of registered instances for `service`.
    pub fn instance_count(&self, service: &str) -> usize {
        self.pools
            .get(service)
            .map(|pool| pool.instances.len())
            .unwrap_or(0)
    }

    fn set_health(&self, service: &str, address: &str, healthy: bool) -> bool {
        match self.pools.get(service) {
            Some(pool) => match pool.find(address) {
                Some(instance) => {
                    instance.healthy.store(healthy, Ordering::Release);
                    true
                }
                None => false,
            },
            None => false,
        }
    }
}

impl EndpointResolver for PoolResolver {
    fn resolve(&self, service: &str) -> Result<Endpoint, ResolutionError> {
        let pool = self
            .pools
            .get(service)
            .ok_or_else(|| ResolutionError::UnknownService {
                service: service.to_string(),
            })?;

        match pool.select() {
            Some(instance) => Ok(instance.endpoint.clone()),
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    service,
                    instances = pool.instances.len(),
                    "no healthy instance in pool"
                );
                Err(ResolutionError::NoHealthyInstance {
                    service: service.to_string(),
                })
            }
        }
    }
}
