//! Fixed name-to-address table.

use crate::{Endpoint, EndpointResolver, ResolutionError};
use dashmap::DashMap;

/// Resolves each service name to exactly one configured address.
#[derive(Debug, Default)]
pub struct StaticResolver {
    endpoints: DashMap<String, Endpoint>,
}

impl StaticResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `service` to `address`, replacing any previous binding.
    pub fn insert(&self, service: &str, address: &str) -> Result<(), ResolutionError> {
        let endpoint = Endpoint::parse(service, address)?;
        self.endpoints.insert(service.to_string(), endpoint);
        Ok(())
    }

    /// Builder-style variant of [`StaticResolver::insert`].
    pub fn with(self, service: &str, address: &str) -> Result<Self, ResolutionError> {
        self.insert(service, address)?;
        Ok(self)
    }

    /// Removes the binding for `service`, returning it if present.
    pub fn remove(&self, service: &str) -> Option<Endpoint> {
        self.endpoints.remove(service).map(|(_, endpoint)| endpoint)
    }
}

impl EndpointResolver for StaticResolver {
    fn resolve(&self, service: &str) -> Result<Endpoint, ResolutionError> {
        self.endpoints
            .get(service)
            .map(|e| e.value().clone())
            .ok_or_else(|| ResolutionError::UnknownService {
                service: service.to_string(),
            })
    }
}
