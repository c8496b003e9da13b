//! Endpoint resolution for the item gateway.
//!
//! Calls name their downstream by a logical service name such as
//! `"service-products"`. An [`EndpointResolver`] turns that name into a
//! concrete [`Endpoint`] at call time, so addresses can change without
//! touching call sites.
//!
//! Two resolvers are provided:
//! - [`StaticResolver`]: one fixed address per name.
//! - [`PoolResolver`]: several instances per name with health flags and a
//!   [`SelectionStrategy`].
//!
//! ```
//! use item_gateway_resolver::{EndpointResolver, PoolResolver};
//!
//! let resolver = PoolResolver::new();
//! resolver.register("service-products", "http://10.0.0.1:8001").unwrap();
//! resolver.register("service-products", "http://10.0.0.2:8001").unwrap();
//!
//! let first = resolver.resolve("service-products").unwrap();
//! let second = resolver.resolve("service-products").unwrap();
//! assert_ne!(first, second);
//! ```

mod endpoint;
mod error;
mod pool;
mod static_resolver;

pub use endpoint::Endpoint;
pub use error::ResolutionError;
pub use pool::{Instance, InstancePool, PoolResolver, SelectionStrategy};
pub use static_resolver::StaticResolver;

use std::sync::Arc;

/// Maps a logical service name to an address.
///
/// Resolution happens on every call and must not block.
pub trait EndpointResolver: Send + Sync {
    /// Returns the endpoint to use for the next call to `service`.
    fn resolve(&self, service: &str) -> Result<Endpoint, ResolutionError>;
}

impl<R: EndpointResolver + ?Sized> EndpointResolver for Arc<R> {
    fn resolve(&self, service: &str) -> Result<Endpoint, ResolutionError> {
        (**self).resolve(service)
    }
}

impl<R: EndpointResolver + ?Sized> EndpointResolver for Box<R> {
    fn resolve(&self, service: &str) -> Result<Endpoint, ResolutionError> {
        (**self).resolve(service)
    }
}
