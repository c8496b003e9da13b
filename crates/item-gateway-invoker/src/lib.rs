//! Remote product operations for the item gateway.
//!
//! A [`RemoteInvoker`] performs one [`Operation`] against a resolved
//! [`Endpoint`] and reports either a decoded [`RemoteValue`] or a
//! [`TransportError`]. It knows nothing about breakers or time limits.
//!
//! [`HttpInvoker`] speaks JSON over HTTP:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `List` | `GET {resource}` |
//! | `Get(id)` | `GET {resource}/{id}` |
//! | `Create(p)` | `POST {resource}` with `p` |
//! | `Update(id, p)` | `PUT {resource}/{id}` with `p` |
//! | `Delete(id)` | `DELETE {resource}/{id}` |
//!
//! Status 404 maps to [`TransportErrorKind::NotFound`], other 4xx to
//! `ClientError`, 5xx to `ServerError`, and a request that never gets a
//! response to `Connection`.

mod error;
mod http;
mod model;

pub use error::{TransportError, TransportErrorKind};
pub use http::{HttpInvoker, DEFAULT_RESOURCE_PATH};
pub use item_gateway_resolver::Endpoint;
pub use model::{Method, Operation, Product, RemoteValue};

use futures::future::BoxFuture;
use std::sync::Arc;

/// Performs a single remote operation.
pub trait RemoteInvoker: Send + Sync {
    /// Issues `operation` against `endpoint`.
    fn invoke<'a>(
        &'a self,
        endpoint: &'a Endpoint,
        operation: Operation,
    ) -> BoxFuture<'a, Result<RemoteValue, TransportError>>;
}

impl<I: RemoteInvoker + ?Sized> RemoteInvoker for Arc<I> {
    fn invoke<'a>(
        &'a self,
        endpoint: &'a Endpoint,
        operation: Operation,
    ) -> BoxFuture<'a, Result<RemoteValue, TransportError>> {
        (**self).invoke(endpoint, operation)
    }
}
