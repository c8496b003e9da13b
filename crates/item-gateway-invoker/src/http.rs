//! HTTP invoker on `reqwest`.

use crate::{Method, Operation, Product, RemoteInvoker, RemoteValue, TransportError};
use futures::future::BoxFuture;
use item_gateway_resolver::Endpoint;
use reqwest::{Client, RequestBuilder};

/// Default collection path on the products service.
pub const DEFAULT_RESOURCE_PATH: &str = "/products";

/// Issues [`Operation`]s as JSON HTTP requests.
///
/// The invoker applies no timeout of its own; time limits belong to the
/// gateway that wraps it.
#[derive(Debug, Clone)]
pub struct HttpInvoker {
    client: Client,
    resource_path: String,
}

impl HttpInvoker {
    /// Creates an invoker with a default client, targeting `/products`.
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Creates an invoker on an existing client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            resource_path: DEFAULT_RESOURCE_PATH.to_string(),
        }
    }

    /// Changes the collection path operations are issued against.
    pub fn resource_path(mut self, path: impl Into<String>) -> Self {
        self.resource_path = path.into();
        self
    }

    fn request(&self, endpoint: &Endpoint, operation: &Operation) -> RequestBuilder {
        let url = endpoint.url(&operation.path(&self.resource_path));
        let builder = match operation.method() {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        };
        match operation.body() {
            Some(product) => builder.json(product),
            None => builder,
        }
    }

    async fn send(
        &self,
        endpoint: &Endpoint,
        operation: Operation,
    ) -> Result<RemoteValue, TransportError> {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            service = endpoint.service(),
            operation = operation.name(),
            base_url = endpoint.base_url(),
            "invoking remote operation"
        );

        let response = self.request(endpoint, &operation).send().await?;
        let status = response.status();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            service = endpoint.service(),
            operation = operation.name(),
            status = status.as_u16(),
            "remote operation responded"
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.is_empty() {
                status.canonical_reason().unwrap_or("unexpected status").to_string()
            } else {
                body
            };
            return Err(TransportError::from_status(status.as_u16(), message));
        }

        if let Operation::Delete(_) = operation {
            return Ok(RemoteValue::Empty);
        }

        let bytes = response.bytes().await?;
        let decode_err = |e: serde_json::Error| TransportError::decode(status.as_u16(), e.to_string());
        match operation {
            Operation::List => serde_json::from_slice::<Vec<Product>>(&bytes)
                .map(RemoteValue::Products)
                .map_err(decode_err),
            _ => serde_json::from_slice::<Product>(&bytes)
                .map(RemoteValue::Product)
                .map_err(decode_err),
        }
    }
}

impl Default for HttpInvoker {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteInvoker for HttpInvoker {
    fn invoke<'a>(
        &'a self,
        endpoint: &'a Endpoint,
        operation: Operation,
    ) -> BoxFuture<'a, Result<RemoteValue, TransportError>> {
        Box::pin(self.send(endpoint, operation))
    }
}
