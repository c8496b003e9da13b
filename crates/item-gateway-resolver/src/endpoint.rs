use crate::ResolutionError;
use std::fmt;
use url::Url;

/// A resolved network address for one logical service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    service: String,
    base_url: String,
}

impl Endpoint {
    /// Validates `address` and binds it to `service`.
    ///
    /// The address must be an absolute `http` or `https` URL with a host. A
    /// trailing slash is dropped so that [`Endpoint::url`] can join paths
    /// uniformly.
    pub fn parse(service: impl Into<String>, address: &str) -> Result<Self, ResolutionError> {
        let parsed = Url::parse(address).map_err(|e| ResolutionError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ResolutionError::InvalidAddress {
                address: address.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        if parsed.host_str().is_none() {
            return Err(ResolutionError::InvalidAddress {
                address: address.to_string(),
                reason: "missing host".to_string(),
            });
        }

        Ok(Self {
            service: service.into(),
            base_url: address.trim_end_matches('/').to_string(),
        })
    }

    /// Logical service name this endpoint was resolved for.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins `path` onto the base URL.
    ///
    /// ```
    /// use item_gateway_resolver::Endpoint;
    ///
    /// let endpoint = Endpoint::parse("service-products", "http://localhost:8001/").unwrap();
    /// assert_eq!(endpoint.url("/products/1"), "http://localhost:8001/products/1");
    /// assert_eq!(endpoint.url("products"), "http://localhost:8001/products");
    /// ```
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.service, self.base_url)
    }
}
