//! Wire model and operation catalogue.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A product as exchanged with the products service.
///
/// Unknown fields in responses are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: f64,
}

impl Product {
    /// Creates a product.
    pub fn new(id: i64, name: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            name: name.into(),
            price,
        }
    }
}

/// HTTP method used by an [`Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One remote product operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Fetch every product.
    List,
    /// Fetch one product by id.
    Get(i64),
    /// Create a product; the service returns the stored product.
    Create(Product),
    /// Replace the product with the given id; the service returns the stored product.
    Update(i64, Product),
    /// Delete the product with the given id.
    Delete(i64),
}

impl Operation {
    /// Method the operation is issued with.
    pub fn method(&self) -> Method {
        match self {
            Operation::List | Operation::Get(_) => Method::Get,
            Operation::Create(_) => Method::Post,
            Operation::Update(..) => Method::Put,
            Operation::Delete(_) => Method::Delete,
        }
    }

    /// Request path below `resource`, e.g. `/products/7`.
    pub fn path(&self, resource: &str) -> String {
        let resource = resource.trim_end_matches('/');
        match self {
            Operation::List | Operation::Create(_) => resource.to_string(),
            Operation::Get(id) | Operation::Update(id, _) | Operation::Delete(id) => {
                format!("{resource}/{id}")
            }
        }
    }

    /// Short stable name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Get(_) => "get",
            Operation::Create(_) => "create",
            Operation::Update(..) => "update",
            Operation::Delete(_) => "delete",
        }
    }

    /// Request body, if the operation carries one.
    pub fn body(&self) -> Option<&Product> {
        match self {
            Operation::Create(product) | Operation::Update(_, product) => Some(product),
            Operation::List | Operation::Get(_) | Operation::Delete(_) => None,
        }
    }
}

/// Decoded result of a successful remote operation.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteValue {
    /// Result of [`Operation::List`].
    Products(Vec<Product>),
    /// Result of get, create and update.
    Product(Product),
    /// Result of delete.
    Empty,
}

impl RemoteValue {
    /// Returns the product list, if this is one.
    pub fn into_products(self) -> Option<Vec<Product>> {
        match self {
            RemoteValue::Products(products) => Some(products),
            _ => None,
        }
    }

    /// Returns the single product, if this is one.
    pub fn into_product(self) -> Option<Product> {
        match self {
            RemoteValue::Product(product) => Some(product),
            _ => None,
        }
    }
}
