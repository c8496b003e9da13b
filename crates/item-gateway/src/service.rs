//! Item operations over the gateway.

use crate::assembler::{to_item, Item};
use crate::{GatewayError, ResilientGateway};
use item_gateway_invoker::{Operation, Product, RemoteValue};
use serde::Deserialize;

/// Name given to the substitute product on the single-item read path.
pub const FALLBACK_PRODUCT_NAME: &str = "Camara Sony [Metodo Alternativo]";

/// Price of the substitute product.
pub const FALLBACK_PRODUCT_PRICE: f64 = 500.00;

/// What create, update and delete do when the downstream call fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteFallback {
    /// Return the error to the caller.
    #[default]
    Propagate,
    /// Pretend the write succeeded: return the submitted item, or `()` for delete.
    Echo,
}

/// Items backed by the products service.
///
/// All calls share one breaker group. Reads of a single item never fail;
/// list and write operations follow [`WriteFallback`] for writes and always
/// propagate for list.
#[derive(Debug, Clone)]
pub struct ItemService {
    gateway: ResilientGateway,
    service: String,
    group: String,
    write_fallback: WriteFallback,
}

impl ItemService {
    /// Creates a service calling `service` under the `items` group.
    pub fn new(gateway: ResilientGateway, service: impl Into<String>) -> Self {
        Self {
            gateway,
            service: service.into(),
            group: "items".to_string(),
            write_fallback: WriteFallback::Propagate,
        }
    }

    /// Uses a different breaker group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Sets the write-path failure policy.
    pub fn with_write_fallback(mut self, policy: WriteFallback) -> Self {
        self.write_fallback = policy;
        self
    }

    /// The underlying gateway.
    pub fn gateway(&self) -> &ResilientGateway {
        &self.gateway
    }

    /// Breaker group name.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Every product as an item with a random quantity.
    pub async fn list_items(&self) -> Result<Vec<Item>, GatewayError> {
        let operation = Operation::List;
        let name = operation.name();
        match self.gateway.execute(&self.group, &self.service, operation).await? {
            RemoteValue::Products(products) => Ok(products
                .into_iter()
                .map(|product| to_item(product, None))
                .collect()),
            _ => Err(GatewayError::UnexpectedResponse { operation: name }),
        }
    }

    /// The item for product `id`.
    ///
    /// Any failure, including an open circuit, yields a substitute item for
    /// the same id named [`FALLBACK_PRODUCT_NAME`].
    pub async fn get_item(&self, id: i64, quantity: Option<u32>) -> Item {
        let value = self
            .gateway
            .call(&self.group, &self.service, Operation::Get(id), |_, _| {
                RemoteValue::Product(fallback_product(id))
            })
            .await;

        match value {
            RemoteValue::Product(product) => to_item(product, quantity),
            other => {
                tracing::warn!(id, response = ?other, "unexpected response to get; using fallback product");
                to_item(fallback_product(id), quantity)
            }
        }
    }

    /// Stores the item's product downstream and returns the stored version
    /// with the submitted quantity.
    pub async fn create_item(&self, item: Item) -> Result<Item, GatewayError> {
        let product = item.product.clone().ok_or(GatewayError::MissingProduct)?;
        let stored = self.write(Operation::Create(product)).await?;
        Self::expect_product(stored, "create", item.quantity)
    }

    /// Replaces product `id` and returns the stored version with the
    /// submitted quantity.
    pub async fn update_item(&self, id: i64, item: Item) -> Result<Item, GatewayError> {
        let product = item.product.clone().ok_or(GatewayError::MissingProduct)?;
        let stored = self.write(Operation::Update(id, product)).await?;
        Self::expect_product(stored, "update", item.quantity)
    }

    /// Deletes product `id`.
    pub async fn delete_item(&self, id: i64) -> Result<(), GatewayError> {
        self.write(Operation::Delete(id)).await.map(|_| ())
    }

    async fn write(&self, operation: Operation) -> Result<RemoteValue, GatewayError> {
        match self.write_fallback {
            WriteFallback::Propagate => {
                self.gateway
                    .execute(&self.group, &self.service, operation)
                    .await
            }
            WriteFallback::Echo => Ok(self
                .gateway
                .call(&self.group, &self.service, operation, |op, _| {
                    match op.body() {
                        Some(product) => RemoteValue::Product(product.clone()),
                        None => RemoteValue::Empty,
                    }
                })
                .await),
        }
    }

    fn expect_product(
        value: RemoteValue,
        operation: &'static str,
        quantity: u32,
    ) -> Result<Item, GatewayError> {
        value
            .into_product()
            .map(|product| Item::new(product, quantity))
            .ok_or(GatewayError::UnexpectedResponse { operation })
    }
}

/// The substitute product returned when product `id` cannot be fetched.
pub fn fallback_product(id: i64) -> Product {
    Product::new(id, FALLBACK_PRODUCT_NAME, FALLBACK_PRODUCT_PRICE)
}
