//! Item assembly.

use crate::GatewayError;
use item_gateway_invoker::Product;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Range random quantities are drawn from.
pub const QUANTITY_RANGE: RangeInclusive<u32> = 1..=10;

/// A product paired with a quantity. Assembled per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// The product, absent only in malformed input.
    pub product: Option<Product>,
    /// Units of the product.
    pub quantity: u32,
}

impl Item {
    /// Pairs `product` with `quantity`.
    pub fn new(product: Product, quantity: u32) -> Self {
        Self {
            product: Some(product),
            quantity,
        }
    }

    /// `price * quantity`.
    ///
    /// # Errors
    ///
    /// [`GatewayError::MissingProduct`] if the item has no product.
    pub fn total(&self) -> Result<f64, GatewayError> {
        self.product
            .as_ref()
            .map(|p| p.price * f64::from(self.quantity))
            .ok_or(GatewayError::MissingProduct)
    }
}

/// Builds an item, drawing a random quantity when none is given.
pub fn to_item(product: Product, quantity: Option<u32>) -> Item {
    Item::new(product, quantity.unwrap_or_else(random_quantity))
}

/// Uniform random quantity in [`QUANTITY_RANGE`].
pub fn random_quantity() -> u32 {
    rand::rng().random_range(QUANTITY_RANGE)
}
