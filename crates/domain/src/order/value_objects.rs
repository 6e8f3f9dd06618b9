//! Value objects for the order domain.

use common::Money;
use serde::{Deserialize, Serialize};

use crate::ids::ProductId;

/// A line in an order, copied from the cart at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The product identifier.
    pub product_id: ProductId,

    /// Human-readable product name.
    pub product_name: String,

    /// Quantity ordered.
    pub quantity: u32,

    /// Price per unit.
    pub unit_price: Money,

    /// quantity × unit price.
    pub subtotal: Money,
}

impl OrderItem {
    /// Creates a new order item, deriving the subtotal.
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            unit_price,
            subtotal: unit_price.multiply(quantity),
        }
    }

    /// Returns true if the recorded subtotal equals quantity × unit price.
    pub fn subtotal_is_consistent(&self) -> bool {
        self.subtotal == self.unit_price.multiply(self.quantity)
    }
}
