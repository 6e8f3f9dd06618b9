//! Cart domain events.

use common::{AggregateId, Money};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::ids::{CartItemId, ProductId, UserId};

/// Events that can occur on a cart aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CartEvent {
    /// Cart was created for a user.
    CartCreated(CartCreatedData),

    /// Item was added to the cart.
    ItemAddedToCart(ItemAddedToCartData),

    /// Item was removed from the cart.
    ItemRemovedFromCart(ItemRemovedFromCartData),
}

impl DomainEvent for CartEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CartEvent::CartCreated(_) => "CartCreated",
            CartEvent::ItemAddedToCart(_) => "ItemAddedToCart",
            CartEvent::ItemRemovedFromCart(_) => "ItemRemovedFromCart",
        }
    }
}

/// Data for CartCreated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartCreatedData {
    /// The unique cart ID.
    pub cart_id: AggregateId,

    /// The user who owns the cart.
    pub user_id: UserId,
}

/// Data for ItemAddedToCart event.
///
/// The cart item id and the subtotal are derived by the command handler
/// and recorded here, so replay reproduces them without recomputation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemAddedToCartData {
    /// The cart the item was added to.
    pub cart_id: AggregateId,

    /// The generated line identifier.
    pub cart_item_id: CartItemId,

    /// The product that was added.
    pub product_id: ProductId,

    /// Product name.
    pub product_name: String,

    /// Quantity added.
    pub quantity: u32,

    /// Unit price at the time of adding.
    pub unit_price: Money,

    /// quantity × unit price.
    pub subtotal: Money,
}

/// Data for ItemRemovedFromCart event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRemovedFromCartData {
    /// The cart the item was removed from.
    pub cart_id: AggregateId,

    /// The line that was removed.
    pub cart_item_id: CartItemId,

    /// The product the removed line referred to.
    pub product_id: ProductId,
}

// Convenience constructors for events
impl CartEvent {
    /// Creates a CartCreated event.
    pub fn cart_created(cart_id: AggregateId, user_id: UserId) -> Self {
        CartEvent::CartCreated(CartCreatedData { cart_id, user_id })
    }

    /// Creates an ItemAddedToCart event.
    pub fn item_added(
        cart_id: AggregateId,
        cart_item_id: CartItemId,
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        CartEvent::ItemAddedToCart(ItemAddedToCartData {
            cart_id,
            cart_item_id,
            product_id,
            product_name: product_name.into(),
            quantity,
            unit_price,
            subtotal: unit_price.multiply(quantity),
        })
    }

    /// Creates an ItemRemovedFromCart event.
    pub fn item_removed(
        cart_id: AggregateId,
        cart_item_id: CartItemId,
        product_id: ProductId,
    ) -> Self {
        CartEvent::ItemRemovedFromCart(ItemRemovedFromCartData {
            cart_id,
            cart_item_id,
            product_id,
        })
    }
}
