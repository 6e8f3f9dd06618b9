//! Cart aggregate and related types.

mod aggregate;
mod commands;
mod events;

pub use aggregate::{Cart, CartItem};
pub use commands::{AddItemToCart, CreateCart, RemoveItemFromCart};
pub use events::{CartCreatedData, CartEvent, ItemAddedToCartData, ItemRemovedFromCartData};

use thiserror::Error;

use crate::ids::CartItemId;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Cart is already created.
    #[error("Cart already created")]
    AlreadyCreated,

    /// Cart does not exist yet.
    #[error("Cart does not exist")]
    NotCreated,

    /// Item not found in cart.
    #[error("Item not found in cart: {cart_item_id}")]
    ItemNotFound { cart_item_id: CartItemId },

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Invalid unit price.
    #[error("Invalid unit price: {price} (must be greater than 0)")]
    InvalidPrice { price: i64 },
}
