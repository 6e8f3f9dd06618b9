//! Cart commands.

use common::{AggregateId, Money};
use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::ids::{CartItemId, ProductId, UserId};

use super::Cart;

/// Command to create a new cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCart {
    /// The cart ID to create.
    pub cart_id: AggregateId,

    /// The user who owns the cart.
    pub user_id: UserId,
}

impl CreateCart {
    /// Creates a new CreateCart command.
    pub fn new(cart_id: AggregateId, user_id: UserId) -> Self {
        Self { cart_id, user_id }
    }

    /// Creates a new CreateCart command with a generated cart ID.
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            cart_id: AggregateId::new(),
            user_id,
        }
    }
}

impl Command for CreateCart {
    type Aggregate = Cart;

    fn aggregate_id(&self) -> AggregateId {
        self.cart_id
    }
}

/// Command to add an item to a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddItemToCart {
    /// The cart to add the item to.
    pub cart_id: AggregateId,

    /// The product to add.
    pub product_id: ProductId,

    /// Product name.
    pub product_name: String,

    /// Quantity to add.
    pub quantity: u32,

    /// Price per unit.
    pub unit_price: Money,
}

impl AddItemToCart {
    /// Creates a new AddItemToCart command.
    pub fn new(
        cart_id: AggregateId,
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            cart_id,
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            unit_price,
        }
    }
}

impl Command for AddItemToCart {
    type Aggregate = Cart;

    fn aggregate_id(&self) -> AggregateId {
        self.cart_id
    }
}

/// Command to remove an item from a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveItemFromCart {
    /// The cart to remove the item from.
    pub cart_id: AggregateId,

    /// The line to remove.
    pub cart_item_id: CartItemId,
}

impl RemoveItemFromCart {
    /// Creates a new RemoveItemFromCart command.
    pub fn new(cart_id: AggregateId, cart_item_id: CartItemId) -> Self {
        Self {
            cart_id,
            cart_item_id,
        }
    }
}

impl Command for RemoveItemFromCart {
    type Aggregate = Cart;

    fn aggregate_id(&self) -> AggregateId {
        self.cart_id
    }
}
