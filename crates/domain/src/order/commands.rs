//! Order commands.

use common::{AggregateId, Money};
use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::ids::UserId;

use super::{Order, OrderItem, OrderStatus};

/// Command to create a new order from a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    /// The order ID to create.
    pub order_id: AggregateId,

    /// The user placing the order.
    pub user_id: UserId,

    /// The cart the order is created from.
    pub cart_id: AggregateId,

    /// Items copied from the cart.
    pub items: Vec<OrderItem>,

    /// Claimed total, validated against the item subtotals.
    pub total_amount: Money,

    /// Where to ship the order.
    pub shipping_address: String,
}

impl CreateOrder {
    /// Creates a new CreateOrder command.
    pub fn new(
        order_id: AggregateId,
        user_id: UserId,
        cart_id: AggregateId,
        items: Vec<OrderItem>,
        total_amount: Money,
        shipping_address: impl Into<String>,
    ) -> Self {
        Self {
            order_id,
            user_id,
            cart_id,
            items,
            total_amount,
            shipping_address: shipping_address.into(),
        }
    }
}

impl Command for CreateOrder {
    type Aggregate = Order;

    fn aggregate_id(&self) -> AggregateId {
        self.order_id
    }
}

/// Command to update an order's workflow status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatus {
    /// The order to update.
    pub order_id: AggregateId,

    /// The new status.
    pub status: OrderStatus,

    /// Why the status changed, if a reason is worth recording.
    pub reason: Option<String>,
}

impl UpdateOrderStatus {
    /// Creates a new UpdateOrderStatus command.
    pub fn new(order_id: AggregateId, status: OrderStatus) -> Self {
        Self {
            order_id,
            status,
            reason: None,
        }
    }

    /// Creates a new UpdateOrderStatus command with a reason.
    pub fn with_reason(
        order_id: AggregateId,
        status: OrderStatus,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            order_id,
            status,
            reason: Some(reason.into()),
        }
    }
}

impl Command for UpdateOrderStatus {
    type Aggregate = Order;

    fn aggregate_id(&self) -> AggregateId {
        self.order_id
    }
}
