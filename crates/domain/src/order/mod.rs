//! Order aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod status;
mod value_objects;

pub use aggregate::Order;
pub use commands::{CreateOrder, UpdateOrderStatus};
pub use events::{OrderCreatedData, OrderEvent, OrderStatusUpdatedData};
pub use status::OrderStatus;
pub use value_objects::OrderItem;

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order is already created.
    #[error("Order already created")]
    AlreadyCreated,

    /// Order does not exist yet.
    #[error("Order does not exist")]
    NotCreated,

    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// An item's recorded subtotal does not equal quantity × unit price.
    #[error("Subtotal mismatch for product {product_id}: expected {expected}, got {actual}")]
    SubtotalMismatch {
        product_id: String,
        expected: i64,
        actual: i64,
    },

    /// The order total does not equal the sum of item subtotals.
    #[error("Total mismatch: items sum to {items_total}, order claims {claimed_total}")]
    TotalMismatch {
        items_total: i64,
        claimed_total: i64,
    },

    /// The order is in a terminal status and accepts no further updates.
    #[error("Cannot update order status: {current} is terminal")]
    TerminalStatus { current: OrderStatus },
}
