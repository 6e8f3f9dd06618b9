//! Order aggregate implementation.

use common::{AggregateId, Money};
use event_store::SequenceNumber;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};
use crate::ids::UserId;

use super::{
    OrderError, OrderEvent, OrderItem, OrderStatus,
    events::{OrderCreatedData, OrderStatusUpdatedData},
};

/// Order aggregate root.
///
/// An order is created once from a cart and then advances through the
/// workflow statuses via explicit status-update commands issued by the
/// saga.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    id: Option<AggregateId>,

    /// Current log position for optimistic concurrency.
    #[serde(default)]
    sequence: SequenceNumber,

    /// The user who placed the order.
    user_id: Option<UserId>,

    /// The cart the order was created from.
    cart_id: Option<AggregateId>,

    /// Items copied from the cart at checkout.
    items: Vec<OrderItem>,

    /// Sum of item subtotals.
    total_amount: Money,

    /// Where to ship the order.
    shipping_address: String,

    /// Current workflow status.
    status: OrderStatus,
}

impl Aggregate for Order {
    type Event = OrderEvent;
    type Error = OrderError;

    fn aggregate_type() -> &'static str {
        "Order"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn sequence(&self) -> SequenceNumber {
        self.sequence
    }

    fn set_sequence(&mut self, sequence: SequenceNumber) {
        self.sequence = sequence;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            OrderEvent::OrderCreated(data) => self.apply_order_created(data),
            OrderEvent::OrderStatusUpdated(data) => self.apply_status_updated(data),
        }
    }
}

impl SnapshotCapable for Order {
    fn snapshot_interval() -> usize {
        50
    }
}

// Query methods
impl Order {
    /// Returns the user who placed the order.
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Returns the source cart ID.
    pub fn cart_id(&self) -> Option<AggregateId> {
        self.cart_id
    }

    /// Returns the current workflow status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns all items in the order.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns the total amount.
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    /// Returns the shipping address.
    pub fn shipping_address(&self) -> &str {
        &self.shipping_address
    }

    /// Returns true if the order's workflow has ended.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Command methods (return events)
impl Order {
    /// Creates a new order from cart contents.
    ///
    /// The caller supplies the items and claimed total; both are checked
    /// here so a malformed checkout can never enter the log: every item's
    /// subtotal must equal quantity × unit price, and the total must equal
    /// the sum of subtotals.
    pub fn create(
        &self,
        order_id: AggregateId,
        user_id: UserId,
        cart_id: AggregateId,
        items: Vec<OrderItem>,
        total_amount: Money,
        shipping_address: impl Into<String>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_some() {
            return Err(OrderError::AlreadyCreated);
        }

        if items.is_empty() {
            return Err(OrderError::NoItems);
        }

        for item in &items {
            if !item.subtotal_is_consistent() {
                return Err(OrderError::SubtotalMismatch {
                    product_id: item.product_id.to_string(),
                    expected: item.unit_price.multiply(item.quantity).cents(),
                    actual: item.subtotal.cents(),
                });
            }
        }

        let items_total = Money::sum(items.iter().map(|i| i.subtotal));
        if items_total != total_amount {
            return Err(OrderError::TotalMismatch {
                items_total: items_total.cents(),
                claimed_total: total_amount.cents(),
            });
        }

        Ok(vec![OrderEvent::order_created(
            order_id,
            user_id,
            cart_id,
            items,
            total_amount,
            shipping_address,
        )])
    }

    /// Updates the workflow status.
    ///
    /// Terminal statuses end the workflow; any further update is rejected
    /// so a late saga command cannot resurrect a finished order.
    pub fn update_status(
        &self,
        new_status: OrderStatus,
        reason: Option<String>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let order_id = self.id.ok_or(OrderError::NotCreated)?;

        if self.status.is_terminal() {
            return Err(OrderError::TerminalStatus {
                current: self.status,
            });
        }

        Ok(vec![OrderEvent::status_updated(
            order_id,
            self.status,
            new_status,
            reason,
        )])
    }
}

// Apply event helpers
impl Order {
    fn apply_order_created(&mut self, data: OrderCreatedData) {
        self.id = Some(data.order_id);
        self.user_id = Some(data.user_id);
        self.cart_id = Some(data.cart_id);
        self.items = data.items;
        self.total_amount = data.total_amount;
        self.shipping_address = data.shipping_address;
        self.status = OrderStatus::Created;
    }

    fn apply_status_updated(&mut self, data: OrderStatusUpdatedData) {
        self.status = data.new_status;
    }
}
