//! Order domain events.

use chrono::{DateTime, Utc};
use common::{AggregateId, Money};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::ids::UserId;

use super::{OrderItem, OrderStatus};

/// Events that can occur on an order aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// Order was created from a cart.
    OrderCreated(OrderCreatedData),

    /// Order workflow status changed.
    OrderStatusUpdated(OrderStatusUpdatedData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => "OrderCreated",
            OrderEvent::OrderStatusUpdated(_) => "OrderStatusUpdated",
        }
    }
}

/// Data for OrderCreated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedData {
    /// The unique order ID.
    pub order_id: AggregateId,

    /// The user who placed the order.
    pub user_id: UserId,

    /// The cart the order was created from.
    pub cart_id: AggregateId,

    /// Items copied from the cart.
    pub items: Vec<OrderItem>,

    /// Sum of item subtotals.
    pub total_amount: Money,

    /// Where to ship the order.
    pub shipping_address: String,

    /// When the order was created.
    pub created_at: DateTime<Utc>,
}

/// Data for OrderStatusUpdated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdatedData {
    /// The order whose status changed.
    pub order_id: AggregateId,

    /// The status before the change.
    pub previous_status: OrderStatus,

    /// The status after the change.
    pub new_status: OrderStatus,

    /// Why the status changed, if a reason was given.
    pub reason: Option<String>,

    /// When the status changed.
    pub updated_at: DateTime<Utc>,
}

// Convenience constructors for events
impl OrderEvent {
    /// Creates an OrderCreated event.
    pub fn order_created(
        order_id: AggregateId,
        user_id: UserId,
        cart_id: AggregateId,
        items: Vec<OrderItem>,
        total_amount: Money,
        shipping_address: impl Into<String>,
    ) -> Self {
        OrderEvent::OrderCreated(OrderCreatedData {
            order_id,
            user_id,
            cart_id,
            items,
            total_amount,
            shipping_address: shipping_address.into(),
            created_at: Utc::now(),
        })
    }

    /// Creates an OrderStatusUpdated event.
    pub fn status_updated(
        order_id: AggregateId,
        previous_status: OrderStatus,
        new_status: OrderStatus,
        reason: Option<String>,
    ) -> Self {
        OrderEvent::OrderStatusUpdated(OrderStatusUpdatedData {
            order_id,
            previous_status,
            new_status,
            reason,
            updated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_names() {
        let order_id = AggregateId::new();

        let event = OrderEvent::order_created(
            order_id,
            UserId::new(),
            AggregateId::new(),
            vec![OrderItem::new("SKU-001", "Widget", 2, Money::from_cents(1000))],
            Money::from_cents(2000),
            "1 Main St",
        );
        assert_eq!(event.event_type(), "OrderCreated");

        let event = OrderEvent::status_updated(
            order_id,
            OrderStatus::Created,
            OrderStatus::PaymentPending,
            None,
        );
        assert_eq!(event.event_type(), "OrderStatusUpdated");
    }

    #[test]
    fn status_updated_serialization() {
        let event = OrderEvent::status_updated(
            AggregateId::new(),
            OrderStatus::Paid,
            OrderStatus::Dispatched,
            Some("carrier confirmed".to_string()),
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("DISPATCHED"));

        let deserialized: OrderEvent = serde_json::from_str(&json).unwrap();
        if let OrderEvent::OrderStatusUpdated(data) = deserialized {
            assert_eq!(data.previous_status, OrderStatus::Paid);
            assert_eq!(data.new_status, OrderStatus::Dispatched);
            assert_eq!(data.reason.as_deref(), Some("carrier confirmed"));
        } else {
            panic!("Expected OrderStatusUpdated event");
        }
    }

    #[test]
    fn order_created_serialization() {
        let order_id = AggregateId::new();
        let event = OrderEvent::order_created(
            order_id,
            UserId::new(),
            AggregateId::new(),
            vec![OrderItem::new("SKU-001", "Widget", 2, Money::from_cents(1000))],
            Money::from_cents(2000),
            "1 Main St",
        );

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: OrderEvent = serde_json::from_str(&json).unwrap();

        if let OrderEvent::OrderCreated(data) = deserialized {
            assert_eq!(data.order_id, order_id);
            assert_eq!(data.items.len(), 1);
            assert_eq!(data.total_amount, Money::from_cents(2000));
            assert_eq!(data.shipping_address, "1 Main St");
        } else {
            panic!("Expected OrderCreated event");
        }
    }
}
