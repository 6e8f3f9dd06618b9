//! Delivery domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

/// Events that can occur on a delivery aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum DeliveryEvent {
    /// The order was delivered.
    OrderDelivered(OrderDeliveredData),
}

impl DomainEvent for DeliveryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DeliveryEvent::OrderDelivered(_) => "OrderDelivered",
        }
    }
}

/// Data for OrderDelivered event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDeliveredData {
    /// The delivery aggregate ID.
    pub delivery_id: AggregateId,

    /// The dispatch this delivery fulfils.
    pub dispatch_id: AggregateId,

    /// The order being delivered.
    pub order_id: AggregateId,

    /// Tracking number from the dispatch.
    pub tracking_number: String,

    /// Where the order was delivered.
    pub delivery_address: String,

    /// Who received the package.
    pub receiver_name: String,

    /// Courier notes.
    pub delivery_notes: String,

    /// When the order was delivered.
    pub delivered_at: DateTime<Utc>,
}

impl DeliveryEvent {
    /// Creates an OrderDelivered event.
    #[allow(clippy::too_many_arguments)]
    pub fn delivered(
        delivery_id: AggregateId,
        dispatch_id: AggregateId,
        order_id: AggregateId,
        tracking_number: impl Into<String>,
        delivery_address: impl Into<String>,
        receiver_name: impl Into<String>,
        delivery_notes: impl Into<String>,
    ) -> Self {
        DeliveryEvent::OrderDelivered(OrderDeliveredData {
            delivery_id,
            dispatch_id,
            order_id,
            tracking_number: tracking_number.into(),
            delivery_address: delivery_address.into(),
            receiver_name: receiver_name.into(),
            delivery_notes: delivery_notes.into(),
            delivered_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_name() {
        let event = DeliveryEvent::delivered(
            AggregateId::new(),
            AggregateId::new(),
            AggregateId::new(),
            "DHL1234567890",
            "1 Main St",
            "Customer",
            "Left at door",
        );
        assert_eq!(event.event_type(), "OrderDelivered");
    }

    #[test]
    fn serialization_roundtrip() {
        let delivery_id = AggregateId::new();
        let event = DeliveryEvent::delivered(
            delivery_id,
            AggregateId::new(),
            AggregateId::new(),
            "DHL1234567890",
            "1 Main St",
            "Customer",
            "Delivered successfully",
        );

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: DeliveryEvent = serde_json::from_str(&json).unwrap();
        let DeliveryEvent::OrderDelivered(data) = deserialized;
        assert_eq!(data.delivery_id, delivery_id);
        assert_eq!(data.tracking_number, "DHL1234567890");
    }
}
