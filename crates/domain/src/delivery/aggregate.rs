//! Delivery aggregate implementation.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::SequenceNumber;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::{DeliveryError, DeliveryEvent, events::OrderDeliveredData};

/// Delivery aggregate root.
///
/// One-shot: `(none) → DELIVERED`. There is no failure transition at
/// this level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delivery {
    /// Unique delivery identifier.
    id: Option<AggregateId>,

    /// Current log position for optimistic concurrency.
    #[serde(default)]
    sequence: SequenceNumber,

    /// The dispatch this delivery fulfils.
    dispatch_id: Option<AggregateId>,

    /// The order being delivered.
    order_id: Option<AggregateId>,

    /// Tracking number from the dispatch.
    tracking_number: Option<String>,

    /// Where the order was delivered.
    delivery_address: Option<String>,

    /// Who received the package.
    receiver_name: Option<String>,

    /// Courier notes.
    delivery_notes: Option<String>,

    /// When the order was delivered.
    delivered_at: Option<DateTime<Utc>>,
}

impl Aggregate for Delivery {
    type Event = DeliveryEvent;
    type Error = DeliveryError;

    fn aggregate_type() -> &'static str {
        "Delivery"
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
            DeliveryEvent::OrderDelivered(data) => self.apply_delivered(data),
        }
    }
}

// Query methods
impl Delivery {
    /// Returns the dispatch this delivery fulfils.
    pub fn dispatch_id(&self) -> Option<AggregateId> {
        self.dispatch_id
    }

    /// Returns the order being delivered.
    pub fn order_id(&self) -> Option<AggregateId> {
        self.order_id
    }

    /// Returns the tracking number.
    pub fn tracking_number(&self) -> Option<&str> {
        self.tracking_number.as_deref()
    }

    /// Returns when the order was delivered.
    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }
}

// Command methods (return events)
impl Delivery {
    /// Records a completed delivery.
    #[allow(clippy::too_many_arguments)]
    pub fn deliver(
        &self,
        delivery_id: AggregateId,
        dispatch_id: AggregateId,
        order_id: AggregateId,
        tracking_number: impl Into<String>,
        delivery_address: impl Into<String>,
        receiver_name: impl Into<String>,
        delivery_notes: impl Into<String>,
    ) -> Result<Vec<DeliveryEvent>, DeliveryError> {
        if self.id.is_some() {
            return Err(DeliveryError::AlreadyDelivered);
        }

        Ok(vec![DeliveryEvent::delivered(
            delivery_id,
            dispatch_id,
            order_id,
            tracking_number,
            delivery_address,
            receiver_name,
            delivery_notes,
        )])
    }
}

// Apply event helpers
impl Delivery {
    fn apply_delivered(&mut self, data: OrderDeliveredData) {
        self.id = Some(data.delivery_id);
        self.dispatch_id = Some(data.dispatch_id);
        self.order_id = Some(data.order_id);
        self.tracking_number = Some(data.tracking_number);
        self.delivery_address = Some(data.delivery_address);
        self.receiver_name = Some(data.receiver_name);
        self.delivery_notes = Some(data.delivery_notes);
        self.delivered_at = Some(data.delivered_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deliver_records_fact() {
        let mut delivery = Delivery::default();
        let delivery_id = AggregateId::new();
        let dispatch_id = AggregateId::new();
        let order_id = AggregateId::new();

        let events = delivery
            .deliver(
                delivery_id,
                dispatch_id,
                order_id,
                "DHL1234567890",
                "1 Main St",
                "Customer",
                "Delivered successfully",
            )
            .unwrap();
        delivery.apply_events(events);

        assert_eq!(delivery.id(), Some(delivery_id));
        assert_eq!(delivery.dispatch_id(), Some(dispatch_id));
        assert_eq!(delivery.order_id(), Some(order_id));
        assert_eq!(delivery.tracking_number(), Some("DHL1234567890"));
        assert!(delivery.delivered_at().is_some());
    }

    #[test]
    fn duplicate_delivery_rejected() {
        let mut delivery = Delivery::default();
        let delivery_id = AggregateId::new();

        let events = delivery
            .deliver(
                delivery_id,
                AggregateId::new(),
                AggregateId::new(),
                "TRK1",
                "1 Main St",
                "Customer",
                "ok",
            )
            .unwrap();
        delivery.apply_events(events);

        let result = delivery.deliver(
            delivery_id,
            AggregateId::new(),
            AggregateId::new(),
            "TRK2",
            "1 Main St",
            "Customer",
            "again",
        );
        assert!(matches!(result, Err(DeliveryError::AlreadyDelivered)));
    }
}
