//! Dispatch domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{Carrier, DispatchStatus};

/// Events that can occur on a dispatch aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum DispatchEvent {
    /// A dispatch attempt was made; the status field records the result.
    OrderDispatched(OrderDispatchedData),
}

impl DomainEvent for DispatchEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DispatchEvent::OrderDispatched(_) => "OrderDispatched",
        }
    }
}

/// Data for OrderDispatched event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDispatchedData {
    /// The dispatch aggregate ID.
    pub dispatch_id: AggregateId,

    /// The order being shipped.
    pub order_id: AggregateId,

    /// DISPATCHED, PENDING, or FAILED.
    pub status: DispatchStatus,

    /// Carrier-specific tracking number, present when confirmed.
    pub tracking_number: Option<String>,

    /// The carrier asked to ship the order.
    pub carrier: Carrier,

    /// When the attempt was made.
    pub dispatched_at: DateTime<Utc>,
}

impl DispatchEvent {
    /// Creates an OrderDispatched event.
    pub fn dispatched(
        dispatch_id: AggregateId,
        order_id: AggregateId,
        status: DispatchStatus,
        tracking_number: Option<String>,
        carrier: Carrier,
    ) -> Self {
        DispatchEvent::OrderDispatched(OrderDispatchedData {
            dispatch_id,
            order_id,
            status,
            tracking_number,
            carrier,
            dispatched_at: Utc::now(),
        })
    }
}
