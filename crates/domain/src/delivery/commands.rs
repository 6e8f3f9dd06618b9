//! Delivery commands.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::command::Command;

use super::Delivery;

/// Command to deliver a dispatched order.
///
/// Constructor-style: the first (and only) command a delivery aggregate
/// ever handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverOrder {
    /// The delivery ID to create.
    pub delivery_id: AggregateId,

    /// The dispatch this delivery fulfils.
    pub dispatch_id: AggregateId,

    /// The order being delivered.
    pub order_id: AggregateId,

    /// Tracking number from the dispatch.
    pub tracking_number: String,

    /// Where to deliver.
    pub delivery_address: String,

    /// When the courier expects to deliver.
    pub estimated_delivery_time: DateTime<Utc>,
}

impl DeliverOrder {
    /// Creates a new DeliverOrder command.
    pub fn new(
        delivery_id: AggregateId,
        dispatch_id: AggregateId,
        order_id: AggregateId,
        tracking_number: impl Into<String>,
        delivery_address: impl Into<String>,
        estimated_delivery_time: DateTime<Utc>,
    ) -> Self {
        Self {
            delivery_id,
            dispatch_id,
            order_id,
            tracking_number: tracking_number.into(),
            delivery_address: delivery_address.into(),
            estimated_delivery_time,
        }
    }
}

impl Command for DeliverOrder {
    type Aggregate = Delivery;

    fn aggregate_id(&self) -> AggregateId {
        self.delivery_id
    }
}
