//! Dispatch commands.

use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::command::Command;

use super::{Carrier, Dispatch};

/// Command to dispatch an order with a carrier.
///
/// Constructor-style: the first (and only) command a dispatch aggregate
/// ever handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchOrder {
    /// The dispatch ID to create.
    pub dispatch_id: AggregateId,

    /// The order being shipped.
    pub order_id: AggregateId,

    /// The carrier to book with.
    pub carrier: Carrier,
}

impl DispatchOrder {
    /// Creates a new DispatchOrder command.
    pub fn new(dispatch_id: AggregateId, order_id: AggregateId, carrier: Carrier) -> Self {
        Self {
            dispatch_id,
            order_id,
            carrier,
        }
    }
}

impl Command for DispatchOrder {
    type Aggregate = Dispatch;

    fn aggregate_id(&self) -> AggregateId {
        self.dispatch_id
    }
}
