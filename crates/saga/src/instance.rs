//! The saga instance record.

use chrono::{DateTime, Utc};
use common::{AggregateId, Money};
use serde::{Deserialize, Serialize};

use crate::state::SagaPhase;

/// A (property name, value) pair routing incoming events to a running
/// saga instance.
///
/// An event's carrier id (say, a payment id) differs from the saga's
/// original key (the order id); association keys bridge that gap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssociationKey {
    /// The property name, e.g. "paymentId".
    pub name: String,

    /// The property value.
    pub value: String,
}

impl AssociationKey {
    pub const ORDER_ID: &'static str = "orderId";
    pub const PAYMENT_ID: &'static str = "paymentId";
    pub const DISPATCH_ID: &'static str = "dispatchId";
    pub const DELIVERY_ID: &'static str = "deliveryId";

    /// Creates an association key.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Key on an order id.
    pub fn order_id(id: AggregateId) -> Self {
        Self::new(Self::ORDER_ID, id.to_string())
    }

    /// Key on a payment id.
    pub fn payment_id(id: AggregateId) -> Self {
        Self::new(Self::PAYMENT_ID, id.to_string())
    }

    /// Key on a dispatch id.
    pub fn dispatch_id(id: AggregateId) -> Self {
        Self::new(Self::DISPATCH_ID, id.to_string())
    }

    /// Key on a delivery id.
    pub fn delivery_id(id: AggregateId) -> Self {
        Self::new(Self::DELIVERY_ID, id.to_string())
    }

    /// Returns the key as a (name, value) pair for indexing.
    pub fn pair(&self) -> (String, String) {
        (self.name.clone(), self.value.clone())
    }
}

impl std::fmt::Display for AssociationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.name, self.value)
    }
}

/// Durable state of one order's fulfillment saga.
///
/// The saga is re-entrant and stateless between invocations: everything
/// it needs to resume lives here, and the record is serializable so an
/// instance survives a process restart the same way an aggregate
/// survives through replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaInstance {
    /// Unique instance identifier.
    pub saga_id: AggregateId,

    /// The order this saga fulfils — its original correlation key.
    pub order_id: AggregateId,

    /// Current phase.
    pub phase: SagaPhase,

    /// Payment id generated when the payment request was issued.
    pub payment_id: Option<AggregateId>,

    /// Dispatch id generated when the dispatch request was issued.
    pub dispatch_id: Option<AggregateId>,

    /// Delivery id generated when the delivery request was issued.
    pub delivery_id: Option<AggregateId>,

    /// Order total, captured from the creation event for the payment
    /// request.
    pub total_amount: Money,

    /// Shipping address, captured for the delivery request.
    pub shipping_address: String,

    /// Tracking number, captured from the dispatch event for the
    /// delivery request.
    pub tracking_number: Option<String>,

    /// Why the workflow failed, when it did.
    pub failure_reason: Option<String>,

    /// When the instance entered its current `Awaiting*` phase; drives
    /// the timeout sweeper.
    pub awaiting_since: Option<DateTime<Utc>>,
}

impl SagaInstance {
    /// Creates a fresh instance for an order.
    pub fn new(
        saga_id: AggregateId,
        order_id: AggregateId,
        total_amount: Money,
        shipping_address: impl Into<String>,
    ) -> Self {
        Self {
            saga_id,
            order_id,
            phase: SagaPhase::Started,
            payment_id: None,
            dispatch_id: None,
            delivery_id: None,
            total_amount,
            shipping_address: shipping_address.into(),
            tracking_number: None,
            failure_reason: None,
            awaiting_since: None,
        }
    }

    /// Returns every association key currently registered for this
    /// instance.
    pub fn association_keys(&self) -> Vec<AssociationKey> {
        let mut keys = vec![AssociationKey::order_id(self.order_id)];
        if let Some(id) = self.payment_id {
            keys.push(AssociationKey::payment_id(id));
        }
        if let Some(id) = self.dispatch_id {
            keys.push(AssociationKey::dispatch_id(id));
        }
        if let Some(id) = self.delivery_id {
            keys.push(AssociationKey::delivery_id(id));
        }
        keys
    }

    /// Returns true if the instance has reached a terminal phase.
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Returns true if the instance has been waiting longer than the
    /// given window.
    pub fn is_overdue(&self, now: DateTime<Utc>, window: std::time::Duration) -> bool {
        if !self.phase.is_awaiting() {
            return false;
        }
        match self.awaiting_since {
            Some(since) => now.signed_duration_since(since).to_std().is_ok_and(|elapsed| elapsed > window),
            None => false,
        }
    }
}
