//! Payment aggregate implementation.

use common::{AggregateId, Money};
use event_store::SequenceNumber;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::{
    PaymentError, PaymentEvent, PaymentMethod, PaymentOutcome, PaymentStatus,
    events::PaymentProcessedData,
};

/// Payment aggregate root.
///
/// One-shot: a payment records the outcome of a single authorization
/// attempt at creation time and never changes afterwards. The gateway
/// call itself happens in the command router; the aggregate only turns
/// its outcome into a fact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payment {
    /// Unique payment identifier.
    id: Option<AggregateId>,

    /// Current log position for optimistic concurrency.
    #[serde(default)]
    sequence: SequenceNumber,

    /// The order being paid for.
    order_id: Option<AggregateId>,

    /// Amount charged (or attempted).
    amount: Money,

    /// Outcome of the attempt.
    status: Option<PaymentStatus>,

    /// How the customer paid.
    payment_method: Option<PaymentMethod>,

    /// Gateway transaction reference, when approved.
    transaction_id: Option<String>,
}

impl Aggregate for Payment {
    type Event = PaymentEvent;
    type Error = PaymentError;

    fn aggregate_type() -> &'static str {
        "Payment"
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
            PaymentEvent::PaymentProcessed(data) => self.apply_processed(data),
        }
    }
}

// Query methods
impl Payment {
    /// Returns the order being paid for.
    pub fn order_id(&self) -> Option<AggregateId> {
        self.order_id
    }

    /// Returns the charged amount.
    pub fn amount(&self) -> Money {
        self.amount
    }

    /// Returns the outcome, if processed.
    pub fn status(&self) -> Option<PaymentStatus> {
        self.status
    }

    /// Returns the payment method, if processed.
    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    /// Returns the gateway transaction reference, if approved.
    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }
}

// Command methods (return events)
impl Payment {
    /// Records the outcome of a payment attempt.
    ///
    /// Never rejects on business grounds: a declined payment (or a
    /// technical gateway error already mapped to a FAILED outcome by the
    /// caller) still yields a PaymentProcessed event so the saga can
    /// react uniformly. The only rejection is a duplicate attempt against
    /// an already-processed payment id.
    pub fn process(
        &self,
        payment_id: AggregateId,
        order_id: AggregateId,
        amount: Money,
        payment_method: PaymentMethod,
        outcome: PaymentOutcome,
    ) -> Result<Vec<PaymentEvent>, PaymentError> {
        if self.id.is_some() {
            return Err(PaymentError::AlreadyProcessed);
        }

        Ok(vec![PaymentEvent::processed(
            payment_id,
            order_id,
            amount,
            outcome.status,
            payment_method,
            outcome.transaction_id,
        )])
    }
}

// Apply event helpers
impl Payment {
    fn apply_processed(&mut self, data: PaymentProcessedData) {
        self.id = Some(data.payment_id);
        self.order_id = Some(data.order_id);
        self.amount = data.amount;
        self.status = Some(data.status);
        self.payment_method = Some(data.payment_method);
        self.transaction_id = data.transaction_id;
    }
}
