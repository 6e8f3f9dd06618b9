//! Payment domain events.

use chrono::{DateTime, Utc};
use common::{AggregateId, Money};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{PaymentMethod, PaymentStatus};

/// Events that can occur on a payment aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PaymentEvent {
    /// A payment attempt was processed, successfully or not.
    PaymentProcessed(PaymentProcessedData),
}

impl DomainEvent for PaymentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PaymentEvent::PaymentProcessed(_) => "PaymentProcessed",
        }
    }
}

/// Data for PaymentProcessed event.
///
/// The status field encodes success or failure — a declined payment is a
/// fact in the log, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentProcessedData {
    /// The payment aggregate ID.
    pub payment_id: AggregateId,

    /// The order being paid for.
    pub order_id: AggregateId,

    /// Amount charged (or attempted).
    pub amount: Money,

    /// COMPLETED or FAILED.
    pub status: PaymentStatus,

    /// How the customer paid.
    pub payment_method: PaymentMethod,

    /// Gateway transaction reference, present when approved.
    pub transaction_id: Option<String>,

    /// When the attempt was processed.
    pub processed_at: DateTime<Utc>,
}

impl PaymentEvent {
    /// Creates a PaymentProcessed event.
    pub fn processed(
        payment_id: AggregateId,
        order_id: AggregateId,
        amount: Money,
        status: PaymentStatus,
        payment_method: PaymentMethod,
        transaction_id: Option<String>,
    ) -> Self {
        PaymentEvent::PaymentProcessed(PaymentProcessedData {
            payment_id,
            order_id,
            amount,
            status,
            payment_method,
            transaction_id,
            processed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_name() {
        let event = PaymentEvent::processed(
            AggregateId::new(),
            AggregateId::new(),
            Money::from_cents(2000),
            PaymentStatus::Completed,
            PaymentMethod::CreditCard,
            Some("TXN-1".to_string()),
        );
        assert_eq!(event.event_type(), "PaymentProcessed");
    }

    #[test]
    fn serialization_roundtrip() {
        let payment_id = AggregateId::new();
        let event = PaymentEvent::processed(
            payment_id,
            AggregateId::new(),
            Money::from_cents(2000),
            PaymentStatus::Failed,
            PaymentMethod::Wallet,
            None,
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("FAILED"));

        let deserialized: PaymentEvent = serde_json::from_str(&json).unwrap();
        let PaymentEvent::PaymentProcessed(data) = deserialized;
        assert_eq!(data.payment_id, payment_id);
        assert_eq!(data.status, PaymentStatus::Failed);
        assert!(data.transaction_id.is_none());
    }
}
