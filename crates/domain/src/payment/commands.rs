//! Payment commands.

use common::{AggregateId, Money};
use serde::{Deserialize, Serialize};

use crate::command::Command;

use super::{Payment, PaymentMethod};

/// Command to process a payment for an order.
///
/// Constructor-style: the first (and only) command a payment aggregate
/// ever handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessPayment {
    /// The payment ID to create.
    pub payment_id: AggregateId,

    /// The order being paid for.
    pub order_id: AggregateId,

    /// Amount to charge.
    pub amount: Money,

    /// How the customer pays.
    pub payment_method: PaymentMethod,
}

impl ProcessPayment {
    /// Creates a new ProcessPayment command.
    pub fn new(
        payment_id: AggregateId,
        order_id: AggregateId,
        amount: Money,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            payment_id,
            order_id,
            amount,
            payment_method,
        }
    }
}

impl Command for ProcessPayment {
    type Aggregate = Payment;

    fn aggregate_id(&self) -> AggregateId {
        self.payment_id
    }
}
