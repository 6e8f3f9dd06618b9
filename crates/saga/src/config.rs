//! Saga configuration.

use std::time::Duration;

use domain::{PaymentMethod, dispatch::Carrier};

/// Tunables for the order fulfillment saga.
#[derive(Debug, Clone)]
pub struct SagaConfig {
    /// Payment method used for the workflow's payment request.
    pub payment_method: PaymentMethod,

    /// Carrier asked to ship confirmed orders.
    pub carrier: Carrier,

    /// How long an instance may sit in an `Awaiting*` phase before the
    /// timeout sweeper fails it. A saga must never stay stuck silently.
    pub step_timeout: Duration,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            payment_method: PaymentMethod::CreditCard,
            carrier: Carrier::default(),
            step_timeout: Duration::from_secs(30),
        }
    }
}
