//! Payment gateway trait, simulated and fixed implementations.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{AggregateId, Money};
use domain::payment::{PaymentMethod, PaymentOutcome};
use rand::Rng;
use uuid::Uuid;

use super::GatewayError;

/// Trait for payment authorization.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Attempts to charge the given amount for an order.
    ///
    /// A business decline comes back as an `Ok` outcome with FAILED
    /// status; `Err` means the gateway itself broke.
    async fn authorize(
        &self,
        order_id: AggregateId,
        amount: Money,
        method: PaymentMethod,
    ) -> Result<PaymentOutcome, GatewayError>;
}

/// Simulated payment gateway.
///
/// Approval probability depends on the amount and method: amounts over
/// $1,000 approve with p=0.7, credit cards with p=0.95, everything else
/// with p=0.9. A 5% slice of calls fails technically.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPaymentGateway;

impl SimulatedPaymentGateway {
    /// Creates a new simulated gateway.
    pub fn new() -> Self {
        Self
    }

    fn approval_probability(amount: Money, method: PaymentMethod) -> f64 {
        if amount > Money::from_dollars(1000) {
            0.7
        } else if method == PaymentMethod::CreditCard {
            0.95
        } else {
            0.9
        }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    async fn authorize(
        &self,
        order_id: AggregateId,
        amount: Money,
        method: PaymentMethod,
    ) -> Result<PaymentOutcome, GatewayError> {
        let (roll, glitch) = {
            let mut rng = rand::rng();
            (rng.random::<f64>(), rng.random::<f64>())
        };

        if glitch < 0.05 {
            return Err(GatewayError::Unavailable(
                "simulated payment gateway error".to_string(),
            ));
        }

        let outcome = if roll < Self::approval_probability(amount, method) {
            PaymentOutcome::completed(Uuid::new_v4().to_string())
        } else {
            PaymentOutcome::failed()
        };

        tracing::debug!(%order_id, %amount, %method, status = %outcome.status, "payment authorized");
        Ok(outcome)
    }
}

#[derive(Debug, Default)]
struct FixedPaymentState {
    decline: bool,
    unavailable: bool,
    next_txn: u32,
    authorizations: u32,
}

/// Deterministic payment gateway for tests.
#[derive(Debug, Clone, Default)]
pub struct FixedPaymentGateway {
    state: Arc<RwLock<FixedPaymentState>>,
}

impl FixedPaymentGateway {
    /// Creates a gateway that approves everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to decline charges.
    pub fn set_decline(&self, decline: bool) {
        self.state.write().unwrap().decline = decline;
    }

    /// Configures the gateway to fail technically.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().unavailable = unavailable;
    }

    /// Returns the number of authorization attempts seen.
    pub fn authorization_count(&self) -> u32 {
        self.state.read().unwrap().authorizations
    }
}

#[async_trait]
impl PaymentGateway for FixedPaymentGateway {
    async fn authorize(
        &self,
        _order_id: AggregateId,
        _amount: Money,
        _method: PaymentMethod,
    ) -> Result<PaymentOutcome, GatewayError> {
        let mut state = self.state.write().unwrap();
        state.authorizations += 1;

        if state.unavailable {
            return Err(GatewayError::Unavailable("gateway offline".to_string()));
        }

        if state.decline {
            return Ok(PaymentOutcome::failed());
        }

        state.next_txn += 1;
        Ok(PaymentOutcome::completed(format!("TXN-{:04}", state.next_txn)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::payment::PaymentStatus;

    #[test]
    fn approval_bands() {
        assert_eq!(
            SimulatedPaymentGateway::approval_probability(
                Money::from_dollars(2000),
                PaymentMethod::CreditCard
            ),
            0.7
        );
        assert_eq!(
            SimulatedPaymentGateway::approval_probability(
                Money::from_cents(500),
                PaymentMethod::CreditCard
            ),
            0.95
        );
        assert_eq!(
            SimulatedPaymentGateway::approval_probability(
                Money::from_cents(500),
                PaymentMethod::Wallet
            ),
            0.9
        );
    }

    #[tokio::test]
    async fn fixed_gateway_approves_with_sequential_txns() {
        let gateway = FixedPaymentGateway::new();
        let r1 = gateway
            .authorize(
                AggregateId::new(),
                Money::from_cents(1000),
                PaymentMethod::CreditCard,
            )
            .await
            .unwrap();
        let r2 = gateway
            .authorize(
                AggregateId::new(),
                Money::from_cents(1000),
                PaymentMethod::CreditCard,
            )
            .await
            .unwrap();

        assert_eq!(r1.transaction_id.as_deref(), Some("TXN-0001"));
        assert_eq!(r2.transaction_id.as_deref(), Some("TXN-0002"));
        assert_eq!(gateway.authorization_count(), 2);
    }

    #[tokio::test]
    async fn fixed_gateway_declines() {
        let gateway = FixedPaymentGateway::new();
        gateway.set_decline(true);

        let outcome = gateway
            .authorize(
                AggregateId::new(),
                Money::from_cents(1000),
                PaymentMethod::CreditCard,
            )
            .await
            .unwrap();
        assert_eq!(outcome.status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn fixed_gateway_fails_technically() {
        let gateway = FixedPaymentGateway::new();
        gateway.set_unavailable(true);

        let result = gateway
            .authorize(
                AggregateId::new(),
                Money::from_cents(1000),
                PaymentMethod::CreditCard,
            )
            .await;
        assert!(matches!(result, Err(GatewayError::Unavailable(_))));
    }
}
