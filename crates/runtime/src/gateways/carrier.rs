//! Carrier gateway trait, simulated and fixed implementations.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::AggregateId;
use domain::dispatch::{Carrier, DispatchOutcome};
use rand::Rng;

use super::GatewayError;

/// Trait for carrier bookings.
#[async_trait]
pub trait CarrierGateway: Send + Sync {
    /// Asks a carrier to pick up an order.
    ///
    /// An unconfirmed booking comes back as an `Ok` outcome with PENDING
    /// status; `Err` means the carrier API itself broke.
    async fn book(
        &self,
        order_id: AggregateId,
        carrier: &Carrier,
    ) -> Result<DispatchOutcome, GatewayError>;
}

/// Simulated carrier gateway.
///
/// The carrier identity selects a confirmation-probability band: DHL
/// p=0.95, FedEx p=0.9, UPS p=0.85, anything else p=0.8. Unconfirmed
/// bookings come back PENDING. A 5% slice of calls fails technically.
/// Confirmed bookings carry a tracking number in the carrier's format.
#[derive(Debug, Clone, Default)]
pub struct SimulatedCarrierGateway;

impl SimulatedCarrierGateway {
    /// Creates a new simulated gateway.
    pub fn new() -> Self {
        Self
    }

    fn confirmation_probability(carrier: &Carrier) -> f64 {
        match carrier.normalized().as_str() {
            Carrier::DHL => 0.95,
            Carrier::FEDEX => 0.9,
            Carrier::UPS => 0.85,
            _ => 0.8,
        }
    }

    fn tracking_number(carrier: &Carrier) -> String {
        let mut rng = rand::rng();
        match carrier.normalized().as_str() {
            Carrier::DHL => format!("DHL{:010}", rng.random_range(0..10_000_000_000u64)),
            Carrier::FEDEX => format!("FDX{:012}", rng.random_range(0..1_000_000_000_000u64)),
            Carrier::UPS => format!("1Z{:016}", rng.random_range(0..10_000_000_000_000_000u64)),
            _ => format!("TRK{:010}", rng.random_range(0..10_000_000_000u64)),
        }
    }
}

#[async_trait]
impl CarrierGateway for SimulatedCarrierGateway {
    async fn book(
        &self,
        order_id: AggregateId,
        carrier: &Carrier,
    ) -> Result<DispatchOutcome, GatewayError> {
        let (roll, glitch) = {
            let mut rng = rand::rng();
            (rng.random::<f64>(), rng.random::<f64>())
        };

        if glitch < 0.05 {
            return Err(GatewayError::Unavailable(
                "simulated logistics system error".to_string(),
            ));
        }

        let outcome = if roll < Self::confirmation_probability(carrier) {
            DispatchOutcome::dispatched(Self::tracking_number(carrier))
        } else {
            DispatchOutcome::pending()
        };

        tracing::debug!(%order_id, %carrier, status = %outcome.status, "carrier booked");
        Ok(outcome)
    }
}

#[derive(Debug, Default)]
struct FixedCarrierState {
    pending: bool,
    unavailable: bool,
    next_tracking: u32,
    bookings: u32,
}

/// Deterministic carrier gateway for tests.
#[derive(Debug, Clone, Default)]
pub struct FixedCarrierGateway {
    state: Arc<RwLock<FixedCarrierState>>,
}

impl FixedCarrierGateway {
    /// Creates a gateway that confirms everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to leave bookings unconfirmed.
    pub fn set_pending(&self, pending: bool) {
        self.state.write().unwrap().pending = pending;
    }

    /// Configures the gateway to fail technically.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().unavailable = unavailable;
    }

    /// Returns the number of booking attempts seen.
    pub fn booking_count(&self) -> u32 {
        self.state.read().unwrap().bookings
    }
}

#[async_trait]
impl CarrierGateway for FixedCarrierGateway {
    async fn book(
        &self,
        _order_id: AggregateId,
        _carrier: &Carrier,
    ) -> Result<DispatchOutcome, GatewayError> {
        let mut state = self.state.write().unwrap();
        state.bookings += 1;

        if state.unavailable {
            return Err(GatewayError::Unavailable("carrier API offline".to_string()));
        }

        if state.pending {
            return Ok(DispatchOutcome::pending());
        }

        state.next_tracking += 1;
        Ok(DispatchOutcome::dispatched(format!(
            "TRACK-{:04}",
            state.next_tracking
        )))
    }
}
