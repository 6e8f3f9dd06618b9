//! Simulated external gateways behind injectable traits.
//!
//! Only the contract matters to the core: given (amount, method) or
//! (order, carrier) input, a gateway returns a status enum and an
//! optional reference id. The simulated implementations roll dice the
//! way a flaky external integration would; the fixed implementations
//! give tests deterministic outcomes.

pub mod carrier;
pub mod payment;

pub use carrier::{CarrierGateway, FixedCarrierGateway, SimulatedCarrierGateway};
pub use payment::{FixedPaymentGateway, PaymentGateway, SimulatedPaymentGateway};

use thiserror::Error;

/// A technical gateway failure.
///
/// Distinct from a business decline: callers on the command path map
/// this to a FAILED-status event so the fact still lands in the log.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway could not be reached or errored internally.
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
}
