//! Execution runtime wiring the command path to the event relay.
//!
//! This crate provides:
//! - The command router: resolves a command's target aggregate, runs it
//!   through the aggregate runtime with per-aggregate serialization and
//!   bounded retry on concurrency conflicts, then publishes the appended
//!   events.
//! - The event publisher: fans appended events out to named channels
//!   (`cart-events`, `order-events`, ...) for sagas, projections, and
//!   other services.
//! - Simulated payment and carrier gateways behind injectable traits.

pub mod command;
pub mod error;
pub mod gateways;
pub mod publisher;
pub mod router;

pub use command::Command;
pub use error::RouterError;
pub use gateways::{
    CarrierGateway, FixedCarrierGateway, FixedPaymentGateway, GatewayError, PaymentGateway,
    SimulatedCarrierGateway, SimulatedPaymentGateway,
};
pub use publisher::{Channel, EventPublisher};
pub use router::{CommandRouter, Submission};
