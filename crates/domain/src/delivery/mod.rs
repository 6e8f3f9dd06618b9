//! Delivery aggregate and related types.

mod aggregate;
mod commands;
mod events;

pub use aggregate::Delivery;
pub use commands::DeliverOrder;
pub use events::{DeliveryEvent, OrderDeliveredData};

use thiserror::Error;

/// Errors that can occur during delivery operations.
///
/// There is no modeled failure path at the aggregate level: a delivery,
/// once commanded, records an OrderDelivered fact. If delivery failure
/// is ever introduced it must arrive as a new event type, not as an
/// error, to preserve replay determinism.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// This delivery ID has already recorded its outcome.
    #[error("Delivery already recorded")]
    AlreadyDelivered,
}
