//! Dispatch aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod types;

pub use aggregate::Dispatch;
pub use commands::DispatchOrder;
pub use events::{DispatchEvent, OrderDispatchedData};
pub use types::{Carrier, DispatchOutcome, DispatchStatus};

use thiserror::Error;

/// Errors that can occur during dispatch operations.
///
/// An unconfirmed or failed dispatch is not an error — it is recorded in
/// the `OrderDispatched` event's status field.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// This dispatch ID has already recorded its outcome.
    #[error("Dispatch already processed")]
    AlreadyProcessed,
}
