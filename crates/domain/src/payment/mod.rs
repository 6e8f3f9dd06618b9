//! Payment aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod types;

pub use aggregate::Payment;
pub use commands::ProcessPayment;
pub use events::{PaymentEvent, PaymentProcessedData};
pub use types::{PaymentMethod, PaymentOutcome, PaymentStatus};

use thiserror::Error;

/// Errors that can occur during payment operations.
///
/// Business declines are not errors — they are recorded as a
/// FAILED-status `PaymentProcessed` event so the saga can react
/// uniformly.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// This payment ID has already recorded its outcome.
    #[error("Payment already processed")]
    AlreadyProcessed,
}
