//! Domain error types.

use event_store::EventStoreError;
use thiserror::Error;

use crate::cart::CartError;
use crate::delivery::DeliveryError;
use crate::dispatch::DispatchError;
use crate::order::OrderError;
use crate::payment::PaymentError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// A cart command was rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// An order command was rejected.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// A payment command was rejected.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// A dispatch command was rejected.
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// A delivery command was rejected.
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Aggregate not found.
    #[error("Aggregate not found: {aggregate_type} with id {aggregate_id}")]
    AggregateNotFound {
        aggregate_type: &'static str,
        aggregate_id: String,
    },

    /// Serialization error. Replaying an event whose type is unknown to
    /// the aggregate surfaces here: the operation aborts rather than
    /// silently skipping the event.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns true if this error is an optimistic-concurrency conflict.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(
            self,
            DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. })
        )
    }
}
