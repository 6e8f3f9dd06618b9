//! Saga error types.

use thiserror::Error;

/// Errors that can occur during saga orchestration.
///
/// Business failures never surface here — they become order status
/// updates. These errors are the fatal/programmer class that must abort
/// loudly.
#[derive(Debug, Error)]
pub enum SagaError {
    /// An association key is already owned by a different live
    /// instance. Correlation would be ambiguous, so the operation
    /// aborts.
    #[error(
        "Association key collision: ({name}, {value}) already owned by saga {existing}, wanted by {incoming}"
    )]
    AssociationCollision {
        name: String,
        value: String,
        existing: common::AggregateId,
        incoming: common::AggregateId,
    },

    /// An event payload could not be deserialized into its declared
    /// workflow event type.
    #[error("Malformed workflow event: {0}")]
    MalformedEvent(#[from] serde_json::Error),
}
