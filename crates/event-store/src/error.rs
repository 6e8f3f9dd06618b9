use thiserror::Error;

use crate::{AggregateId, SequenceNumber};

/// Errors that can occur when interacting with the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// The caller's expected sequence did not match the aggregate's tail.
    /// The caller must reload the aggregate and reapply; the append is
    /// never merged.
    #[error(
        "Concurrency conflict for aggregate {aggregate_id}: expected sequence {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_id: AggregateId,
        expected: SequenceNumber,
        actual: SequenceNumber,
    },

    /// The aggregate was not found in the event store.
    #[error("Aggregate not found: {0}")]
    AggregateNotFound(AggregateId),

    /// The batch of events to append was malformed.
    #[error("Invalid append batch: {0}")]
    InvalidBatch(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
