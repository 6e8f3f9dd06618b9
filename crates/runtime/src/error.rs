//! Runtime error types.

use common::AggregateId;
use domain::DomainError;
use thiserror::Error;

/// Errors surfaced by the command router.
///
/// Validation rejections pass through as `Domain` errors and are never
/// retried. `ConflictRetriesExhausted` is a technical failure: the saga
/// treats it as a command submission failure and compensates.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The aggregate rejected the command, or a store/serialization
    /// failure occurred.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Optimistic-concurrency retries ran out without a successful
    /// append.
    #[error("Concurrency retries exhausted for aggregate {aggregate_id} after {attempts} attempts")]
    ConflictRetriesExhausted {
        aggregate_id: AggregateId,
        attempts: u32,
    },
}

impl RouterError {
    /// Returns true if the failure is technical rather than a
    /// validation rejection.
    pub fn is_technical(&self) -> bool {
        match self {
            RouterError::ConflictRetriesExhausted { .. } => true,
            RouterError::Domain(e) => matches!(
                e,
                DomainError::EventStore(_) | DomainError::Serialization(_)
            ),
        }
    }
}
