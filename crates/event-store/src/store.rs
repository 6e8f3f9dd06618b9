use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{AggregateId, EventEnvelope, EventQuery, EventStoreError, Result, SequenceNumber, Snapshot};

/// Options for appending events to the store.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Expected tail sequence of the aggregate, for optimistic concurrency.
    /// If None, no check is performed (use with caution).
    pub expected_sequence: Option<SequenceNumber>,
}

impl AppendOptions {
    /// Creates options with no sequence check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the aggregate to be at a specific sequence.
    pub fn expect_sequence(sequence: SequenceNumber) -> Self {
        Self {
            expected_sequence: Some(sequence),
        }
    }

    /// Creates options expecting the aggregate to not exist yet.
    pub fn expect_new() -> Self {
        Self {
            expected_sequence: Some(SequenceNumber::initial()),
        }
    }
}

/// A stream of events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventEnvelope>> + Send>>;

/// Core trait for event store implementations.
///
/// An event store keeps an append-only, sequence-ordered log per
/// aggregate id. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends events to the store.
    ///
    /// Events are appended atomically — either all succeed or none do.
    /// If `options.expected_sequence` is set, the operation fails with
    /// `ConcurrencyConflict` when the aggregate's tail doesn't match;
    /// this is what prevents two concurrent commands against the same
    /// aggregate from both producing sequence N.
    ///
    /// Returns the new tail sequence of the aggregate.
    async fn append(
        &self,
        events: Vec<EventEnvelope>,
        options: AppendOptions,
    ) -> Result<SequenceNumber>;

    /// Retrieves all events for a specific aggregate, oldest first.
    async fn events_for_aggregate(&self, aggregate_id: AggregateId)
    -> Result<Vec<EventEnvelope>>;

    /// Retrieves events for an aggregate starting from a sequence number.
    ///
    /// Useful when replaying from a snapshot.
    async fn events_for_aggregate_from(
        &self,
        aggregate_id: AggregateId,
        from_sequence: SequenceNumber,
    ) -> Result<Vec<EventEnvelope>>;

    /// Retrieves events matching a query.
    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>>;

    /// Retrieves events by type.
    async fn events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>>;

    /// Streams all events in the store, in insertion order.
    async fn stream_all_events(&self) -> Result<EventStream>;

    /// Gets the current tail sequence of an aggregate.
    ///
    /// Returns None if the aggregate doesn't exist.
    async fn aggregate_sequence(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Option<SequenceNumber>>;

    /// Saves a snapshot of an aggregate's state, replacing any prior one.
    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()>;

    /// Retrieves the latest snapshot for an aggregate, if any.
    async fn snapshot(&self, aggregate_id: AggregateId) -> Result<Option<Snapshot>>;
}

/// Extension trait providing convenience methods for event stores.
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Appends a single event to the store.
    async fn append_event(
        &self,
        event: EventEnvelope,
        options: AppendOptions,
    ) -> Result<SequenceNumber> {
        self.append(vec![event], options).await
    }

    /// Checks if an aggregate exists (has any events).
    async fn aggregate_exists(&self, aggregate_id: AggregateId) -> Result<bool> {
        Ok(self.aggregate_sequence(aggregate_id).await?.is_some())
    }

    /// Loads an aggregate's events, optionally starting from a snapshot.
    ///
    /// If a snapshot exists, returns the snapshot and events after it.
    /// Otherwise, returns None and all events.
    async fn load_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<(Option<Snapshot>, Vec<EventEnvelope>)> {
        if let Some(snapshot) = self.snapshot(aggregate_id).await? {
            let events = self
                .events_for_aggregate_from(aggregate_id, snapshot.sequence.next())
                .await?;
            Ok((Some(snapshot), events))
        } else {
            let events = self.events_for_aggregate(aggregate_id).await?;
            Ok((None, events))
        }
    }
}

// Blanket implementation for all EventStore implementations
impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Validates a batch of events before appending.
///
/// All events must target the same aggregate and carry contiguous
/// sequence numbers.
pub fn validate_append_batch(events: &[EventEnvelope]) -> Result<()> {
    if events.is_empty() {
        return Err(EventStoreError::InvalidBatch(
            "cannot append an empty event list".to_string(),
        ));
    }

    let first = &events[0];
    for event in events.iter().skip(1) {
        if event.aggregate_id != first.aggregate_id {
            return Err(EventStoreError::InvalidBatch(
                "all events must be for the same aggregate".to_string(),
            ));
        }
        if event.aggregate_type != first.aggregate_type {
            return Err(EventStoreError::InvalidBatch(
                "all events must have the same aggregate type".to_string(),
            ));
        }
    }

    let mut expected = first.sequence;
    for event in events.iter().skip(1) {
        expected = expected.next();
        if event.sequence != expected {
            return Err(EventStoreError::InvalidBatch(format!(
                "event sequences must be contiguous: expected {}, got {}",
                expected, event.sequence
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(aggregate_id: AggregateId, sequence: SequenceNumber) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type("TestAggregate")
            .event_type("TestEvent")
            .sequence(sequence)
            .payload_raw(serde_json::json!({}))
            .build()
    }

    #[test]
    fn empty_batch_rejected() {
        let result = validate_append_batch(&[]);
        assert!(matches!(result, Err(EventStoreError::InvalidBatch(_))));
    }

    #[test]
    fn mixed_aggregates_rejected() {
        let events = vec![
            envelope(AggregateId::new(), SequenceNumber::new(1)),
            envelope(AggregateId::new(), SequenceNumber::new(2)),
        ];
        assert!(validate_append_batch(&events).is_err());
    }

    #[test]
    fn gapped_sequences_rejected() {
        let id = AggregateId::new();
        let events = vec![
            envelope(id, SequenceNumber::new(1)),
            envelope(id, SequenceNumber::new(3)),
        ];
        assert!(validate_append_batch(&events).is_err());
    }

    #[test]
    fn contiguous_batch_accepted() {
        let id = AggregateId::new();
        let events = vec![
            envelope(id, SequenceNumber::new(1)),
            envelope(id, SequenceNumber::new(2)),
            envelope(id, SequenceNumber::new(3)),
        ];
        assert!(validate_append_batch(&events).is_ok());
    }
}
