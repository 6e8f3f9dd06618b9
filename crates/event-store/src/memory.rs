use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventEnvelope, EventQuery, EventStoreError, Result, SequenceNumber, Snapshot,
    store::{AppendOptions, EventStore, EventStream, validate_append_batch},
};

/// In-memory event store implementation.
///
/// Backs the test suites and the default binary wiring, and provides the
/// same contract as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<Vec<EventEnvelope>>>,
    snapshots: Arc<RwLock<HashMap<AggregateId, Snapshot>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Clears all events and snapshots.
    pub async fn clear(&self) {
        self.events.write().await.clear();
        self.snapshots.write().await.clear();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(
        &self,
        events: Vec<EventEnvelope>,
        options: AppendOptions,
    ) -> Result<SequenceNumber> {
        validate_append_batch(&events)?;

        let first_event = &events[0];
        let aggregate_id = first_event.aggregate_id;

        let mut store = self.events.write().await;

        let current = store
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.sequence)
            .max()
            .unwrap_or(SequenceNumber::initial());

        if let Some(expected) = options.expected_sequence
            && current != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current,
            });
        }

        // Unique (aggregate_id, sequence) constraint simulation
        let first_new = first_event.sequence;
        if first_new <= current && current != SequenceNumber::initial() {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: options.expected_sequence.unwrap_or(current),
                actual: current,
            });
        }

        let tail = events
            .last()
            .map(|e| e.sequence)
            .unwrap_or(SequenceNumber::initial());
        metrics::counter!("event_store_events_appended").increment(events.len() as u64);
        store.extend(events);

        Ok(tail)
    }

    async fn events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        let mut events: Vec<_> = store
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    async fn events_for_aggregate_from(
        &self,
        aggregate_id: AggregateId,
        from_sequence: SequenceNumber,
    ) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        let mut events: Vec<_> = store
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id && e.sequence >= from_sequence)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        let mut events: Vec<_> = store
            .iter()
            .filter(|e| {
                if let Some(id) = query.aggregate_id
                    && e.aggregate_id != id
                {
                    return false;
                }
                if let Some(ref agg_type) = query.aggregate_type
                    && &e.aggregate_type != agg_type
                {
                    return false;
                }
                if let Some(ref types) = query.event_types
                    && !types.contains(&e.event_type)
                {
                    return false;
                }
                if let Some(from) = query.from_sequence
                    && e.sequence < from
                {
                    return false;
                }
                if let Some(to) = query.to_sequence
                    && e.sequence > to
                {
                    return false;
                }
                if let Some(from) = query.from_timestamp
                    && e.occurred_at < from
                {
                    return false;
                }
                if let Some(to) = query.to_timestamp
                    && e.occurred_at > to
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        events.sort_by(|a, b| {
            a.occurred_at
                .cmp(&b.occurred_at)
                .then(a.sequence.cmp(&b.sequence))
        });

        let offset = query.offset.unwrap_or(0);
        let events: Vec<_> = events.into_iter().skip(offset).collect();

        let events = if let Some(limit) = query.limit {
            events.into_iter().take(limit).collect()
        } else {
            events
        };

        Ok(events)
    }

    async fn events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        let mut events: Vec<_> = store
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.occurred_at.cmp(&b.occurred_at));
        Ok(events)
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        let store = self.events.read().await;
        let events = store.clone();

        let stream = stream::iter(events.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn aggregate_sequence(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Option<SequenceNumber>> {
        let store = self.events.read().await;
        let sequence = store
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.sequence)
            .max();
        Ok(sequence)
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        let mut snapshots = self.snapshots.write().await;
        snapshots.insert(snapshot.aggregate_id, snapshot);
        Ok(())
    }

    async fn snapshot(&self, aggregate_id: AggregateId) -> Result<Option<Snapshot>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots.get(&aggregate_id).cloned())
    }
}
