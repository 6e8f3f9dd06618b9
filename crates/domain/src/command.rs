//! Command handling infrastructure: the aggregate runtime.

use std::marker::PhantomData;

use common::AggregateId;
use event_store::{
    AppendOptions, EventEnvelope, EventStore, EventStoreExt, SequenceNumber, Snapshot,
};
use serde::Serialize;

use crate::aggregate::{Aggregate, DomainEvent, SnapshotCapable};
use crate::error::DomainError;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were generated and persisted.
    pub events: Vec<A::Event>,

    /// The persisted envelopes, in append order, for relaying to
    /// downstream consumers.
    pub envelopes: Vec<EventEnvelope>,

    /// The aggregate's log position after the command.
    pub new_sequence: SequenceNumber,
}

/// Trait for commands that can be executed against an aggregate.
///
/// Commands represent an intention to perform an action. They may be
/// rejected if the aggregate's current state doesn't allow the action.
pub trait Command: Send + Sync {
    /// The type of aggregate this command targets.
    type Aggregate: Aggregate;

    /// Returns the ID of the aggregate this command targets.
    fn aggregate_id(&self) -> AggregateId;
}

/// The aggregate runtime: loads an aggregate's history, replays it,
/// validates a command against current state, and appends the resulting
/// events under optimistic concurrency.
pub struct CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    _phantom: PhantomData<A>,
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    /// Creates a new command handler with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads an aggregate from the event store.
    ///
    /// If the aggregate doesn't exist, returns a default instance.
    /// An event whose payload cannot be deserialized into the aggregate's
    /// event type aborts the load — replay determinism is the correctness
    /// backbone, so unknown events are never skipped.
    pub async fn load(&self, aggregate_id: AggregateId) -> Result<A, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
        A::Event: for<'de> serde::Deserialize<'de>,
    {
        let (snapshot, events) = self.store.load_aggregate(aggregate_id).await?;

        let mut aggregate = if let Some(snapshot) = snapshot {
            self.restore_from_snapshot(snapshot)?
        } else {
            A::default()
        };

        // Apply events after snapshot
        for envelope in events {
            let event: A::Event = serde_json::from_value(envelope.payload)?;
            aggregate.apply(event);
            aggregate.set_sequence(envelope.sequence);
        }

        Ok(aggregate)
    }

    /// Loads an aggregate, returning None if it doesn't exist.
    pub async fn load_existing(&self, aggregate_id: AggregateId) -> Result<Option<A>, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
        A::Event: for<'de> serde::Deserialize<'de>,
    {
        let aggregate = self.load(aggregate_id).await?;
        if aggregate.id().is_some() {
            Ok(Some(aggregate))
        } else {
            Ok(None)
        }
    }

    /// Executes a command and persists the resulting events.
    ///
    /// The command function receives the current aggregate state and
    /// returns either a list of events to apply, or a rejection.
    /// The append carries the loaded sequence as the expected tail, so a
    /// concurrent writer on the same aggregate surfaces as
    /// `ConcurrencyConflict` for the caller to retry with a reload.
    pub async fn execute<F>(
        &self,
        aggregate_id: AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
        A::Event: for<'de> serde::Deserialize<'de> + Serialize,
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let mut aggregate = self.load(aggregate_id).await?;
        let current_sequence = aggregate.sequence();

        // Execute command to get events
        let events = command_fn(&aggregate)?;

        if events.is_empty() {
            return Ok(CommandResult {
                aggregate,
                events: vec![],
                envelopes: vec![],
                new_sequence: current_sequence,
            });
        }

        let envelopes = self.build_envelopes(aggregate_id, current_sequence, &events)?;

        let options = if current_sequence == SequenceNumber::initial() {
            AppendOptions::expect_new()
        } else {
            AppendOptions::expect_sequence(current_sequence)
        };

        let new_sequence = self.store.append(envelopes.clone(), options).await?;
        metrics::counter!("commands_executed_total", "aggregate" => A::aggregate_type())
            .increment(1);

        // Apply events to aggregate
        for event in &events {
            aggregate.apply(event.clone());
        }
        aggregate.set_sequence(new_sequence);

        Ok(CommandResult {
            aggregate,
            events,
            envelopes,
            new_sequence,
        })
    }

    /// Builds event envelopes from domain events.
    fn build_envelopes(
        &self,
        aggregate_id: AggregateId,
        current_sequence: SequenceNumber,
        events: &[A::Event],
    ) -> Result<Vec<EventEnvelope>, DomainError>
    where
        A::Event: Serialize,
    {
        let mut envelopes = Vec::with_capacity(events.len());
        let mut sequence = current_sequence;

        for event in events {
            sequence = sequence.next();
            let envelope = EventEnvelope::builder()
                .aggregate_id(aggregate_id)
                .aggregate_type(A::aggregate_type())
                .event_type(event.event_type())
                .sequence(sequence)
                .payload(event)?
                .build();
            envelopes.push(envelope);
        }

        Ok(envelopes)
    }

    fn restore_from_snapshot(&self, snapshot: Snapshot) -> Result<A, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
    {
        let aggregate: A = serde_json::from_value(snapshot.state)?;
        Ok(aggregate)
    }
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: SnapshotCapable,
{
    /// Executes a command and optionally saves a snapshot.
    pub async fn execute_with_snapshot<F>(
        &self,
        aggregate_id: AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
        A::Event: for<'de> serde::Deserialize<'de> + Serialize,
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let result = self.execute(aggregate_id, command_fn).await?;

        if result.aggregate.should_snapshot() {
            let snapshot = Snapshot::from_state(
                aggregate_id,
                A::aggregate_type(),
                result.new_sequence,
                &result.aggregate,
            )?;
            self.store.save_snapshot(snapshot).await?;
        }

        Ok(result)
    }
}
