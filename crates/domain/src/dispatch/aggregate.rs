//! Dispatch aggregate implementation.

use common::AggregateId;
use event_store::SequenceNumber;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::{
    Carrier, DispatchError, DispatchEvent, DispatchOutcome, DispatchStatus,
    events::OrderDispatchedData,
};

/// Dispatch aggregate root.
///
/// One-shot: the dispatch outcome is decided at creation time by the
/// carrier call and never changes. The carrier call happens in the
/// command router; the aggregate records its outcome as a fact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dispatch {
    /// Unique dispatch identifier.
    id: Option<AggregateId>,

    /// Current log position for optimistic concurrency.
    #[serde(default)]
    sequence: SequenceNumber,

    /// The order being shipped.
    order_id: Option<AggregateId>,

    /// Outcome of the attempt.
    status: Option<DispatchStatus>,

    /// Tracking number, when confirmed.
    tracking_number: Option<String>,

    /// The carrier asked to ship.
    carrier: Option<Carrier>,
}

impl Aggregate for Dispatch {
    type Event = DispatchEvent;
    type Error = DispatchError;

    fn aggregate_type() -> &'static str {
        "Dispatch"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn sequence(&self) -> SequenceNumber {
        self.sequence
    }

    fn set_sequence(&mut self, sequence: SequenceNumber) {
        self.sequence = sequence;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            DispatchEvent::OrderDispatched(data) => self.apply_dispatched(data),
        }
    }
}

// Query methods
impl Dispatch {
    /// Returns the order being shipped.
    pub fn order_id(&self) -> Option<AggregateId> {
        self.order_id
    }

    /// Returns the outcome, if processed.
    pub fn status(&self) -> Option<DispatchStatus> {
        self.status
    }

    /// Returns the tracking number, if confirmed.
    pub fn tracking_number(&self) -> Option<&str> {
        self.tracking_number.as_deref()
    }

    /// Returns the carrier, if processed.
    pub fn carrier(&self) -> Option<&Carrier> {
        self.carrier.as_ref()
    }
}

// Command methods (return events)
impl Dispatch {
    /// Records the outcome of a dispatch attempt.
    ///
    /// Never rejects on business grounds: an unconfirmed or failed
    /// booking (including a technical carrier error mapped to FAILED by
    /// the caller) still yields an OrderDispatched event. The only
    /// rejection is a duplicate attempt against an already-processed
    /// dispatch id.
    pub fn process(
        &self,
        dispatch_id: AggregateId,
        order_id: AggregateId,
        carrier: Carrier,
        outcome: DispatchOutcome,
    ) -> Result<Vec<DispatchEvent>, DispatchError> {
        if self.id.is_some() {
            return Err(DispatchError::AlreadyProcessed);
        }

        Ok(vec![DispatchEvent::dispatched(
            dispatch_id,
            order_id,
            outcome.status,
            outcome.tracking_number,
            carrier,
        )])
    }
}

// Apply event helpers
impl Dispatch {
    fn apply_dispatched(&mut self, data: OrderDispatchedData) {
        self.id = Some(data.dispatch_id);
        self.order_id = Some(data.order_id);
        self.status = Some(data.status);
        self.tracking_number = data.tracking_number;
        self.carrier = Some(data.carrier);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_confirmed_dispatch() {
        let mut dispatch = Dispatch::default();
        let dispatch_id = AggregateId::new();
        let order_id = AggregateId::new();

        let events = dispatch
            .process(
                dispatch_id,
                order_id,
                Carrier::new(Carrier::DHL),
                DispatchOutcome::dispatched("DHL1234567890"),
            )
            .unwrap();
        dispatch.apply_events(events);

        assert_eq!(dispatch.id(), Some(dispatch_id));
        assert_eq!(dispatch.order_id(), Some(order_id));
        assert_eq!(dispatch.status(), Some(DispatchStatus::Dispatched));
        assert_eq!(dispatch.tracking_number(), Some("DHL1234567890"));
    }

    #[test]
    fn pending_dispatch_is_an_event_not_an_error() {
        let mut dispatch = Dispatch::default();

        let events = dispatch
            .process(
                AggregateId::new(),
                AggregateId::new(),
                Carrier::new(Carrier::UPS),
                DispatchOutcome::pending(),
            )
            .unwrap();
        dispatch.apply_events(events);

        assert_eq!(dispatch.status(), Some(DispatchStatus::Pending));
        assert!(dispatch.tracking_number().is_none());
    }

    #[test]
    fn duplicate_processing_rejected() {
        let mut dispatch = Dispatch::default();
        let dispatch_id = AggregateId::new();

        let events = dispatch
            .process(
                dispatch_id,
                AggregateId::new(),
                Carrier::default(),
                DispatchOutcome::dispatched("TRK1"),
            )
            .unwrap();
        dispatch.apply_events(events);

        let result = dispatch.process(
            dispatch_id,
            AggregateId::new(),
            Carrier::default(),
            DispatchOutcome::failed(),
        );
        assert!(matches!(result, Err(DispatchError::AlreadyProcessed)));
    }
}
