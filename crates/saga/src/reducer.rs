//! The saga's decision logic, as a pure reducer.
//!
//! Every transition is a function from (instance, input) to
//! (new instance, outgoing commands, new association keys). Nothing in
//! here performs I/O — command submission and registry bookkeeping
//! happen in the orchestrator shell — so the whole workflow is testable
//! without mocks.

use chrono::{Duration, Utc};
use common::AggregateId;
use domain::{
    DeliverOrder, DispatchOrder, OrderStatus, ProcessPayment, UpdateOrderStatus,
    delivery::OrderDeliveredData,
    dispatch::{DispatchStatus, OrderDispatchedData},
    order::{OrderCreatedData, OrderEvent},
    payment::{PaymentProcessedData, PaymentStatus},
};
use event_store::EventEnvelope;

use crate::config::SagaConfig;
use crate::instance::{AssociationKey, SagaInstance};
use crate::state::SagaPhase;

/// How far out the courier promises delivery.
const ESTIMATED_DELIVERY_DAYS: i64 = 3;

/// The cross-aggregate events the saga reacts to.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    OrderCreated(OrderCreatedData),
    PaymentProcessed(PaymentProcessedData),
    OrderDispatched(OrderDispatchedData),
    OrderDelivered(OrderDeliveredData),
}

impl WorkflowEvent {
    /// Decodes a relayed envelope into a workflow event.
    ///
    /// Returns `Ok(None)` for event types the saga does not react to
    /// (cart events, status updates). A payload that fails to decode
    /// under its declared type is a malformed event and aborts loudly.
    pub fn from_envelope(envelope: &EventEnvelope) -> Result<Option<Self>, serde_json::Error> {
        match envelope.event_type.as_str() {
            "OrderCreated" => {
                let event: OrderEvent = serde_json::from_value(envelope.payload.clone())?;
                match event {
                    OrderEvent::OrderCreated(data) => Ok(Some(WorkflowEvent::OrderCreated(data))),
                    _ => Ok(None),
                }
            }
            "PaymentProcessed" => {
                let event: domain::payment::PaymentEvent =
                    serde_json::from_value(envelope.payload.clone())?;
                let domain::payment::PaymentEvent::PaymentProcessed(data) = event;
                Ok(Some(WorkflowEvent::PaymentProcessed(data)))
            }
            "OrderDispatched" => {
                let event: domain::dispatch::DispatchEvent =
                    serde_json::from_value(envelope.payload.clone())?;
                let domain::dispatch::DispatchEvent::OrderDispatched(data) = event;
                Ok(Some(WorkflowEvent::OrderDispatched(data)))
            }
            "OrderDelivered" => {
                let event: domain::delivery::DeliveryEvent =
                    serde_json::from_value(envelope.payload.clone())?;
                let domain::delivery::DeliveryEvent::OrderDelivered(data) = event;
                Ok(Some(WorkflowEvent::OrderDelivered(data)))
            }
            _ => Ok(None),
        }
    }

    /// Returns the association key this event routes by.
    pub fn correlation(&self) -> AssociationKey {
        match self {
            WorkflowEvent::OrderCreated(data) => AssociationKey::order_id(data.order_id),
            WorkflowEvent::PaymentProcessed(data) => AssociationKey::payment_id(data.payment_id),
            WorkflowEvent::OrderDispatched(data) => AssociationKey::dispatch_id(data.dispatch_id),
            WorkflowEvent::OrderDelivered(data) => AssociationKey::delivery_id(data.delivery_id),
        }
    }

    /// Returns the event type name.
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowEvent::OrderCreated(_) => "OrderCreated",
            WorkflowEvent::PaymentProcessed(_) => "PaymentProcessed",
            WorkflowEvent::OrderDispatched(_) => "OrderDispatched",
            WorkflowEvent::OrderDelivered(_) => "OrderDelivered",
        }
    }
}

/// One reducer step: the instance after the transition, the commands to
/// submit, and the association keys to register before submitting.
#[derive(Debug)]
pub struct ReducerOutput {
    pub instance: SagaInstance,
    pub commands: Vec<runtime::Command>,
    pub new_associations: Vec<AssociationKey>,
}

impl ReducerOutput {
    fn unchanged(instance: SagaInstance) -> Self {
        Self {
            instance,
            commands: Vec::new(),
            new_associations: Vec::new(),
        }
    }
}

/// Starts a saga for a newly created order.
///
/// Generates a fresh payment id, registers it as an association key,
/// marks the order PAYMENT_PENDING, and issues the payment request.
pub fn start(saga_id: AggregateId, order: &OrderCreatedData, config: &SagaConfig) -> ReducerOutput {
    let mut instance = SagaInstance::new(
        saga_id,
        order.order_id,
        order.total_amount,
        order.shipping_address.clone(),
    );

    let payment_id = AggregateId::new();
    instance.payment_id = Some(payment_id);
    instance.phase = SagaPhase::AwaitingPayment;
    instance.awaiting_since = Some(Utc::now());

    ReducerOutput {
        commands: vec![
            runtime::Command::UpdateOrderStatus(UpdateOrderStatus::new(
                order.order_id,
                OrderStatus::PaymentPending,
            )),
            runtime::Command::ProcessPayment(ProcessPayment::new(
                payment_id,
                order.order_id,
                order.total_amount,
                config.payment_method,
            )),
        ],
        new_associations: vec![AssociationKey::payment_id(payment_id)],
        instance,
    }
}

/// Applies a correlated event to a running instance.
pub fn apply(instance: SagaInstance, event: &WorkflowEvent, config: &SagaConfig) -> ReducerOutput {
    if instance.is_terminal() {
        return ReducerOutput::unchanged(instance);
    }

    match (instance.phase, event) {
        (SagaPhase::AwaitingPayment, WorkflowEvent::PaymentProcessed(data)) => {
            on_payment_processed(instance, data, config)
        }
        (SagaPhase::AwaitingDispatch, WorkflowEvent::OrderDispatched(data)) => {
            on_order_dispatched(instance, data)
        }
        (SagaPhase::AwaitingDelivery, WorkflowEvent::OrderDelivered(_)) => {
            on_order_delivered(instance)
        }
        // An event that doesn't fit the current phase is stale or
        // duplicated; the instance stays put.
        _ => ReducerOutput::unchanged(instance),
    }
}

fn on_payment_processed(
    mut instance: SagaInstance,
    data: &PaymentProcessedData,
    config: &SagaConfig,
) -> ReducerOutput {
    match data.status {
        PaymentStatus::Completed => {
            let dispatch_id = AggregateId::new();
            instance.dispatch_id = Some(dispatch_id);
            instance.phase = SagaPhase::AwaitingDispatch;
            instance.awaiting_since = Some(Utc::now());

            ReducerOutput {
                commands: vec![
                    runtime::Command::UpdateOrderStatus(UpdateOrderStatus::new(
                        instance.order_id,
                        OrderStatus::Paid,
                    )),
                    runtime::Command::DispatchOrder(DispatchOrder::new(
                        dispatch_id,
                        instance.order_id,
                        config.carrier.clone(),
                    )),
                ],
                new_associations: vec![AssociationKey::dispatch_id(dispatch_id)],
                instance,
            }
        }
        PaymentStatus::Failed => {
            instance.phase = SagaPhase::Ended;
            instance.awaiting_since = None;
            instance.failure_reason = Some("payment declined".to_string());

            ReducerOutput {
                commands: vec![runtime::Command::UpdateOrderStatus(
                    UpdateOrderStatus::with_reason(
                        instance.order_id,
                        OrderStatus::PaymentFailed,
                        "payment declined",
                    ),
                )],
                new_associations: Vec::new(),
                instance,
            }
        }
    }
}

fn on_order_dispatched(mut instance: SagaInstance, data: &OrderDispatchedData) -> ReducerOutput {
    match (data.status, data.tracking_number.as_deref()) {
        (DispatchStatus::Dispatched, Some(tracking_number)) => {
            let delivery_id = AggregateId::new();
            let dispatch_id = data.dispatch_id;
            instance.delivery_id = Some(delivery_id);
            instance.tracking_number = Some(tracking_number.to_string());
            instance.phase = SagaPhase::AwaitingDelivery;
            instance.awaiting_since = Some(Utc::now());

            ReducerOutput {
                commands: vec![
                    runtime::Command::UpdateOrderStatus(UpdateOrderStatus::new(
                        instance.order_id,
                        OrderStatus::Dispatched,
                    )),
                    runtime::Command::DeliverOrder(DeliverOrder::new(
                        delivery_id,
                        dispatch_id,
                        instance.order_id,
                        tracking_number,
                        instance.shipping_address.clone(),
                        Utc::now() + Duration::days(ESTIMATED_DELIVERY_DAYS),
                    )),
                ],
                new_associations: vec![AssociationKey::delivery_id(delivery_id)],
                instance,
            }
        }
        // PENDING, FAILED, or a confirmation without a tracking number:
        // the dispatch never became shippable. Payment was captured, so
        // the compensating action is the explicit DISPATCH_FAILED
        // status.
        (status, _) => {
            let reason = format!("carrier reported {status}");
            instance.phase = SagaPhase::Ended;
            instance.awaiting_since = None;
            instance.failure_reason = Some(reason.clone());

            ReducerOutput {
                commands: vec![runtime::Command::UpdateOrderStatus(
                    UpdateOrderStatus::with_reason(
                        instance.order_id,
                        OrderStatus::DispatchFailed,
                        reason,
                    ),
                )],
                new_associations: Vec::new(),
                instance,
            }
        }
    }
}

fn on_order_delivered(mut instance: SagaInstance) -> ReducerOutput {
    instance.phase = SagaPhase::Ended;
    instance.awaiting_since = None;

    ReducerOutput {
        commands: vec![runtime::Command::UpdateOrderStatus(UpdateOrderStatus::new(
            instance.order_id,
            OrderStatus::Delivered,
        ))],
        new_associations: Vec::new(),
        instance,
    }
}

/// Reacts to a command that could not be submitted (technical failure).
///
/// Every downstream issuance is guarded this way so a routing failure
/// becomes an explicit compensating status update instead of a silently
/// stuck saga.
pub fn on_submission_failure(
    mut instance: SagaInstance,
    failed: &runtime::Command,
    reason: &str,
) -> ReducerOutput {
    instance.awaiting_since = None;
    instance.failure_reason = Some(reason.to_string());

    let (phase, status) = match failed {
        runtime::Command::ProcessPayment(_) => (SagaPhase::Error, Some(OrderStatus::Error)),
        runtime::Command::DispatchOrder(_) => (SagaPhase::Ended, Some(OrderStatus::DispatchFailed)),
        runtime::Command::DeliverOrder(_) => (SagaPhase::Ended, Some(OrderStatus::DeliveryFailed)),
        // The status update itself failed: there is no further order
        // state to fall back to. The shell logs this as an error.
        _ => (SagaPhase::Error, None),
    };

    instance.phase = phase;

    ReducerOutput {
        commands: status
            .map(|status| {
                vec![runtime::Command::UpdateOrderStatus(
                    UpdateOrderStatus::with_reason(instance.order_id, status, reason),
                )]
            })
            .unwrap_or_default(),
        new_associations: Vec::new(),
        instance,
    }
}

/// Fails an instance that has waited too long for its follow-up event.
pub fn on_timeout(mut instance: SagaInstance) -> ReducerOutput {
    let status = match instance.phase {
        SagaPhase::AwaitingPayment => OrderStatus::PaymentFailed,
        SagaPhase::AwaitingDispatch => OrderStatus::DispatchFailed,
        SagaPhase::AwaitingDelivery => OrderStatus::DeliveryFailed,
        _ => return ReducerOutput::unchanged(instance),
    };

    let reason = format!("timed out in {}", instance.phase);
    instance.phase = SagaPhase::Ended;
    instance.awaiting_since = None;
    instance.failure_reason = Some(reason.clone());

    ReducerOutput {
        commands: vec![runtime::Command::UpdateOrderStatus(
            UpdateOrderStatus::with_reason(instance.order_id, status, reason),
        )],
        new_associations: Vec::new(),
        instance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;
    use domain::payment::PaymentMethod;
    use domain::{OrderItem, UserId};

    fn order_created(order_id: AggregateId) -> OrderCreatedData {
        OrderCreatedData {
            order_id,
            user_id: UserId::new(),
            cart_id: AggregateId::new(),
            items: vec![OrderItem::new("SKU-001", "Widget", 2, Money::from_cents(1000))],
            total_amount: Money::from_cents(2000),
            shipping_address: "1 Main St".to_string(),
            created_at: Utc::now(),
        }
    }

    fn payment_processed(instance: &SagaInstance, status: PaymentStatus) -> PaymentProcessedData {
        PaymentProcessedData {
            payment_id: instance.payment_id.unwrap(),
            order_id: instance.order_id,
            amount: instance.total_amount,
            status,
            payment_method: PaymentMethod::CreditCard,
            transaction_id: (status == PaymentStatus::Completed).then(|| "TXN-1".to_string()),
            processed_at: Utc::now(),
        }
    }

    fn order_dispatched(
        instance: &SagaInstance,
        status: DispatchStatus,
        tracking: Option<&str>,
    ) -> OrderDispatchedData {
        OrderDispatchedData {
            dispatch_id: instance.dispatch_id.unwrap(),
            order_id: instance.order_id,
            status,
            tracking_number: tracking.map(str::to_string),
            carrier: domain::dispatch::Carrier::default(),
            dispatched_at: Utc::now(),
        }
    }

    fn started_instance() -> (SagaInstance, AggregateId) {
        let order_id = AggregateId::new();
        let out = start(AggregateId::new(), &order_created(order_id), &SagaConfig::default());
        (out.instance, order_id)
    }

    fn expect_status(command: &runtime::Command, status: OrderStatus) {
        match command {
            runtime::Command::UpdateOrderStatus(cmd) => assert_eq!(cmd.status, status),
            other => panic!("expected UpdateOrderStatus, got {}", other.name()),
        }
    }

    #[test]
    fn start_issues_pending_mark_and_payment_request() {
        let order_id = AggregateId::new();
        let out = start(AggregateId::new(), &order_created(order_id), &SagaConfig::default());

        assert_eq!(out.instance.phase, SagaPhase::AwaitingPayment);
        assert!(out.instance.payment_id.is_some());
        assert!(out.instance.awaiting_since.is_some());

        assert_eq!(out.commands.len(), 2);
        expect_status(&out.commands[0], OrderStatus::PaymentPending);
        match &out.commands[1] {
            runtime::Command::ProcessPayment(cmd) => {
                assert_eq!(cmd.order_id, order_id);
                assert_eq!(cmd.amount, Money::from_cents(2000));
                assert_eq!(cmd.payment_id, out.instance.payment_id.unwrap());
            }
            other => panic!("expected ProcessPayment, got {}", other.name()),
        }

        assert_eq!(out.new_associations.len(), 1);
        assert_eq!(out.new_associations[0].name, AssociationKey::PAYMENT_ID);
    }

    #[test]
    fn completed_payment_marks_paid_and_requests_dispatch() {
        let (instance, order_id) = started_instance();
        let data = payment_processed(&instance, PaymentStatus::Completed);

        let out = apply(
            instance,
            &WorkflowEvent::PaymentProcessed(data),
            &SagaConfig::default(),
        );

        assert_eq!(out.instance.phase, SagaPhase::AwaitingDispatch);
        assert!(out.instance.dispatch_id.is_some());

        assert_eq!(out.commands.len(), 2);
        expect_status(&out.commands[0], OrderStatus::Paid);
        match &out.commands[1] {
            runtime::Command::DispatchOrder(cmd) => {
                assert_eq!(cmd.order_id, order_id);
                assert_eq!(cmd.dispatch_id, out.instance.dispatch_id.unwrap());
            }
            other => panic!("expected DispatchOrder, got {}", other.name()),
        }

        assert_eq!(out.new_associations.len(), 1);
        assert_eq!(out.new_associations[0].name, AssociationKey::DISPATCH_ID);
    }

    #[test]
    fn failed_payment_compensates_and_ends() {
        let (instance, _) = started_instance();
        let data = payment_processed(&instance, PaymentStatus::Failed);

        let out = apply(
            instance,
            &WorkflowEvent::PaymentProcessed(data),
            &SagaConfig::default(),
        );

        assert_eq!(out.instance.phase, SagaPhase::Ended);
        assert_eq!(out.commands.len(), 1);
        expect_status(&out.commands[0], OrderStatus::PaymentFailed);
        // No dispatch is ever requested
        assert!(out.instance.dispatch_id.is_none());
        assert!(out.new_associations.is_empty());
    }

    #[test]
    fn dispatch_flow_happy_path() {
        let (instance, order_id) = started_instance();
        let paid = apply(
            instance.clone(),
            &WorkflowEvent::PaymentProcessed(payment_processed(&instance, PaymentStatus::Completed)),
            &SagaConfig::default(),
        );

        let dispatched = apply(
            paid.instance.clone(),
            &WorkflowEvent::OrderDispatched(order_dispatched(
                &paid.instance,
                DispatchStatus::Dispatched,
                Some("DHL1234567890"),
            )),
            &SagaConfig::default(),
        );

        assert_eq!(dispatched.instance.phase, SagaPhase::AwaitingDelivery);
        assert_eq!(
            dispatched.instance.tracking_number.as_deref(),
            Some("DHL1234567890")
        );

        assert_eq!(dispatched.commands.len(), 2);
        expect_status(&dispatched.commands[0], OrderStatus::Dispatched);
        match &dispatched.commands[1] {
            runtime::Command::DeliverOrder(cmd) => {
                assert_eq!(cmd.order_id, order_id);
                assert_eq!(cmd.tracking_number, "DHL1234567890");
                assert_eq!(cmd.delivery_address, "1 Main St");
            }
            other => panic!("expected DeliverOrder, got {}", other.name()),
        }
    }

    #[test]
    fn unconfirmed_dispatch_compensates_and_ends() {
        let (instance, _) = started_instance();
        let paid = apply(
            instance.clone(),
            &WorkflowEvent::PaymentProcessed(payment_processed(&instance, PaymentStatus::Completed)),
            &SagaConfig::default(),
        );

        let out = apply(
            paid.instance.clone(),
            &WorkflowEvent::OrderDispatched(order_dispatched(
                &paid.instance,
                DispatchStatus::Pending,
                None,
            )),
            &SagaConfig::default(),
        );

        assert_eq!(out.instance.phase, SagaPhase::Ended);
        assert_eq!(out.commands.len(), 1);
        expect_status(&out.commands[0], OrderStatus::DispatchFailed);
    }

    #[test]
    fn delivered_marks_delivered_and_ends() {
        let (instance, _) = started_instance();
        let paid = apply(
            instance.clone(),
            &WorkflowEvent::PaymentProcessed(payment_processed(&instance, PaymentStatus::Completed)),
            &SagaConfig::default(),
        );
        let dispatched = apply(
            paid.instance.clone(),
            &WorkflowEvent::OrderDispatched(order_dispatched(
                &paid.instance,
                DispatchStatus::Dispatched,
                Some("TRK1"),
            )),
            &SagaConfig::default(),
        );

        let delivered_data = OrderDeliveredData {
            delivery_id: dispatched.instance.delivery_id.unwrap(),
            dispatch_id: dispatched.instance.dispatch_id.unwrap(),
            order_id: dispatched.instance.order_id,
            tracking_number: "TRK1".to_string(),
            delivery_address: "1 Main St".to_string(),
            receiver_name: "Customer".to_string(),
            delivery_notes: "Delivered successfully".to_string(),
            delivered_at: Utc::now(),
        };
        let out = apply(
            dispatched.instance,
            &WorkflowEvent::OrderDelivered(delivered_data),
            &SagaConfig::default(),
        );

        assert_eq!(out.instance.phase, SagaPhase::Ended);
        assert_eq!(out.commands.len(), 1);
        expect_status(&out.commands[0], OrderStatus::Delivered);
    }

    #[test]
    fn terminal_instance_ignores_further_events() {
        let (instance, _) = started_instance();
        let failed = apply(
            instance.clone(),
            &WorkflowEvent::PaymentProcessed(payment_processed(&instance, PaymentStatus::Failed)),
            &SagaConfig::default(),
        );
        assert_eq!(failed.instance.phase, SagaPhase::Ended);

        // A stale event after the end changes nothing
        let out = apply(
            failed.instance.clone(),
            &WorkflowEvent::PaymentProcessed(payment_processed(&instance, PaymentStatus::Completed)),
            &SagaConfig::default(),
        );
        assert_eq!(out.instance.phase, SagaPhase::Ended);
        assert!(out.commands.is_empty());
    }

    #[test]
    fn payment_submission_failure_escalates_to_error() {
        let (instance, order_id) = started_instance();
        let failed_cmd = runtime::Command::ProcessPayment(ProcessPayment::new(
            instance.payment_id.unwrap(),
            order_id,
            instance.total_amount,
            PaymentMethod::CreditCard,
        ));

        let out = on_submission_failure(instance, &failed_cmd, "router unreachable");

        assert_eq!(out.instance.phase, SagaPhase::Error);
        assert_eq!(out.commands.len(), 1);
        expect_status(&out.commands[0], OrderStatus::Error);
    }

    #[test]
    fn dispatch_submission_failure_compensates_with_dispatch_failed() {
        let (instance, order_id) = started_instance();
        let failed_cmd = runtime::Command::DispatchOrder(DispatchOrder::new(
            AggregateId::new(),
            order_id,
            domain::dispatch::Carrier::default(),
        ));

        let out = on_submission_failure(instance, &failed_cmd, "conflict retries exhausted");

        assert_eq!(out.instance.phase, SagaPhase::Ended);
        expect_status(&out.commands[0], OrderStatus::DispatchFailed);
    }

    #[test]
    fn status_update_submission_failure_has_no_fallback() {
        let (instance, order_id) = started_instance();
        let failed_cmd = runtime::Command::UpdateOrderStatus(UpdateOrderStatus::new(
            order_id,
            OrderStatus::Paid,
        ));

        let out = on_submission_failure(instance, &failed_cmd, "store down");

        assert_eq!(out.instance.phase, SagaPhase::Error);
        assert!(out.commands.is_empty());
    }

    #[test]
    fn timeout_fails_the_awaited_step() {
        let (instance, _) = started_instance();
        assert_eq!(instance.phase, SagaPhase::AwaitingPayment);

        let out = on_timeout(instance);
        assert_eq!(out.instance.phase, SagaPhase::Ended);
        expect_status(&out.commands[0], OrderStatus::PaymentFailed);
    }

    #[test]
    fn timeout_is_a_noop_outside_awaiting_phases() {
        let (mut instance, _) = started_instance();
        instance.phase = SagaPhase::Ended;

        let out = on_timeout(instance);
        assert!(out.commands.is_empty());
        assert_eq!(out.instance.phase, SagaPhase::Ended);
    }

    #[test]
    fn correlation_keys_per_event() {
        let (instance, order_id) = started_instance();
        let data = payment_processed(&instance, PaymentStatus::Completed);

        let event = WorkflowEvent::OrderCreated(order_created(order_id));
        assert_eq!(event.correlation().name, AssociationKey::ORDER_ID);

        let event = WorkflowEvent::PaymentProcessed(data);
        assert_eq!(event.correlation().name, AssociationKey::PAYMENT_ID);
    }

    #[test]
    fn from_envelope_ignores_unrelated_events() {
        let envelope = EventEnvelope::builder()
            .aggregate_id(AggregateId::new())
            .aggregate_type("Order")
            .event_type("OrderStatusUpdated")
            .sequence(event_store::SequenceNumber::first())
            .payload_raw(serde_json::json!({
                "type": "OrderStatusUpdated",
                "data": {
                    "order_id": AggregateId::new(),
                    "previous_status": "CREATED",
                    "new_status": "PAYMENT_PENDING",
                    "reason": null,
                    "updated_at": Utc::now(),
                }
            }))
            .build();

        let result = WorkflowEvent::from_envelope(&envelope).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn from_envelope_decodes_order_created() {
        let order_id = AggregateId::new();
        let event = OrderEvent::OrderCreated(order_created(order_id));
        let envelope = EventEnvelope::builder()
            .aggregate_id(order_id)
            .aggregate_type("Order")
            .event_type("OrderCreated")
            .sequence(event_store::SequenceNumber::first())
            .payload(&event)
            .unwrap()
            .build();

        let decoded = WorkflowEvent::from_envelope(&envelope).unwrap().unwrap();
        match decoded {
            WorkflowEvent::OrderCreated(data) => assert_eq!(data.order_id, order_id),
            other => panic!("expected OrderCreated, got {}", other.name()),
        }
    }
}
