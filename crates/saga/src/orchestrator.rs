//! The orchestrator shell around the saga reducer.
//!
//! Owns the registry of live instances and their association-key index,
//! routes relayed events to the matching instance, submits the
//! reducer's commands, and sweeps overdue instances. All decision logic
//! lives in [`crate::reducer`]; this module only does I/O and
//! bookkeeping.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use common::AggregateId;
use event_store::{EventEnvelope, EventStore};
use runtime::{Channel, Command, CommandRouter};
use tokio::sync::Mutex;

use crate::config::SagaConfig;
use crate::error::SagaError;
use crate::instance::{AssociationKey, SagaInstance};
use crate::reducer::{self, WorkflowEvent};

#[derive(Default)]
struct SagaRegistry {
    /// Live instances by saga id.
    active: HashMap<AggregateId, SagaInstance>,

    /// Association-key index: (name, value) → saga id.
    index: HashMap<(String, String), AggregateId>,

    /// Terminal instances, kept for inspection.
    retired: HashMap<AggregateId, SagaInstance>,
}

impl SagaRegistry {
    /// Registers an association key for a live instance.
    ///
    /// A key already owned by a different live instance makes event
    /// correlation ambiguous; that is a fatal error, never ignored.
    fn register(&mut self, saga_id: AggregateId, key: AssociationKey) -> Result<(), SagaError> {
        match self.index.get(&key.pair()) {
            Some(existing) if *existing != saga_id => Err(SagaError::AssociationCollision {
                name: key.name,
                value: key.value,
                existing: *existing,
                incoming: saga_id,
            }),
            _ => {
                self.index.insert(key.pair(), saga_id);
                Ok(())
            }
        }
    }

    /// Retires an instance: frees its keys and moves it out of the
    /// active set. No event delivered after this point can re-activate
    /// it.
    fn retire(&mut self, saga_id: AggregateId, instance: SagaInstance) {
        for key in instance.association_keys() {
            self.index.remove(&key.pair());
        }
        self.active.remove(&saga_id);
        self.retired.insert(saga_id, instance);
    }
}

/// Correlates workflow events to saga instances and drives them.
pub struct SagaOrchestrator<S: EventStore + Clone> {
    router: Arc<CommandRouter<S>>,
    config: SagaConfig,
    registry: Mutex<SagaRegistry>,
}

impl<S: EventStore + Clone + Send + Sync + 'static> SagaOrchestrator<S> {
    /// Creates a new orchestrator submitting commands through the given
    /// router.
    pub fn new(router: Arc<CommandRouter<S>>, config: SagaConfig) -> Self {
        Self {
            router,
            config,
            registry: Mutex::new(SagaRegistry::default()),
        }
    }

    /// Handles one relayed event.
    ///
    /// Events the saga does not react to, and events whose correlation
    /// key matches no live instance (the saga already ended), are
    /// dropped — that is normal operation, not an error.
    #[tracing::instrument(skip(self, envelope), fields(event_type = %envelope.event_type))]
    pub async fn handle_event(&self, envelope: &EventEnvelope) -> Result<(), SagaError> {
        let Some(event) = WorkflowEvent::from_envelope(envelope)? else {
            return Ok(());
        };

        match &event {
            WorkflowEvent::OrderCreated(data) => self.start_saga(data.clone()).await,
            _ => self.advance_saga(&event).await,
        }
    }

    async fn start_saga(
        &self,
        order: domain::order::OrderCreatedData,
    ) -> Result<(), SagaError> {
        let saga_id = AggregateId::new();
        let out = reducer::start(saga_id, &order, &self.config);

        {
            let mut registry = self.registry.lock().await;

            // At most one saga instance per order id, ever.
            let order_key = AssociationKey::order_id(order.order_id);
            if registry.index.contains_key(&order_key.pair()) {
                tracing::warn!(order_id = %order.order_id, "duplicate OrderCreated, dropping");
                metrics::counter!("saga_events_dropped_total").increment(1);
                return Ok(());
            }

            registry.register(saga_id, order_key)?;
            for key in &out.new_associations {
                registry.register(saga_id, key.clone())?;
            }
            registry.active.insert(saga_id, out.instance.clone());
        }

        metrics::counter!("saga_started_total").increment(1);
        tracing::info!(%saga_id, order_id = %order.order_id, "saga started");

        let instance = self.submit_all(out.instance, out.commands).await;
        self.finalize(saga_id, instance).await;
        Ok(())
    }

    async fn advance_saga(&self, event: &WorkflowEvent) -> Result<(), SagaError> {
        let key = event.correlation();

        let (saga_id, instance) = {
            let registry = self.registry.lock().await;
            match registry.index.get(&key.pair()) {
                Some(saga_id) => (*saga_id, registry.active.get(saga_id).cloned()),
                None => {
                    // The saga already ended (or never existed); drop.
                    tracing::debug!(event = event.name(), %key, "no matching saga instance, dropping");
                    metrics::counter!("saga_events_dropped_total").increment(1);
                    return Ok(());
                }
            }
        };

        let Some(instance) = instance else {
            return Ok(());
        };

        let out = reducer::apply(instance, event, &self.config);

        {
            let mut registry = self.registry.lock().await;
            for key in &out.new_associations {
                registry.register(saga_id, key.clone())?;
            }
            registry.active.insert(saga_id, out.instance.clone());
        }

        let instance = self.submit_all(out.instance, out.commands).await;
        self.finalize(saga_id, instance).await;
        Ok(())
    }

    /// Submits the reducer's commands in order.
    ///
    /// A submission failure re-enters the reducer so the failure becomes
    /// an explicit compensating status update; the compensation itself
    /// is best-effort (if even that fails, the instance still reaches a
    /// terminal phase and the failure is logged loudly).
    async fn submit_all(
        &self,
        mut instance: SagaInstance,
        commands: Vec<Command>,
    ) -> SagaInstance {
        for command in commands {
            match self.router.dispatch(command.clone()).await {
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        command = command.name(),
                        error = %e,
                        saga_id = %instance.saga_id,
                        "command submission failed, compensating"
                    );
                    metrics::counter!("saga_submission_failures_total").increment(1);

                    let out = reducer::on_submission_failure(instance, &command, &e.to_string());
                    instance = out.instance;

                    for compensation in out.commands {
                        if let Err(e2) = self.router.dispatch(compensation).await {
                            tracing::error!(
                                saga_id = %instance.saga_id,
                                order_id = %instance.order_id,
                                error = %e2,
                                "failed to record compensating status update"
                            );
                        }
                    }
                    break;
                }
            }
        }
        instance
    }

    /// Persists the instance's post-step state and retires it when
    /// terminal.
    async fn finalize(&self, saga_id: AggregateId, instance: SagaInstance) {
        let mut registry = self.registry.lock().await;
        if instance.is_terminal() {
            tracing::info!(
                %saga_id,
                order_id = %instance.order_id,
                phase = %instance.phase,
                "saga retired"
            );
            metrics::counter!("saga_retired_total", "phase" => instance.phase.as_str())
                .increment(1);
            registry.retire(saga_id, instance);
        } else {
            registry.active.insert(saga_id, instance);
        }
    }

    /// Fails every instance that has waited past the configured window.
    ///
    /// Driven periodically by the runner; callable directly in tests.
    pub async fn sweep_timeouts(&self) -> Result<(), SagaError> {
        let now = Utc::now();
        let overdue: Vec<(AggregateId, SagaInstance)> = {
            let registry = self.registry.lock().await;
            registry
                .active
                .iter()
                .filter(|(_, instance)| instance.is_overdue(now, self.config.step_timeout))
                .map(|(id, instance)| (*id, instance.clone()))
                .collect()
        };

        for (saga_id, instance) in overdue {
            tracing::warn!(
                %saga_id,
                order_id = %instance.order_id,
                phase = %instance.phase,
                "saga timed out"
            );
            metrics::counter!("saga_timeouts_total").increment(1);

            let out = reducer::on_timeout(instance);
            let instance = self.submit_all(out.instance, out.commands).await;
            self.finalize(saga_id, instance).await;
        }

        Ok(())
    }

    /// Returns the number of live instances.
    pub async fn active_count(&self) -> usize {
        self.registry.lock().await.active.len()
    }

    /// Looks up the instance fulfilling an order, live or retired.
    pub async fn instance_for_order(&self, order_id: AggregateId) -> Option<SagaInstance> {
        let registry = self.registry.lock().await;
        registry
            .active
            .values()
            .chain(registry.retired.values())
            .find(|instance| instance.order_id == order_id)
            .cloned()
    }

    /// Re-registers an instance loaded from persistence, with all of
    /// its association keys, so the workflow resumes where it left off.
    pub async fn restore(&self, instance: SagaInstance) -> Result<(), SagaError> {
        let mut registry = self.registry.lock().await;
        let saga_id = instance.saga_id;
        for key in instance.association_keys() {
            registry.register(saga_id, key)?;
        }
        registry.active.insert(saga_id, instance);
        Ok(())
    }

    /// Spawns the runner: a task consuming the order, payment,
    /// dispatch, and delivery channels and a periodic timeout sweep.
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let publisher = self.router.publisher().clone();
        tokio::spawn(async move {
            let mut orders = publisher.subscribe(Channel::Order);
            let mut payments = publisher.subscribe(Channel::Payment);
            let mut dispatches = publisher.subscribe(Channel::Dispatch);
            let mut deliveries = publisher.subscribe(Channel::Delivery);
            let period = (self.config.step_timeout / 2).max(std::time::Duration::from_millis(100));
            let mut sweep = tokio::time::interval(period);

            loop {
                let result = tokio::select! {
                    event = orders.recv() => event.map(Some),
                    event = payments.recv() => event.map(Some),
                    event = dispatches.recv() => event.map(Some),
                    event = deliveries.recv() => event.map(Some),
                    _ = sweep.tick() => Ok(None),
                };

                match result {
                    Ok(Some(envelope)) => {
                        if let Err(e) = self.handle_event(&envelope).await {
                            tracing::error!(error = %e, "saga event handling failed");
                        }
                    }
                    Ok(None) => {
                        if let Err(e) = self.sweep_timeouts().await {
                            tracing::error!(error = %e, "saga timeout sweep failed");
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "saga runner lagged behind the relay");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;
    use domain::{OrderItem, UserId, order::OrderCreatedData};
    use event_store::InMemoryEventStore;
    use runtime::{EventPublisher, FixedCarrierGateway, FixedPaymentGateway};

    fn setup() -> Arc<SagaOrchestrator<InMemoryEventStore>> {
        let router = Arc::new(CommandRouter::new(
            InMemoryEventStore::new(),
            Arc::new(FixedPaymentGateway::new()),
            Arc::new(FixedCarrierGateway::new()),
            EventPublisher::new(64),
        ));
        Arc::new(SagaOrchestrator::new(router, SagaConfig::default()))
    }

    fn order_created_envelope(order_id: AggregateId) -> EventEnvelope {
        let data = OrderCreatedData {
            order_id,
            user_id: UserId::new(),
            cart_id: AggregateId::new(),
            items: vec![OrderItem::new("SKU-001", "Widget", 2, Money::from_cents(1000))],
            total_amount: Money::from_cents(2000),
            shipping_address: "1 Main St".to_string(),
            created_at: Utc::now(),
        };
        let event = domain::order::OrderEvent::OrderCreated(data);
        EventEnvelope::builder()
            .aggregate_id(order_id)
            .aggregate_type("Order")
            .event_type("OrderCreated")
            .sequence(event_store::SequenceNumber::first())
            .payload(&event)
            .unwrap()
            .build()
    }

    #[tokio::test]
    async fn order_created_starts_exactly_one_saga() {
        let orchestrator = setup();
        let order_id = AggregateId::new();

        orchestrator
            .handle_event(&order_created_envelope(order_id))
            .await
            .unwrap();
        assert_eq!(orchestrator.active_count().await, 1);

        // A redelivered creation event is dropped, not double-started
        orchestrator
            .handle_event(&order_created_envelope(order_id))
            .await
            .unwrap();
        assert_eq!(orchestrator.active_count().await, 1);
    }

    #[tokio::test]
    async fn uncorrelated_event_is_dropped() {
        let orchestrator = setup();

        let data = domain::payment::PaymentProcessedData {
            payment_id: AggregateId::new(),
            order_id: AggregateId::new(),
            amount: Money::from_cents(2000),
            status: domain::payment::PaymentStatus::Completed,
            payment_method: domain::payment::PaymentMethod::CreditCard,
            transaction_id: Some("TXN-1".to_string()),
            processed_at: Utc::now(),
        };
        let event = domain::payment::PaymentEvent::PaymentProcessed(data);
        let envelope = EventEnvelope::builder()
            .aggregate_id(AggregateId::new())
            .aggregate_type("Payment")
            .event_type("PaymentProcessed")
            .sequence(event_store::SequenceNumber::first())
            .payload(&event)
            .unwrap()
            .build();

        // No saga holds this payment id: dropped without error
        orchestrator.handle_event(&envelope).await.unwrap();
        assert_eq!(orchestrator.active_count().await, 0);
    }

    #[tokio::test]
    async fn restore_reinstates_instance_and_keys() {
        let orchestrator = setup();
        let order_id = AggregateId::new();

        orchestrator
            .handle_event(&order_created_envelope(order_id))
            .await
            .unwrap();

        let instance = orchestrator.instance_for_order(order_id).await.unwrap();
        let json = serde_json::to_string(&instance).unwrap();

        // A second orchestrator (fresh process) resumes from the record
        let restored: SagaInstance = serde_json::from_str(&json).unwrap();
        let other = setup();
        other.restore(restored).await.unwrap();
        assert_eq!(other.active_count().await, 1);

        let resumed = other.instance_for_order(order_id).await.unwrap();
        assert_eq!(resumed.phase, instance.phase);
        assert_eq!(resumed.payment_id, instance.payment_id);
    }

    #[tokio::test]
    async fn restore_detects_key_collision() {
        let orchestrator = setup();
        let order_id = AggregateId::new();

        orchestrator
            .handle_event(&order_created_envelope(order_id))
            .await
            .unwrap();

        let mut stolen = orchestrator.instance_for_order(order_id).await.unwrap();
        stolen.saga_id = AggregateId::new();

        let result = orchestrator.restore(stolen).await;
        assert!(matches!(
            result,
            Err(SagaError::AssociationCollision { .. })
        ));
    }
}
