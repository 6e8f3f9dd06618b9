//! Command router: resolves commands to aggregates and publishes results.

use std::collections::HashMap;
use std::sync::Arc;

use common::AggregateId;
use domain::{
    Cart, CommandHandler, Delivery, Dispatch, DomainError, Order, Payment,
    dispatch::DispatchOutcome, payment::PaymentOutcome,
};
use event_store::{EventEnvelope, EventStore, SequenceNumber};
use tokio::sync::Mutex;

use crate::command::Command;
use crate::error::RouterError;
use crate::gateways::{CarrierGateway, PaymentGateway};
use crate::publisher::EventPublisher;

/// How many times a concurrency conflict is retried with
/// reload-and-reapply before the failure is surfaced to the caller.
const MAX_CONFLICT_RETRIES: u32 = 3;

/// Result of a successfully routed command.
#[derive(Debug)]
pub struct Submission {
    /// The aggregate the command landed on.
    pub aggregate_id: AggregateId,

    /// The aggregate's log position after the append.
    pub new_sequence: SequenceNumber,

    /// The appended envelopes, already relayed to the publisher.
    pub envelopes: Vec<EventEnvelope>,
}

/// Routes commands to their target aggregate.
///
/// The router is the single entry point of the command path: it locates
/// (or lazily creates, for constructor-style commands) the target
/// aggregate, runs the command through the aggregate runtime, retries
/// bounded on optimistic-concurrency conflicts, and relays appended
/// events to the publisher.
///
/// Each aggregate id is a single-writer serialization domain: commands
/// against the same id queue on a per-id async lock, while commands
/// against different ids proceed fully in parallel.
pub struct CommandRouter<S: EventStore + Clone> {
    store: S,
    payments: Arc<dyn PaymentGateway>,
    carriers: Arc<dyn CarrierGateway>,
    publisher: EventPublisher,
    locks: Mutex<HashMap<AggregateId, Arc<Mutex<()>>>>,
}

impl<S: EventStore + Clone> CommandRouter<S> {
    /// Creates a new command router.
    pub fn new(
        store: S,
        payments: Arc<dyn PaymentGateway>,
        carriers: Arc<dyn CarrierGateway>,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            store,
            payments,
            carriers,
            publisher,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the event publisher fed by this router.
    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    /// Returns the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Dispatches a command to its target aggregate.
    ///
    /// Returns the appended events on success. Validation rejections
    /// surface immediately and are never retried; concurrency conflicts
    /// are retried up to [`MAX_CONFLICT_RETRIES`] times with
    /// reload-and-reapply before surfacing as a technical failure.
    #[tracing::instrument(skip(self, command), fields(command = command.name(), target = %command.target()))]
    pub async fn dispatch(&self, command: Command) -> Result<Submission, RouterError> {
        let target = command.target();

        // Gateway calls happen once per dispatch, outside the retry
        // loop, so a conflict retry does not double-charge.
        let payment_outcome = self.prepare_payment_outcome(&command).await;
        let dispatch_outcome = self.prepare_dispatch_outcome(&command).await;

        let id_lock = self.lock_for(target).await;
        let _guard = id_lock.lock().await;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self
                .execute(&command, payment_outcome.clone(), dispatch_outcome.clone())
                .await;

            match result {
                Ok(submission) => {
                    self.publisher.publish(&submission.envelopes);
                    metrics::counter!("commands_dispatched_total", "command" => command.name())
                        .increment(1);
                    return Ok(submission);
                }
                Err(e) if e.is_concurrency_conflict() => {
                    if attempt > MAX_CONFLICT_RETRIES {
                        metrics::counter!("commands_conflict_exhausted_total").increment(1);
                        tracing::warn!(%target, attempt, "concurrency retries exhausted");
                        return Err(RouterError::ConflictRetriesExhausted {
                            aggregate_id: target,
                            attempts: attempt,
                        });
                    }
                    tracing::debug!(%target, attempt, "concurrency conflict, reloading");
                }
                Err(e) => {
                    metrics::counter!("commands_rejected_total", "command" => command.name())
                        .increment(1);
                    return Err(RouterError::Domain(e));
                }
            }
        }
    }

    async fn execute(
        &self,
        command: &Command,
        payment_outcome: Option<PaymentOutcome>,
        dispatch_outcome: Option<DispatchOutcome>,
    ) -> Result<Submission, DomainError> {
        match command {
            Command::CreateCart(cmd) => {
                let handler: CommandHandler<S, Cart> = CommandHandler::new(self.store.clone());
                let cart_id = cmd.cart_id;
                let user_id = cmd.user_id;
                let result = handler
                    .execute(cart_id, |cart| cart.create(cart_id, user_id))
                    .await?;
                Ok(Submission {
                    aggregate_id: cart_id,
                    new_sequence: result.new_sequence,
                    envelopes: result.envelopes,
                })
            }
            Command::AddItemToCart(cmd) => {
                let handler: CommandHandler<S, Cart> = CommandHandler::new(self.store.clone());
                let cmd = cmd.clone();
                let result = handler
                    .execute(cmd.cart_id, move |cart| {
                        cart.add_item(
                            cmd.product_id,
                            cmd.product_name,
                            cmd.quantity,
                            cmd.unit_price,
                        )
                    })
                    .await?;
                Ok(Submission {
                    aggregate_id: command.target(),
                    new_sequence: result.new_sequence,
                    envelopes: result.envelopes,
                })
            }
            Command::RemoveItemFromCart(cmd) => {
                let handler: CommandHandler<S, Cart> = CommandHandler::new(self.store.clone());
                let cart_item_id = cmd.cart_item_id;
                let result = handler
                    .execute(cmd.cart_id, move |cart| cart.remove_item(cart_item_id))
                    .await?;
                Ok(Submission {
                    aggregate_id: command.target(),
                    new_sequence: result.new_sequence,
                    envelopes: result.envelopes,
                })
            }
            Command::CreateOrder(cmd) => {
                let handler: CommandHandler<S, Order> = CommandHandler::new(self.store.clone());
                let cmd = cmd.clone();
                let result = handler
                    .execute(cmd.order_id, move |order| {
                        order.create(
                            cmd.order_id,
                            cmd.user_id,
                            cmd.cart_id,
                            cmd.items,
                            cmd.total_amount,
                            cmd.shipping_address,
                        )
                    })
                    .await?;
                Ok(Submission {
                    aggregate_id: command.target(),
                    new_sequence: result.new_sequence,
                    envelopes: result.envelopes,
                })
            }
            Command::UpdateOrderStatus(cmd) => {
                let handler: CommandHandler<S, Order> = CommandHandler::new(self.store.clone());
                let cmd = cmd.clone();
                let result = handler
                    .execute(cmd.order_id, move |order| {
                        order.update_status(cmd.status, cmd.reason)
                    })
                    .await?;
                Ok(Submission {
                    aggregate_id: command.target(),
                    new_sequence: result.new_sequence,
                    envelopes: result.envelopes,
                })
            }
            Command::ProcessPayment(cmd) => {
                let handler: CommandHandler<S, Payment> = CommandHandler::new(self.store.clone());
                let cmd = cmd.clone();
                let outcome = payment_outcome.expect("payment outcome prepared for ProcessPayment");
                let result = handler
                    .execute(cmd.payment_id, move |payment| {
                        payment.process(
                            cmd.payment_id,
                            cmd.order_id,
                            cmd.amount,
                            cmd.payment_method,
                            outcome,
                        )
                    })
                    .await?;
                Ok(Submission {
                    aggregate_id: command.target(),
                    new_sequence: result.new_sequence,
                    envelopes: result.envelopes,
                })
            }
            Command::DispatchOrder(cmd) => {
                let handler: CommandHandler<S, Dispatch> = CommandHandler::new(self.store.clone());
                let cmd = cmd.clone();
                let outcome =
                    dispatch_outcome.expect("dispatch outcome prepared for DispatchOrder");
                let result = handler
                    .execute(cmd.dispatch_id, move |dispatch| {
                        dispatch.process(cmd.dispatch_id, cmd.order_id, cmd.carrier, outcome)
                    })
                    .await?;
                Ok(Submission {
                    aggregate_id: command.target(),
                    new_sequence: result.new_sequence,
                    envelopes: result.envelopes,
                })
            }
            Command::DeliverOrder(cmd) => {
                let handler: CommandHandler<S, Delivery> = CommandHandler::new(self.store.clone());
                let cmd = cmd.clone();
                let result = handler
                    .execute(cmd.delivery_id, move |delivery| {
                        delivery.deliver(
                            cmd.delivery_id,
                            cmd.dispatch_id,
                            cmd.order_id,
                            cmd.tracking_number,
                            cmd.delivery_address,
                            "Customer",
                            "Delivered successfully",
                        )
                    })
                    .await?;
                Ok(Submission {
                    aggregate_id: command.target(),
                    new_sequence: result.new_sequence,
                    envelopes: result.envelopes,
                })
            }
        }
    }

    /// Calls the payment gateway for a ProcessPayment command.
    ///
    /// A technical gateway failure is recorded as a FAILED outcome — the
    /// decision must land in the log as a fact so the saga can react
    /// uniformly.
    async fn prepare_payment_outcome(&self, command: &Command) -> Option<PaymentOutcome> {
        let Command::ProcessPayment(cmd) = command else {
            return None;
        };

        match self
            .payments
            .authorize(cmd.order_id, cmd.amount, cmd.payment_method)
            .await
        {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(order_id = %cmd.order_id, error = %e, "payment gateway failed, recording FAILED");
                Some(PaymentOutcome::failed())
            }
        }
    }

    /// Calls the carrier gateway for a DispatchOrder command.
    ///
    /// A technical carrier failure is recorded as a FAILED outcome, same
    /// as above.
    async fn prepare_dispatch_outcome(&self, command: &Command) -> Option<DispatchOutcome> {
        let Command::DispatchOrder(cmd) = command else {
            return None;
        };

        match self.carriers.book(cmd.order_id, &cmd.carrier).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(order_id = %cmd.order_id, error = %e, "carrier gateway failed, recording FAILED");
                Some(DispatchOutcome::failed())
            }
        }
    }

    async fn lock_for(&self, aggregate_id: AggregateId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(aggregate_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

// Query-side loads for the API and tests.
impl<S: EventStore + Clone> CommandRouter<S> {
    /// Loads a cart by id, None if it doesn't exist.
    pub async fn load_cart(&self, id: AggregateId) -> Result<Option<Cart>, DomainError> {
        let handler: CommandHandler<S, Cart> = CommandHandler::new(self.store.clone());
        handler.load_existing(id).await
    }

    /// Loads an order by id, None if it doesn't exist.
    pub async fn load_order(&self, id: AggregateId) -> Result<Option<Order>, DomainError> {
        let handler: CommandHandler<S, Order> = CommandHandler::new(self.store.clone());
        handler.load_existing(id).await
    }

    /// Loads a payment by id, None if it doesn't exist.
    pub async fn load_payment(&self, id: AggregateId) -> Result<Option<Payment>, DomainError> {
        let handler: CommandHandler<S, Payment> = CommandHandler::new(self.store.clone());
        handler.load_existing(id).await
    }

    /// Loads a dispatch by id, None if it doesn't exist.
    pub async fn load_dispatch(&self, id: AggregateId) -> Result<Option<Dispatch>, DomainError> {
        let handler: CommandHandler<S, Dispatch> = CommandHandler::new(self.store.clone());
        handler.load_existing(id).await
    }

    /// Loads a delivery by id, None if it doesn't exist.
    pub async fn load_delivery(&self, id: AggregateId) -> Result<Option<Delivery>, DomainError> {
        let handler: CommandHandler<S, Delivery> = CommandHandler::new(self.store.clone());
        handler.load_existing(id).await
    }
}
