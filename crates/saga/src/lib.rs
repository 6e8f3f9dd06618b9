//! Order fulfillment saga.
//!
//! The saga drives the cross-aggregate workflow
//! order → payment → dispatch → delivery to completion or to a reported
//! failure, purely through asynchronous message exchange:
//!
//! 1. On `OrderCreated` it submits a payment request.
//! 2. On `PaymentProcessed` it marks the order PAID and requests
//!    dispatch, or marks PAYMENT_FAILED and ends.
//! 3. On `OrderDispatched` it marks the order DISPATCHED and requests
//!    delivery, or marks DISPATCH_FAILED and ends.
//! 4. On `OrderDelivered` it marks the order DELIVERED and ends.
//!
//! Compensation is forward-only: a failed or unsubmittable step becomes
//! an explicit `*_FAILED`/`ERROR` order status rather than a rollback,
//! so a stuck workflow is always user-visible.
//!
//! The decision logic is a pure reducer
//! (`SagaInstance`, incoming event) → (new instance, outgoing commands);
//! command submission, association-key indexing, and timeout sweeping
//! live in the orchestrator shell.

pub mod config;
pub mod error;
pub mod instance;
pub mod orchestrator;
pub mod reducer;
pub mod state;

pub use config::SagaConfig;
pub use error::SagaError;
pub use instance::{AssociationKey, SagaInstance};
pub use orchestrator::SagaOrchestrator;
pub use reducer::{ReducerOutput, WorkflowEvent};
pub use state::SagaPhase;
