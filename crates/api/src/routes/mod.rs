//! HTTP route handlers.

pub mod carts;
pub mod health;
pub mod metrics;
pub mod orders;

use std::sync::Arc;

use event_store::EventStore;
use projections::{CartsView, OrderStatusView, ProjectionProcessor};
use runtime::CommandRouter;
use saga::SagaOrchestrator;

/// Shared application state accessible from all handlers.
pub struct AppState<S: EventStore + Clone> {
    pub command_router: Arc<CommandRouter<S>>,
    pub orchestrator: Arc<SagaOrchestrator<S>>,
    pub order_status: Arc<OrderStatusView>,
    pub carts_view: Arc<CartsView>,
    pub event_store: S,
    pub projection_processor: Arc<ProjectionProcessor<S>>,
}

/// Parses a path segment as an aggregate id.
pub(crate) fn parse_aggregate_id(id: &str) -> Result<common::AggregateId, crate::error::ApiError> {
    id.parse()
        .map_err(|e| crate::error::ApiError::BadRequest(format!("Invalid id '{id}': {e}")))
}
