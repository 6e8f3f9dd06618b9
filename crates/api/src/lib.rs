//! HTTP API server with observability for the order fulfillment
//! workflow.
//!
//! Exposes the command surface (carts, checkout) and the query surface
//! (orders, saga status, event histories), with structured logging
//! (tracing) and Prometheus metrics. The saga orchestrator and the
//! projection pump run as background tasks fed by the event relay.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use event_store::EventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use projections::{CartsView, OrderStatusView, Projection, ProjectionProcessor};
use runtime::{
    Channel, CommandRouter, EventPublisher, SimulatedCarrierGateway, SimulatedPaymentGateway,
};
use saga::{SagaConfig, SagaOrchestrator};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::AppState;

/// Creates the Axum application router with all routes and shared
/// state.
pub fn create_app<S: EventStore + Clone + Send + Sync + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/carts", post(routes::carts::create::<S>))
        .route("/carts/{id}", get(routes::carts::get::<S>))
        .route("/carts/{id}/items", post(routes::carts::add_item::<S>))
        .route(
            "/carts/{id}/items/{item_id}",
            delete(routes::carts::remove_item::<S>),
        )
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/saga", get(routes::orders::saga_status::<S>))
        .route("/orders/{id}/events", get(routes::orders::events::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state with simulated gateways.
pub fn create_default_state<S: EventStore + Clone + Send + Sync + 'static>(
    event_store: S,
) -> Arc<AppState<S>> {
    let publisher = EventPublisher::default();
    let command_router = Arc::new(CommandRouter::new(
        event_store.clone(),
        Arc::new(SimulatedPaymentGateway::new()),
        Arc::new(SimulatedCarrierGateway::new()),
        publisher,
    ));
    let orchestrator = Arc::new(SagaOrchestrator::new(
        command_router.clone(),
        SagaConfig::default(),
    ));

    let order_status = Arc::new(OrderStatusView::new());
    let carts_view = Arc::new(CartsView::new());

    let mut processor = ProjectionProcessor::new(event_store.clone());
    processor.register(Box::new(order_status.as_ref().clone()) as Box<dyn Projection>);
    processor.register(Box::new(carts_view.as_ref().clone()) as Box<dyn Projection>);
    let processor = Arc::new(processor);

    Arc::new(AppState {
        command_router,
        orchestrator,
        order_status,
        carts_view,
        event_store,
        projection_processor: processor,
    })
}

/// Spawns the projection pump: relayed events flow into the registered
/// projections as they are published.
pub fn spawn_projection_pump<S: EventStore + Clone + Send + Sync + 'static>(
    state: &Arc<AppState<S>>,
) -> tokio::task::JoinHandle<()> {
    let publisher = state.command_router.publisher().clone();
    let processor = state.projection_processor.clone();

    tokio::spawn(async move {
        let mut receivers: Vec<_> = Channel::ALL
            .into_iter()
            .map(|c| publisher.subscribe(c))
            .collect();

        loop {
            let mut delivered = false;
            for rx in &mut receivers {
                match rx.try_recv() {
                    Ok(envelope) => {
                        delivered = true;
                        if let Err(e) = processor.process_event(&envelope).await {
                            tracing::error!(error = %e, "projection update failed");
                        }
                    }
                    Err(tokio::sync::broadcast::error::TryRecvError::Closed) => return,
                    Err(_) => {}
                }
            }
            if !delivered {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
        }
    })
}
