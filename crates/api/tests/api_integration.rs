//! Integration tests for the API server.
//!
//! The full stack runs in-process: router, relay, saga runner, and
//! projection pump, with deterministic gateways in place of the
//! simulated ones.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use event_store::InMemoryEventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use projections::{CartsView, OrderStatusView, Projection, ProjectionProcessor};
use runtime::{CommandRouter, EventPublisher, FixedCarrierGateway, FixedPaymentGateway};
use saga::{SagaConfig, SagaOrchestrator};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestStack {
    app: axum::Router,
    state: Arc<api::AppState<InMemoryEventStore>>,
    payments: FixedPaymentGateway,
    #[allow(dead_code)]
    carriers: FixedCarrierGateway,
}

fn setup() -> TestStack {
    let event_store = InMemoryEventStore::new();
    let payments = FixedPaymentGateway::new();
    let carriers = FixedCarrierGateway::new();

    let command_router = Arc::new(CommandRouter::new(
        event_store.clone(),
        Arc::new(payments.clone()),
        Arc::new(carriers.clone()),
        EventPublisher::default(),
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

    let state = Arc::new(api::AppState {
        command_router,
        orchestrator,
        order_status,
        carts_view,
        event_store,
        projection_processor: Arc::new(processor),
    });

    let _saga_runner = state.orchestrator.clone().spawn();
    let _projection_pump = api::spawn_projection_pump(&state);

    let app = api::create_app(state.clone(), get_metrics_handle());

    TestStack {
        app,
        state,
        payments,
        carriers,
    }
}

async fn request_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_string(&json).unwrap())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Creates a cart with one widget and checks out; returns the order id.
async fn checkout(app: &axum::Router) -> String {
    let (status, cart) = request_json(app, "POST", "/carts", Some(serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let cart_id = cart["cart_id"].as_str().unwrap().to_string();

    let (status, _) = request_json(
        app,
        "POST",
        &format!("/carts/{cart_id}/items"),
        Some(serde_json::json!({
            "product_id": "SKU-001",
            "product_name": "Widget",
            "quantity": 2,
            "unit_price_cents": 1000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, order) = request_json(
        app,
        "POST",
        "/orders",
        Some(serde_json::json!({
            "cart_id": cart_id,
            "shipping_address": "1 Main St"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["total_cents"], 2000);
    order["order_id"].as_str().unwrap().to_string()
}

/// Polls until the order reaches the wanted status or a deadline
/// passes.
async fn await_status(app: &axum::Router, order_id: &str, wanted: &str) {
    for _ in 0..200 {
        let (status, order) = request_json(app, "GET", &format!("/orders/{order_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        if order["status"] == wanted {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("order {order_id} never reached status {wanted}");
}

#[tokio::test]
async fn health_check() {
    let stack = setup();

    let (status, json) = request_json(&stack.app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn cart_roundtrip() {
    let stack = setup();

    let (status, cart) =
        request_json(&stack.app, "POST", "/carts", Some(serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let cart_id = cart["cart_id"].as_str().unwrap();

    let (status, added) = request_json(
        &stack.app,
        "POST",
        &format!("/carts/{cart_id}/items"),
        Some(serde_json::json!({
            "product_id": "SKU-001",
            "product_name": "Widget",
            "quantity": 3,
            "unit_price_cents": 1999
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(added["subtotal_cents"], 5997);
    let cart_item_id = added["cart_item_id"].as_str().unwrap();

    let (status, loaded) =
        request_json(&stack.app, "GET", &format!("/carts/{cart_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loaded["total_cents"], 5997);
    assert_eq!(loaded["items"].as_array().unwrap().len(), 1);

    let (status, _) = request_json(
        &stack.app,
        "DELETE",
        &format!("/carts/{cart_id}/items/{cart_item_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, loaded) = request_json(&stack.app, "GET", &format!("/carts/{cart_id}"), None).await;
    assert_eq!(loaded["total_cents"], 0);
}

#[tokio::test]
async fn removing_unknown_cart_item_is_not_found() {
    let stack = setup();

    let (_, cart) = request_json(&stack.app, "POST", "/carts", Some(serde_json::json!({}))).await;
    let cart_id = cart["cart_id"].as_str().unwrap();

    let bogus_item = uuid::Uuid::new_v4();
    let (status, _) = request_json(
        &stack.app,
        "DELETE",
        &format!("/carts/{cart_id}/items/{bogus_item}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_ids_are_bad_requests() {
    let stack = setup();

    let (status, _) = request_json(&stack.app, "GET", "/carts/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request_json(&stack.app, "GET", "/orders/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn checkout_runs_the_workflow_to_delivered() {
    let stack = setup();
    let order_id = checkout(&stack.app).await;

    await_status(&stack.app, &order_id, "DELIVERED").await;

    // The saga's view agrees and is terminal
    let (status, saga) =
        request_json(&stack.app, "GET", &format!("/orders/{order_id}/saga"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saga["phase"], "Ended");
    assert!(saga["tracking_number"].as_str().is_some());

    // Event history: OrderCreated plus the four status updates
    let (status, events) =
        request_json(&stack.app, "GET", &format!("/orders/{order_id}/events"), None).await;
    assert_eq!(status, StatusCode::OK);
    let events = events.as_array().unwrap().clone();
    assert_eq!(events.len(), 5);
    assert_eq!(events[0]["event_type"], "OrderCreated");
    assert!(
        events[1..]
            .iter()
            .all(|e| e["event_type"] == "OrderStatusUpdated")
    );
}

#[tokio::test]
async fn declined_payment_shows_payment_failed() {
    let stack = setup();
    stack.payments.set_decline(true);

    let order_id = checkout(&stack.app).await;
    await_status(&stack.app, &order_id, "PAYMENT_FAILED").await;

    let (_, saga) =
        request_json(&stack.app, "GET", &format!("/orders/{order_id}/saga"), None).await;
    assert_eq!(saga["phase"], "Ended");
    assert!(saga["dispatch_id"].is_null());
}

#[tokio::test]
async fn orders_list_reflects_projection() {
    let stack = setup();
    let order_id = checkout(&stack.app).await;
    await_status(&stack.app, &order_id, "DELIVERED").await;

    // Give the projection pump a moment to drain the relay
    for _ in 0..100 {
        if stack.state.order_status.get_all_orders().await.len() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let (status, orders) = request_json(&stack.app, "GET", "/orders", None).await;
    assert_eq!(status, StatusCode::OK);
    let orders = orders.as_array().unwrap().clone();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["order_id"], order_id.as_str());
}

#[tokio::test]
async fn metrics_endpoint_renders() {
    let stack = setup();

    let response = stack
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
