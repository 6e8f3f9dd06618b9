//! Order checkout and query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::AggregateId;
use domain::{CreateOrder, OrderItem};
use event_store::EventStore;
use runtime::Command;
use serde::{Deserialize, Serialize};

use super::{AppState, parse_aggregate_id};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub cart_id: String,
    pub shipping_address: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderCreatedResponse {
    pub order_id: String,
    pub status: String,
    pub total_cents: i64,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub order_id: String,
    pub user_id: String,
    pub cart_id: String,
    pub status: String,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub shipping_address: String,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

#[derive(Serialize)]
pub struct OrderSummaryResponse {
    pub order_id: String,
    pub user_id: String,
    pub status: String,
    pub item_count: usize,
    pub total_cents: i64,
}

#[derive(Serialize)]
pub struct SagaStatusResponse {
    pub saga_id: String,
    pub order_id: String,
    pub phase: String,
    pub payment_id: Option<String>,
    pub dispatch_id: Option<String>,
    pub delivery_id: Option<String>,
    pub tracking_number: Option<String>,
    pub failure_reason: Option<String>,
}

#[derive(Serialize)]
pub struct EventResponse {
    pub event_type: String,
    pub sequence: i64,
    pub occurred_at: chrono::DateTime<chrono::Utc>,
    pub payload: serde_json::Value,
}

// -- Handlers --

/// POST /orders — checkout: create an order from a cart's contents.
///
/// The fulfillment workflow (payment → dispatch → delivery) runs
/// asynchronously from here; poll the order's status to observe it.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: EventStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CheckoutRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let cart_id = parse_aggregate_id(&req.cart_id)?;

    let cart = state
        .command_router
        .load_cart(cart_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Cart {cart_id} not found")))?;

    let user_id = cart
        .user_id()
        .ok_or_else(|| ApiError::Internal("cart has no owner".to_string()))?;

    let mut lines: Vec<_> = cart.items().cloned().collect();
    lines.sort_by(|a, b| a.cart_item_id.as_uuid().cmp(&b.cart_item_id.as_uuid()));
    let items: Vec<OrderItem> = lines
        .into_iter()
        .map(|line| OrderItem::new(line.product_id, line.product_name, line.quantity, line.unit_price))
        .collect();
    let total_amount = cart.total_amount();

    let order_id = AggregateId::new();
    state
        .command_router
        .dispatch(Command::CreateOrder(CreateOrder::new(
            order_id,
            user_id,
            cart_id,
            items,
            total_amount,
            req.shipping_address,
        )))
        .await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(OrderCreatedResponse {
            order_id: order_id.to_string(),
            status: "CREATED".to_string(),
            total_cents: total_amount.cents(),
        }),
    ))
}

/// GET /orders/:id — load an order aggregate by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_aggregate_id(&id)?;
    let order = state
        .command_router
        .load_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    let items: Vec<OrderItemResponse> = order
        .items()
        .iter()
        .map(|item| OrderItemResponse {
            product_id: item.product_id.to_string(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price.cents(),
            subtotal_cents: item.subtotal.cents(),
        })
        .collect();

    Ok(Json(OrderResponse {
        order_id: order_id.to_string(),
        user_id: order.user_id().map(|u| u.to_string()).unwrap_or_default(),
        cart_id: order.cart_id().map(|c| c.to_string()).unwrap_or_default(),
        status: order.status().to_string(),
        items,
        total_cents: order.total_amount().cents(),
        shipping_address: order.shipping_address().to_string(),
    }))
}

/// GET /orders — list all orders from the status projection.
#[tracing::instrument(skip(state))]
pub async fn list<S: EventStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<OrderSummaryResponse>>, ApiError> {
    let mut orders = state.order_status.get_all_orders().await;
    orders.sort_by_key(|o| o.created_at);

    Ok(Json(
        orders
            .into_iter()
            .map(|o| OrderSummaryResponse {
                order_id: o.order_id.to_string(),
                user_id: o.user_id.to_string(),
                status: o.status.to_string(),
                item_count: o.item_count,
                total_cents: o.total_amount.cents(),
            })
            .collect(),
    ))
}

/// GET /orders/:id/saga — the fulfillment saga's view of an order.
#[tracing::instrument(skip(state))]
pub async fn saga_status<S: EventStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<SagaStatusResponse>, ApiError> {
    let order_id = parse_aggregate_id(&id)?;
    let instance = state
        .orchestrator
        .instance_for_order(order_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("No saga for order {id}")))?;

    Ok(Json(SagaStatusResponse {
        saga_id: instance.saga_id.to_string(),
        order_id: instance.order_id.to_string(),
        phase: instance.phase.to_string(),
        payment_id: instance.payment_id.map(|p| p.to_string()),
        dispatch_id: instance.dispatch_id.map(|d| d.to_string()),
        delivery_id: instance.delivery_id.map(|d| d.to_string()),
        tracking_number: instance.tracking_number,
        failure_reason: instance.failure_reason,
    }))
}

/// GET /orders/:id/events — the order's raw event history.
#[tracing::instrument(skip(state))]
pub async fn events<S: EventStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    let order_id = parse_aggregate_id(&id)?;
    let events = state
        .event_store
        .events_for_aggregate(order_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    if events.is_empty() {
        return Err(ApiError::NotFound(format!("Order {id} not found")));
    }

    Ok(Json(
        events
            .into_iter()
            .map(|e| EventResponse {
                event_type: e.event_type,
                sequence: e.sequence.as_i64(),
                occurred_at: e.occurred_at,
                payload: e.payload,
            })
            .collect(),
    ))
}
