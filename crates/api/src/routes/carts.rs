//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::Money;
use domain::{AddItemToCart, CreateCart, RemoveItemFromCart, UserId, cart::CartEvent};
use event_store::EventStore;
use runtime::Command;
use serde::{Deserialize, Serialize};

use super::{AppState, parse_aggregate_id};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateCartRequest {
    pub user_id: Option<String>,
}

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartCreatedResponse {
    pub cart_id: String,
    pub user_id: String,
}

#[derive(Serialize)]
pub struct ItemAddedResponse {
    pub cart_id: String,
    pub cart_item_id: String,
    pub subtotal_cents: i64,
}

#[derive(Serialize)]
pub struct CartResponse {
    pub cart_id: String,
    pub user_id: String,
    pub items: Vec<CartItemResponse>,
    pub total_cents: i64,
}

#[derive(Serialize)]
pub struct CartItemResponse {
    pub cart_item_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

// -- Handlers --

/// POST /carts — create a new cart.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: EventStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateCartRequest>,
) -> Result<(axum::http::StatusCode, Json<CartCreatedResponse>), ApiError> {
    let user_id = if let Some(ref id_str) = req.user_id {
        let uuid = uuid::Uuid::parse_str(id_str)
            .map_err(|e| ApiError::BadRequest(format!("Invalid user_id: {e}")))?;
        UserId::from_uuid(uuid)
    } else {
        UserId::new()
    };

    let cmd = CreateCart::for_user(user_id);
    let cart_id = cmd.cart_id;
    state
        .command_router
        .dispatch(Command::CreateCart(cmd))
        .await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(CartCreatedResponse {
            cart_id: cart_id.to_string(),
            user_id: user_id.to_string(),
        }),
    ))
}

/// POST /carts/:id/items — add an item to a cart.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<S: EventStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<AddItemRequest>,
) -> Result<(axum::http::StatusCode, Json<ItemAddedResponse>), ApiError> {
    let cart_id = parse_aggregate_id(&id)?;

    let submission = state
        .command_router
        .dispatch(Command::AddItemToCart(AddItemToCart::new(
            cart_id,
            req.product_id.as_str(),
            req.product_name.as_str(),
            req.quantity,
            Money::from_cents(req.unit_price_cents),
        )))
        .await?;

    // The generated line id is recorded in the appended event
    let added = submission
        .envelopes
        .iter()
        .find(|e| e.event_type == "ItemAddedToCart")
        .and_then(|e| serde_json::from_value::<CartEvent>(e.payload.clone()).ok())
        .and_then(|event| match event {
            CartEvent::ItemAddedToCart(data) => Some(data),
            _ => None,
        })
        .ok_or_else(|| ApiError::Internal("ItemAddedToCart event missing".to_string()))?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(ItemAddedResponse {
            cart_id: cart_id.to_string(),
            cart_item_id: added.cart_item_id.to_string(),
            subtotal_cents: added.subtotal.cents(),
        }),
    ))
}

/// DELETE /carts/:id/items/:item_id — remove an item from a cart.
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: EventStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<axum::http::StatusCode, ApiError> {
    let cart_id = parse_aggregate_id(&id)?;
    let cart_item_id = item_id
        .parse::<uuid::Uuid>()
        .map(domain::CartItemId::from_uuid)
        .map_err(|e| ApiError::BadRequest(format!("Invalid cart item id '{item_id}': {e}")))?;

    state
        .command_router
        .dispatch(Command::RemoveItemFromCart(RemoveItemFromCart::new(
            cart_id,
            cart_item_id,
        )))
        .await?;

    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// GET /carts/:id — load a cart aggregate by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart_id = parse_aggregate_id(&id)?;
    let cart = state
        .command_router
        .load_cart(cart_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Cart {id} not found")))?;

    let mut items: Vec<CartItemResponse> = cart
        .items()
        .map(|item| CartItemResponse {
            cart_item_id: item.cart_item_id.to_string(),
            product_id: item.product_id.to_string(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price.cents(),
            subtotal_cents: item.subtotal.cents(),
        })
        .collect();
    items.sort_by(|a, b| a.cart_item_id.cmp(&b.cart_item_id));

    Ok(Json(CartResponse {
        cart_id: cart_id.to_string(),
        user_id: cart.user_id().map(|u| u.to_string()).unwrap_or_default(),
        items,
        total_cents: cart.total_amount().cents(),
    }))
}
