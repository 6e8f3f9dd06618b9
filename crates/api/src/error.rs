//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CartError, DomainError, OrderError};
use event_store::EventStoreError;
use runtime::RouterError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Command routing failure.
    Router(RouterError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Router(err) => router_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn router_error_to_response(err: RouterError) -> (StatusCode, String) {
    match &err {
        RouterError::Domain(domain_err) => domain_error_to_response(domain_err, &err),
        RouterError::ConflictRetriesExhausted { .. } => (StatusCode::CONFLICT, err.to_string()),
    }
}

fn domain_error_to_response(err: &DomainError, outer: &RouterError) -> (StatusCode, String) {
    match err {
        DomainError::Cart(cart_err) => match cart_err {
            CartError::ItemNotFound { .. } => (StatusCode::NOT_FOUND, outer.to_string()),
            CartError::NotCreated => (StatusCode::NOT_FOUND, outer.to_string()),
            CartError::AlreadyCreated
            | CartError::InvalidQuantity { .. }
            | CartError::InvalidPrice { .. } => (StatusCode::BAD_REQUEST, outer.to_string()),
        },
        DomainError::Order(order_err) => match order_err {
            OrderError::TerminalStatus { .. } => (StatusCode::CONFLICT, outer.to_string()),
            OrderError::NotCreated => (StatusCode::NOT_FOUND, outer.to_string()),
            OrderError::AlreadyCreated
            | OrderError::NoItems
            | OrderError::SubtotalMismatch { .. }
            | OrderError::TotalMismatch { .. } => (StatusCode::BAD_REQUEST, outer.to_string()),
        },
        DomainError::Payment(_) | DomainError::Dispatch(_) | DomainError::Delivery(_) => {
            (StatusCode::CONFLICT, outer.to_string())
        }
        DomainError::AggregateNotFound { .. } => (StatusCode::NOT_FOUND, outer.to_string()),
        DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. }) => {
            (StatusCode::CONFLICT, outer.to_string())
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, outer.to_string()),
    }
}

impl From<RouterError> for ApiError {
    fn from(err: RouterError) -> Self {
        ApiError::Router(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Router(RouterError::Domain(err))
    }
}
