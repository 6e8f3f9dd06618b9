//! Read model views.

mod carts;
mod orders;

pub use carts::{CartLineSummary, CartSummary, CartsView};
pub use orders::{OrderStatusSummary, OrderStatusView, StatusChange};
