//! Cart read model — current contents of every cart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{AggregateId, Money};
use domain::{CartItemId, ProductId, UserId, cart::CartEvent};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// One line in a cart summary.
#[derive(Debug, Clone)]
pub struct CartLineSummary {
    pub cart_item_id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// Summary of a cart in the carts view.
#[derive(Debug, Clone)]
pub struct CartSummary {
    pub cart_id: AggregateId,
    pub user_id: UserId,
    pub lines: HashMap<CartItemId, CartLineSummary>,
    pub total_amount: Money,
}

impl CartSummary {
    fn recalculate_total(&mut self) {
        self.total_amount = self.lines.values().map(|line| line.subtotal).sum();
    }
}

/// Read model view of cart contents.
#[derive(Clone)]
pub struct CartsView {
    carts: Arc<RwLock<HashMap<AggregateId, CartSummary>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl CartsView {
    /// Creates a new empty carts view.
    pub fn new() -> Self {
        Self {
            carts: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Gets a summary of a specific cart.
    pub async fn get_cart(&self, cart_id: AggregateId) -> Option<CartSummary> {
        self.carts.read().await.get(&cart_id).cloned()
    }

    /// Gets carts owned by a specific user.
    pub async fn get_carts_by_user(&self, user_id: UserId) -> Vec<CartSummary> {
        self.carts
            .read()
            .await
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Returns the number of carts tracked.
    pub async fn cart_count(&self) -> usize {
        self.carts.read().await.len()
    }
}

impl Default for CartsView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for CartsView {
    fn name(&self) -> &'static str {
        "CartsView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type != "Cart" {
            let mut pos = self.position.write().await;
            *pos = pos.advance();
            return Ok(());
        }

        let cart_event: CartEvent = serde_json::from_value(event.payload.clone())?;
        let cart_id = event.aggregate_id;

        let mut carts = self.carts.write().await;

        match cart_event {
            CartEvent::CartCreated(data) => {
                carts.insert(
                    cart_id,
                    CartSummary {
                        cart_id,
                        user_id: data.user_id,
                        lines: HashMap::new(),
                        total_amount: Money::zero(),
                    },
                );
            }
            CartEvent::ItemAddedToCart(data) => {
                if let Some(cart) = carts.get_mut(&cart_id) {
                    cart.lines.insert(
                        data.cart_item_id,
                        CartLineSummary {
                            cart_item_id: data.cart_item_id,
                            product_id: data.product_id,
                            product_name: data.product_name,
                            quantity: data.quantity,
                            unit_price: data.unit_price,
                            subtotal: data.subtotal,
                        },
                    );
                    cart.recalculate_total();
                }
            }
            CartEvent::ItemRemovedFromCart(data) => {
                if let Some(cart) = carts.get_mut(&cart_id) {
                    cart.lines.remove(&data.cart_item_id);
                    cart.recalculate_total();
                }
            }
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance();

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.carts.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for CartsView {
    fn name(&self) -> &'static str {
        "CartsView"
    }

    fn count(&self) -> usize {
        self.carts.try_read().map(|c| c.len()).unwrap_or(0)
    }
}
