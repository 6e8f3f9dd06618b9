//! Order status read model — every order's current workflow status and
//! status history.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AggregateId, Money};
use domain::{OrderStatus, UserId, order::OrderEvent};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// One recorded status transition.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub reason: Option<String>,
    pub at: DateTime<Utc>,
}

/// Summary of an order in the status view.
#[derive(Debug, Clone)]
pub struct OrderStatusSummary {
    pub order_id: AggregateId,
    pub user_id: UserId,
    pub total_amount: Money,
    pub item_count: usize,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub history: Vec<StatusChange>,
}

/// Read model view tracking every order's workflow status.
///
/// This is what makes the saga's outcome user-visible: a failed or
/// timed-out workflow shows up here as a `*_FAILED`/`ERROR` status.
#[derive(Clone)]
pub struct OrderStatusView {
    orders: Arc<RwLock<HashMap<AggregateId, OrderStatusSummary>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl OrderStatusView {
    /// Creates a new empty order status view.
    pub fn new() -> Self {
        Self {
            orders: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Gets a summary of a specific order.
    pub async fn get_order(&self, order_id: AggregateId) -> Option<OrderStatusSummary> {
        self.orders.read().await.get(&order_id).cloned()
    }

    /// Gets all orders.
    pub async fn get_all_orders(&self) -> Vec<OrderStatusSummary> {
        self.orders.read().await.values().cloned().collect()
    }

    /// Gets orders currently in the given status.
    pub async fn get_orders_by_status(&self, status: OrderStatus) -> Vec<OrderStatusSummary> {
        self.orders
            .read()
            .await
            .values()
            .filter(|o| o.status == status)
            .cloned()
            .collect()
    }

    /// Gets orders placed by a specific user.
    pub async fn get_orders_by_user(&self, user_id: UserId) -> Vec<OrderStatusSummary> {
        self.orders
            .read()
            .await
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Returns the number of orders tracked.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

impl Default for OrderStatusView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for OrderStatusView {
    fn name(&self) -> &'static str {
        "OrderStatusView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type != "Order" {
            let mut pos = self.position.write().await;
            *pos = pos.advance();
            return Ok(());
        }

        let order_event: OrderEvent = serde_json::from_value(event.payload.clone())?;
        let order_id = event.aggregate_id;

        let mut orders = self.orders.write().await;

        match order_event {
            OrderEvent::OrderCreated(data) => {
                orders.insert(
                    order_id,
                    OrderStatusSummary {
                        order_id,
                        user_id: data.user_id,
                        total_amount: data.total_amount,
                        item_count: data.items.len(),
                        status: OrderStatus::Created,
                        created_at: data.created_at,
                        updated_at: data.created_at,
                        history: Vec::new(),
                    },
                );
            }
            OrderEvent::OrderStatusUpdated(data) => {
                if let Some(order) = orders.get_mut(&order_id) {
                    order.status = data.new_status;
                    order.updated_at = data.updated_at;
                    order.history.push(StatusChange {
                        from: data.previous_status,
                        to: data.new_status,
                        reason: data.reason,
                        at: data.updated_at,
                    });
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
        self.orders.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for OrderStatusView {
    fn name(&self) -> &'static str {
        "OrderStatusView"
    }

    fn count(&self) -> usize {
        // Approximation without blocking; exact counts go through
        // order_count().
        self.orders.try_read().map(|o| o.len()).unwrap_or(0)
    }
}
