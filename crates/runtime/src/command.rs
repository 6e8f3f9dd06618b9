//! The routable command set.

use common::AggregateId;
use domain::{
    AddItemToCart, CreateCart, CreateOrder, DeliverOrder, DispatchOrder, ProcessPayment,
    RemoveItemFromCart, UpdateOrderStatus,
};
use serde::{Deserialize, Serialize};

/// Every command the router can dispatch, one variant per operation.
///
/// Wiring is explicit enum dispatch resolved at compile time — no
/// annotation scanning, no reflection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Command {
    CreateCart(CreateCart),
    AddItemToCart(AddItemToCart),
    RemoveItemFromCart(RemoveItemFromCart),
    CreateOrder(CreateOrder),
    UpdateOrderStatus(UpdateOrderStatus),
    ProcessPayment(ProcessPayment),
    DispatchOrder(DispatchOrder),
    DeliverOrder(DeliverOrder),
}

impl Command {
    /// Returns the command type name.
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateCart(_) => "CreateCart",
            Command::AddItemToCart(_) => "AddItemToCart",
            Command::RemoveItemFromCart(_) => "RemoveItemFromCart",
            Command::CreateOrder(_) => "CreateOrder",
            Command::UpdateOrderStatus(_) => "UpdateOrderStatus",
            Command::ProcessPayment(_) => "ProcessPayment",
            Command::DispatchOrder(_) => "DispatchOrder",
            Command::DeliverOrder(_) => "DeliverOrder",
        }
    }

    /// Returns the id of the aggregate this command targets.
    pub fn target(&self) -> AggregateId {
        match self {
            Command::CreateCart(c) => c.cart_id,
            Command::AddItemToCart(c) => c.cart_id,
            Command::RemoveItemFromCart(c) => c.cart_id,
            Command::CreateOrder(c) => c.order_id,
            Command::UpdateOrderStatus(c) => c.order_id,
            Command::ProcessPayment(c) => c.payment_id,
            Command::DispatchOrder(c) => c.dispatch_id,
            Command::DeliverOrder(c) => c.delivery_id,
        }
    }

    /// Returns the order this command concerns, when it concerns one.
    ///
    /// The saga uses this to aim compensating status updates.
    pub fn order_id(&self) -> Option<AggregateId> {
        match self {
            Command::CreateCart(_)
            | Command::AddItemToCart(_)
            | Command::RemoveItemFromCart(_) => None,
            Command::CreateOrder(c) => Some(c.order_id),
            Command::UpdateOrderStatus(c) => Some(c.order_id),
            Command::ProcessPayment(c) => Some(c.order_id),
            Command::DispatchOrder(c) => Some(c.order_id),
            Command::DeliverOrder(c) => Some(c.order_id),
        }
    }
}
