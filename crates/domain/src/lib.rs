//! Domain layer for the order fulfillment workflow.
//!
//! This crate provides the core event-sourcing abstractions:
//! - Aggregate trait for event-sourced entities
//! - DomainEvent trait for domain events
//! - CommandHandler implementing the load → validate → append cycle
//!
//! plus the five workflow aggregates: Cart, Order, Payment, Dispatch,
//! and Delivery.

pub mod aggregate;
pub mod cart;
pub mod command;
pub mod delivery;
pub mod dispatch;
pub mod error;
pub mod ids;
pub mod order;
pub mod payment;

pub use aggregate::{Aggregate, DomainEvent, SnapshotCapable};
pub use cart::{
    AddItemToCart, Cart, CartCreatedData, CartError, CartEvent, CartItem, CreateCart,
    ItemAddedToCartData, ItemRemovedFromCartData, RemoveItemFromCart,
};
pub use command::{Command, CommandHandler, CommandResult};
pub use delivery::{DeliverOrder, Delivery, DeliveryError, DeliveryEvent, OrderDeliveredData};
pub use dispatch::{
    Carrier, Dispatch, DispatchError, DispatchEvent, DispatchOrder, DispatchOutcome,
    DispatchStatus, OrderDispatchedData,
};
pub use error::DomainError;
pub use ids::{CartItemId, ProductId, UserId};
pub use order::{
    CreateOrder, Order, OrderCreatedData, OrderError, OrderEvent, OrderItem, OrderStatus,
    OrderStatusUpdatedData, UpdateOrderStatus,
};
pub use payment::{
    Payment, PaymentError, PaymentEvent, PaymentMethod, PaymentOutcome, PaymentProcessedData,
    PaymentStatus, ProcessPayment,
};
