//! Projection integration tests: catch-up and rebuild over a populated
//! event store.

use common::{AggregateId, Money};
use domain::{
    CartItemId, OrderItem, OrderStatus, ProductId, UserId,
    cart::CartEvent,
    order::OrderEvent,
};
use event_store::{AppendOptions, EventEnvelope, EventStore, InMemoryEventStore, SequenceNumber};
use projections::{CartsView, OrderStatusView, Projection, ProjectionProcessor};

fn envelope(
    aggregate_id: AggregateId,
    aggregate_type: &str,
    event_type: &str,
    sequence: i64,
    payload: serde_json::Value,
) -> EventEnvelope {
    EventEnvelope::builder()
        .aggregate_id(aggregate_id)
        .aggregate_type(aggregate_type)
        .event_type(event_type)
        .sequence(SequenceNumber::new(sequence))
        .payload_raw(payload)
        .build()
}

async fn populate(store: &InMemoryEventStore) -> (AggregateId, AggregateId) {
    let user_id = UserId::new();
    let cart_id = AggregateId::new();
    let order_id = AggregateId::new();

    let cart_created = CartEvent::cart_created(cart_id, user_id);
    let item_added = CartEvent::item_added(
        cart_id,
        CartItemId::new(),
        ProductId::new("SKU-001"),
        "Widget",
        2,
        Money::from_cents(1000),
    );
    store
        .append(
            vec![
                envelope(
                    cart_id,
                    "Cart",
                    "CartCreated",
                    1,
                    serde_json::to_value(&cart_created).unwrap(),
                ),
                envelope(
                    cart_id,
                    "Cart",
                    "ItemAddedToCart",
                    2,
                    serde_json::to_value(&item_added).unwrap(),
                ),
            ],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    let order_created = OrderEvent::order_created(
        order_id,
        user_id,
        cart_id,
        vec![OrderItem::new("SKU-001", "Widget", 2, Money::from_cents(1000))],
        Money::from_cents(2000),
        "1 Main St",
    );
    let status_updated = OrderEvent::status_updated(
        order_id,
        OrderStatus::Created,
        OrderStatus::PaymentPending,
        None,
    );
    store
        .append(
            vec![
                envelope(
                    order_id,
                    "Order",
                    "OrderCreated",
                    1,
                    serde_json::to_value(&order_created).unwrap(),
                ),
                envelope(
                    order_id,
                    "Order",
                    "OrderStatusUpdated",
                    2,
                    serde_json::to_value(&status_updated).unwrap(),
                ),
            ],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    (cart_id, order_id)
}

#[tokio::test]
async fn catch_up_builds_both_views() {
    let store = InMemoryEventStore::new();
    let (cart_id, order_id) = populate(&store).await;

    let carts = CartsView::new();
    let orders = OrderStatusView::new();

    let mut processor = ProjectionProcessor::new(store);
    processor.register(Box::new(carts.clone()) as Box<dyn Projection>);
    processor.register(Box::new(orders.clone()) as Box<dyn Projection>);
    processor.run_catch_up().await.unwrap();

    let cart = carts.get_cart(cart_id).await.unwrap();
    assert_eq!(cart.total_amount, Money::from_cents(2000));

    let order = orders.get_order(order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::PaymentPending);
    assert_eq!(order.history.len(), 1);
}

#[tokio::test]
async fn rebuild_is_idempotent() {
    let store = InMemoryEventStore::new();
    let (cart_id, order_id) = populate(&store).await;

    let carts = CartsView::new();
    let orders = OrderStatusView::new();

    let mut processor = ProjectionProcessor::new(store);
    processor.register(Box::new(carts.clone()) as Box<dyn Projection>);
    processor.register(Box::new(orders.clone()) as Box<dyn Projection>);
    processor.run_catch_up().await.unwrap();
    processor.rebuild_all().await.unwrap();

    assert_eq!(carts.cart_count().await, 1);
    assert_eq!(orders.order_count().await, 1);
    assert!(carts.get_cart(cart_id).await.is_some());

    // History is not duplicated by the rebuild
    let order = orders.get_order(order_id).await.unwrap();
    assert_eq!(order.history.len(), 1);
}
