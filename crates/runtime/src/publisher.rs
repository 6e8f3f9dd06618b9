//! Event publisher: fans appended events out to named channels.

use std::collections::HashMap;

use event_store::EventEnvelope;
use tokio::sync::broadcast;

/// A logically named event channel.
///
/// Each aggregate type publishes to its own channel; consumers subscribe
/// per channel. The ordering key is the aggregate id: publication
/// happens in append order under the router's per-aggregate lock, so
/// per-aggregate ordering is preserved end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Cart,
    Order,
    Payment,
    Dispatch,
    Delivery,
}

impl Channel {
    /// All channels, in workflow order.
    pub const ALL: [Channel; 5] = [
        Channel::Cart,
        Channel::Order,
        Channel::Payment,
        Channel::Dispatch,
        Channel::Delivery,
    ];

    /// Returns the channel's wire name.
    pub fn name(&self) -> &'static str {
        match self {
            Channel::Cart => "cart-events",
            Channel::Order => "order-events",
            Channel::Payment => "payment-events",
            Channel::Dispatch => "dispatch-events",
            Channel::Delivery => "delivery-events",
        }
    }

    /// Resolves the channel an aggregate type publishes to.
    pub fn for_aggregate_type(aggregate_type: &str) -> Option<Channel> {
        match aggregate_type {
            "Cart" => Some(Channel::Cart),
            "Order" => Some(Channel::Order),
            "Payment" => Some(Channel::Payment),
            "Dispatch" => Some(Channel::Dispatch),
            "Delivery" => Some(Channel::Delivery),
            _ => None,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Fans appended events out to channel subscribers.
///
/// Subscribers that fall too far behind miss events (broadcast
/// semantics); exactly-once delivery across the relay is a non-goal.
#[derive(Clone)]
pub struct EventPublisher {
    senders: HashMap<Channel, broadcast::Sender<EventEnvelope>>,
}

impl EventPublisher {
    /// Creates a publisher with the given per-channel buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let senders = Channel::ALL
            .into_iter()
            .map(|channel| {
                let (tx, _rx) = broadcast::channel(capacity);
                (channel, tx)
            })
            .collect();
        Self { senders }
    }

    /// Subscribes to a channel.
    pub fn subscribe(&self, channel: Channel) -> broadcast::Receiver<EventEnvelope> {
        self.senders[&channel].subscribe()
    }

    /// Publishes envelopes to their channels, in order.
    pub fn publish(&self, envelopes: &[EventEnvelope]) {
        for envelope in envelopes {
            let Some(channel) = Channel::for_aggregate_type(&envelope.aggregate_type) else {
                tracing::warn!(
                    aggregate_type = %envelope.aggregate_type,
                    event_type = %envelope.event_type,
                    "no channel for aggregate type, event not relayed"
                );
                continue;
            };

            // Send fails only when nobody is subscribed, which is fine.
            let _ = self.senders[&channel].send(envelope.clone());
            metrics::counter!("events_published_total", "channel" => channel.name())
                .increment(1);
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AggregateId;
    use event_store::SequenceNumber;

    fn envelope(aggregate_type: &str, event_type: &str) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(AggregateId::new())
            .aggregate_type(aggregate_type)
            .event_type(event_type)
            .sequence(SequenceNumber::first())
            .payload_raw(serde_json::json!({}))
            .build()
    }

    #[test]
    fn channel_names() {
        assert_eq!(Channel::Cart.name(), "cart-events");
        assert_eq!(Channel::Order.name(), "order-events");
        assert_eq!(Channel::Payment.name(), "payment-events");
        assert_eq!(Channel::Dispatch.name(), "dispatch-events");
        assert_eq!(Channel::Delivery.name(), "delivery-events");
    }

    #[test]
    fn channel_routing_by_aggregate_type() {
        assert_eq!(Channel::for_aggregate_type("Order"), Some(Channel::Order));
        assert_eq!(Channel::for_aggregate_type("Unknown"), None);
    }

    #[tokio::test]
    async fn events_reach_matching_channel_only() {
        let publisher = EventPublisher::new(16);
        let mut orders = publisher.subscribe(Channel::Order);
        let mut payments = publisher.subscribe(Channel::Payment);

        publisher.publish(&[envelope("Order", "OrderCreated")]);

        let received = orders.try_recv().unwrap();
        assert_eq!(received.event_type, "OrderCreated");
        assert!(payments.try_recv().is_err());
    }

    #[tokio::test]
    async fn publish_preserves_order() {
        let publisher = EventPublisher::new(16);
        let mut orders = publisher.subscribe(Channel::Order);

        publisher.publish(&[
            envelope("Order", "OrderCreated"),
            envelope("Order", "OrderStatusUpdated"),
        ]);

        assert_eq!(orders.try_recv().unwrap().event_type, "OrderCreated");
        assert_eq!(orders.try_recv().unwrap().event_type, "OrderStatusUpdated");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_fine() {
        let publisher = EventPublisher::new(16);
        publisher.publish(&[envelope("Cart", "CartCreated")]);
    }
}
