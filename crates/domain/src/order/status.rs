//! Order workflow status machine.

use serde::{Deserialize, Serialize};

/// The externally visible status of an order's workflow.
///
/// The saga drives the happy path:
/// ```text
/// Created ──► PaymentPending ──► Paid ──► Dispatched ──► Delivered
///                   │              │           │
///                   ▼              ▼           ▼
///            PaymentFailed  DispatchFailed  DeliveryFailed
/// ```
/// `Cancelled` and `Error` can be reached from any non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order has been created, workflow not yet started.
    #[default]
    Created,

    /// A payment request has been submitted.
    PaymentPending,

    /// Payment completed.
    Paid,

    /// Payment declined or never confirmed (terminal).
    PaymentFailed,

    /// Carrier confirmed the dispatch.
    Dispatched,

    /// Dispatch could not be confirmed after payment (terminal).
    DispatchFailed,

    /// Order delivered (terminal).
    Delivered,

    /// Delivery could not be arranged after dispatch (terminal).
    DeliveryFailed,

    /// Order was cancelled (terminal).
    Cancelled,

    /// The workflow hit an unrecoverable technical failure (terminal).
    Error,
}

impl OrderStatus {
    /// Returns true if this status ends the workflow.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::PaymentFailed
                | OrderStatus::DispatchFailed
                | OrderStatus::Delivered
                | OrderStatus::DeliveryFailed
                | OrderStatus::Cancelled
                | OrderStatus::Error
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::PaymentPending => "PAYMENT_PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::PaymentFailed => "PAYMENT_FAILED",
            OrderStatus::Dispatched => "DISPATCHED",
            OrderStatus::DispatchFailed => "DISPATCH_FAILED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::DeliveryFailed => "DELIVERY_FAILED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_created() {
        assert_eq!(OrderStatus::default(), OrderStatus::Created);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!OrderStatus::Created.is_terminal());
        assert!(!OrderStatus::PaymentPending.is_terminal());
        assert!(!OrderStatus::Paid.is_terminal());
        assert!(!OrderStatus::Dispatched.is_terminal());
        assert!(OrderStatus::PaymentFailed.is_terminal());
        assert!(OrderStatus::DispatchFailed.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::DeliveryFailed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Error.is_terminal());
    }

    #[test]
    fn display_matches_wire_format() {
        assert_eq!(OrderStatus::PaymentPending.to_string(), "PAYMENT_PENDING");
        assert_eq!(OrderStatus::DispatchFailed.to_string(), "DISPATCH_FAILED");
    }

    #[test]
    fn serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&OrderStatus::PaymentFailed).unwrap();
        assert_eq!(json, "\"PAYMENT_FAILED\"");
        let back: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, OrderStatus::PaymentFailed);
    }
}
