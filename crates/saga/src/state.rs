//! Saga phase machine.

use serde::{Deserialize, Serialize};

/// Where a saga instance is in its lifecycle.
///
/// Phase transitions:
/// ```text
/// Started ──► AwaitingPayment ──► AwaitingDispatch ──► AwaitingDelivery ──► Ended
///                  │                    │                     │
///                  └────────────────────┴─────────────────────┴──► Ended / Error
/// ```
/// `Ended` and `Error` are terminal: the instance is retired, its
/// association keys are freed, and no later event may re-activate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaPhase {
    /// Instance created on the order-creation event.
    #[default]
    Started,

    /// Payment command submitted, waiting for the processed event.
    AwaitingPayment,

    /// Dispatch command submitted, waiting for the dispatched event.
    AwaitingDispatch,

    /// Delivery command submitted, waiting for the delivered event.
    AwaitingDelivery,

    /// Workflow finished — success or reported business failure
    /// (terminal).
    Ended,

    /// Workflow aborted on a technical failure (terminal).
    Error,
}

impl SagaPhase {
    /// Returns true if this is a terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaPhase::Ended | SagaPhase::Error)
    }

    /// Returns true if the instance is waiting for a follow-up event.
    pub fn is_awaiting(&self) -> bool {
        matches!(
            self,
            SagaPhase::AwaitingPayment | SagaPhase::AwaitingDispatch | SagaPhase::AwaitingDelivery
        )
    }

    /// Returns the phase name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaPhase::Started => "Started",
            SagaPhase::AwaitingPayment => "AwaitingPayment",
            SagaPhase::AwaitingDispatch => "AwaitingDispatch",
            SagaPhase::AwaitingDelivery => "AwaitingDelivery",
            SagaPhase::Ended => "Ended",
            SagaPhase::Error => "Error",
        }
    }
}

impl std::fmt::Display for SagaPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
