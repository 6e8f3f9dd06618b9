//! Payment value types and the gateway outcome contract.

use serde::{Deserialize, Serialize};

/// Outcome of a payment attempt.
///
/// A payment is one-shot: it goes straight from nothing to COMPLETED or
/// FAILED at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// The gateway approved and captured the payment.
    Completed,

    /// The gateway declined the payment, or a technical gateway error
    /// was recorded as a decline.
    Failed,
}

impl PaymentStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    CreditCard,
    DebitCard,
    Paypal,
    BankTransfer,
    Wallet,
}

impl PaymentMethod {
    /// Returns the method name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::DebitCard => "DEBIT_CARD",
            PaymentMethod::Paypal => "PAYPAL",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::Wallet => "WALLET",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the payment gateway reports back for an authorization attempt.
///
/// This is the whole contract with the external gateway: a status and,
/// on success, a transaction reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    /// Approved or declined.
    pub status: PaymentStatus,

    /// Gateway transaction reference, present when approved.
    pub transaction_id: Option<String>,
}

impl PaymentOutcome {
    /// An approved outcome with a transaction reference.
    pub fn completed(transaction_id: impl Into<String>) -> Self {
        Self {
            status: PaymentStatus::Completed,
            transaction_id: Some(transaction_id.into()),
        }
    }

    /// A declined outcome.
    pub fn failed() -> Self {
        Self {
            status: PaymentStatus::Failed,
            transaction_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_format() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Completed).unwrap(),
            "\"COMPLETED\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Failed).unwrap(),
            "\"FAILED\""
        );
    }

    #[test]
    fn method_wire_format() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CreditCard).unwrap(),
            "\"CREDIT_CARD\""
        );
        let back: PaymentMethod = serde_json::from_str("\"BANK_TRANSFER\"").unwrap();
        assert_eq!(back, PaymentMethod::BankTransfer);
    }

    #[test]
    fn outcome_constructors() {
        let ok = PaymentOutcome::completed("TXN-1");
        assert_eq!(ok.status, PaymentStatus::Completed);
        assert_eq!(ok.transaction_id.as_deref(), Some("TXN-1"));

        let declined = PaymentOutcome::failed();
        assert_eq!(declined.status, PaymentStatus::Failed);
        assert!(declined.transaction_id.is_none());
    }
}
