//! Dispatch value types and the carrier outcome contract.

use serde::{Deserialize, Serialize};

/// Outcome of a dispatch attempt.
///
/// Decided once, at creation time, by the carrier call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchStatus {
    /// Carrier confirmed pickup; a tracking number was assigned.
    Dispatched,

    /// Carrier accepted the request but did not confirm.
    Pending,

    /// The dispatch could not be arranged.
    Failed,
}

impl DispatchStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::Dispatched => "DISPATCHED",
            DispatchStatus::Pending => "PENDING",
            DispatchStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A carrier identity.
///
/// Carriers are open-ended strings; the well-known ones get constants
/// because the simulated carrier API keys its behavior (success band,
/// tracking format) off them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Carrier(String);

impl Carrier {
    pub const DHL: &'static str = "DHL";
    pub const FEDEX: &'static str = "FEDEX";
    pub const UPS: &'static str = "UPS";

    /// Creates a carrier from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the carrier name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the carrier name uppercased, for band matching.
    pub fn normalized(&self) -> String {
        self.0.to_uppercase()
    }
}

impl Default for Carrier {
    fn default() -> Self {
        Self::new("DEFAULT_CARRIER")
    }
}

impl std::fmt::Display for Carrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Carrier {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Carrier {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// What the carrier API reports back for a booking attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Confirmed, pending, or failed.
    pub status: DispatchStatus,

    /// Carrier-specific tracking number, present when confirmed.
    pub tracking_number: Option<String>,
}

impl DispatchOutcome {
    /// A confirmed outcome with a tracking number.
    pub fn dispatched(tracking_number: impl Into<String>) -> Self {
        Self {
            status: DispatchStatus::Dispatched,
            tracking_number: Some(tracking_number.into()),
        }
    }

    /// An unconfirmed outcome.
    pub fn pending() -> Self {
        Self {
            status: DispatchStatus::Pending,
            tracking_number: None,
        }
    }

    /// A failed outcome.
    pub fn failed() -> Self {
        Self {
            status: DispatchStatus::Failed,
            tracking_number: None,
        }
    }
}
