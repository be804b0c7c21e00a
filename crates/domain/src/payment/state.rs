//! Payment record state machine.

use serde::{Deserialize, Serialize};

/// The state of a payment attempt.
///
/// A payment resolves exactly once: Pending moves to either Success or
/// Failed, and both are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    /// Payment has been initiated but not yet resolved.
    #[default]
    Pending,

    /// Payment settled successfully.
    Success,

    /// Payment was declined or errored.
    Failed,
}

impl PaymentStatus {
    /// Returns true while the payment can still resolve.
    pub fn can_resolve(&self) -> bool {
        matches!(self, PaymentStatus::Pending)
    }

    /// Returns true once the payment has resolved.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Success | PaymentStatus::Failed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Success => "Success",
            PaymentStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
