//! Order state machine.

use serde::{Deserialize, Serialize};

/// The state of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──► Confirmed ──► Processing ──► Delivered
///    │            │
///    └────────────┴──► Cancelled
/// ```
///
/// Once an order reaches Processing its inventory has been permanently
/// deducted, so cancellation is no longer possible; terminal states
/// absorb every later transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order was placed, awaiting inventory and payment.
    #[default]
    Pending,

    /// Inventory reserved and payment settled.
    Confirmed,

    /// Order is being picked and packed (point of no return).
    Processing,

    /// Order reached the customer (terminal state).
    Delivered,

    /// Order was cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the order can be confirmed in this state.
    pub fn can_confirm(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if fulfillment can start in this state.
    pub fn can_start_processing(&self) -> bool {
        matches!(self, OrderStatus::Confirmed)
    }

    /// Returns true if the order can be delivered in this state.
    pub fn can_deliver(&self) -> bool {
        matches!(self, OrderStatus::Processing)
    }

    /// Returns true if the order can be cancelled in this state.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Processing => "Processing",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
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
    fn test_default_state_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_pending_can_confirm() {
        assert!(OrderStatus::Pending.can_confirm());
        assert!(!OrderStatus::Confirmed.can_confirm());
        assert!(!OrderStatus::Processing.can_confirm());
        assert!(!OrderStatus::Delivered.can_confirm());
        assert!(!OrderStatus::Cancelled.can_confirm());
    }

    #[test]
    fn test_confirmed_can_start_processing() {
        assert!(!OrderStatus::Pending.can_start_processing());
        assert!(OrderStatus::Confirmed.can_start_processing());
        assert!(!OrderStatus::Processing.can_start_processing());
        assert!(!OrderStatus::Delivered.can_start_processing());
        assert!(!OrderStatus::Cancelled.can_start_processing());
    }

    #[test]
    fn test_processing_can_deliver() {
        assert!(!OrderStatus::Pending.can_deliver());
        assert!(!OrderStatus::Confirmed.can_deliver());
        assert!(OrderStatus::Processing.can_deliver());
        assert!(!OrderStatus::Delivered.can_deliver());
        assert!(!OrderStatus::Cancelled.can_deliver());
    }

    #[test]
    fn test_cancel_only_before_processing() {
        assert!(OrderStatus::Pending.can_cancel());
        assert!(OrderStatus::Confirmed.can_cancel());
        assert!(!OrderStatus::Processing.can_cancel());
        assert!(!OrderStatus::Delivered.can_cancel());
        assert!(!OrderStatus::Cancelled.can_cancel());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Confirmed.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(OrderStatus::Pending.to_string(), "Pending");
        assert_eq!(OrderStatus::Cancelled.to_string(), "Cancelled");
    }

    #[test]
    fn test_serialization() {
        let state = OrderStatus::Processing;
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }
}
