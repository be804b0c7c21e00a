//! Domain error types.

use event_store::EventStoreError;
use thiserror::Error;

use crate::inventory::InventoryError;
use crate::order::OrderError;
use crate::payment::PaymentError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// An error occurred in the inventory ledger.
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// An error occurred in the order aggregate.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// An error occurred in the payment record.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Aggregate not found.
    #[error("Aggregate not found: {aggregate_type} with id {aggregate_id}")]
    AggregateNotFound {
        aggregate_type: &'static str,
        aggregate_id: String,
    },

    /// A command was rejected for a reason outside the typed errors above.
    #[error("Command rejected: {0}")]
    Rejected(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns true if the operation is safe to retry as-is.
    ///
    /// Only infrastructure failures qualify; business rejections
    /// (insufficient stock, invalid transitions) are terminal for the
    /// attempt and retrying them cannot change the answer.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::EventStore(e) if e.is_transient())
    }
}
