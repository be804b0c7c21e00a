//! Saga error types.

use common::AggregateId;
use domain::DomainError;
use thiserror::Error;

/// Errors that can occur during saga coordination.
#[derive(Debug, Error)]
pub enum SagaError {
    /// A domain operation failed.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// The referenced order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(AggregateId),

    /// The system reached a state the saga cannot reconcile on its own.
    ///
    /// These are surfaced for operators rather than retried: a retry
    /// would replay the same contradiction.
    #[error("Consistency error: {0}")]
    Consistency(String),
}

impl SagaError {
    /// Returns true if redelivering the triggering message may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, SagaError::Domain(e) if e.is_transient())
    }
}
