//! Errors raised while folding store events into read model views.

use thiserror::Error;

/// Why a view could not be brought up to date.
///
/// Both variants mean the fold stopped partway; callers rebuild the
/// affected view rather than patching it in place.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The event store could not produce the history to fold.
    #[error("Event store error: {0}")]
    EventStore(#[from] event_store::EventStoreError),

    /// A stored payload did not decode as the domain event its
    /// envelope claims it to be.
    #[error("Event deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
