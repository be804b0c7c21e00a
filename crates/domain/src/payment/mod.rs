//! Payment record and related types.

mod events;
mod record;
mod service;
mod state;

pub use events::{PaymentEvent, PaymentFailedData, PaymentOpenedData, PaymentSucceededData};
pub use record::PaymentRecord;
pub use service::PaymentService;
pub use state::PaymentStatus;

use thiserror::Error;

/// Errors that can occur during payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// No payment has been opened on this record.
    #[error("Payment has not been opened")]
    NotOpened,

    /// The payment already resolved the other way.
    #[error("Payment already resolved as {status}: cannot {attempted}")]
    AlreadyResolved {
        status: PaymentStatus,
        attempted: &'static str,
    },

    /// Amount must be positive.
    #[error("Invalid payment amount: {amount} (must be greater than 0)")]
    InvalidAmount { amount: i64 },
}
