//! Payment domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::value_objects::{CustomerId, Money};

/// Events that can occur on a payment record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PaymentEvent {
    /// A payment attempt was opened for an order.
    PaymentOpened(PaymentOpenedData),

    /// The payment settled successfully.
    PaymentSucceeded(PaymentSucceededData),

    /// The payment was declined or errored.
    PaymentFailed(PaymentFailedData),

    /// An operator note was attached to the payment.
    PaymentNoteAdded(PaymentNoteAddedData),
}

impl DomainEvent for PaymentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PaymentEvent::PaymentOpened(_) => "PaymentOpened",
            PaymentEvent::PaymentSucceeded(_) => "PaymentSucceeded",
            PaymentEvent::PaymentFailed(_) => "PaymentFailed",
            PaymentEvent::PaymentNoteAdded(_) => "PaymentNoteAdded",
        }
    }
}

/// Data for PaymentOpened event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOpenedData {
    /// The order being paid for.
    pub order_id: AggregateId,

    /// The paying customer.
    pub customer_id: CustomerId,

    /// Amount to charge.
    pub amount: Money,

    /// When the payment was opened.
    pub opened_at: DateTime<Utc>,
}

/// Data for PaymentSucceeded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSucceededData {
    /// Transaction reference from the payment provider.
    pub transaction_id: String,

    /// When the payment settled.
    pub succeeded_at: DateTime<Utc>,
}

/// Data for PaymentFailed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentFailedData {
    /// Human-readable failure reason.
    pub reason: String,

    /// Provider error code, if any.
    pub error_code: Option<String>,

    /// When the payment failed.
    pub failed_at: DateTime<Utc>,
}

/// Data for PaymentNoteAdded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentNoteAddedData {
    /// Free-form operator note.
    pub note: String,

    /// When the note was added.
    pub noted_at: DateTime<Utc>,
}

// Convenience constructors for events
impl PaymentEvent {
    /// Creates a PaymentOpened event.
    pub fn payment_opened(order_id: AggregateId, customer_id: CustomerId, amount: Money) -> Self {
        PaymentEvent::PaymentOpened(PaymentOpenedData {
            order_id,
            customer_id,
            amount,
            opened_at: Utc::now(),
        })
    }

    /// Creates a PaymentSucceeded event.
    pub fn payment_succeeded(transaction_id: impl Into<String>) -> Self {
        PaymentEvent::PaymentSucceeded(PaymentSucceededData {
            transaction_id: transaction_id.into(),
            succeeded_at: Utc::now(),
        })
    }

    /// Creates a PaymentFailed event.
    pub fn payment_failed(reason: impl Into<String>, error_code: Option<String>) -> Self {
        PaymentEvent::PaymentFailed(PaymentFailedData {
            reason: reason.into(),
            error_code,
            failed_at: Utc::now(),
        })
    }

    /// Creates a PaymentNoteAdded event.
    pub fn payment_note_added(note: impl Into<String>) -> Self {
        PaymentEvent::PaymentNoteAdded(PaymentNoteAddedData {
            note: note.into(),
            noted_at: Utc::now(),
        })
    }
}
