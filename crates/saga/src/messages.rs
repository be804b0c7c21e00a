//! Messages exchanged between the saga coordinator and its surroundings.
//!
//! Delivery is at-least-once and unordered: every handler must treat a
//! redelivered or late message as routine, not exceptional.

use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{CustomerId, Money, ProductId};
use serde::{Deserialize, Serialize};

/// One product successfully placed on hold for an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservedItem {
    /// The product that was reserved.
    pub product_id: ProductId,

    /// Quantity placed on hold.
    pub quantity: u32,

    /// The ledger stream carrying the hold, for audit consumers.
    pub reservation_ref: AggregateId,
}

/// Messages the saga coordinator consumes and emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SagaMessage {
    /// A new order entered the system.
    OrderCreated {
        order_id: AggregateId,
        customer_id: CustomerId,
        total_amount: Money,
        created_at: DateTime<Utc>,
    },

    /// All of an order's items are on hold.
    InventoryReserved {
        order_id: AggregateId,
        customer_id: CustomerId,
        reserved_items: Vec<ReservedItem>,
        reserved_at: DateTime<Utc>,
    },

    /// The order's payment settled.
    PaymentCompleted {
        payment_id: AggregateId,
        order_id: AggregateId,
        customer_id: CustomerId,
        amount: Money,
        transaction_id: String,
        completed_at: DateTime<Utc>,
    },

    /// The order's payment was declined or errored.
    PaymentFailed {
        payment_id: AggregateId,
        order_id: AggregateId,
        customer_id: CustomerId,
        failure_reason: String,
        error_code: Option<String>,
        failed_at: DateTime<Utc>,
    },
}

impl SagaMessage {
    /// Returns the message type name, for logging and metrics.
    pub fn message_type(&self) -> &'static str {
        match self {
            SagaMessage::OrderCreated { .. } => "OrderCreated",
            SagaMessage::InventoryReserved { .. } => "InventoryReserved",
            SagaMessage::PaymentCompleted { .. } => "PaymentCompleted",
            SagaMessage::PaymentFailed { .. } => "PaymentFailed",
        }
    }

    /// Returns the order this message concerns.
    pub fn order_id(&self) -> AggregateId {
        match self {
            SagaMessage::OrderCreated { order_id, .. }
            | SagaMessage::InventoryReserved { order_id, .. }
            | SagaMessage::PaymentCompleted { order_id, .. }
            | SagaMessage::PaymentFailed { order_id, .. } => *order_id,
        }
    }
}
