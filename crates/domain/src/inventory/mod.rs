//! Inventory ledger module.
//!
//! Each product has its own event stream, identified deterministically
//! by SKU. Reservations are tracked as per-order holds so that retried
//! and reordered deliveries of the same command resolve to no-ops
//! instead of double-counting stock.

mod events;
mod hold;
mod record;
mod service;

pub use events::{
    InventoryEvent, ReservationConfirmedData, ReservationReleasedData, StockAddedData,
    StockProvisionedData, StockReducedData, StockReservedData,
};
pub use hold::{Hold, HoldState};
pub use record::InventoryRecord;
pub use service::InventoryLedger;

use common::AggregateId;
use thiserror::Error;

/// Errors specific to inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The product is already registered in the ledger.
    #[error("Product {product_id} is already provisioned")]
    AlreadyProvisioned { product_id: String },

    /// The product has never been provisioned.
    #[error("Product is not provisioned")]
    NotProvisioned,

    /// Not enough available stock to satisfy the request.
    #[error(
        "Insufficient stock for {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: String,
        requested: u32,
        available: u32,
    },

    /// A hold was in the wrong state (or missing) for the attempted
    /// resolution.
    #[error(
        "Cannot {attempted} reservation for order {order_id}: hold is {}",
        state.map(|s| s.to_string()).unwrap_or_else(|| "absent".to_string())
    )]
    InvalidReservationState {
        order_id: AggregateId,
        state: Option<HoldState>,
        attempted: &'static str,
    },

    /// Quantity must be positive.
    #[error("Quantity must be greater than zero")]
    InvalidQuantity,
}
