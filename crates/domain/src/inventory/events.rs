//! Inventory ledger events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::value_objects::ProductId;

/// Events that can occur on an inventory record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InventoryEvent {
    /// A product was registered in the ledger.
    StockProvisioned(StockProvisionedData),

    /// Stock was added by a restock.
    StockAdded(StockAddedData),

    /// Stock was removed by an adjustment (shrinkage, damage).
    StockReduced(StockReducedData),

    /// Stock was placed on hold for an order.
    StockReserved(StockReservedData),

    /// A hold was converted into a permanent deduction.
    ReservationConfirmed(ReservationConfirmedData),

    /// A hold was cancelled and the stock returned.
    ReservationReleased(ReservationReleasedData),
}

impl DomainEvent for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::StockProvisioned(_) => "StockProvisioned",
            InventoryEvent::StockAdded(_) => "StockAdded",
            InventoryEvent::StockReduced(_) => "StockReduced",
            InventoryEvent::StockReserved(_) => "StockReserved",
            InventoryEvent::ReservationConfirmed(_) => "ReservationConfirmed",
            InventoryEvent::ReservationReleased(_) => "ReservationReleased",
        }
    }
}

/// Data for StockProvisioned event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockProvisionedData {
    /// The product being registered.
    pub product_id: ProductId,

    /// Initial stock quantity.
    pub initial_quantity: u32,

    /// When the product was provisioned.
    pub provisioned_at: DateTime<Utc>,
}

/// Data for StockAdded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAddedData {
    /// Quantity added.
    pub quantity: u32,

    /// When the stock was added.
    pub added_at: DateTime<Utc>,
}

/// Data for StockReduced event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReducedData {
    /// Quantity removed.
    pub quantity: u32,

    /// Reason for the adjustment.
    pub reason: String,

    /// When the stock was removed.
    pub reduced_at: DateTime<Utc>,
}

/// Data for StockReserved event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReservedData {
    /// The order the hold belongs to.
    pub order_id: AggregateId,

    /// Quantity placed on hold.
    pub quantity: u32,

    /// When the reservation was made.
    pub reserved_at: DateTime<Utc>,
}

/// Data for ReservationConfirmed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationConfirmedData {
    /// The order whose hold was confirmed.
    pub order_id: AggregateId,

    /// Quantity permanently deducted.
    pub quantity: u32,

    /// When the hold was confirmed.
    pub confirmed_at: DateTime<Utc>,
}

/// Data for ReservationReleased event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationReleasedData {
    /// The order whose hold was released.
    pub order_id: AggregateId,

    /// Quantity returned to the available pool.
    pub quantity: u32,

    /// Reason for the release (payment failure, cancellation).
    pub reason: String,

    /// When the hold was released.
    pub released_at: DateTime<Utc>,
}

// Convenience constructors for events
impl InventoryEvent {
    /// Creates a StockProvisioned event.
    pub fn stock_provisioned(product_id: ProductId, initial_quantity: u32) -> Self {
        InventoryEvent::StockProvisioned(StockProvisionedData {
            product_id,
            initial_quantity,
            provisioned_at: Utc::now(),
        })
    }

    /// Creates a StockAdded event.
    pub fn stock_added(quantity: u32) -> Self {
        InventoryEvent::StockAdded(StockAddedData {
            quantity,
            added_at: Utc::now(),
        })
    }

    /// Creates a StockReduced event.
    pub fn stock_reduced(quantity: u32, reason: impl Into<String>) -> Self {
        InventoryEvent::StockReduced(StockReducedData {
            quantity,
            reason: reason.into(),
            reduced_at: Utc::now(),
        })
    }

    /// Creates a StockReserved event.
    pub fn stock_reserved(order_id: AggregateId, quantity: u32) -> Self {
        InventoryEvent::StockReserved(StockReservedData {
            order_id,
            quantity,
            reserved_at: Utc::now(),
        })
    }

    /// Creates a ReservationConfirmed event.
    pub fn reservation_confirmed(order_id: AggregateId, quantity: u32) -> Self {
        InventoryEvent::ReservationConfirmed(ReservationConfirmedData {
            order_id,
            quantity,
            confirmed_at: Utc::now(),
        })
    }

    /// Creates a ReservationReleased event.
    pub fn reservation_released(
        order_id: AggregateId,
        quantity: u32,
        reason: impl Into<String>,
    ) -> Self {
        InventoryEvent::ReservationReleased(ReservationReleasedData {
            order_id,
            quantity,
            reason: reason.into(),
            released_at: Utc::now(),
        })
    }
}
