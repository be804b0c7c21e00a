//! The inventory record aggregate.

use std::collections::HashMap;

use common::AggregateId;
use event_store::Version;
use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::value_objects::ProductId;

use super::events::InventoryEvent;
use super::hold::{Hold, HoldState};
use super::InventoryError;

/// Namespace for deriving inventory stream IDs from product SKUs.
const INVENTORY_NAMESPACE: Uuid = Uuid::from_bytes([
    0x7a, 0x3f, 0x1c, 0x52, 0x9e, 0x44, 0x4b, 0x8d, 0xa1, 0x06, 0x5b, 0xe2, 0x90, 0x17, 0x3c, 0x64,
]);

/// Per-product stock ledger.
///
/// Tracks the on-hand quantity, the portion of it set aside by active
/// holds, and the per-order holds themselves. The available quantity is
/// always `quantity - reserved`, and `reserved <= quantity` holds after
/// every event.
#[derive(Debug, Default, Clone)]
pub struct InventoryRecord {
    id: Option<AggregateId>,
    version: Version,
    product_id: Option<ProductId>,
    quantity: u32,
    reserved: u32,
    holds: HashMap<AggregateId, Hold>,
}

impl InventoryRecord {
    /// Derives the deterministic stream ID for a product.
    ///
    /// Every caller that mentions the same SKU ends up on the same
    /// event stream, which is what makes concurrent reservations
    /// contend on one version counter.
    pub fn stream_id(product_id: &ProductId) -> AggregateId {
        AggregateId::derive(INVENTORY_NAMESPACE, product_id.as_str().as_bytes())
    }

    /// Returns the product this record tracks, if provisioned.
    pub fn product_id(&self) -> Option<&ProductId> {
        self.product_id.as_ref()
    }

    /// Returns the total on-hand quantity (including reserved stock).
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns the quantity currently set aside by active holds.
    pub fn reserved(&self) -> u32 {
        self.reserved
    }

    /// Returns the quantity available for new reservations.
    pub fn available(&self) -> u32 {
        self.quantity - self.reserved
    }

    /// Returns the hold for an order, if one was ever created.
    pub fn hold_for(&self, order_id: &AggregateId) -> Option<&Hold> {
        self.holds.get(order_id)
    }

    fn ensure_provisioned(&self) -> Result<&ProductId, InventoryError> {
        self.product_id
            .as_ref()
            .ok_or(InventoryError::NotProvisioned)
    }

    /// Registers the product in the ledger with its initial stock.
    pub fn provision(
        &self,
        product_id: ProductId,
        initial_quantity: u32,
    ) -> Result<Vec<InventoryEvent>, InventoryError> {
        if self.product_id.is_some() {
            return Err(InventoryError::AlreadyProvisioned {
                product_id: product_id.to_string(),
            });
        }

        Ok(vec![InventoryEvent::stock_provisioned(
            product_id,
            initial_quantity,
        )])
    }

    /// Adds restocked quantity to the available pool.
    pub fn add_stock(&self, quantity: u32) -> Result<Vec<InventoryEvent>, InventoryError> {
        self.ensure_provisioned()?;

        if quantity == 0 {
            return Err(InventoryError::InvalidQuantity);
        }

        Ok(vec![InventoryEvent::stock_added(quantity)])
    }

    /// Removes quantity from the available pool (shrinkage, damage).
    ///
    /// Stock under an active hold cannot be adjusted away; the ceiling
    /// is the available quantity, not the on-hand one.
    pub fn reduce_stock(
        &self,
        quantity: u32,
        reason: impl Into<String>,
    ) -> Result<Vec<InventoryEvent>, InventoryError> {
        let product_id = self.ensure_provisioned()?;

        if quantity == 0 {
            return Err(InventoryError::InvalidQuantity);
        }

        if quantity > self.available() {
            return Err(InventoryError::InsufficientStock {
                product_id: product_id.to_string(),
                requested: quantity,
                available: self.available(),
            });
        }

        Ok(vec![InventoryEvent::stock_reduced(quantity, reason)])
    }

    /// Places stock on hold for an order.
    ///
    /// Reservations are idempotent per (order, product): if a hold
    /// already exists for this order, in any state, the retry is a
    /// duplicate of an earlier delivery and produces no events.
    pub fn reserve(
        &self,
        order_id: AggregateId,
        quantity: u32,
    ) -> Result<Vec<InventoryEvent>, InventoryError> {
        let product_id = self.ensure_provisioned()?;

        if self.holds.contains_key(&order_id) {
            return Ok(vec![]);
        }

        if quantity == 0 {
            return Err(InventoryError::InvalidQuantity);
        }

        if quantity > self.available() {
            return Err(InventoryError::InsufficientStock {
                product_id: product_id.to_string(),
                requested: quantity,
                available: self.available(),
            });
        }

        Ok(vec![InventoryEvent::stock_reserved(order_id, quantity)])
    }

    /// Converts an order's hold into a permanent deduction.
    ///
    /// Confirming an already-confirmed hold is a duplicate delivery and
    /// produces no events. Confirming a released or absent hold is a
    /// consistency error the caller must surface.
    pub fn confirm_reservation(
        &self,
        order_id: AggregateId,
    ) -> Result<Vec<InventoryEvent>, InventoryError> {
        self.ensure_provisioned()?;

        match self.holds.get(&order_id) {
            Some(hold) if hold.state.can_confirm() => Ok(vec![
                InventoryEvent::reservation_confirmed(order_id, hold.quantity),
            ]),
            Some(hold) if hold.state == HoldState::Confirmed => Ok(vec![]),
            Some(hold) => Err(InventoryError::InvalidReservationState {
                order_id,
                state: Some(hold.state),
                attempted: "confirm",
            }),
            None => Err(InventoryError::InvalidReservationState {
                order_id,
                state: None,
                attempted: "confirm",
            }),
        }
    }

    /// Cancels an order's hold and returns the stock.
    ///
    /// Releasing an already-released hold is a duplicate delivery and
    /// produces no events. Releasing a confirmed or absent hold is a
    /// consistency error.
    pub fn release_reservation(
        &self,
        order_id: AggregateId,
        reason: impl Into<String>,
    ) -> Result<Vec<InventoryEvent>, InventoryError> {
        self.ensure_provisioned()?;

        match self.holds.get(&order_id) {
            Some(hold) if hold.state.can_release() => Ok(vec![
                InventoryEvent::reservation_released(order_id, hold.quantity, reason),
            ]),
            Some(hold) if hold.state == HoldState::Released => Ok(vec![]),
            Some(hold) => Err(InventoryError::InvalidReservationState {
                order_id,
                state: Some(hold.state),
                attempted: "release",
            }),
            None => Err(InventoryError::InvalidReservationState {
                order_id,
                state: None,
                attempted: "release",
            }),
        }
    }
}

impl Aggregate for InventoryRecord {
    type Event = InventoryEvent;
    type Error = InventoryError;

    fn aggregate_type() -> &'static str {
        "InventoryRecord"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: InventoryEvent) {
        match event {
            InventoryEvent::StockProvisioned(data) => {
                self.id = Some(Self::stream_id(&data.product_id));
                self.product_id = Some(data.product_id);
                self.quantity = data.initial_quantity;
            }
            InventoryEvent::StockAdded(data) => {
                self.quantity += data.quantity;
            }
            InventoryEvent::StockReduced(data) => {
                self.quantity -= data.quantity;
            }
            InventoryEvent::StockReserved(data) => {
                self.reserved += data.quantity;
                self.holds.insert(data.order_id, Hold::new(data.quantity));
            }
            InventoryEvent::ReservationConfirmed(data) => {
                if let Some(hold) = self.holds.get_mut(&data.order_id) {
                    self.quantity -= hold.quantity;
                    self.reserved -= hold.quantity;
                    hold.state = HoldState::Confirmed;
                }
            }
            InventoryEvent::ReservationReleased(data) => {
                if let Some(hold) = self.holds.get_mut(&data.order_id) {
                    self.reserved -= hold.quantity;
                    hold.state = HoldState::Released;
                }
            }
        }
    }
}
