//! Stock levels read model — current availability per product.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::AggregateId;
use domain::{InventoryEvent, ProductId};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Current stock position for one product.
#[derive(Debug, Clone)]
pub struct StockLevel {
    pub product_id: ProductId,

    /// On-hand quantity, including reserved stock.
    pub quantity: u32,

    /// Quantity currently under active holds.
    pub reserved: u32,
}

impl StockLevel {
    /// Quantity available for new reservations.
    pub fn available(&self) -> u32 {
        self.quantity - self.reserved
    }
}

struct StockLevelsState {
    levels: HashMap<ProductId, StockLevel>,
    /// Maps inventory stream IDs back to the SKU they track.
    streams: HashMap<AggregateId, ProductId>,
    position: ProjectionPosition,
}

/// Read model view answering "how much of this product is left".
///
/// Folds the inventory ledger's events; always rebuildable from the
/// store, never written to directly.
#[derive(Clone)]
pub struct StockLevelsView {
    state: Arc<RwLock<StockLevelsState>>,
}

impl StockLevelsView {
    /// Creates a new empty stock levels view.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(StockLevelsState {
                levels: HashMap::new(),
                streams: HashMap::new(),
                position: ProjectionPosition::zero(),
            })),
        }
    }

    /// Gets the stock level for a product.
    pub async fn get_level(&self, product_id: &ProductId) -> Option<StockLevel> {
        self.state.read().await.levels.get(product_id).cloned()
    }

    /// Gets all tracked products.
    pub async fn get_all(&self) -> Vec<StockLevel> {
        self.state.read().await.levels.values().cloned().collect()
    }

    /// Gets products with nothing left to reserve.
    pub async fn get_out_of_stock(&self) -> Vec<StockLevel> {
        self.state
            .read()
            .await
            .levels
            .values()
            .filter(|level| level.available() == 0)
            .cloned()
            .collect()
    }
}

impl Default for StockLevelsView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for StockLevelsView {
    fn name(&self) -> &'static str {
        "StockLevelsView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type != "InventoryRecord" {
            let mut state = self.state.write().await;
            state.position = state.position.advance();
            return Ok(());
        }

        let inventory_event: InventoryEvent = serde_json::from_value(event.payload.clone())?;
        let stream_id = event.aggregate_id;

        let mut state = self.state.write().await;

        match inventory_event {
            InventoryEvent::StockProvisioned(data) => {
                state.streams.insert(stream_id, data.product_id.clone());
                state.levels.insert(
                    data.product_id.clone(),
                    StockLevel {
                        product_id: data.product_id,
                        quantity: data.initial_quantity,
                        reserved: 0,
                    },
                );
            }
            other => {
                let Some(product_id) = state.streams.get(&stream_id).cloned() else {
                    // Event for a stream whose provisioning we never
                    // saw; nothing to fold it into.
                    state.position = state.position.advance();
                    return Ok(());
                };
                if let Some(level) = state.levels.get_mut(&product_id) {
                    match other {
                        InventoryEvent::StockAdded(data) => level.quantity += data.quantity,
                        InventoryEvent::StockReduced(data) => level.quantity -= data.quantity,
                        InventoryEvent::StockReserved(data) => level.reserved += data.quantity,
                        InventoryEvent::ReservationConfirmed(data) => {
                            level.quantity -= data.quantity;
                            level.reserved -= data.quantity;
                        }
                        InventoryEvent::ReservationReleased(data) => {
                            level.reserved -= data.quantity;
                        }
                        InventoryEvent::StockProvisioned(_) => unreachable!(),
                    }
                }
            }
        }

        state.position = state.position.advance();
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.levels.clear();
        state.streams.clear();
        state.position = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for StockLevelsView {
    fn name(&self) -> &'static str {
        "StockLevelsView"
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.levels.len()).unwrap_or(0)
    }
}
