//! Inventory ledger service providing a simplified API for stock operations.

use common::AggregateId;
use event_store::{EventStore, EventStoreError};

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;
use crate::value_objects::ProductId;

use super::events::InventoryEvent;
use super::record::InventoryRecord;
use super::InventoryError;

/// How many times a conflicting conditional write is retried before the
/// error is surfaced to the caller.
const MAX_CONFLICT_RETRIES: u32 = 16;

/// Service for managing per-product stock ledgers.
///
/// Every operation is a conditional write: the record is rebuilt from
/// its stream, the guard runs against that state, and the resulting
/// events are appended with the loaded version as the expected version.
/// When a concurrent writer wins the race the append fails, the record
/// is reloaded, and the guard runs again against the fresh state, up to
/// a bounded number of attempts. Two orders racing for the last unit
/// therefore resolve to exactly one hold.
pub struct InventoryLedger<S: EventStore> {
    handler: CommandHandler<S, InventoryRecord>,
}

impl<S: EventStore> InventoryLedger<S> {
    /// Creates a new inventory ledger with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, InventoryRecord> {
        &self.handler
    }

    async fn execute_with_retry<F>(
        &self,
        product_id: &ProductId,
        command_fn: F,
    ) -> Result<CommandResult<InventoryRecord>, DomainError>
    where
        F: Fn(&InventoryRecord) -> Result<Vec<InventoryEvent>, InventoryError>,
    {
        let stream_id = InventoryRecord::stream_id(product_id);
        let mut attempt = 0;

        loop {
            match self.handler.execute(stream_id, &command_fn).await {
                Err(DomainError::EventStore(EventStoreError::ConcurrencyConflict {
                    expected,
                    actual,
                    ..
                })) if attempt < MAX_CONFLICT_RETRIES => {
                    attempt += 1;
                    metrics::counter!("inventory_write_conflicts_total").increment(1);
                    tracing::debug!(
                        product_id = %product_id,
                        expected = %expected,
                        actual = %actual,
                        attempt,
                        "conditional write lost the race, retrying against fresh state"
                    );
                }
                result => return result,
            }
        }
    }

    /// Registers a product in the ledger with its initial stock.
    #[tracing::instrument(skip(self))]
    pub async fn provision(
        &self,
        product_id: ProductId,
        initial_quantity: u32,
    ) -> Result<CommandResult<InventoryRecord>, DomainError> {
        let stream_key = product_id.clone();
        self.execute_with_retry(&stream_key, move |record| {
            record.provision(product_id.clone(), initial_quantity)
        })
        .await
    }

    /// Adds restocked quantity to a product's available pool.
    #[tracing::instrument(skip(self))]
    pub async fn add_stock(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<CommandResult<InventoryRecord>, DomainError> {
        self.execute_with_retry(product_id, |record| record.add_stock(quantity))
            .await
    }

    /// Removes quantity from a product's available pool.
    #[tracing::instrument(skip(self))]
    pub async fn reduce_stock(
        &self,
        product_id: &ProductId,
        quantity: u32,
        reason: &str,
    ) -> Result<CommandResult<InventoryRecord>, DomainError> {
        self.execute_with_retry(product_id, |record| record.reduce_stock(quantity, reason))
            .await
    }

    /// Places stock on hold for an order.
    ///
    /// Idempotent per (order, product): a redelivered reservation for an
    /// order that already holds (or held) this product succeeds without
    /// producing events.
    #[tracing::instrument(skip(self))]
    pub async fn reserve(
        &self,
        product_id: &ProductId,
        order_id: AggregateId,
        quantity: u32,
    ) -> Result<CommandResult<InventoryRecord>, DomainError> {
        let result = self
            .execute_with_retry(product_id, |record| record.reserve(order_id, quantity))
            .await?;

        if !result.events.is_empty() {
            metrics::counter!("inventory_reservations_total").increment(1);
        }

        Ok(result)
    }

    /// Converts an order's hold into a permanent deduction.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_reservation(
        &self,
        product_id: &ProductId,
        order_id: AggregateId,
    ) -> Result<CommandResult<InventoryRecord>, DomainError> {
        self.execute_with_retry(product_id, |record| record.confirm_reservation(order_id))
            .await
    }

    /// Cancels an order's hold and returns the stock.
    #[tracing::instrument(skip(self))]
    pub async fn release_reservation(
        &self,
        product_id: &ProductId,
        order_id: AggregateId,
        reason: &str,
    ) -> Result<CommandResult<InventoryRecord>, DomainError> {
        let result = self
            .execute_with_retry(product_id, |record| {
                record.release_reservation(order_id, reason)
            })
            .await?;

        if !result.events.is_empty() {
            metrics::counter!("inventory_releases_total").increment(1);
        }

        Ok(result)
    }

    /// Loads a product's current ledger state, if provisioned.
    #[tracing::instrument(skip(self))]
    pub async fn get_record(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<InventoryRecord>, DomainError> {
        self.handler
            .load_existing(InventoryRecord::stream_id(product_id))
            .await
    }
}
