//! Payment service providing a simplified API for payment records.

use common::AggregateId;
use event_store::EventStore;

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;
use crate::value_objects::{CustomerId, Money};

use super::record::PaymentRecord;

/// Service for managing per-order payment records.
///
/// The record's stream ID is derived from the order ID, so every caller
/// that mentions the same order reaches the same record.
pub struct PaymentService<S: EventStore> {
    handler: CommandHandler<S, PaymentRecord>,
}

impl<S: EventStore> PaymentService<S> {
    /// Creates a new payment service with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, PaymentRecord> {
        &self.handler
    }

    /// Opens the payment attempt for an order. Idempotent per order.
    #[tracing::instrument(skip(self))]
    pub async fn open_payment(
        &self,
        order_id: AggregateId,
        customer_id: CustomerId,
        amount: Money,
    ) -> Result<CommandResult<PaymentRecord>, DomainError> {
        self.handler
            .execute(PaymentRecord::stream_id(order_id), move |record| {
                record.open(order_id, customer_id, amount)
            })
            .await
    }

    /// Records a successful settlement for an order's payment.
    #[tracing::instrument(skip(self))]
    pub async fn record_success(
        &self,
        order_id: AggregateId,
        transaction_id: &str,
    ) -> Result<CommandResult<PaymentRecord>, DomainError> {
        let result = self
            .handler
            .execute(PaymentRecord::stream_id(order_id), |record| {
                record.succeed(transaction_id)
            })
            .await?;

        if !result.events.is_empty() {
            metrics::counter!("payments_succeeded_total").increment(1);
        }

        Ok(result)
    }

    /// Records a failed settlement for an order's payment.
    #[tracing::instrument(skip(self))]
    pub async fn record_failure(
        &self,
        order_id: AggregateId,
        reason: &str,
        error_code: Option<String>,
    ) -> Result<CommandResult<PaymentRecord>, DomainError> {
        let result = self
            .handler
            .execute(PaymentRecord::stream_id(order_id), |record| {
                record.fail(reason, error_code)
            })
            .await?;

        if !result.events.is_empty() {
            metrics::counter!("payments_failed_total").increment(1);
        }

        Ok(result)
    }

    /// Attaches a free-form operator note to an order's payment.
    #[tracing::instrument(skip(self, note))]
    pub async fn add_note(
        &self,
        order_id: AggregateId,
        note: &str,
    ) -> Result<CommandResult<PaymentRecord>, DomainError> {
        self.handler
            .execute(PaymentRecord::stream_id(order_id), |record| {
                record.annotate(note)
            })
            .await
    }

    /// Loads the payment record for an order, if one was opened.
    #[tracing::instrument(skip(self))]
    pub async fn get_payment(
        &self,
        order_id: AggregateId,
    ) -> Result<Option<PaymentRecord>, DomainError> {
        self.handler
            .load_existing(PaymentRecord::stream_id(order_id))
            .await
    }
}
