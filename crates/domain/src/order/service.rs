//! Order service providing a simplified API for order operations.

use common::AggregateId;
use event_store::EventStore;

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::commands::{CancelOrder, ConfirmOrder, DeliverOrder, PlaceOrder, StartProcessing};
use super::Order;

/// Service for managing orders.
///
/// Provides a high-level API for order operations, wrapping the command
/// handler and providing convenient methods for common operations.
pub struct OrderService<S: EventStore> {
    handler: CommandHandler<S, Order>,
}

impl<S: EventStore> OrderService<S> {
    /// Creates a new order service with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Order> {
        &self.handler
    }

    /// Places a new order.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<CommandResult<Order>, DomainError> {
        let order_id = cmd.order_id;
        let result = self
            .handler
            .execute(order_id, move |order| order.place(cmd))
            .await?;

        metrics::counter!("orders_placed_total").increment(1);
        Ok(result)
    }

    /// Confirms an order after payment settles.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_order(
        &self,
        cmd: ConfirmOrder,
    ) -> Result<CommandResult<Order>, DomainError> {
        let transaction_id = cmd.transaction_id.clone();
        self.handler
            .execute(cmd.order_id, |order| order.confirm(transaction_id))
            .await
    }

    /// Starts fulfillment of a confirmed order.
    #[tracing::instrument(skip(self))]
    pub async fn start_processing(
        &self,
        cmd: StartProcessing,
    ) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute(cmd.order_id, |order| order.start_processing())
            .await
    }

    /// Marks an order as delivered.
    #[tracing::instrument(skip(self))]
    pub async fn deliver_order(
        &self,
        cmd: DeliverOrder,
    ) -> Result<CommandResult<Order>, DomainError> {
        let tracking_number = cmd.tracking_number.clone();
        self.handler
            .execute(cmd.order_id, |order| order.deliver(tracking_number))
            .await
    }

    /// Cancels an order.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        cmd: CancelOrder,
    ) -> Result<CommandResult<Order>, DomainError> {
        let reason = cmd.reason.clone();
        let cancelled_by = cmd.cancelled_by.clone();

        let result = self
            .handler
            .execute(cmd.order_id, |order| order.cancel(reason, cancelled_by))
            .await?;

        if !result.events.is_empty() {
            metrics::counter!("orders_cancelled_total").increment(1);
        }

        Ok(result)
    }

    /// Loads an order, if it exists.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: AggregateId) -> Result<Option<Order>, DomainError> {
        self.handler.load_existing(order_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderStatus;
    use crate::value_objects::{CustomerId, Money, OrderItem};
    use event_store::InMemoryEventStore;
    use std::sync::Arc;

    fn service() -> OrderService<Arc<InMemoryEventStore>> {
        OrderService::new(Arc::new(InMemoryEventStore::new()))
    }

    fn sample_cmd() -> PlaceOrder {
        PlaceOrder::for_customer(
            CustomerId::new(),
            vec![OrderItem::new("SKU-001", 2, Money::from_cents(1000))],
        )
    }

    #[tokio::test]
    async fn test_place_and_load() {
        let service = service();
        let cmd = sample_cmd();
        let order_id = cmd.order_id;

        service.place_order(cmd).await.unwrap();

        let order = service.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.total_amount(), Money::from_cents(2000));
    }

    #[tokio::test]
    async fn test_unknown_order_is_none() {
        let service = service();
        let order = service.get_order(AggregateId::new()).await.unwrap();
        assert!(order.is_none());
    }

    #[tokio::test]
    async fn test_confirm_then_cancel_rejected_after_processing() {
        let service = service();
        let cmd = sample_cmd();
        let order_id = cmd.order_id;

        service.place_order(cmd).await.unwrap();
        service
            .confirm_order(ConfirmOrder::new(order_id, "txn-1"))
            .await
            .unwrap();
        service
            .start_processing(StartProcessing::new(order_id))
            .await
            .unwrap();

        let result = service
            .cancel_order(CancelOrder::new(order_id, "too late"))
            .await;
        assert!(result.is_err());
    }
}
