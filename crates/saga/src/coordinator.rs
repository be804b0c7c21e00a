//! The order fulfillment coordinator.
//!
//! Reacts to one message at a time: load the current state, decide,
//! write through the domain services, and hand back any follow-up
//! messages. All saga state lives in the aggregates themselves, so a
//! crashed coordinator resumes by simply receiving the next delivery.

use std::sync::Arc;

use chrono::Utc;
use common::AggregateId;
use domain::{
    CancelOrder, ConfirmOrder, CustomerId, DomainError, HoldState, InventoryError,
    InventoryLedger, InventoryRecord, Money, Order, OrderService, OrderStatus, PaymentRecord,
    PaymentService, PaymentStatus,
};
use event_store::EventStore;

use crate::error::SagaError;
use crate::gateway::{GatewayOutcome, PaymentGateway};
use crate::messages::{ReservedItem, SagaMessage};

/// Orchestrates order fulfillment across inventory, payment, and the
/// order itself, with compensation on failure.
pub struct SagaCoordinator<S: EventStore> {
    orders: OrderService<S>,
    payments: PaymentService<S>,
    ledger: InventoryLedger<S>,
    gateway: Arc<dyn PaymentGateway>,
}

impl<S: EventStore + Clone> SagaCoordinator<S> {
    /// Creates a new coordinator over a shared event store.
    pub fn new(store: S, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            orders: OrderService::new(store.clone()),
            payments: PaymentService::new(store.clone()),
            ledger: InventoryLedger::new(store),
            gateway,
        }
    }

    /// Returns the order service backing this coordinator.
    pub fn orders(&self) -> &OrderService<S> {
        &self.orders
    }

    /// Returns the payment service backing this coordinator.
    pub fn payments(&self) -> &PaymentService<S> {
        &self.payments
    }

    /// Returns the inventory ledger backing this coordinator.
    pub fn ledger(&self) -> &InventoryLedger<S> {
        &self.ledger
    }

    /// Routes a message to its handler.
    #[tracing::instrument(skip(self, message), fields(message_type = message.message_type(), order_id = %message.order_id()))]
    pub async fn handle(&self, message: SagaMessage) -> Result<Vec<SagaMessage>, SagaError> {
        metrics::counter!("saga_messages_total", "type" => message.message_type()).increment(1);

        match message {
            SagaMessage::OrderCreated { order_id, .. } => {
                self.handle_order_created(order_id).await
            }
            SagaMessage::InventoryReserved { order_id, .. } => {
                self.handle_inventory_reserved(order_id).await
            }
            SagaMessage::PaymentCompleted {
                order_id,
                transaction_id,
                ..
            } => self.handle_payment_completed(order_id, &transaction_id).await,
            SagaMessage::PaymentFailed {
                order_id,
                failure_reason,
                ..
            } => self.handle_payment_failed(order_id, &failure_reason).await,
        }
    }

    /// Step 1: place holds on every item of a new order.
    ///
    /// If any item cannot be reserved the holds already taken for this
    /// order are released and the order is cancelled; a partially
    /// reserved order never survives.
    pub async fn handle_order_created(
        &self,
        order_id: AggregateId,
    ) -> Result<Vec<SagaMessage>, SagaError> {
        let order = self.load_order(order_id).await?;

        match order.status() {
            OrderStatus::Pending => {}
            OrderStatus::Cancelled => {
                self.discard_stale("OrderCreated", order_id, order.status());
                // The order may have been cancelled between our holds
                // and this redelivery; make sure none survive it.
                self.release_holds(&order, order_id, "order cancelled")
                    .await?;
                return Ok(vec![]);
            }
            status => {
                self.discard_stale("OrderCreated", order_id, status);
                return Ok(vec![]);
            }
        }

        let customer_id = order
            .customer_id()
            .ok_or_else(|| SagaError::Consistency(format!("order {order_id} has no customer")))?;

        let mut reserved = Vec::new();
        for item in order.items() {
            match self
                .ledger
                .reserve(&item.product_id, order_id, item.quantity)
                .await
            {
                Ok(_) => reserved.push(ReservedItem {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                    reservation_ref: InventoryRecord::stream_id(&item.product_id),
                }),
                Err(DomainError::Inventory(InventoryError::InsufficientStock {
                    ref product_id,
                    ..
                })) => {
                    tracing::info!(
                        order_id = %order_id,
                        product_id = %product_id,
                        "reservation failed, compensating"
                    );
                    self.release_holds(&order, order_id, "insufficient stock")
                        .await?;
                    self.orders
                        .cancel_order(
                            CancelOrder::new(order_id, format!(
                                "insufficient stock for {product_id}"
                            ))
                            .by("fulfillment"),
                        )
                        .await?;
                    metrics::counter!("saga_orders_compensated_total").increment(1);
                    return Ok(vec![]);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(vec![SagaMessage::InventoryReserved {
            order_id,
            customer_id,
            reserved_items: reserved,
            reserved_at: Utc::now(),
        }])
    }

    /// Step 2: charge the customer once all holds are in place.
    pub async fn handle_inventory_reserved(
        &self,
        order_id: AggregateId,
    ) -> Result<Vec<SagaMessage>, SagaError> {
        let order = self.load_order(order_id).await?;

        match order.status() {
            OrderStatus::Pending => {}
            OrderStatus::Cancelled => {
                self.discard_stale("InventoryReserved", order_id, order.status());
                self.release_holds(&order, order_id, "order cancelled")
                    .await?;
                return Ok(vec![]);
            }
            status => {
                self.discard_stale("InventoryReserved", order_id, status);
                return Ok(vec![]);
            }
        }

        let customer_id = order
            .customer_id()
            .ok_or_else(|| SagaError::Consistency(format!("order {order_id} has no customer")))?;
        let amount = order.total_amount();

        self.payments
            .open_payment(order_id, customer_id, amount)
            .await?;

        // A redelivery after the gateway already answered must reuse
        // the recorded outcome, never charge again.
        if let Some(record) = self.payments.get_payment(order_id).await?
            && record.status().is_terminal()
        {
            return Ok(vec![self.resolution_message(order_id, customer_id, amount, &record)]);
        }

        let outcome = self.gateway.authorize(order_id, customer_id, amount).await;
        let payment_id = PaymentRecord::stream_id(order_id);

        match outcome {
            GatewayOutcome::Approved { transaction_id } => {
                self.payments
                    .record_success(order_id, &transaction_id)
                    .await?;
                Ok(vec![SagaMessage::PaymentCompleted {
                    payment_id,
                    order_id,
                    customer_id,
                    amount,
                    transaction_id,
                    completed_at: Utc::now(),
                }])
            }
            GatewayOutcome::Declined { reason, error_code } => {
                self.payments
                    .record_failure(order_id, &reason, error_code.clone())
                    .await?;
                Ok(vec![SagaMessage::PaymentFailed {
                    payment_id,
                    order_id,
                    customer_id,
                    failure_reason: reason,
                    error_code,
                    failed_at: Utc::now(),
                }])
            }
        }
    }

    /// Step 3a: payment settled; make the holds permanent and confirm
    /// the order.
    ///
    /// If the order was cancelled while the payment was in flight, the
    /// cancellation wins: the holds are released and the settled amount
    /// is left for the refund process to pick up from the payment
    /// record.
    pub async fn handle_payment_completed(
        &self,
        order_id: AggregateId,
        transaction_id: &str,
    ) -> Result<Vec<SagaMessage>, SagaError> {
        let order = self.load_order(order_id).await?;

        match order.status() {
            OrderStatus::Pending => {}
            OrderStatus::Cancelled => {
                self.discard_stale("PaymentCompleted", order_id, order.status());
                self.release_holds(&order, order_id, "order cancelled")
                    .await?;
                return Ok(vec![]);
            }
            status => {
                self.discard_stale("PaymentCompleted", order_id, status);
                return Ok(vec![]);
            }
        }

        for item in order.items() {
            match self
                .ledger
                .confirm_reservation(&item.product_id, order_id)
                .await
            {
                Ok(_) => {}
                Err(DomainError::Inventory(InventoryError::InvalidReservationState {
                    state,
                    ..
                })) => {
                    return Err(SagaError::Consistency(format!(
                        "payment for order {order_id} settled but hold on {} is {}",
                        item.product_id,
                        state.map(|s| s.to_string()).unwrap_or_else(|| "absent".into()),
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.orders
            .confirm_order(ConfirmOrder::new(order_id, transaction_id))
            .await?;
        metrics::counter!("saga_orders_confirmed_total").increment(1);

        Ok(vec![])
    }

    /// Step 3b: payment failed; undo the holds and cancel the order.
    pub async fn handle_payment_failed(
        &self,
        order_id: AggregateId,
        failure_reason: &str,
    ) -> Result<Vec<SagaMessage>, SagaError> {
        let order = self.load_order(order_id).await?;

        match order.status() {
            OrderStatus::Pending | OrderStatus::Cancelled => {}
            status => {
                // A late failure signal (timeout sweep racing the real
                // outcome) never cancels a sale that already settled.
                self.discard_stale("PaymentFailed", order_id, status);
                return Ok(vec![]);
            }
        }

        self.release_holds(&order, order_id, "payment failed").await?;

        self.orders
            .cancel_order(
                CancelOrder::new(order_id, format!("payment failed: {failure_reason}"))
                    .by("fulfillment"),
            )
            .await?;
        metrics::counter!("saga_orders_compensated_total").increment(1);

        Ok(vec![])
    }

    /// Cancels an order on behalf of a customer or operator.
    ///
    /// The inventory side is reconciled before the order is touched, so
    /// a rejected cancellation leaves no partial write: a pending
    /// order's holds are released, a confirmed order's already-deducted
    /// stock is returned to the pool, and an order past the
    /// cancellation window is rejected untouched.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        order_id: AggregateId,
        reason: &str,
        cancelled_by: &str,
    ) -> Result<(), SagaError> {
        let order = self.load_order(order_id).await?;

        match order.status() {
            OrderStatus::Pending => {
                self.release_holds(&order, order_id, reason).await?;
            }
            OrderStatus::Confirmed => {
                self.restock_confirmed_order(&order, order_id).await?;
            }
            // Cancelled: duplicate cancel, already reconciled.
            // Processing/Delivered: the aggregate rejects below without
            // any inventory having been touched.
            _ => {}
        }

        self.orders
            .cancel_order(CancelOrder::new(order_id, reason).by(cancelled_by))
            .await?;
        Ok(())
    }

    async fn load_order(&self, order_id: AggregateId) -> Result<Order, SagaError> {
        self.orders
            .get_order(order_id)
            .await?
            .ok_or(SagaError::OrderNotFound(order_id))
    }

    fn discard_stale(&self, message_type: &'static str, order_id: AggregateId, status: OrderStatus) {
        tracing::warn!(
            order_id = %order_id,
            status = %status,
            message_type,
            "discarding stale message"
        );
        metrics::counter!("saga_stale_messages_total", "type" => message_type).increment(1);
    }

    /// Releases every hold this order may have, tolerating items that
    /// were never reserved or were already released.
    async fn release_holds(
        &self,
        order: &Order,
        order_id: AggregateId,
        reason: &str,
    ) -> Result<(), SagaError> {
        for item in order.items() {
            match self
                .ledger
                .release_reservation(&item.product_id, order_id, reason)
                .await
            {
                Ok(_) => {}
                Err(DomainError::Inventory(InventoryError::InvalidReservationState {
                    state: None,
                    ..
                })) => {
                    // Never reserved; nothing to undo.
                }
                Err(DomainError::Inventory(InventoryError::NotProvisioned)) => {
                    // No ledger stream for this product; nothing to undo.
                }
                Err(DomainError::Inventory(InventoryError::InvalidReservationState {
                    state: Some(HoldState::Confirmed),
                    ..
                })) => {
                    return Err(SagaError::Consistency(format!(
                        "cannot release confirmed hold on {} for order {order_id}",
                        item.product_id
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Returns a confirmed order's stock to the available pool.
    ///
    /// Confirmed holds were already deducted from on-hand quantity, so
    /// undoing them is a restock; a hold still active (payment outcome
    /// racing the cancellation) is released instead.
    async fn restock_confirmed_order(
        &self,
        order: &Order,
        order_id: AggregateId,
    ) -> Result<(), SagaError> {
        for item in order.items() {
            let record = self.ledger.get_record(&item.product_id).await?;
            let hold_state = record
                .as_ref()
                .and_then(|r| r.hold_for(&order_id))
                .map(|hold| hold.state);

            match hold_state {
                Some(HoldState::Confirmed) => {
                    self.ledger
                        .add_stock(&item.product_id, item.quantity)
                        .await?;
                    tracing::info!(
                        order_id = %order_id,
                        product_id = %item.product_id,
                        quantity = item.quantity,
                        "restocked confirmed hold for cancelled order"
                    );
                }
                Some(HoldState::Held) => {
                    self.ledger
                        .release_reservation(&item.product_id, order_id, "order cancelled")
                        .await?;
                }
                Some(HoldState::Released) | None => {}
            }
        }
        Ok(())
    }

    fn resolution_message(
        &self,
        order_id: AggregateId,
        customer_id: CustomerId,
        amount: Money,
        record: &PaymentRecord,
    ) -> SagaMessage {
        let payment_id = PaymentRecord::stream_id(order_id);
        match record.status() {
            PaymentStatus::Success => SagaMessage::PaymentCompleted {
                payment_id,
                order_id,
                customer_id,
                amount,
                transaction_id: record.transaction_id().unwrap_or_default().to_string(),
                completed_at: Utc::now(),
            },
            _ => SagaMessage::PaymentFailed {
                payment_id,
                order_id,
                customer_id,
                failure_reason: record
                    .failure_reason()
                    .unwrap_or("payment failed")
                    .to_string(),
                error_code: None,
                failed_at: Utc::now(),
            },
        }
    }
}
