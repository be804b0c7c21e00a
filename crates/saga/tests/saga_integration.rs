//! End-to-end tests for the order fulfillment saga.
//!
//! Every test runs against a shared in-memory event store, driving the
//! coordinator through the delivery pump the way a message broker would,
//! including duplicate and late deliveries.

use std::sync::Arc;

use chrono::Utc;
use common::AggregateId;
use domain::{
    CustomerId, HoldState, Money, OrderItem, OrderStatus, PaymentStatus, PlaceOrder, ProductId,
};
use event_store::InMemoryEventStore;
use saga::{DeliveryPump, MockPaymentGateway, SagaCoordinator, SagaMessage};

struct Fixture {
    pump: DeliveryPump<InMemoryEventStore>,
    gateway: Arc<MockPaymentGateway>,
    customer_id: CustomerId,
}

impl Fixture {
    async fn new(stock: &[(&str, u32)]) -> Self {
        let store = InMemoryEventStore::new();
        let gateway = Arc::new(MockPaymentGateway::new());
        let coordinator = Arc::new(SagaCoordinator::new(store, gateway.clone()));

        for (sku, quantity) in stock {
            coordinator
                .ledger()
                .provision(ProductId::new(*sku), *quantity)
                .await
                .unwrap();
        }

        Self {
            pump: DeliveryPump::new(coordinator),
            gateway,
            customer_id: CustomerId::new(),
        }
    }

    fn coordinator(&self) -> &Arc<SagaCoordinator<InMemoryEventStore>> {
        self.pump.coordinator()
    }

    async fn place_order(&self, items: Vec<OrderItem>) -> (AggregateId, SagaMessage) {
        let cmd = PlaceOrder::for_customer(self.customer_id, items);
        let order_id = cmd.order_id;
        let placed = self
            .coordinator()
            .orders()
            .place_order(cmd)
            .await
            .unwrap();

        let message = SagaMessage::OrderCreated {
            order_id,
            customer_id: self.customer_id,
            total_amount: placed.aggregate.total_amount(),
            created_at: Utc::now(),
        };
        (order_id, message)
    }

    async fn order_status(&self, order_id: AggregateId) -> OrderStatus {
        self.coordinator()
            .orders()
            .get_order(order_id)
            .await
            .unwrap()
            .unwrap()
            .status()
    }

    async fn available(&self, sku: &str) -> u32 {
        self.coordinator()
            .ledger()
            .get_record(&ProductId::new(sku))
            .await
            .unwrap()
            .unwrap()
            .available()
    }
}

fn item(sku: &str, quantity: u32, cents: i64) -> OrderItem {
    OrderItem::new(sku, quantity, Money::from_cents(cents))
}

#[tokio::test]
async fn happy_path_confirms_order_and_deducts_stock() {
    let mut fx = Fixture::new(&[("SKU-001", 10), ("SKU-002", 5)]).await;
    let (order_id, message) = fx
        .place_order(vec![item("SKU-001", 2, 1000), item("SKU-002", 1, 500)])
        .await;

    fx.pump.enqueue(message);
    fx.pump.run_until_idle().await.unwrap();

    assert_eq!(fx.order_status(order_id).await, OrderStatus::Confirmed);
    assert!(fx.pump.dead_letters().is_empty());

    // Confirmed holds deduct permanently.
    let record = fx
        .coordinator()
        .ledger()
        .get_record(&ProductId::new("SKU-001"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.quantity(), 8);
    assert_eq!(record.reserved(), 0);
    assert_eq!(
        record.hold_for(&order_id).unwrap().state,
        HoldState::Confirmed
    );

    let payment = fx
        .coordinator()
        .payments()
        .get_payment(order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status(), PaymentStatus::Success);
}

#[tokio::test]
async fn insufficient_stock_releases_sibling_holds_and_cancels() {
    let mut fx = Fixture::new(&[("SKU-001", 10), ("SKU-002", 1)]).await;
    let (order_id, message) = fx
        .place_order(vec![item("SKU-001", 2, 1000), item("SKU-002", 3, 500)])
        .await;

    fx.pump.enqueue(message);
    fx.pump.run_until_idle().await.unwrap();

    assert_eq!(fx.order_status(order_id).await, OrderStatus::Cancelled);
    assert!(fx.pump.dead_letters().is_empty());

    // The first item's hold was taken, then released when the second
    // failed; nothing stays reserved for a dead order.
    assert_eq!(fx.available("SKU-001").await, 10);
    assert_eq!(fx.available("SKU-002").await, 1);
}

#[tokio::test]
async fn payment_decline_compensates_and_cancels() {
    let mut fx = Fixture::new(&[("SKU-001", 10)]).await;
    fx.gateway.set_decline("card declined", Some("051".into()));

    let (order_id, message) = fx.place_order(vec![item("SKU-001", 2, 1000)]).await;

    fx.pump.enqueue(message);
    fx.pump.run_until_idle().await.unwrap();

    assert_eq!(fx.order_status(order_id).await, OrderStatus::Cancelled);
    assert_eq!(fx.available("SKU-001").await, 10);
    assert!(fx.pump.dead_letters().is_empty());

    let payment = fx
        .coordinator()
        .payments()
        .get_payment(order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status(), PaymentStatus::Failed);
    assert_eq!(payment.failure_reason(), Some("card declined"));
}

#[tokio::test]
async fn duplicate_order_created_charges_and_reserves_once() {
    let mut fx = Fixture::new(&[("SKU-001", 10)]).await;
    let (order_id, message) = fx.place_order(vec![item("SKU-001", 2, 1000)]).await;

    // The broker delivers the same message twice.
    fx.pump.enqueue(message.clone());
    fx.pump.enqueue(message);
    fx.pump.run_until_idle().await.unwrap();

    assert_eq!(fx.order_status(order_id).await, OrderStatus::Confirmed);
    assert!(fx.pump.dead_letters().is_empty());

    let record = fx
        .coordinator()
        .ledger()
        .get_record(&ProductId::new("SKU-001"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.quantity(), 8);
    assert_eq!(record.reserved(), 0);
}

#[tokio::test]
async fn redelivered_reservation_reuses_recorded_payment_outcome() {
    let fx = Fixture::new(&[("SKU-001", 10)]).await;
    let (order_id, _) = fx.place_order(vec![item("SKU-001", 2, 1000)]).await;

    let coordinator = fx.coordinator();
    let follow_ups = coordinator.handle_order_created(order_id).await.unwrap();
    assert_eq!(follow_ups.len(), 1);

    // Two deliveries of InventoryReserved while the order is still
    // pending: the second must reuse the first authorization.
    let first = coordinator
        .handle_inventory_reserved(order_id)
        .await
        .unwrap();
    let second = coordinator
        .handle_inventory_reserved(order_id)
        .await
        .unwrap();

    let txn = |msgs: &[SagaMessage]| match &msgs[0] {
        SagaMessage::PaymentCompleted { transaction_id, .. } => transaction_id.clone(),
        other => panic!("expected PaymentCompleted, got {}", other.message_type()),
    };
    assert_eq!(txn(&first), txn(&second));
}

#[tokio::test]
async fn late_messages_after_confirmation_are_discarded() {
    let mut fx = Fixture::new(&[("SKU-001", 10)]).await;
    let (order_id, message) = fx.place_order(vec![item("SKU-001", 2, 1000)]).await;

    fx.pump.enqueue(message.clone());
    fx.pump.run_until_idle().await.unwrap();
    assert_eq!(fx.order_status(order_id).await, OrderStatus::Confirmed);

    // A very late redelivery of the original trigger changes nothing.
    fx.pump.enqueue(message);
    fx.pump.run_until_idle().await.unwrap();

    assert_eq!(fx.order_status(order_id).await, OrderStatus::Confirmed);
    assert!(fx.pump.dead_letters().is_empty());

    let record = fx
        .coordinator()
        .ledger()
        .get_record(&ProductId::new("SKU-001"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.quantity(), 8);
}

#[tokio::test]
async fn late_payment_failure_after_confirmation_is_discarded() {
    let mut fx = Fixture::new(&[("SKU-001", 10)]).await;
    let (order_id, message) = fx.place_order(vec![item("SKU-001", 2, 1000)]).await;

    fx.pump.enqueue(message);
    fx.pump.run_until_idle().await.unwrap();
    assert_eq!(fx.order_status(order_id).await, OrderStatus::Confirmed);

    // A timeout sweep reports a failure long after the real outcome
    // settled; the sale stands and nothing is dead-lettered.
    fx.pump.enqueue(SagaMessage::PaymentFailed {
        payment_id: AggregateId::new(),
        order_id,
        customer_id: fx.customer_id,
        failure_reason: "payment window expired".to_string(),
        error_code: None,
        failed_at: Utc::now(),
    });
    fx.pump.run_until_idle().await.unwrap();

    assert!(fx.pump.dead_letters().is_empty());
    assert_eq!(fx.order_status(order_id).await, OrderStatus::Confirmed);

    let record = fx
        .coordinator()
        .ledger()
        .get_record(&ProductId::new("SKU-001"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.quantity(), 8);
    assert_eq!(record.reserved(), 0);
}

#[tokio::test]
async fn duplicate_payment_completed_confirms_once() {
    let mut fx = Fixture::new(&[("SKU-001", 10)]).await;
    let (order_id, _) = fx.place_order(vec![item("SKU-001", 2, 1000)]).await;

    let coordinator = Arc::clone(fx.coordinator());
    coordinator.handle_order_created(order_id).await.unwrap();
    let follow_ups = coordinator
        .handle_inventory_reserved(order_id)
        .await
        .unwrap();
    let settled = follow_ups.into_iter().next().unwrap();

    // The broker delivers the settlement twice.
    fx.pump.enqueue(settled.clone());
    fx.pump.enqueue(settled);
    fx.pump.run_until_idle().await.unwrap();

    assert_eq!(fx.order_status(order_id).await, OrderStatus::Confirmed);
    assert!(fx.pump.dead_letters().is_empty());

    let record = fx
        .coordinator()
        .ledger()
        .get_record(&ProductId::new("SKU-001"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.quantity(), 8);
    assert_eq!(record.reserved(), 0);
}

#[tokio::test]
async fn admin_cancel_of_confirmed_order_restocks() {
    let mut fx = Fixture::new(&[("SKU-001", 10)]).await;
    let (order_id, message) = fx.place_order(vec![item("SKU-001", 2, 1000)]).await;

    fx.pump.enqueue(message);
    fx.pump.run_until_idle().await.unwrap();
    assert_eq!(fx.order_status(order_id).await, OrderStatus::Confirmed);
    assert_eq!(fx.available("SKU-001").await, 8);

    fx.coordinator()
        .cancel_order(order_id, "refund requested", "admin")
        .await
        .unwrap();

    assert_eq!(fx.order_status(order_id).await, OrderStatus::Cancelled);
    assert_eq!(fx.available("SKU-001").await, 10);
}

#[tokio::test]
async fn cancellation_wins_over_in_flight_payment() {
    let fx = Fixture::new(&[("SKU-001", 10)]).await;
    let (order_id, _) = fx.place_order(vec![item("SKU-001", 2, 1000)]).await;

    let coordinator = fx.coordinator();
    coordinator.handle_order_created(order_id).await.unwrap();

    // The customer cancels while the charge is in flight.
    coordinator
        .cancel_order(order_id, "changed my mind", "customer")
        .await
        .unwrap();

    // The settled payment then arrives; the cancellation stands and the
    // holds come back.
    let result = coordinator
        .handle_payment_completed(order_id, "txn-000001")
        .await
        .unwrap();
    assert!(result.is_empty());

    assert_eq!(fx.order_status(order_id).await, OrderStatus::Cancelled);
    assert_eq!(fx.available("SKU-001").await, 10);
}

#[tokio::test]
async fn cancel_after_processing_is_rejected() {
    let mut fx = Fixture::new(&[("SKU-001", 10)]).await;
    let (order_id, message) = fx.place_order(vec![item("SKU-001", 2, 1000)]).await;

    fx.pump.enqueue(message);
    fx.pump.run_until_idle().await.unwrap();

    fx.coordinator()
        .orders()
        .start_processing(domain::order::StartProcessing::new(order_id))
        .await
        .unwrap();

    let result = fx
        .coordinator()
        .cancel_order(order_id, "too late", "customer")
        .await;
    assert!(result.is_err());
    assert_eq!(fx.order_status(order_id).await, OrderStatus::Processing);
}

#[tokio::test]
async fn unknown_order_goes_to_dead_letters() {
    let mut fx = Fixture::new(&[]).await;

    fx.pump.enqueue(SagaMessage::OrderCreated {
        order_id: AggregateId::new(),
        customer_id: CustomerId::new(),
        total_amount: Money::from_cents(100),
        created_at: Utc::now(),
    });
    fx.pump.run_until_idle().await.unwrap();

    assert_eq!(fx.pump.dead_letters().len(), 1);
}
