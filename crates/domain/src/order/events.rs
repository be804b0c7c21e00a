//! Order domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::value_objects::{CustomerId, Money, OrderItem, PaymentMethod, ShippingAddress};

/// Events that can occur on an order aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// Order was placed with its full item list.
    OrderPlaced(OrderPlacedData),

    /// Inventory and payment settled; order is confirmed.
    OrderConfirmed(OrderConfirmedData),

    /// Fulfillment started; cancellation window closed.
    OrderProcessingStarted(OrderProcessingStartedData),

    /// Order reached the customer.
    OrderDelivered(OrderDeliveredData),

    /// Order was cancelled.
    OrderCancelled(OrderCancelledData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "OrderPlaced",
            OrderEvent::OrderConfirmed(_) => "OrderConfirmed",
            OrderEvent::OrderProcessingStarted(_) => "OrderProcessingStarted",
            OrderEvent::OrderDelivered(_) => "OrderDelivered",
            OrderEvent::OrderCancelled(_) => "OrderCancelled",
        }
    }
}

/// Data for OrderPlaced event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacedData {
    /// The unique order ID.
    pub order_id: AggregateId,

    /// The customer who placed the order.
    pub customer_id: CustomerId,

    /// The items ordered, with unit prices snapshotted at placement.
    pub items: Vec<OrderItem>,

    /// Total amount across all line items.
    pub total_amount: Money,

    /// How the customer is paying.
    pub payment_method: PaymentMethod,

    /// Where the order ships to.
    pub shipping_address: Option<ShippingAddress>,

    /// When the order was placed.
    pub placed_at: DateTime<Utc>,
}

/// Data for OrderConfirmed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderConfirmedData {
    /// Payment transaction reference.
    pub transaction_id: String,

    /// When the order was confirmed.
    pub confirmed_at: DateTime<Utc>,
}

/// Data for OrderProcessingStarted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderProcessingStartedData {
    /// When fulfillment started.
    pub started_at: DateTime<Utc>,
}

/// Data for OrderDelivered event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDeliveredData {
    /// When the order was delivered.
    pub delivered_at: DateTime<Utc>,

    /// Shipment tracking number.
    pub tracking_number: Option<String>,
}

/// Data for OrderCancelled event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelledData {
    /// When the order was cancelled.
    pub cancelled_at: DateTime<Utc>,

    /// Reason for cancellation.
    pub reason: String,

    /// Who cancelled the order (customer, admin, saga).
    pub cancelled_by: Option<String>,
}

// Convenience constructors for events
impl OrderEvent {
    /// Creates an OrderPlaced event.
    pub fn order_placed(
        order_id: AggregateId,
        customer_id: CustomerId,
        items: Vec<OrderItem>,
        payment_method: PaymentMethod,
        shipping_address: Option<ShippingAddress>,
    ) -> Self {
        let total_amount = items.iter().map(OrderItem::line_total).sum();
        OrderEvent::OrderPlaced(OrderPlacedData {
            order_id,
            customer_id,
            items,
            total_amount,
            payment_method,
            shipping_address,
            placed_at: Utc::now(),
        })
    }

    /// Creates an OrderConfirmed event.
    pub fn order_confirmed(transaction_id: impl Into<String>) -> Self {
        OrderEvent::OrderConfirmed(OrderConfirmedData {
            transaction_id: transaction_id.into(),
            confirmed_at: Utc::now(),
        })
    }

    /// Creates an OrderProcessingStarted event.
    pub fn order_processing_started() -> Self {
        OrderEvent::OrderProcessingStarted(OrderProcessingStartedData {
            started_at: Utc::now(),
        })
    }

    /// Creates an OrderDelivered event.
    pub fn order_delivered(tracking_number: Option<String>) -> Self {
        OrderEvent::OrderDelivered(OrderDeliveredData {
            delivered_at: Utc::now(),
            tracking_number,
        })
    }

    /// Creates an OrderCancelled event.
    pub fn order_cancelled(reason: impl Into<String>, cancelled_by: Option<String>) -> Self {
        OrderEvent::OrderCancelled(OrderCancelledData {
            cancelled_at: Utc::now(),
            reason: reason.into(),
            cancelled_by,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        let order_id = AggregateId::new();
        let customer_id = CustomerId::new();
        let items = vec![OrderItem::new("SKU-001", 2, Money::from_cents(1000))];

        let event =
            OrderEvent::order_placed(order_id, customer_id, items, PaymentMethod::default(), None);
        assert_eq!(event.event_type(), "OrderPlaced");

        let event = OrderEvent::order_confirmed("txn-123");
        assert_eq!(event.event_type(), "OrderConfirmed");

        let event = OrderEvent::order_cancelled("changed my mind", None);
        assert_eq!(event.event_type(), "OrderCancelled");
    }

    #[test]
    fn test_placed_totals_line_items() {
        let items = vec![
            OrderItem::new("SKU-001", 2, Money::from_cents(1000)),
            OrderItem::new("SKU-002", 1, Money::from_cents(500)),
        ];
        let event = OrderEvent::order_placed(
            AggregateId::new(),
            CustomerId::new(),
            items,
            PaymentMethod::default(),
            None,
        );

        let OrderEvent::OrderPlaced(data) = event else {
            panic!("expected OrderPlaced");
        };
        assert_eq!(data.total_amount, Money::from_cents(2500));
    }
}
