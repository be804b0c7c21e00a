//! The order aggregate.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::Version;

use crate::aggregate::Aggregate;
use crate::value_objects::{CustomerId, Money, OrderItem, PaymentMethod, ShippingAddress};

use super::commands::PlaceOrder;
use super::events::OrderEvent;
use super::state::OrderStatus;
use super::OrderError;

/// An order placed by a customer.
///
/// The item list is fixed at placement; everything after that is a
/// lifecycle transition. Duplicate deliveries of a transition the order
/// has already made resolve to no-ops, while transitions that contradict
/// the current state are rejected.
#[derive(Debug, Default, Clone)]
pub struct Order {
    id: Option<AggregateId>,
    version: Version,
    customer_id: Option<CustomerId>,
    items: Vec<OrderItem>,
    total_amount: Money,
    payment_method: PaymentMethod,
    shipping_address: Option<ShippingAddress>,
    placed_at: Option<DateTime<Utc>>,
    status: OrderStatus,
    transaction_id: Option<String>,
}

impl Order {
    /// Returns the customer who placed the order.
    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    /// Returns the items in the order.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns the order total, snapshotted at placement.
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    /// Returns the payment method chosen at placement.
    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Returns the shipping address, if one was given.
    pub fn shipping_address(&self) -> Option<&ShippingAddress> {
        self.shipping_address.as_ref()
    }

    /// Returns when the order was placed.
    pub fn placed_at(&self) -> Option<DateTime<Utc>> {
        self.placed_at
    }

    /// Returns the current order status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the payment transaction reference, once confirmed.
    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    /// Places the order with its full item list.
    pub fn place(&self, cmd: PlaceOrder) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_some() {
            return Err(OrderError::AlreadyPlaced);
        }

        if cmd.items.is_empty() {
            return Err(OrderError::NoItems);
        }

        for item in &cmd.items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    quantity: item.quantity,
                });
            }
            if !item.unit_price.is_positive() {
                return Err(OrderError::InvalidPrice {
                    price: item.unit_price.cents(),
                });
            }
        }

        Ok(vec![OrderEvent::order_placed(
            cmd.order_id,
            cmd.customer_id,
            cmd.items,
            cmd.payment_method,
            cmd.shipping_address,
        )])
    }

    /// Confirms the order after payment settles.
    ///
    /// A duplicate confirmation is a no-op; any other state rejects.
    pub fn confirm(
        &self,
        transaction_id: impl Into<String>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        match self.status {
            s if s.can_confirm() => Ok(vec![OrderEvent::order_confirmed(transaction_id)]),
            OrderStatus::Confirmed => Ok(vec![]),
            current_state => Err(OrderError::InvalidStateTransition {
                current_state,
                action: "confirm",
            }),
        }
    }

    /// Starts fulfillment; from here on the order cannot be cancelled.
    pub fn start_processing(&self) -> Result<Vec<OrderEvent>, OrderError> {
        match self.status {
            s if s.can_start_processing() => Ok(vec![OrderEvent::order_processing_started()]),
            OrderStatus::Processing => Ok(vec![]),
            current_state => Err(OrderError::InvalidStateTransition {
                current_state,
                action: "start processing",
            }),
        }
    }

    /// Marks the order as delivered.
    pub fn deliver(
        &self,
        tracking_number: Option<String>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        match self.status {
            s if s.can_deliver() => Ok(vec![OrderEvent::order_delivered(tracking_number)]),
            OrderStatus::Delivered => Ok(vec![]),
            current_state => Err(OrderError::InvalidStateTransition {
                current_state,
                action: "deliver",
            }),
        }
    }

    /// Cancels the order.
    ///
    /// Only possible before fulfillment starts; a duplicate cancel is a
    /// no-op.
    pub fn cancel(
        &self,
        reason: impl Into<String>,
        cancelled_by: Option<String>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        match self.status {
            s if s.can_cancel() => Ok(vec![OrderEvent::order_cancelled(reason, cancelled_by)]),
            OrderStatus::Cancelled => Ok(vec![]),
            current_state => Err(OrderError::InvalidStateTransition {
                current_state,
                action: "cancel",
            }),
        }
    }
}

impl Aggregate for Order {
    type Event = OrderEvent;
    type Error = OrderError;

    fn aggregate_type() -> &'static str {
        "Order"
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

    fn apply(&mut self, event: OrderEvent) {
        match event {
            OrderEvent::OrderPlaced(data) => {
                self.id = Some(data.order_id);
                self.customer_id = Some(data.customer_id);
                self.items = data.items;
                self.total_amount = data.total_amount;
                self.payment_method = data.payment_method;
                self.shipping_address = data.shipping_address;
                self.placed_at = Some(data.placed_at);
                self.status = OrderStatus::Pending;
            }
            OrderEvent::OrderConfirmed(data) => {
                self.status = OrderStatus::Confirmed;
                self.transaction_id = Some(data.transaction_id);
            }
            OrderEvent::OrderProcessingStarted(_) => {
                self.status = OrderStatus::Processing;
            }
            OrderEvent::OrderDelivered(_) => {
                self.status = OrderStatus::Delivered;
            }
            OrderEvent::OrderCancelled(_) => {
                self.status = OrderStatus::Cancelled;
            }
        }
    }
}
