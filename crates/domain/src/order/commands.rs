//! Order commands.

use common::AggregateId;

use crate::value_objects::{CustomerId, OrderItem, PaymentMethod, ShippingAddress};

/// Command to place a new order.
///
/// The item list is final: an order's contents cannot change after
/// placement, only its lifecycle state can.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    /// The order ID to create.
    pub order_id: AggregateId,

    /// The customer placing the order.
    pub customer_id: CustomerId,

    /// The items being ordered.
    pub items: Vec<OrderItem>,

    /// How the customer will pay.
    pub payment_method: PaymentMethod,

    /// Where the order ships to.
    pub shipping_address: Option<ShippingAddress>,
}

impl PlaceOrder {
    /// Creates a new PlaceOrder command.
    pub fn new(order_id: AggregateId, customer_id: CustomerId, items: Vec<OrderItem>) -> Self {
        Self {
            order_id,
            customer_id,
            items,
            payment_method: PaymentMethod::default(),
            shipping_address: None,
        }
    }

    /// Creates a new PlaceOrder command with a generated order ID.
    pub fn for_customer(customer_id: CustomerId, items: Vec<OrderItem>) -> Self {
        Self::new(AggregateId::new(), customer_id, items)
    }

    /// Sets the payment method.
    pub fn pay_with(mut self, payment_method: PaymentMethod) -> Self {
        self.payment_method = payment_method;
        self
    }

    /// Sets the shipping address.
    pub fn ship_to(mut self, address: ShippingAddress) -> Self {
        self.shipping_address = Some(address);
        self
    }
}

/// Command to confirm an order after payment settles.
#[derive(Debug, Clone)]
pub struct ConfirmOrder {
    /// The order to confirm.
    pub order_id: AggregateId,

    /// Payment transaction reference.
    pub transaction_id: String,
}

impl ConfirmOrder {
    /// Creates a new ConfirmOrder command.
    pub fn new(order_id: AggregateId, transaction_id: impl Into<String>) -> Self {
        Self {
            order_id,
            transaction_id: transaction_id.into(),
        }
    }
}

/// Command to start fulfillment of a confirmed order.
#[derive(Debug, Clone)]
pub struct StartProcessing {
    /// The order to start fulfilling.
    pub order_id: AggregateId,
}

impl StartProcessing {
    /// Creates a new StartProcessing command.
    pub fn new(order_id: AggregateId) -> Self {
        Self { order_id }
    }
}

/// Command to mark an order as delivered.
#[derive(Debug, Clone)]
pub struct DeliverOrder {
    /// The order that was delivered.
    pub order_id: AggregateId,

    /// Shipment tracking number, if any.
    pub tracking_number: Option<String>,
}

impl DeliverOrder {
    /// Creates a new DeliverOrder command.
    pub fn new(order_id: AggregateId, tracking_number: Option<String>) -> Self {
        Self {
            order_id,
            tracking_number,
        }
    }
}

/// Command to cancel an order.
#[derive(Debug, Clone)]
pub struct CancelOrder {
    /// The order to cancel.
    pub order_id: AggregateId,

    /// Reason for cancellation.
    pub reason: String,

    /// Who cancelled the order.
    pub cancelled_by: Option<String>,
}

impl CancelOrder {
    /// Creates a new CancelOrder command.
    pub fn new(order_id: AggregateId, reason: impl Into<String>) -> Self {
        Self {
            order_id,
            reason: reason.into(),
            cancelled_by: None,
        }
    }

    /// Sets who cancelled the order.
    pub fn by(mut self, cancelled_by: impl Into<String>) -> Self {
        self.cancelled_by = Some(cancelled_by.into());
        self
    }
}
