//! Domain layer for the order fulfillment system.
//!
//! This crate provides:
//! - Aggregate and DomainEvent traits for event-sourced entities
//! - A generic CommandHandler (replay, guard, append with expected version)
//! - The inventory ledger: per-product stock with reversible holds
//! - The order aggregate and its status state machine
//! - The payment record and its status state machine

pub mod aggregate;
pub mod command;
pub mod error;
pub mod inventory;
pub mod order;
pub mod payment;
pub mod value_objects;

pub use aggregate::{Aggregate, DomainEvent};
pub use command::{CommandHandler, CommandResult};
pub use error::DomainError;
pub use inventory::{
    Hold, HoldState, InventoryError, InventoryEvent, InventoryLedger, InventoryRecord,
};
pub use order::{
    CancelOrder, ConfirmOrder, DeliverOrder, Order, OrderError, OrderEvent, OrderService,
    OrderStatus, PlaceOrder, StartProcessing,
};
pub use payment::{PaymentError, PaymentEvent, PaymentRecord, PaymentService, PaymentStatus};
pub use value_objects::{CustomerId, Money, OrderItem, PaymentMethod, ProductId, ShippingAddress};
