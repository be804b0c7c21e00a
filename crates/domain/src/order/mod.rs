//! Order aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod service;
mod state;

pub use aggregate::Order;
pub use commands::*;
pub use events::{
    OrderCancelledData, OrderConfirmedData, OrderDeliveredData, OrderEvent, OrderPlacedData,
    OrderProcessingStartedData,
};
pub use service::OrderService;
pub use state::OrderStatus;

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order stream already holds a placed order.
    #[error("Order already placed")]
    AlreadyPlaced,

    /// Order is not in the expected state.
    #[error("Invalid state transition: cannot {action} from {current_state} state")]
    InvalidStateTransition {
        current_state: OrderStatus,
        action: &'static str,
    },

    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Invalid price.
    #[error("Invalid price: {price} (must be greater than 0)")]
    InvalidPrice { price: i64 },
}
