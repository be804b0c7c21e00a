//! Read model views for the query side.

pub mod order_status;
pub mod stock_levels;

pub use order_status::{OrderStatusView, OrderSummary};
pub use stock_levels::{StockLevel, StockLevelsView};
