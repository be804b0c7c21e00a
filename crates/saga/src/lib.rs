//! Order fulfillment saga.
//!
//! This crate provides:
//! - SagaMessage: the at-least-once, unordered message vocabulary
//! - SagaCoordinator: per-message handlers with compensation
//! - PaymentGateway: the external payment provider seam
//! - DeliveryPump: an in-process queue with bounded redelivery and a
//!   dead letter list

pub mod coordinator;
pub mod delivery;
pub mod error;
pub mod gateway;
pub mod messages;

pub use coordinator::SagaCoordinator;
pub use delivery::{DeadLetter, DeliveryPump};
pub use error::SagaError;
pub use gateway::{GatewayOutcome, MockPaymentGateway, PaymentGateway};
pub use messages::{ReservedItem, SagaMessage};
