//! Event persistence for the order fulfillment system.
//!
//! Every aggregate mutation in this system is an event appended with an
//! expected-version check. That check is the compare-and-swap that keeps
//! concurrent reservations against the same inventory record from both
//! reading "available" and both writing: the loser gets a
//! [`EventStoreError::ConcurrencyConflict`] and must reload and retry.

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use store::{AppendOptions, EventStore, EventStoreExt, EventStream};
