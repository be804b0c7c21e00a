use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AggregateId;

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random event ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an event ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Version number for an aggregate, used for optimistic concurrency control.
///
/// Versions start at 1 for the first event and increment by 1 for each
/// subsequent event on an aggregate. An aggregate with no events is at
/// version 0.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the initial version (0) for a new aggregate.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the first version (1) for the first event.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// An event envelope containing an event along with its metadata.
///
/// Wraps a domain event with everything needed for storage and retrieval:
/// identity, stream position, and an opaque JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique identifier for this event.
    pub event_id: EventId,

    /// The type of the event (e.g., "StockReserved", "OrderCancelled").
    pub event_type: String,

    /// The aggregate this event belongs to.
    pub aggregate_id: AggregateId,

    /// The type of aggregate (e.g., "InventoryRecord", "Order").
    pub aggregate_type: String,

    /// The version of the aggregate after this event.
    pub version: Version,

    /// When the event occurred.
    pub timestamp: DateTime<Utc>,

    /// The serialized event payload.
    pub payload: serde_json::Value,

    /// Additional metadata (correlation IDs, delivery attempt, etc.).
    pub metadata: HashMap<String, serde_json::Value>,
}

impl EventEnvelope {
    /// Starts building a new event envelope.
    pub fn builder() -> EventEnvelopeBuilder {
        EventEnvelopeBuilder::default()
    }
}

/// Builder for [`EventEnvelope`].
#[derive(Debug, Default)]
pub struct EventEnvelopeBuilder {
    event_type: Option<String>,
    aggregate_id: Option<AggregateId>,
    aggregate_type: Option<String>,
    version: Option<Version>,
    payload: Option<serde_json::Value>,
    metadata: HashMap<String, serde_json::Value>,
}

impl EventEnvelopeBuilder {
    /// Sets the event type.
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Sets the aggregate ID.
    pub fn aggregate_id(mut self, aggregate_id: AggregateId) -> Self {
        self.aggregate_id = Some(aggregate_id);
        self
    }

    /// Sets the aggregate type.
    pub fn aggregate_type(mut self, aggregate_type: impl Into<String>) -> Self {
        self.aggregate_type = Some(aggregate_type.into());
        self
    }

    /// Sets the version.
    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Serializes and sets the payload.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self, serde_json::Error> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    /// Sets a raw JSON payload.
    pub fn payload_raw(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Adds a metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Builds the envelope, assigning a fresh event ID and timestamp.
    ///
    /// Panics if a required field is missing; envelope construction is
    /// always driven by the command handler, which sets every field.
    pub fn build(self) -> EventEnvelope {
        EventEnvelope {
            event_id: EventId::new(),
            event_type: self.event_type.expect("event_type is required"),
            aggregate_id: self.aggregate_id.expect("aggregate_id is required"),
            aggregate_type: self.aggregate_type.expect("aggregate_type is required"),
            version: self.version.unwrap_or_else(Version::first),
            timestamp: Utc::now(),
            payload: self.payload.unwrap_or(serde_json::Value::Null),
            metadata: self.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_ordering_and_next() {
        assert!(Version::initial() < Version::first());
        assert_eq!(Version::initial().next(), Version::first());
        assert_eq!(Version::new(41).next(), Version::new(42));
    }

    #[test]
    fn version_display() {
        assert_eq!(Version::new(7).to_string(), "7");
    }

    #[test]
    fn builder_produces_complete_envelope() {
        let aggregate_id = AggregateId::new();
        let envelope = EventEnvelope::builder()
            .event_type("StockReserved")
            .aggregate_id(aggregate_id)
            .aggregate_type("InventoryRecord")
            .version(Version::first())
            .payload_raw(serde_json::json!({"quantity": 3}))
            .metadata("attempt", serde_json::json!(1))
            .build();

        assert_eq!(envelope.event_type, "StockReserved");
        assert_eq!(envelope.aggregate_id, aggregate_id);
        assert_eq!(envelope.aggregate_type, "InventoryRecord");
        assert_eq!(envelope.version, Version::first());
        assert_eq!(envelope.payload["quantity"], 3);
        assert_eq!(envelope.metadata["attempt"], 1);
    }

    #[test]
    fn builder_serializes_typed_payload() {
        #[derive(Serialize)]
        struct Payload {
            order_id: String,
        }

        let envelope = EventEnvelope::builder()
            .event_type("ReservationConfirmed")
            .aggregate_id(AggregateId::new())
            .aggregate_type("InventoryRecord")
            .payload(&Payload {
                order_id: "abc".into(),
            })
            .unwrap()
            .build();

        assert_eq!(envelope.payload["order_id"], "abc");
    }

    #[test]
    fn envelope_serialization_roundtrip() {
        let envelope = EventEnvelope::builder()
            .event_type("StockAdded")
            .aggregate_id(AggregateId::new())
            .aggregate_type("InventoryRecord")
            .version(Version::new(3))
            .payload_raw(serde_json::json!({"quantity": 10}))
            .build();

        let json = serde_json::to_string(&envelope).unwrap();
        let back: EventEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event_id, envelope.event_id);
        assert_eq!(back.version, envelope.version);
        assert_eq!(back.payload, envelope.payload);
    }
}
