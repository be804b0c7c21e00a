//! Command handling infrastructure.

use std::marker::PhantomData;

use common::AggregateId;
use event_store::{AppendOptions, EventEnvelope, EventStore, Version};
use serde::Serialize;

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were generated and persisted.
    pub events: Vec<A::Event>,

    /// The new version of the aggregate after the command.
    pub new_version: Version,
}

/// Handler for executing commands against aggregates.
///
/// The handler loads the aggregate by replaying its events, runs the
/// command function against the reconstructed state, and appends the
/// resulting events with the loaded version as the expected version.
/// A concurrent writer to the same aggregate makes the append fail with
/// `ConcurrencyConflict`; the caller reloads and retries. The
/// guard-check and the write therefore act as one atomic conditional
/// update, never as a separate read followed by an unconditional write.
pub struct CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    _phantom: PhantomData<A>,
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    /// Creates a new command handler with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads an aggregate from the event store.
    ///
    /// If the aggregate doesn't exist, returns a default instance.
    pub async fn load(&self, aggregate_id: AggregateId) -> Result<A, DomainError>
    where
        A::Event: for<'de> serde::Deserialize<'de>,
    {
        let events = self.store.get_events_for_aggregate(aggregate_id).await?;

        let mut aggregate = A::default();
        for envelope in events {
            let event: A::Event = serde_json::from_value(envelope.payload)?;
            aggregate.apply(event);
            aggregate.set_version(envelope.version);
        }

        Ok(aggregate)
    }

    /// Loads an aggregate, returning None if it doesn't exist.
    pub async fn load_existing(&self, aggregate_id: AggregateId) -> Result<Option<A>, DomainError>
    where
        A::Event: for<'de> serde::Deserialize<'de>,
    {
        let aggregate = self.load(aggregate_id).await?;
        if aggregate.id().is_some() {
            Ok(Some(aggregate))
        } else {
            Ok(None)
        }
    }

    /// Executes a command and persists the resulting events.
    ///
    /// The command function receives the current aggregate state and returns
    /// either a list of events to apply, or an error. An empty event list is
    /// a valid no-op outcome (idempotent retries rely on this).
    pub async fn execute<F>(
        &self,
        aggregate_id: AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        A::Event: for<'de> serde::Deserialize<'de> + Serialize,
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let mut aggregate = self.load(aggregate_id).await?;
        let current_version = aggregate.version();

        let events = command_fn(&aggregate)?;

        if events.is_empty() {
            return Ok(CommandResult {
                aggregate,
                events: vec![],
                new_version: current_version,
            });
        }

        let envelopes = self.build_envelopes(aggregate_id, current_version, &events)?;

        // Persist events with optimistic concurrency
        let options = if current_version == Version::initial() {
            AppendOptions::expect_new()
        } else {
            AppendOptions::expect_version(current_version)
        };

        let new_version = self.store.append(envelopes, options).await?;

        for event in &events {
            aggregate.apply(event.clone());
        }
        aggregate.set_version(new_version);

        Ok(CommandResult {
            aggregate,
            events,
            new_version,
        })
    }

    /// Builds event envelopes from domain events.
    fn build_envelopes(
        &self,
        aggregate_id: AggregateId,
        current_version: Version,
        events: &[A::Event],
    ) -> Result<Vec<EventEnvelope>, DomainError>
    where
        A::Event: Serialize,
    {
        let mut envelopes = Vec::with_capacity(events.len());
        let mut version = current_version;

        for event in events {
            version = version.next();
            let envelope = EventEnvelope::builder()
                .aggregate_id(aggregate_id)
                .aggregate_type(A::aggregate_type())
                .event_type(event.event_type())
                .version(version)
                .payload(event)?
                .build();
            envelopes.push(envelope);
        }

        Ok(envelopes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_store::InMemoryEventStore;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    enum TallyEvent {
        Opened { id: AggregateId },
        Added { amount: u32 },
    }

    impl DomainEvent for TallyEvent {
        fn event_type(&self) -> &'static str {
            match self {
                TallyEvent::Opened { .. } => "TallyOpened",
                TallyEvent::Added { .. } => "TallyAdded",
            }
        }
    }

    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    struct Tally {
        id: Option<AggregateId>,
        total: u32,
        version: Version,
    }

    #[derive(Debug, thiserror::Error)]
    enum TallyError {
        #[error("tally not opened")]
        NotOpened,
    }

    impl From<TallyError> for DomainError {
        fn from(e: TallyError) -> Self {
            DomainError::Rejected(e.to_string())
        }
    }

    impl Aggregate for Tally {
        type Event = TallyEvent;
        type Error = TallyError;

        fn aggregate_type() -> &'static str {
            "Tally"
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

        fn apply(&mut self, event: Self::Event) {
            match event {
                TallyEvent::Opened { id } => self.id = Some(id),
                TallyEvent::Added { amount } => self.total += amount,
            }
        }
    }

    #[tokio::test]
    async fn execute_persists_and_applies() {
        let store = InMemoryEventStore::new();
        let handler: CommandHandler<_, Tally> = CommandHandler::new(store);
        let id = AggregateId::new();

        let result = handler
            .execute(id, |_| Ok(vec![TallyEvent::Opened { id }]))
            .await
            .unwrap();
        assert_eq!(result.new_version, Version::first());
        assert_eq!(result.aggregate.id(), Some(id));

        let result = handler
            .execute(id, |_| Ok(vec![TallyEvent::Added { amount: 7 }]))
            .await
            .unwrap();
        assert_eq!(result.new_version, Version::new(2));
        assert_eq!(result.aggregate.total, 7);
    }

    #[tokio::test]
    async fn execute_with_no_events_is_a_noop() {
        let store = InMemoryEventStore::new();
        let handler: CommandHandler<_, Tally> = CommandHandler::new(store);
        let id = AggregateId::new();

        let result = handler.execute(id, |_| Ok(vec![])).await.unwrap();
        assert_eq!(result.new_version, Version::initial());
        assert!(result.events.is_empty());
    }

    #[tokio::test]
    async fn command_errors_do_not_persist_anything() {
        let store = InMemoryEventStore::new();
        let handler: CommandHandler<_, Tally> = CommandHandler::new(store.clone());
        let id = AggregateId::new();

        let result = handler
            .execute(id, |_| Err::<Vec<TallyEvent>, _>(TallyError::NotOpened))
            .await;
        assert!(result.is_err());
        assert_eq!(store.event_count().await, 0);
    }

    #[tokio::test]
    async fn load_existing_distinguishes_absent_aggregates() {
        let store = InMemoryEventStore::new();
        let handler: CommandHandler<_, Tally> = CommandHandler::new(store);
        let id = AggregateId::new();

        assert!(handler.load_existing(id).await.unwrap().is_none());

        handler
            .execute(id, |_| Ok(vec![TallyEvent::Opened { id }]))
            .await
            .unwrap();

        let loaded = handler.load_existing(id).await.unwrap().unwrap();
        assert_eq!(loaded.id(), Some(id));
    }

    #[tokio::test]
    async fn load_replays_all_events() {
        let store = InMemoryEventStore::new();
        let handler: CommandHandler<_, Tally> = CommandHandler::new(store);
        let id = AggregateId::new();

        handler
            .execute(id, |_| Ok(vec![TallyEvent::Opened { id }]))
            .await
            .unwrap();
        for amount in [1, 2, 3] {
            handler
                .execute(id, |_| Ok(vec![TallyEvent::Added { amount }]))
                .await
                .unwrap();
        }

        let loaded = handler.load(id).await.unwrap();
        assert_eq!(loaded.total, 6);
        assert_eq!(loaded.version(), Version::new(4));
    }
}
