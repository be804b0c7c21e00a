//! PostgreSQL integration tests
//!
//! These tests start a PostgreSQL container via testcontainers and are
//! `#[ignore]`d so plain `cargo test` passes on machines without Docker.
//! Run with:
//!
//! ```bash
//! cargo test -p event-store --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use event_store::{
    AggregateId, AppendOptions, EventEnvelope, EventStore, EventStoreError, EventStoreExt,
    PostgresEventStore, Version,
};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!("../../../migrations/0001_create_events.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresEventStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE events")
        .execute(&pool)
        .await
        .unwrap();

    PostgresEventStore::new(pool)
}

fn create_test_event(
    aggregate_id: AggregateId,
    version: Version,
    event_type: &str,
) -> EventEnvelope {
    EventEnvelope::builder()
        .aggregate_id(aggregate_id)
        .aggregate_type("InventoryRecord")
        .event_type(event_type)
        .version(version)
        .payload_raw(serde_json::json!({"quantity": 1}))
        .build()
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn append_and_load_roundtrip() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    let events = vec![
        create_test_event(aggregate_id, Version::new(1), "StockProvisioned"),
        create_test_event(aggregate_id, Version::new(2), "StockReserved"),
    ];

    let version = store
        .append(events, AppendOptions::expect_new())
        .await
        .unwrap();
    assert_eq!(version, Version::new(2));

    let loaded = store.get_events_for_aggregate(aggregate_id).await.unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].event_type, "StockProvisioned");
    assert_eq!(loaded[1].version, Version::new(2));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn expected_version_mismatch_is_rejected() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    store
        .append(
            vec![create_test_event(
                aggregate_id,
                Version::first(),
                "StockProvisioned",
            )],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    // A second writer that still believes the aggregate is new must lose
    let result = store
        .append(
            vec![create_test_event(
                aggregate_id,
                Version::first(),
                "StockReserved",
            )],
            AppendOptions::expect_new(),
        )
        .await;

    assert!(matches!(
        result,
        Err(EventStoreError::ConcurrencyConflict { .. })
    ));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn unique_constraint_catches_racing_writers() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    // Two appends at the same version without an expectation: the
    // (aggregate_id, version) constraint must reject the second.
    store
        .append(
            vec![create_test_event(
                aggregate_id,
                Version::first(),
                "StockProvisioned",
            )],
            AppendOptions::new(),
        )
        .await
        .unwrap();

    let result = store
        .append(
            vec![create_test_event(
                aggregate_id,
                Version::first(),
                "StockReserved",
            )],
            AppendOptions::new(),
        )
        .await;

    assert!(matches!(
        result,
        Err(EventStoreError::ConcurrencyConflict { .. })
    ));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn get_events_by_type_spans_aggregates() {
    let store = get_test_store().await;
    let id1 = AggregateId::new();
    let id2 = AggregateId::new();

    store
        .append(
            vec![create_test_event(id1, Version::first(), "StockReserved")],
            AppendOptions::new(),
        )
        .await
        .unwrap();
    store
        .append(
            vec![create_test_event(id2, Version::first(), "StockReserved")],
            AppendOptions::new(),
        )
        .await
        .unwrap();

    let events = store.get_events_by_type("StockReserved").await.unwrap();
    assert_eq!(events.len(), 2);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn aggregate_version_and_existence() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    assert!(!store.aggregate_exists(aggregate_id).await.unwrap());

    store
        .append(
            vec![create_test_event(
                aggregate_id,
                Version::first(),
                "StockProvisioned",
            )],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    assert!(store.aggregate_exists(aggregate_id).await.unwrap());
    assert_eq!(
        store.get_aggregate_version(aggregate_id).await.unwrap(),
        Some(Version::first())
    );
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn stream_all_events_in_order() {
    use futures_util::StreamExt;

    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    for v in 1..=3 {
        store
            .append(
                vec![create_test_event(
                    aggregate_id,
                    Version::new(v),
                    "StockAdded",
                )],
                AppendOptions::new(),
            )
            .await
            .unwrap();
    }

    let stream = store.stream_all_events().await.unwrap();
    let events: Vec<_> = stream.map(|e| e.unwrap()).collect().await;
    assert_eq!(events.len(), 3);
}
