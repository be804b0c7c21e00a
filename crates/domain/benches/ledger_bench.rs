use common::AggregateId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{InventoryLedger, ProductId};
use event_store::InMemoryEventStore;

/// Measures the reserve hot path: replay the product stream, run the
/// guard, append one event with the expected version.
fn bench_reserve(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("ledger/reserve_on_fresh_stream", |b| {
        b.iter(|| {
            rt.block_on(async {
                let ledger = InventoryLedger::new(InMemoryEventStore::new());
                let product = ProductId::new("SKU-BENCH");
                ledger.provision(product.clone(), 1_000_000).await.unwrap();
                ledger
                    .reserve(&product, AggregateId::new(), 1)
                    .await
                    .unwrap();
            });
        });
    });
}

/// Measures reserve latency on a stream that already carries history.
fn bench_reserve_deep_stream(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = InventoryLedger::new(InMemoryEventStore::new());
    let product = ProductId::new("SKU-DEEP");

    rt.block_on(async {
        ledger.provision(product.clone(), 1_000_000).await.unwrap();
        for _ in 0..1_000 {
            ledger
                .reserve(&product, AggregateId::new(), 1)
                .await
                .unwrap();
        }
    });

    c.bench_function("ledger/reserve_after_1000_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                ledger
                    .reserve(&product, AggregateId::new(), 1)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_rebuild_record(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = InventoryLedger::new(InMemoryEventStore::new());
    let product = ProductId::new("SKU-REPLAY");

    rt.block_on(async {
        ledger.provision(product.clone(), 1_000_000).await.unwrap();
        for _ in 0..5_000 {
            ledger
                .reserve(&product, AggregateId::new(), 1)
                .await
                .unwrap();
        }
    });

    c.bench_function("ledger/rebuild_from_5000_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let record = ledger.get_record(&product).await.unwrap().unwrap();
                assert!(record.reserved() >= 5_000);
            });
        });
    });
}

criterion_group!(
    benches,
    bench_reserve,
    bench_reserve_deep_stream,
    bench_rebuild_record
);
criterion_main!(benches);
