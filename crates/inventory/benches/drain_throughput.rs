use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use rust_decimal::Decimal;

use dulceria_core::ProductId;
use dulceria_inventory::{
    InMemoryLedgerStore, InventoryLedger, MovementKind, PendingOperation,
};

/// Register `operations` pending mutations spread over `products` distinct
/// products, then drain once.
fn register_and_drain(products: usize, operations: usize) {
    let ledger = InventoryLedger::new(InMemoryLedgerStore::new());
    let product_ids: Vec<ProductId> = (0..products).map(|_| ProductId::new()).collect();

    for i in 0..operations {
        let product_id = product_ids[i % products];
        let kind = if i % 3 == 0 {
            MovementKind::In
        } else {
            MovementKind::Out
        };
        ledger.register_movement(PendingOperation::new(
            kind,
            product_id,
            Decimal::from((i % 7 + 1) as u32),
            "bench",
        ));
    }

    ledger.drain_and_apply();
    black_box(ledger.pending_operations());
}

fn bench_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("drain_and_apply");

    for &operations in &[100usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(operations as u64));

        // Many lines touching few products (the batching sweet spot).
        group.bench_with_input(
            BenchmarkId::new("few_products", operations),
            &operations,
            |b, &operations| b.iter(|| register_and_drain(10, operations)),
        );

        // One product per operation (worst case for grouping).
        group.bench_with_input(
            BenchmarkId::new("distinct_products", operations),
            &operations,
            |b, &operations| b.iter(|| register_and_drain(operations, operations)),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_drain);
criterion_main!(benches);
