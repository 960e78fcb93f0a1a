use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use stocksync_core::{Barcode, ScanAction, WarehouseId};
use stocksync_store::{InMemoryInventoryStore, InventoryStore};

fn bench_same_key_applies(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_apply_same_key");

    for ops in [100u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(ops));
        group.bench_with_input(BenchmarkId::from_parameter(ops), &ops, |b, &ops| {
            b.iter(|| {
                let store = InMemoryInventoryStore::new();
                let warehouse = WarehouseId::new("A").unwrap();
                let barcode = Barcode::new("012345678905").unwrap();

                for _ in 0..ops {
                    black_box(
                        store
                            .apply(&warehouse, &barcode, ScanAction::Restock, 1)
                            .unwrap(),
                    );
                }
            });
        });
    }

    group.finish();
}

fn bench_distinct_key_applies(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_apply_distinct_keys");

    for keys in [100u64, 1_000] {
        group.throughput(Throughput::Elements(keys));
        group.bench_with_input(BenchmarkId::from_parameter(keys), &keys, |b, &keys| {
            let barcodes: Vec<Barcode> = (0..keys)
                .map(|i| Barcode::new(format!("{i:012}")).unwrap())
                .collect();

            b.iter(|| {
                let store = InMemoryInventoryStore::new();
                let warehouse = WarehouseId::new("A").unwrap();

                for barcode in &barcodes {
                    black_box(store.apply(&warehouse, barcode, ScanAction::Restock, 1).unwrap());
                }
            });
        });
    }

    group.finish();
}

fn bench_contended_sales(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_contended_sales");
    group.throughput(Throughput::Elements(1_000));

    group.bench_function("8_threads_one_key", |b| {
        b.iter(|| {
            let store = std::sync::Arc::new(InMemoryInventoryStore::new());
            let warehouse = WarehouseId::new("A").unwrap();
            let barcode = Barcode::new("012345678905").unwrap();
            store
                .apply(&warehouse, &barcode, ScanAction::Restock, 1_000)
                .unwrap();

            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let store = store.clone();
                    let warehouse = warehouse.clone();
                    let barcode = barcode.clone();
                    std::thread::spawn(move || {
                        for _ in 0..125 {
                            let _ = black_box(store.apply(&warehouse, &barcode, ScanAction::Sale, 1));
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_same_key_applies,
    bench_distinct_key_applies,
    bench_contended_sales
);
criterion_main!(benches);
