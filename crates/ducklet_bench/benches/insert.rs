//! Insert benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ducklet_bench::{insert_statement, BENCH_SCHEMA};
use ducklet_core::Database;

/// Benchmark multi-row inserts of increasing batch size.
fn bench_batch_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_insert");

    for batch_size in [1, 10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            batch_size,
            |b, &batch_size| {
                let db = Database::open(None).unwrap();
                let conn = db.connect().unwrap();
                conn.query(BENCH_SCHEMA).unwrap();

                // Pre-generate statement text
                let sql = insert_statement(0, batch_size);

                b.iter(|| {
                    conn.query(black_box(&sql)).unwrap();
                });
            },
        );
    }
    group.finish();
}

/// Benchmark bulk update and delete over a fixed table.
fn bench_mutations(c: &mut Criterion) {
    let mut group = c.benchmark_group("mutations");

    group.bench_function("update", |b| {
        let (_db, conn) = ducklet_bench::populated_database(10_000).unwrap();
        b.iter(|| {
            conn.query(black_box("UPDATE bench SET flag = NOT flag WHERE category < 8"))
                .unwrap();
        });
    });

    group.bench_function("delete_reinsert", |b| {
        let (_db, conn) = ducklet_bench::populated_database(10_000).unwrap();
        let refill = insert_statement(20_000, 100);
        b.iter(|| {
            conn.query(black_box("DELETE FROM bench WHERE id >= 20000")).unwrap();
            conn.query(&refill).unwrap();
        });
    });
    group.finish();
}

criterion_group!(benches, bench_batch_insert, bench_mutations);
criterion_main!(benches);
