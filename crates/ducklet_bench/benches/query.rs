//! Query execution benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ducklet_bench::populated_database;

/// Benchmark full scans with projection.
fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");

    for rows in [1_000, 10_000, 100_000].iter() {
        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), rows, |b, &rows| {
            let (_db, conn) = populated_database(rows).unwrap();
            b.iter(|| {
                let result = conn.query(black_box("SELECT id, price FROM bench")).unwrap();
                black_box(result.row_count());
            });
        });
    }
    group.finish();
}

/// Benchmark filters with expression evaluation.
fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");
    let (_db, conn) = populated_database(50_000).unwrap();

    for (name, sql) in [
        ("comparison", "SELECT id FROM bench WHERE category = 3"),
        ("between", "SELECT id FROM bench WHERE price BETWEEN 10 AND 500"),
        ("like", "SELECT id FROM bench WHERE label LIKE 'a%'"),
        (
            "case",
            "SELECT CASE WHEN flag THEN upper(label) ELSE label END FROM bench WHERE id % 3 = 0",
        ),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let result = conn.query(black_box(sql)).unwrap();
                black_box(result.row_count());
            });
        });
    }
    group.finish();
}

/// Benchmark ORDER BY with LIMIT.
fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");

    for rows in [1_000, 10_000, 50_000].iter() {
        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), rows, |b, &rows| {
            let (_db, conn) = populated_database(rows).unwrap();
            b.iter(|| {
                let result = conn
                    .query(black_box(
                        "SELECT id, label FROM bench ORDER BY price DESC, id LIMIT 100",
                    ))
                    .unwrap();
                black_box(result.row_count());
            });
        });
    }
    group.finish();
}

/// Benchmark typed accessor reads over a materialized result.
fn bench_accessors(c: &mut Criterion) {
    let (_db, conn) = populated_database(10_000).unwrap();
    let result = conn.query("SELECT id, price, label FROM bench").unwrap();

    c.bench_function("accessors/i64", |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for row in 0..result.row_count() {
                sum += result.value_i64(0, row).unwrap().unwrap_or(0);
            }
            black_box(sum)
        });
    });

    c.bench_function("accessors/decimal_as_f64", |b| {
        b.iter(|| {
            let mut sum = 0.0f64;
            for row in 0..result.row_count() {
                sum += result.value_f64(1, row).unwrap().unwrap_or(0.0);
            }
            black_box(sum)
        });
    });

    c.bench_function("accessors/varchar", |b| {
        b.iter(|| {
            let mut len = 0usize;
            for row in 0..result.row_count() {
                len += result.value_string(2, row).unwrap().map_or(0, |s| s.len());
            }
            black_box(len)
        });
    });
}

criterion_group!(benches, bench_scan, bench_filter, bench_sort, bench_accessors);
criterion_main!(benches);
