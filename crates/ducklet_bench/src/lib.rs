//! Benchmark utilities.
//!
//! Builds SQL text and populated databases for the criterion benches.

use ducklet_core::{Connection, CoreResult, Database};
use rand::Rng;

/// Schema of the benchmark table `bench`.
pub const BENCH_SCHEMA: &str =
    "CREATE TABLE bench (id BIGINT, category INTEGER, price DECIMAL(10,2), label VARCHAR, flag BOOLEAN)";

/// Generate a random lowercase label of the specified length.
pub fn random_label(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
        .collect()
}

/// Generate an `INSERT` statement with `count` random rows, ids starting
/// at `first_id`.
pub fn insert_statement(first_id: u64, count: usize) -> String {
    let mut rng = rand::thread_rng();
    let rows: Vec<String> = (0..count as u64)
        .map(|i| {
            let category: i32 = rng.gen_range(0..16);
            let cents: u32 = rng.gen_range(0..100_000);
            let flag = if rng.gen_bool(0.5) { "TRUE" } else { "FALSE" };
            format!(
                "({}, {category}, {}.{:02}, '{}', {flag})",
                first_id + i,
                cents / 100,
                cents % 100,
                random_label(12)
            )
        })
        .collect();
    format!("INSERT INTO bench VALUES {}", rows.join(", "))
}

/// Opens an in-memory database with `rows` random rows in `bench`.
pub fn populated_database(rows: usize) -> CoreResult<(Database, Connection)> {
    let db = Database::open(None)?;
    let conn = db.connect()?;
    conn.query(BENCH_SCHEMA)?;

    let mut inserted = 0;
    while inserted < rows {
        let batch = (rows - inserted).min(1_000);
        conn.query(&insert_statement(inserted as u64, batch))?;
        inserted += batch;
    }
    Ok((db, conn))
}
