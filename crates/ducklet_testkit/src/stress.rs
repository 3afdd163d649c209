//! Stress tests for Ducklet.
//!
//! These tests verify behavior under heavy load and concurrent access.

use ducklet_core::{Database, Engine};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Success and failure counts of a stress run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StressOutcome {
    /// Operations that succeeded.
    pub successful_ops: usize,
    /// Operations that failed.
    pub failed_ops: usize,
}

impl StressOutcome {
    /// Every operation attempted.
    pub fn total_ops(&self) -> usize {
        self.successful_ops + self.failed_ops
    }
}

/// Outcome counters shared by worker threads.
#[derive(Default)]
struct Tally {
    successful: AtomicUsize,
    failed: AtomicUsize,
}

impl Tally {
    fn record(&self, ok: bool) {
        let counter = if ok { &self.successful } else { &self.failed };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn fail(&self, count: usize) {
        self.failed.fetch_add(count, Ordering::Relaxed);
    }

    fn finish(self) -> StressOutcome {
        StressOutcome {
            successful_ops: self.successful.into_inner(),
            failed_ops: self.failed.into_inner(),
        }
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform (per thread for concurrent tests).
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Rows inserted per `INSERT` statement.
    pub batch_size: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 1_000,
            threads: 4,
            batch_size: 16,
        }
    }
}

fn insert_sql(table: &str, start: usize, batch: usize) -> String {
    let values: Vec<String> = (start..start + batch)
        .map(|i| format!("({i}, 'row {i}')"))
        .collect();
    format!("INSERT INTO {table} VALUES {}", values.join(", "))
}

/// Runs batched inserts on a single connection into a fresh table `stress`.
pub fn stress_sequential_inserts(db: &Database, config: &StressConfig) -> StressOutcome {
    let tally = Tally::default();
    let Ok(conn) = db.connect() else {
        tally.fail(config.operations);
        return tally.finish();
    };
    let _ = conn.query("CREATE TABLE stress (id BIGINT, label VARCHAR)");

    for i in 0..config.operations {
        let sql = insert_sql("stress", i * config.batch_size, config.batch_size);
        tally.record(conn.query(&sql).is_ok());
    }
    tally.finish()
}

/// Runs `config.threads` connections concurrently, each inserting into its
/// own table and reading it back.
pub fn stress_concurrent_connections(db: &Database, config: &StressConfig) -> StressOutcome {
    let tally = Tally::default();

    thread::scope(|scope| {
        for t in 0..config.threads {
            let tally = &tally;
            scope.spawn(move || {
                let Ok(conn) = db.connect() else {
                    tally.fail(config.operations);
                    return;
                };
                let table = format!("stress_{t}");
                if conn
                    .query(&format!("CREATE TABLE {table} (id BIGINT, label VARCHAR)"))
                    .is_err()
                {
                    tally.fail(config.operations);
                    return;
                }

                for i in 0..config.operations {
                    let outcome = if i % 2 == 0 {
                        conn.query(&insert_sql(&table, i * config.batch_size, config.batch_size))
                    } else {
                        conn.query(&format!("SELECT id, label FROM {table} WHERE id % 7 = 0"))
                    };
                    tally.record(outcome.is_ok());
                }
                let _ = conn.disconnect();
            });
        }
    });
    tally.finish()
}

/// Opens, uses and releases handles through an [`Engine`] from many threads.
///
/// Every handle is released, so the engine must end empty.
pub fn stress_handle_churn(engine: &Engine, config: &StressConfig) -> StressOutcome {
    let tally = Tally::default();

    thread::scope(|scope| {
        for _ in 0..config.threads {
            let tally = &tally;
            scope.spawn(move || {
                for _ in 0..config.operations {
                    let outcome = (|| {
                        let db = engine.open(None)?;
                        let conn = engine.connect(db)?;
                        let result = engine.query(conn, "SELECT 42 AS answer")?;
                        engine.disconnect(conn)?;
                        let answer = engine.with_result(result, |r| r.value_i64(0, 0))??;
                        engine.destroy_result(result)?;
                        engine.close(db)?;
                        Ok::<_, ducklet_core::CoreError>(answer)
                    })();
                    tally.record(matches!(outcome, Ok(Some(42))));
                }
            });
        }
    });
    tally.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestDatabase;

    fn small() -> StressConfig {
        StressConfig {
            operations: 50,
            threads: 4,
            batch_size: 8,
        }
    }

    #[test]
    fn tally_counts_outcomes() {
        let tally = Tally::default();
        tally.record(true);
        tally.record(false);
        tally.fail(3);
        let outcome = tally.finish();
        assert_eq!(outcome.successful_ops, 1);
        assert_eq!(outcome.failed_ops, 4);
        assert_eq!(outcome.total_ops(), 5);
    }

    #[test]
    fn sequential_inserts() {
        let db = TestDatabase::memory();
        let config = small();
        let result = stress_sequential_inserts(&db, &config);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.successful_ops, config.operations);

        let conn = db.connect().unwrap();
        let rows = conn.query("SELECT id FROM stress").unwrap().row_count();
        assert_eq!(rows, config.operations * config.batch_size);
    }

    #[test]
    fn concurrent_connections() {
        let db = TestDatabase::memory();
        let config = small();
        let result = stress_concurrent_connections(&db, &config);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.total_ops(), config.threads * config.operations);
        assert_eq!(db.table_names().len(), config.threads);
        assert_eq!(db.connection_count(), 0);
    }

    #[test]
    fn handle_churn_leaves_engine_empty() {
        let engine = Engine::new();
        let result = stress_handle_churn(&engine, &small());
        assert_eq!(result.failed_ops, 0);
        assert_eq!(engine.database_count(), 0);
        assert_eq!(engine.connection_count(), 0);
        assert_eq!(engine.result_count(), 0);
    }
}
