//! Database statistics.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ducklet_core::Database;
//!
//! let db = Database::open(None)?;
//! let conn = db.connect()?;
//! conn.query("SELECT 42")?;
//!
//! let stats = db.stats();
//! println!("Queries: {}", stats.queries_executed);
//! println!("Rows: {}", stats.rows_produced);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Query and connection counters.
///
/// All counters are atomic and monotonically increasing, so they can be
/// read while queries run on other threads.
#[derive(Debug, Default)]
pub struct DatabaseStats {
    /// Statements that completed successfully.
    queries_executed: AtomicU64,
    /// Calls to `query` that returned an error.
    queries_failed: AtomicU64,
    /// Rows materialized into result sets.
    rows_produced: AtomicU64,
    /// Connections opened.
    connections_opened: AtomicU64,
    /// Connections disconnected or dropped.
    connections_closed: AtomicU64,
}

impl DatabaseStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful statement and the rows it produced.
    pub(crate) fn record_query(&self, rows: usize) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
        self.rows_produced
            .fetch_add(u64::try_from(rows).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    /// Records a failed query.
    pub(crate) fn record_failure(&self) {
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a new connection.
    pub(crate) fn record_connect(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a closed connection.
    pub(crate) fn record_disconnect(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of successful statements.
    pub fn queries_executed(&self) -> u64 {
        self.queries_executed.load(Ordering::Relaxed)
    }

    /// Returns the number of failed queries.
    pub fn queries_failed(&self) -> u64 {
        self.queries_failed.load(Ordering::Relaxed)
    }

    /// Returns the number of rows produced.
    pub fn rows_produced(&self) -> u64 {
        self.rows_produced.load(Ordering::Relaxed)
    }

    /// Returns the number of connections opened.
    pub fn connections_opened(&self) -> u64 {
        self.connections_opened.load(Ordering::Relaxed)
    }

    /// Returns the number of connections closed.
    pub fn connections_closed(&self) -> u64 {
        self.connections_closed.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            queries_executed: self.queries_executed(),
            queries_failed: self.queries_failed(),
            rows_produced: self.rows_produced(),
            connections_opened: self.connections_opened(),
            connections_closed: self.connections_closed(),
        }
    }
}

/// A point-in-time copy of [`DatabaseStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Statements that completed successfully.
    pub queries_executed: u64,
    /// Calls to `query` that returned an error.
    pub queries_failed: u64,
    /// Rows materialized into result sets.
    pub rows_produced: u64,
    /// Connections opened.
    pub connections_opened: u64,
    /// Connections disconnected or dropped.
    pub connections_closed: u64,
}

impl StatsSnapshot {
    /// Connections opened and not yet closed.
    #[must_use]
    pub fn live_connections(&self) -> u64 {
        self.connections_opened.saturating_sub(self.connections_closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let stats = DatabaseStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn record_queries() {
        let stats = DatabaseStats::new();
        stats.record_query(3);
        stats.record_query(0);
        stats.record_failure();

        let snap = stats.snapshot();
        assert_eq!(snap.queries_executed, 2);
        assert_eq!(snap.queries_failed, 1);
        assert_eq!(snap.rows_produced, 3);
    }

    #[test]
    fn connection_counters() {
        let stats = DatabaseStats::new();
        stats.record_connect();
        stats.record_connect();
        stats.record_disconnect();
        assert_eq!(stats.snapshot().live_connections(), 1);
    }

    #[test]
    fn concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(DatabaseStats::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let s = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    s.record_query(2);
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(stats.queries_executed(), 1000);
        assert_eq!(stats.rows_produced(), 2000);
    }
}
