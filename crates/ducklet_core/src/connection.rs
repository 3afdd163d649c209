//! Connections: query sessions bound to one database.

use crate::database::DatabaseInner;
use crate::error::{CoreError, CoreResult};
use crate::exec;
use crate::result::ResultSet;
use crate::sql;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// A session on a [`Database`](crate::Database).
///
/// A connection is meant for one caller at a time. Statements from
/// different connections are serialized on the database's catalog lock.
pub struct Connection {
    db: Arc<DatabaseInner>,
    closed: AtomicBool,
}

impl Connection {
    pub(crate) fn new(db: Arc<DatabaseInner>) -> Self {
        Self {
            db,
            closed: AtomicBool::new(false),
        }
    }

    /// Runs `sql` and returns the result of its last statement.
    ///
    /// Several `;`-separated statements run in order under one catalog
    /// lock; the first failure stops the batch.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConnectionClosed`] or
    /// [`CoreError::DatabaseClosed`] for closed handles, and the statement's
    /// error otherwise.
    pub fn query(&self, sql: &str) -> CoreResult<ResultSet> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CoreError::ConnectionClosed);
        }
        self.db.ensure_open()?;

        match self.run(sql) {
            Ok(result) => {
                debug!(
                    sql,
                    rows = result.row_count(),
                    columns = result.column_count(),
                    "query executed"
                );
                Ok(result)
            }
            Err(err) => {
                self.db.stats.record_failure();
                warn!(sql, kind = %err.kind(), error = %err, "query failed");
                Err(err)
            }
        }
    }

    fn run(&self, sql: &str) -> CoreResult<ResultSet> {
        let statements = sql::parse(sql)?;
        if statements.is_empty() {
            return Err(CoreError::query(
                "Invalid Input Error: No statement to prepare!",
            ));
        }
        let mut catalog = self.db.catalog.lock();
        let mut last = None;
        for statement in &statements {
            let result = exec::execute(&mut catalog, &self.db.config, statement)?;
            self.db.stats.record_query(result.row_count());
            last = Some(result);
        }
        Ok(last.unwrap_or_else(ResultSet::empty))
    }

    /// Closes the connection. Disconnecting twice is a no-op.
    pub fn disconnect(&self) -> CoreResult<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.db.release_connection();
        }
        Ok(())
    }

    /// Checks if the connection is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("is_open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{CoreError, ErrorKind};
    use crate::types::LogicalType;
    use crate::Database;

    #[test]
    fn query_returns_last_statement() {
        let db = Database::open(None).unwrap();
        let conn = db.connect().unwrap();
        let result = conn
            .query("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (1), (2); SELECT sum_x FROM t")
            .unwrap_err();
        assert_eq!(result.kind(), ErrorKind::Query);

        // Statements before the failure took effect
        let result = conn.query("SELECT x FROM t ORDER BY x DESC;").unwrap();
        assert_eq!(result.column_type(0).unwrap(), LogicalType::Integer);
        assert_eq!(result.value_i32(0, 0).unwrap(), Some(2));
    }

    #[test]
    fn empty_query_is_an_error() {
        let db = Database::open(None).unwrap();
        let conn = db.connect().unwrap();
        for sql in ["", "  ", "-- nothing", ";"] {
            let err = conn.query(sql).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Query, "{sql:?}");
        }
    }

    #[test]
    fn syntax_errors_are_query_errors() {
        let db = Database::open(None).unwrap();
        let conn = db.connect().unwrap();
        let err = conn.query("SELECT FROM").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Query);
        assert!(err.to_string().starts_with("Parser Error"));
    }

    #[test]
    fn closed_connection_rejects_queries() {
        let db = Database::open(None).unwrap();
        let conn = db.connect().unwrap();
        conn.disconnect().unwrap();
        conn.disconnect().unwrap();
        assert!(!conn.is_open());
        let err = conn.query("SELECT 1").unwrap_err();
        assert!(matches!(err, CoreError::ConnectionClosed));
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(db.connection_count(), 0);
    }

    #[test]
    fn stats_track_queries() {
        let db = Database::open(None).unwrap();
        let conn = db.connect().unwrap();
        conn.query("VALUES (1), (2), (3)").unwrap();
        conn.query("SELECT 1").unwrap();
        assert!(conn.query("SELECT nope").is_err());

        let stats = db.stats();
        assert_eq!(stats.queries_executed, 2);
        assert_eq!(stats.queries_failed, 1);
        assert_eq!(stats.rows_produced, 4);
    }

    #[test]
    fn connection_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<crate::Connection>();
        assert_send_sync::<Database>();
    }

    #[test]
    fn concurrent_connections() {
        let db = Database::open(None).unwrap();
        db.connect()
            .unwrap()
            .query("CREATE TABLE t (x INTEGER)")
            .unwrap();

        std::thread::scope(|scope| {
            for i in 0..4 {
                let conn = db.connect().unwrap();
                scope.spawn(move || {
                    for j in 0..25 {
                        conn.query(&format!("INSERT INTO t VALUES ({})", i * 100 + j))
                            .unwrap();
                    }
                });
            }
        });

        let conn = db.connect().unwrap();
        let result = conn.query("SELECT x FROM t").unwrap();
        assert_eq!(result.row_count(), 100);
    }
}
