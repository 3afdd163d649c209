//! Test fixtures and database helpers.
//!
//! Provides convenience functions for setting up test databases
//! and running statements without error plumbing.

use ducklet_core::{Config, Connection, CoreResult, Database, ResultSet, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A test database with automatic cleanup.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
    path: Option<PathBuf>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestDatabase {
    /// Creates a new in-memory test database.
    pub fn memory() -> Self {
        Self {
            db: Database::open(None).expect("Failed to open in-memory database"),
            path: None,
            _temp_dir: None,
        }
    }

    /// Creates a new file-backed test database in a temporary directory.
    pub fn file() -> Self {
        Self::file_with_config(Config::default())
    }

    /// Creates a file-backed test database with a custom configuration.
    pub fn file_with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("test.ducklet");
        let db = Database::open_with_config(Some(&path), config)
            .expect("Failed to open file database");

        Self {
            db,
            path: Some(path),
            _temp_dir: Some(temp_dir),
        }
    }

    /// Returns the database path if file-backed, None if in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// A database plus one connection, with panicking helpers for tests.
pub struct Session {
    // Declared first so it is dropped before the database
    conn: Connection,
    db: TestDatabase,
}

impl Session {
    /// Opens an in-memory session.
    pub fn new() -> Self {
        Self::from_database(TestDatabase::memory())
    }

    /// Opens a session on an existing test database.
    pub fn from_database(db: TestDatabase) -> Self {
        let conn = db.connect().expect("Failed to connect");
        Self { conn, db }
    }

    /// The connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// The database.
    pub fn db(&self) -> &TestDatabase {
        &self.db
    }

    /// Runs `sql`, returning the error instead of panicking.
    pub fn try_exec(&self, sql: &str) -> CoreResult<ResultSet> {
        self.conn.query(sql)
    }

    /// Runs `sql` and panics with the error message on failure.
    pub fn exec(&self, sql: &str) -> ResultSet {
        match self.conn.query(sql) {
            Ok(result) => result,
            Err(e) => panic!("query failed: {sql}\n  {}: {e}", e.kind()),
        }
    }

    /// Runs `sql` and returns the first cell of the first row.
    ///
    /// Returns `None` when the result is empty or the cell is NULL.
    pub fn scalar(&self, sql: &str) -> Option<Value> {
        let result = self.exec(sql);
        if result.row_count() == 0 {
            return None;
        }
        result.value(0, 0).expect("result has no columns")
    }

    /// Runs `sql` and reads the first cell as `i64`.
    pub fn scalar_i64(&self, sql: &str) -> Option<i64> {
        let result = self.exec(sql);
        if result.row_count() == 0 {
            return None;
        }
        result.value_i64(0, 0).expect("cell is not an i64")
    }

    /// Runs `sql` and returns every row rendered as text (`NULL` for nulls).
    pub fn rows_as_text(&self, sql: &str) -> Vec<Vec<String>> {
        self.exec(sql)
            .rows()
            .map(|row| {
                row.iter()
                    .map(|v| if v.is_null() { "NULL".to_string() } else { v.to_string() })
                    .collect()
            })
            .collect()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a test with a temporary in-memory database.
///
/// # Example
///
/// ```rust,ignore
/// use ducklet_testkit::with_temp_db;
///
/// #[test]
/// fn my_test() {
///     with_temp_db(|db| {
///         let conn = db.connect().unwrap();
///         conn.query("SELECT 1").unwrap();
///     });
/// }
/// ```
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database) -> R,
{
    let test_db = TestDatabase::memory();
    f(&test_db.db)
}

/// Runs a test with a temporary file-backed database.
pub fn with_file_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database, &Path) -> R,
{
    let test_db = TestDatabase::file();
    let path = test_db.path().map(Path::to_path_buf).unwrap_or_default();
    f(&test_db.db, &path)
}

/// Runs a test with an in-memory [`Session`].
pub fn with_session<F, R>(f: F) -> R
where
    F: FnOnce(&Session) -> R,
{
    let session = Session::new();
    f(&session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ducklet_core::{CoreError, ErrorKind};

    #[test]
    fn memory_database() {
        let db = TestDatabase::memory();
        assert!(db.is_in_memory());
        assert!(db.path().is_none());
    }

    #[test]
    fn file_database_holds_lock() {
        with_file_db(|db, path| {
            assert!(!db.is_in_memory());
            assert!(path.exists());
            let err = Database::open(Some(path)).unwrap_err();
            assert!(matches!(err, CoreError::DatabaseLocked));
        });
    }

    #[test]
    fn session_helpers() {
        with_session(|s| {
            s.exec("CREATE TABLE t (x INTEGER, y VARCHAR)");
            s.exec("INSERT INTO t VALUES (1, 'a'), (2, NULL)");
            assert_eq!(s.scalar_i64("SELECT x FROM t ORDER BY x DESC"), Some(2));
            assert_eq!(
                s.rows_as_text("SELECT x, y FROM t ORDER BY x"),
                vec![vec!["1", "a"], vec!["2", "NULL"]]
            );
            assert_eq!(s.scalar_i64("SELECT x FROM t WHERE x > 5"), None);
            let err = s.try_exec("SELECT z FROM t").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Query);
        });
    }

    #[test]
    fn file_session_is_read_only_when_configured() {
        let db = TestDatabase::file();
        let path = db.path().map(Path::to_path_buf).unwrap();
        drop(db.db);

        let config = Config::new().access_mode(ducklet_core::AccessMode::ReadOnly);
        let db = Database::open_with_config(Some(&path), config).unwrap();
        let conn = db.connect().unwrap();
        let err = conn.query("CREATE TABLE t (x INTEGER)").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Query);
        assert_eq!(conn.query("SELECT 1").unwrap().row_count(), 1);
    }
}
