//! Handle-based engine.
//!
//! [`Engine`] owns databases, connections and results behind generational
//! handles. It is the state the C ABI drives, but it is an ordinary value:
//! tests create as many engines as they like.

use crate::config::Config;
use crate::connection::Connection;
use crate::database::Database;
use crate::error::CoreResult;
use crate::handle::{kind, ConnectionHandle, DatabaseHandle, HandleTable, ResultHandle};
use crate::result::ResultSet;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tracing::trace;

/// Process state addressed by handles.
///
/// Releasing the null handle is a successful no-op. Releasing a handle
/// twice, or using it after release, fails with
/// [`CoreError::InvalidHandle`](crate::CoreError::InvalidHandle).
///
/// # Example
///
/// ```rust,ignore
/// use ducklet_core::Engine;
///
/// let engine = Engine::new();
/// let db = engine.open(None)?;
/// let conn = engine.connect(db)?;
/// let result = engine.query(conn, "SELECT 42")?;
/// let answer = engine.with_result(result, |r| r.value_i32(0, 0))??;
///
/// engine.destroy_result(result)?;
/// engine.disconnect(conn)?;
/// engine.close(db)?;
/// ```
#[derive(Default)]
pub struct Engine {
    databases: Mutex<HandleTable<kind::Database, Arc<Database>>>,
    connections: Mutex<HandleTable<kind::Connection, Arc<Connection>>>,
    results: Mutex<HandleTable<kind::Result, ResultSet>>,
}

impl Engine {
    /// Creates an engine with no open handles.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a database with the default configuration.
    pub fn open(&self, path: Option<&Path>) -> CoreResult<DatabaseHandle> {
        self.open_with_config(path, Config::default())
    }

    /// Opens a database with `config`.
    pub fn open_with_config(
        &self,
        path: Option<&Path>,
        config: Config,
    ) -> CoreResult<DatabaseHandle> {
        let db = Database::open_with_config(path, config)?;
        let handle = self.databases.lock().insert(Arc::new(db))?;
        trace!(handle = handle.raw(), "database handle allocated");
        Ok(handle)
    }

    /// Closes a database and invalidates its handle.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::ConnectionsOpen`](crate::CoreError::ConnectionsOpen)
    /// while connections are live. The handle stays valid in that case.
    pub fn close(&self, handle: DatabaseHandle) -> CoreResult<()> {
        if handle.is_null() {
            return Ok(());
        }
        let mut databases = self.databases.lock();
        databases.get(handle)?.close()?;
        databases.remove(handle)?;
        trace!(handle = handle.raw(), "database handle released");
        Ok(())
    }

    /// Opens a connection on a database.
    pub fn connect(&self, db: DatabaseHandle) -> CoreResult<ConnectionHandle> {
        let database = Arc::clone(self.databases.lock().get(db)?);
        let conn = database.connect()?;
        let handle = self.connections.lock().insert(Arc::new(conn))?;
        trace!(handle = handle.raw(), database = db.raw(), "connection handle allocated");
        Ok(handle)
    }

    /// Disconnects and invalidates a connection handle.
    pub fn disconnect(&self, handle: ConnectionHandle) -> CoreResult<()> {
        if handle.is_null() {
            return Ok(());
        }
        let conn = self.connections.lock().remove(handle)?;
        conn.disconnect()?;
        trace!(handle = handle.raw(), "connection handle released");
        Ok(())
    }

    /// Runs `sql` on a connection and stores the materialized result.
    pub fn query(&self, conn: ConnectionHandle, sql: &str) -> CoreResult<ResultHandle> {
        // Clone out so queries on other connections are not serialized here
        let connection = Arc::clone(self.connections.lock().get(conn)?);
        let result = connection.query(sql)?;
        let handle = self.results.lock().insert(result)?;
        trace!(handle = handle.raw(), connection = conn.raw(), "result handle allocated");
        Ok(handle)
    }

    /// Frees a result and invalidates its handle.
    pub fn destroy_result(&self, handle: ResultHandle) -> CoreResult<()> {
        if handle.is_null() {
            return Ok(());
        }
        drop(self.results.lock().remove(handle)?);
        trace!(handle = handle.raw(), "result handle released");
        Ok(())
    }

    /// Runs `f` against a live result.
    ///
    /// The result table is locked while `f` runs; `f` must not call back
    /// into this engine.
    pub fn with_result<R>(
        &self,
        handle: ResultHandle,
        f: impl FnOnce(&ResultSet) -> R,
    ) -> CoreResult<R> {
        let results = self.results.lock();
        Ok(f(results.get(handle)?))
    }

    /// Runs `f` against a live database.
    pub fn with_database<R>(
        &self,
        handle: DatabaseHandle,
        f: impl FnOnce(&Database) -> R,
    ) -> CoreResult<R> {
        let database = Arc::clone(self.databases.lock().get(handle)?);
        Ok(f(&database))
    }

    /// Number of open database handles.
    #[must_use]
    pub fn database_count(&self) -> usize {
        self.databases.lock().len()
    }

    /// Number of open connection handles.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Number of live result handles.
    #[must_use]
    pub fn result_count(&self) -> usize {
        self.results.lock().len()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("databases", &self.database_count())
            .field("connections", &self.connection_count())
            .field("results", &self.result_count())
            .finish()
    }
}
