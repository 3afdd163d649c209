//! Database handle.
//!
//! A [`Database`] owns the catalog shared by all of its connections. A
//! file-backed database holds an exclusive advisory lock on its file for as
//! long as it is open, so only one engine instance can use a path at a time.
//! Table data lives in memory only; the file is never read or written.

use crate::catalog::Catalog;
use crate::config::Config;
use crate::connection::Connection;
use crate::error::{CoreError, CoreResult};
use crate::stats::{DatabaseStats, StatsSnapshot};
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Path spelling that selects an in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

/// Returns true when `path` selects an in-memory database.
#[must_use]
pub fn is_memory_path(path: Option<&Path>) -> bool {
    match path {
        None => true,
        Some(p) => p.as_os_str().is_empty() || p.as_os_str() == MEMORY_PATH,
    }
}

/// State shared between a database and its connections.
#[derive(Debug)]
pub(crate) struct DatabaseInner {
    pub(crate) config: Config,
    pub(crate) path: Option<PathBuf>,
    pub(crate) catalog: Mutex<Catalog>,
    pub(crate) stats: DatabaseStats,
    /// Open flag plus live connection count, updated together.
    state: RwLock<OpenState>,
    /// Lock file handle, released on close.
    lock_file: Mutex<Option<File>>,
}

#[derive(Debug)]
struct OpenState {
    is_open: bool,
    connections: usize,
}

impl DatabaseInner {
    pub(crate) fn ensure_open(&self) -> CoreResult<()> {
        if self.state.read().is_open {
            Ok(())
        } else {
            Err(CoreError::DatabaseClosed)
        }
    }

    /// Called exactly once per connection, on disconnect or drop.
    pub(crate) fn release_connection(&self) {
        let mut state = self.state.write();
        state.connections = state.connections.saturating_sub(1);
        self.stats.record_disconnect();
    }
}

fn lock_database_file(path: &Path, config: &Config) -> CoreResult<File> {
    let display = path.display().to_string();
    if path.is_dir() {
        return Err(CoreError::invalid_path(display, "path is a directory"));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(CoreError::invalid_path(
                display,
                "parent directory does not exist",
            ));
        }
    }
    let exists = path.exists();
    if !exists && config.is_read_only() {
        return Err(CoreError::invalid_path(
            display,
            "database file does not exist (read-only mode)",
        ));
    }
    if !exists && !config.create_if_missing {
        return Err(CoreError::invalid_path(
            display,
            "database file does not exist",
        ));
    }

    let file = OpenOptions::new()
        .read(true)
        .write(!config.is_read_only())
        .create(!config.is_read_only())
        .truncate(false)
        .open(path)?;

    // Non-blocking; a second engine instance fails immediately
    if file.try_lock_exclusive().is_err() {
        return Err(CoreError::DatabaseLocked);
    }
    Ok(file)
}

/// An open database.
///
/// # Example
///
/// ```rust,ignore
/// use ducklet_core::Database;
///
/// let db = Database::open(None)?;
/// let conn = db.connect()?;
/// let result = conn.query("SELECT 42 AS answer")?;
/// assert_eq!(result.value_i32(0, 0)?, Some(42));
///
/// conn.disconnect()?;
/// db.close()?;
/// ```
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Opens a database with the default configuration.
    ///
    /// `None`, `""` and `":memory:"` open an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an `Io`-kind error for unusable paths and
    /// [`CoreError::DatabaseLocked`] when another instance holds the file.
    pub fn open(path: Option<&Path>) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a database with a custom configuration.
    pub fn open_with_config(path: Option<&Path>, config: Config) -> CoreResult<Self> {
        let (path, lock_file) = if is_memory_path(path) {
            (None, None)
        } else {
            let path = path.map(Path::to_path_buf).unwrap_or_default();
            let file = lock_database_file(&path, &config)?;
            (Some(path), Some(file))
        };

        let location = match &path {
            Some(p) => p.display().to_string(),
            None => MEMORY_PATH.to_string(),
        };
        info!(path = %location, access_mode = %config.access_mode, "database opened");

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                config,
                path,
                catalog: Mutex::new(Catalog::new()),
                stats: DatabaseStats::new(),
                state: RwLock::new(OpenState {
                    is_open: true,
                    connections: 0,
                }),
                lock_file: Mutex::new(lock_file),
            }),
        })
    }

    /// Opens a new connection.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DatabaseClosed`] after [`close`](Self::close).
    pub fn connect(&self) -> CoreResult<Connection> {
        let mut state = self.inner.state.write();
        if !state.is_open {
            return Err(CoreError::DatabaseClosed);
        }
        state.connections += 1;
        self.inner.stats.record_connect();
        Ok(Connection::new(Arc::clone(&self.inner)))
    }

    /// Closes the database and releases its file lock.
    ///
    /// Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConnectionsOpen`] while connections are live; the
    /// database stays open in that case.
    pub fn close(&self) -> CoreResult<()> {
        let mut state = self.inner.state.write();
        if !state.is_open {
            return Ok(());
        }
        if state.connections > 0 {
            warn!(
                connections = state.connections,
                "database close refused: connections still open"
            );
            return Err(CoreError::ConnectionsOpen {
                count: state.connections,
            });
        }
        state.is_open = false;
        if let Some(file) = self.inner.lock_file.lock().take() {
            let _ = FileExt::unlock(&file);
        }
        info!(tables = self.inner.catalog.lock().len(), "database closed");
        Ok(())
    }

    /// Checks if the database is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.state.read().is_open
    }

    /// Number of connections not yet disconnected.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.inner.state.read().connections
    }

    /// Returns true for an in-memory database.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.inner.path.is_none()
    }

    /// File path of a file-backed database.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Returns the database configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Returns a snapshot of the query and connection counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Names of the tables in the catalog, sorted.
    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        self.inner
            .catalog
            .lock()
            .table_names()
            .map(str::to_string)
            .collect()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.inner.path)
            .field("is_open", &self.is_open())
            .field("connections", &self.connection_count())
            .finish_non_exhaustive()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        // Refused while connections are live; they keep the shared state alive
        let _ = self.close();
    }
}
