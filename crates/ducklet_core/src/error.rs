//! Error types for Ducklet core.

use crate::types::LogicalType;
use std::fmt;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Coarse classification of a [`CoreError`].
///
/// Every error maps to exactly one kind. The C ABI reports the kind as
/// `ducklet_error_kind`, so the discriminants are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorKind {
    /// Path or storage access failed.
    Io = 1,
    /// Invalid, closed or already released handle.
    State = 2,
    /// Parse, semantic or evaluation failure.
    Query = 3,
    /// Column or row index out of bounds.
    Range = 4,
    /// A value could not be coerced to the requested type.
    Format = 5,
    /// A numeric value does not fit the requested type.
    Overflow = 6,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Io => "IOError",
            ErrorKind::State => "StateError",
            ErrorKind::Query => "QueryError",
            ErrorKind::Range => "RangeError",
            ErrorKind::Format => "FormatError",
            ErrorKind::Overflow => "OverflowError",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in Ducklet core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The database path cannot be used.
    #[error("invalid database path '{path}': {reason}")]
    InvalidPath {
        /// The offending path.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Database is closed.
    #[error("database is closed")]
    DatabaseClosed,

    /// Connection is closed.
    #[error("connection is closed")]
    ConnectionClosed,

    /// Another engine instance holds the database file.
    #[error("database locked: another instance has exclusive access")]
    DatabaseLocked,

    /// Database close was refused because connections are still open.
    #[error("cannot close database: {count} connection(s) still open")]
    ConnectionsOpen {
        /// Number of live connections.
        count: usize,
    },

    /// Handle is unknown, stale or already released.
    #[error("invalid {kind} handle {id:#x}")]
    InvalidHandle {
        /// Handle kind ("database", "connection", "result", "config").
        kind: &'static str,
        /// Raw handle id.
        id: u64,
    },

    /// Parse, semantic or evaluation failure.
    #[error("{message}")]
    Query {
        /// Human-readable description.
        message: String,
    },

    /// Unknown configuration option or bad option value.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// Column index out of bounds.
    #[error("column index {index} out of range (column count {count})")]
    ColumnOutOfRange {
        /// Requested column.
        index: usize,
        /// Number of columns.
        count: usize,
    },

    /// Row index out of bounds.
    #[error("row index {index} out of range (row count {count})")]
    RowOutOfRange {
        /// Requested row.
        index: usize,
        /// Number of rows.
        count: usize,
    },

    /// Value cannot be converted between the two types.
    #[error("could not convert {value} from {from} to {to}")]
    Conversion {
        /// Source type.
        from: LogicalType,
        /// Target type.
        to: LogicalType,
        /// Rendered source value.
        value: String,
    },

    /// Numeric value out of range for the target type.
    #[error("value {value} is out of range for {target}")]
    Overflow {
        /// Rendered source value.
        value: String,
        /// Target type.
        target: LogicalType,
    },
}

impl CoreError {
    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Io(_) | CoreError::InvalidPath { .. } => ErrorKind::Io,
            CoreError::DatabaseClosed
            | CoreError::ConnectionClosed
            | CoreError::DatabaseLocked
            | CoreError::ConnectionsOpen { .. }
            | CoreError::InvalidHandle { .. } => ErrorKind::State,
            CoreError::Query { .. } | CoreError::InvalidConfig { .. } => ErrorKind::Query,
            CoreError::ColumnOutOfRange { .. } | CoreError::RowOutOfRange { .. } => {
                ErrorKind::Range
            }
            CoreError::Conversion { .. } => ErrorKind::Format,
            CoreError::Overflow { .. } => ErrorKind::Overflow,
        }
    }

    /// Creates a query error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Creates an invalid path error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates a conversion error.
    pub fn conversion(from: LogicalType, to: LogicalType, value: impl fmt::Display) -> Self {
        Self::Conversion {
            from,
            to,
            value: value.to_string(),
        }
    }

    /// Creates an overflow error.
    pub fn overflow(value: impl fmt::Display, target: LogicalType) -> Self {
        Self::Overflow {
            value: value.to_string(),
            target,
        }
    }

    /// Creates an invalid handle error.
    pub fn invalid_handle(kind: &'static str, id: u64) -> Self {
        Self::InvalidHandle { kind, id }
    }
}
