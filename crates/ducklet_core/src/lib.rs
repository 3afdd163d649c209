//! # Ducklet Core
//!
//! Core engine for Ducklet, a small embedded analytical SQL engine.
//!
//! This crate provides:
//! - A logical type system with stable type codes
//! - Columnar value storage with validity bitmaps
//! - A SQL front end (lexer, parser, syntax tree)
//! - An in-memory executor for queries, DDL and DML
//! - Databases and connections with typed, materialized result sets
//! - A handle-based [`Engine`] for foreign callers
//!
//! ## Example
//!
//! ```rust
//! use ducklet_core::{Database, LogicalType};
//!
//! let db = Database::open(None).unwrap();
//! let conn = db.connect().unwrap();
//! conn.query("CREATE TABLE t (id INTEGER, name VARCHAR)").unwrap();
//! conn.query("INSERT INTO t VALUES (1, 'duck'), (2, NULL)").unwrap();
//!
//! let result = conn.query("SELECT id, name FROM t ORDER BY id").unwrap();
//! assert_eq!(result.row_count(), 2);
//! assert_eq!(result.column_type(0).unwrap(), LogicalType::Integer);
//! assert_eq!(result.value_string(1, 0).unwrap().as_deref(), Some("duck"));
//! assert_eq!(result.value_string(1, 1).unwrap(), None);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cast;
pub mod catalog;
mod config;
mod connection;
mod database;
mod engine;
mod error;
pub mod exec;
pub mod handle;
mod result;
pub mod sql;
mod stats;
pub mod temporal;
mod types;
mod value;
pub mod vector;

pub use config::{AccessMode, Config, NullOrder, SortOrder, OPTION_NAMES};
pub use connection::Connection;
pub use database::{is_memory_path, Database, MEMORY_PATH};
pub use engine::Engine;
pub use error::{CoreError, CoreResult, ErrorKind};
pub use handle::{ConnectionHandle, DatabaseHandle, Handle, ResultHandle};
pub use result::{ColumnMeta, ResultSet};
pub use stats::{DatabaseStats, StatsSnapshot};
pub use temporal::Interval;
pub use types::{DataType, LogicalType, MAX_DECIMAL_WIDTH};
pub use value::Value;
pub use vector::{Column, ColumnBuilder};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
