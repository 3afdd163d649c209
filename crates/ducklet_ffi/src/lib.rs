//! # Ducklet FFI
//!
//! Stable C ABI for Ducklet.
//!
//! This crate provides:
//! - C-compatible function exports with the `ducklet_` prefix
//! - Generational handles for databases, connections, results and configs
//! - Memory ownership conventions for strings and blobs
//! - Status codes plus a per-thread last error
//!
//! ## Conventions
//!
//! - Fallible functions return [`DuckletState`]. On `Error`, out-parameters
//!   hold their null/zero value and `ducklet_last_error()` describes the
//!   failure.
//! - Release functions take a pointer to the handle and reset it to null.
//!   Releasing the null handle is a no-op; releasing a stale copy of a
//!   handle is a `State` error.
//! - Strings returned by Ducklet are freed with `ducklet_free`, blobs with
//!   `ducklet_free_blob`.
//! - Panics never unwind across the ABI; they are reported as errors.

#![warn(missing_docs)]

mod buffer;
mod config;
mod connection;
mod database;
mod error;
mod result;
mod types;

pub use buffer::{ducklet_free, ducklet_free_blob, DuckletBlob};
pub use config::{ducklet_create_config, ducklet_destroy_config, ducklet_set_config};
pub use connection::{ducklet_connect, ducklet_disconnect, ducklet_query};
pub use database::{ducklet_close, ducklet_database_stats, ducklet_open, ducklet_open_ext};
pub use error::{
    ducklet_clear_error, ducklet_last_error, ducklet_last_error_kind, DuckletErrorKind,
    DuckletState,
};
pub use result::*;
pub use types::{
    DuckletConfig, DuckletConnection, DuckletDatabase, DuckletResult, DuckletStats, DuckletType,
    Idx,
};

use ducklet_core::Engine;
use std::ffi::c_char;
use std::sync::LazyLock;

/// Process-wide engine behind every handle issued through the C ABI.
pub(crate) static ENGINE: LazyLock<Engine> = LazyLock::new(Engine::new);

static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");

/// Returns the library version as a static C string.
#[no_mangle]
pub extern "C" fn ducklet_library_version() -> *const c_char {
    VERSION.as_ptr().cast()
}
