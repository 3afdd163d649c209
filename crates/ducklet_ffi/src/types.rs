//! Type definitions for FFI.

use ducklet_core::handle::HandleKind;
use ducklet_core::{ConnectionHandle, DatabaseHandle, Handle, ResultHandle, StatsSnapshot};

/// Row and column index type (`idx_t`).
pub type Idx = u64;

/// Logical type code, as returned by `ducklet_column_type`.
pub type DuckletType = u32;

macro_rules! ffi_handle {
    ($(#[$doc:meta])* $name:ident => $handle:ty) => {
        $(#[$doc])*
        ///
        /// Id `0` is the null handle.
        #[repr(C)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name {
            /// Packed index and generation.
            pub id: u64,
        }

        impl $name {
            /// The null handle.
            pub const NULL: Self = Self { id: 0 };

            /// Returns true for the null handle.
            pub fn is_null(self) -> bool {
                self.id == 0
            }

            pub(crate) fn handle(self) -> $handle {
                Handle::from_raw(self.id)
            }
        }

        impl From<$handle> for $name {
            fn from(handle: $handle) -> Self {
                Self { id: handle.raw() }
            }
        }
    };
}

ffi_handle! {
    /// A database handle.
    DuckletDatabase => DatabaseHandle
}

ffi_handle! {
    /// A connection handle.
    DuckletConnection => ConnectionHandle
}

ffi_handle! {
    /// A materialized query result handle.
    DuckletResult => ResultHandle
}

ffi_handle! {
    /// A configuration handle, created by `ducklet_create_config`.
    DuckletConfig => Handle<ConfigKind>
}

/// Handle kind for configurations, which live only on the FFI side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKind {}

impl HandleKind for ConfigKind {
    const NAME: &'static str = "config";
}

/// Database statistics snapshot.
///
/// Use `ducklet_database_stats()` to get the current counters.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct DuckletStats {
    /// Statements that completed successfully.
    pub queries_executed: u64,
    /// Queries that returned an error.
    pub queries_failed: u64,
    /// Rows materialized into results.
    pub rows_produced: u64,
    /// Connections opened.
    pub connections_opened: u64,
    /// Connections closed.
    pub connections_closed: u64,
}

impl From<StatsSnapshot> for DuckletStats {
    fn from(s: StatsSnapshot) -> Self {
        Self {
            queries_executed: s.queries_executed,
            queries_failed: s.queries_failed,
            rows_produced: s.rows_produced,
            connections_opened: s.connections_opened,
            connections_closed: s.connections_closed,
        }
    }
}
