//! # Ducklet Testkit
//!
//! Test utilities for Ducklet.
//!
//! This crate provides:
//! - Test fixtures and database helpers
//! - Property-based test generators using proptest
//! - Fuzz testing harnesses for the parser and executor
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ducklet_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_session() {
//!     with_session(|s| {
//!         s.exec("CREATE TABLE t (x INTEGER)");
//!         s.exec("INSERT INTO t VALUES (1)");
//!         assert_eq!(s.scalar_i64("SELECT x FROM t"), Some(1));
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use stress::*;
