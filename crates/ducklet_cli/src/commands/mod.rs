//! CLI command implementations.

pub mod query;
pub mod shell;
pub mod types;
