//! CLI error type.

use ducklet_core::CoreError;
use thiserror::Error;

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Errors reported by the `ducklet` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// Engine error.
    #[error("{}: {0}", .0.kind())]
    Core(#[from] CoreError),

    /// Terminal or pipe I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON rendering failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
