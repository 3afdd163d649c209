//! Database configuration.

use crate::error::{CoreError, CoreResult};
use std::fmt;

/// Whether the database accepts writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Read-write unless the file is not writable.
    #[default]
    Automatic,
    /// DDL and DML are rejected.
    ReadOnly,
    /// Read-write.
    ReadWrite,
}

/// Placement of NULLs in `ORDER BY` when not given explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullOrder {
    /// NULLs sort before all values.
    NullsFirst,
    /// NULLs sort after all values.
    #[default]
    NullsLast,
}

/// Direction of `ORDER BY` when not given explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

/// Configuration for opening a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Whether writes are allowed.
    pub access_mode: AccessMode,

    /// Whether to create the database file if it doesn't exist.
    pub create_if_missing: bool,

    /// Upper bound on rows a single query may return (`None` = unlimited).
    pub max_result_rows: Option<usize>,

    /// Default NULL placement for `ORDER BY`.
    pub default_null_order: NullOrder,

    /// Default direction for `ORDER BY`.
    pub default_order: SortOrder,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_mode: AccessMode::Automatic,
            create_if_missing: true,
            max_result_rows: None,
            default_null_order: NullOrder::NullsLast,
            default_order: SortOrder::Asc,
        }
    }
}

/// Option names accepted by [`Config::set`].
pub const OPTION_NAMES: &[&str] = &[
    "access_mode",
    "create_if_missing",
    "max_result_rows",
    "default_null_order",
    "default_order",
];

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the access mode.
    #[must_use]
    pub const fn access_mode(mut self, mode: AccessMode) -> Self {
        self.access_mode = mode;
        self
    }

    /// Sets whether to create the database file if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Caps the number of rows a query may return.
    #[must_use]
    pub const fn max_result_rows(mut self, limit: Option<usize>) -> Self {
        self.max_result_rows = limit;
        self
    }

    /// Sets the default NULL placement.
    #[must_use]
    pub const fn default_null_order(mut self, order: NullOrder) -> Self {
        self.default_null_order = order;
        self
    }

    /// Sets the default sort direction.
    #[must_use]
    pub const fn default_order(mut self, order: SortOrder) -> Self {
        self.default_order = order;
        self
    }

    /// Returns true when writes are rejected.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.access_mode == AccessMode::ReadOnly
    }

    /// Applies a named option from its string form.
    ///
    /// Names and values are case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] for unknown names or bad values.
    pub fn set(&mut self, name: &str, value: &str) -> CoreResult<()> {
        let value_lower = value.trim().to_ascii_lowercase();
        let bad_value = || {
            CoreError::invalid_config(format!("invalid value '{value}' for option '{name}'"))
        };
        match name.trim().to_ascii_lowercase().as_str() {
            "access_mode" => {
                self.access_mode = match value_lower.as_str() {
                    "automatic" => AccessMode::Automatic,
                    "read_only" => AccessMode::ReadOnly,
                    "read_write" => AccessMode::ReadWrite,
                    _ => return Err(bad_value()),
                };
            }
            "create_if_missing" => {
                self.create_if_missing = match value_lower.as_str() {
                    "true" | "1" | "yes" | "on" => true,
                    "false" | "0" | "no" | "off" => false,
                    _ => return Err(bad_value()),
                };
            }
            "max_result_rows" => {
                self.max_result_rows = match value_lower.as_str() {
                    "" | "none" | "unlimited" => None,
                    digits => Some(digits.parse::<usize>().map_err(|_| bad_value())?),
                };
            }
            "default_null_order" => {
                self.default_null_order = match value_lower.as_str() {
                    "nulls_first" | "nulls first" => NullOrder::NullsFirst,
                    "nulls_last" | "nulls last" => NullOrder::NullsLast,
                    _ => return Err(bad_value()),
                };
            }
            "default_order" => {
                self.default_order = match value_lower.as_str() {
                    "asc" | "ascending" => SortOrder::Asc,
                    "desc" | "descending" => SortOrder::Desc,
                    _ => return Err(bad_value()),
                };
            }
            _ => {
                return Err(CoreError::invalid_config(format!(
                    "unrecognized configuration option '{name}'"
                )))
            }
        }
        Ok(())
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AccessMode::Automatic => "automatic",
            AccessMode::ReadOnly => "read_only",
            AccessMode::ReadWrite => "read_write",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.access_mode, AccessMode::Automatic);
        assert!(config.create_if_missing);
        assert_eq!(config.max_result_rows, None);
        assert_eq!(config.default_null_order, NullOrder::NullsLast);
        assert_eq!(config.default_order, SortOrder::Asc);
        assert!(!config.is_read_only());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .access_mode(AccessMode::ReadOnly)
            .create_if_missing(false)
            .max_result_rows(Some(10))
            .default_order(SortOrder::Desc);

        assert!(config.is_read_only());
        assert!(!config.create_if_missing);
        assert_eq!(config.max_result_rows, Some(10));
        assert_eq!(config.default_order, SortOrder::Desc);
    }

    #[test]
    fn set_from_strings() {
        let mut config = Config::new();
        config.set("ACCESS_MODE", "read_only").unwrap();
        config.set("create_if_missing", "false").unwrap();
        config.set("max_result_rows", "5").unwrap();
        config.set("default_null_order", "nulls_first").unwrap();
        config.set("default_order", "DESC").unwrap();

        assert_eq!(config.access_mode, AccessMode::ReadOnly);
        assert!(!config.create_if_missing);
        assert_eq!(config.max_result_rows, Some(5));
        assert_eq!(config.default_null_order, NullOrder::NullsFirst);
        assert_eq!(config.default_order, SortOrder::Desc);

        config.set("max_result_rows", "unlimited").unwrap();
        assert_eq!(config.max_result_rows, None);
    }

    #[test]
    fn set_rejects_bad_input() {
        let mut config = Config::new();
        let err = config.set("threads", "4").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Query);
        assert!(config.set("access_mode", "sometimes").is_err());
        assert!(config.set("max_result_rows", "-1").is_err());
        assert_eq!(config, Config::default());
    }
}
