//! Property-based test generators using proptest.
//!
//! Provides strategies for SQL identifiers, literals, table rows and
//! statement sequences that are always accepted by the parser.

use ducklet_core::sql::token::Keyword;
use proptest::prelude::*;

/// Strategy for unquoted identifiers that are not reserved words.
pub fn identifier_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}")
        .expect("Invalid regex")
        .prop_filter("Identifier must not be a keyword", |s| {
            Keyword::lookup(s).is_none()
        })
}

/// Strategy for string contents made of printable ASCII, quotes included.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ -~]{0,32}").expect("Invalid regex")
}

/// Renders `text` as a SQL string literal.
pub fn quote_string(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// One row of the fixture table `(id INTEGER, label VARCHAR, flag BOOLEAN)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Row key.
    pub id: i32,
    /// Nullable text column.
    pub label: Option<String>,
    /// Nullable boolean column.
    pub flag: Option<bool>,
}

impl Row {
    /// Column definitions matching [`Row`].
    pub const SCHEMA: &'static str = "(id INTEGER, label VARCHAR, flag BOOLEAN)";

    /// Renders the row as a parenthesised `VALUES` tuple.
    pub fn to_sql(&self) -> String {
        let label = self
            .label
            .as_deref()
            .map_or_else(|| "NULL".to_string(), quote_string);
        let flag = match self.flag {
            Some(true) => "TRUE",
            Some(false) => "FALSE",
            None => "NULL",
        };
        format!("({}, {label}, {flag})", self.id)
    }
}

/// Strategy for fixture rows with ids drawn from `ids`.
pub fn row_strategy(ids: std::ops::Range<i32>) -> impl Strategy<Value = Row> {
    (
        ids,
        prop::option::of(text_strategy()),
        prop::option::of(any::<bool>()),
    )
        .prop_map(|(id, label, flag)| Row { id, label, flag })
}

/// Statement kinds applied to the fixture table.
#[derive(Debug, Clone)]
pub enum TableOperation {
    /// Insert one row.
    Insert(Row),
    /// Delete rows with the given id.
    Delete {
        /// Target id.
        id: i32,
    },
    /// Set the label of rows with the given id.
    Relabel {
        /// Target id.
        id: i32,
        /// New label.
        label: Option<String>,
    },
}

impl TableOperation {
    /// Renders the operation as SQL against `table`.
    pub fn to_sql(&self, table: &str) -> String {
        match self {
            TableOperation::Insert(row) => format!("INSERT INTO {table} VALUES {}", row.to_sql()),
            TableOperation::Delete { id } => format!("DELETE FROM {table} WHERE id = {id}"),
            TableOperation::Relabel { id, label } => {
                let label = label
                    .as_deref()
                    .map_or_else(|| "NULL".to_string(), quote_string);
                format!("UPDATE {table} SET label = {label} WHERE id = {id}")
            }
        }
    }
}

/// Strategy for a single table operation over a small id space.
pub fn table_operation_strategy() -> impl Strategy<Value = TableOperation> {
    prop_oneof![
        3 => row_strategy(0..32).prop_map(TableOperation::Insert),
        1 => (0..32i32).prop_map(|id| TableOperation::Delete { id }),
        1 => (0..32i32, prop::option::of(text_strategy()))
            .prop_map(|(id, label)| TableOperation::Relabel { id, label }),
    ]
}

/// Strategy for a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<TableOperation>> {
    prop::collection::vec(table_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
