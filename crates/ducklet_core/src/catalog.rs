//! In-memory table catalog.
//!
//! Table and column names are matched case-insensitively and keep the
//! spelling they were created with.

use crate::error::{CoreError, CoreResult};
use crate::sql::ast::ColumnDef;
use crate::types::DataType;
use crate::value::Value;
use std::collections::BTreeMap;

/// A column of a stored table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    /// Column name as declared.
    pub name: String,
    /// Declared type.
    pub data_type: DataType,
    /// `NOT NULL` constraint.
    pub not_null: bool,
}

/// A stored table: schema plus rows.
#[derive(Debug, Clone, Default)]
pub struct Table {
    name: String,
    columns: Vec<TableColumn>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Creates an empty table.
    pub fn new(name: impl Into<String>, columns: Vec<TableColumn>) -> CoreResult<Self> {
        let name = name.into();
        if columns.is_empty() {
            return Err(CoreError::query(format!(
                "Parser Error: table \"{name}\" must have at least one column"
            )));
        }
        for (i, column) in columns.iter().enumerate() {
            if columns[..i]
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(&column.name))
            {
                return Err(CoreError::query(format!(
                    "Catalog Error: Column with name {} already exists!",
                    column.name
                )));
            }
            if column.data_type == DataType::SqlNull {
                return Err(CoreError::query(format!(
                    "Binder Error: column \"{}\" cannot have type NULL",
                    column.name
                )));
            }
        }
        Ok(Self {
            name,
            columns,
            rows: Vec::new(),
        })
    }

    /// Table name as declared.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column schema.
    #[must_use]
    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    /// Stored rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of stored rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of a column, matched case-insensitively.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Checks a row against the schema. Values must already have the column types.
    fn check_row(&self, row: &[Value]) -> CoreResult<()> {
        if row.len() != self.columns.len() {
            return Err(CoreError::query(format!(
                "Binder Error: table {} has {} columns but {} values were supplied",
                self.name,
                self.columns.len(),
                row.len()
            )));
        }
        for (column, value) in self.columns.iter().zip(row) {
            if column.not_null && value.is_null() {
                return Err(CoreError::query(format!(
                    "Constraint Error: NOT NULL constraint failed: {}.{}",
                    self.name, column.name
                )));
            }
        }
        Ok(())
    }

    /// Appends rows atomically: either all are stored or none.
    pub fn insert_rows(&mut self, rows: Vec<Vec<Value>>) -> CoreResult<usize> {
        for row in &rows {
            self.check_row(row)?;
        }
        let count = rows.len();
        self.rows.extend(rows);
        Ok(count)
    }

    /// Replaces all rows atomically, validating each.
    pub fn replace_rows(&mut self, rows: Vec<Vec<Value>>) -> CoreResult<()> {
        for row in &rows {
            self.check_row(row)?;
        }
        self.rows = rows;
        Ok(())
    }
}

/// Registry of tables, keyed by lower-cased name.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: BTreeMap<String, Table>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table from parsed column definitions.
    ///
    /// Returns `false` when the table existed and `if_not_exists` was set.
    pub fn create_table(
        &mut self,
        name: &str,
        columns: &[ColumnDef],
        if_not_exists: bool,
    ) -> CoreResult<bool> {
        let key = name.to_ascii_lowercase();
        if self.tables.contains_key(&key) {
            if if_not_exists {
                return Ok(false);
            }
            return Err(CoreError::query(format!(
                "Catalog Error: Table with name \"{name}\" already exists!"
            )));
        }
        let columns = columns
            .iter()
            .map(|def| TableColumn {
                name: def.name.clone(),
                data_type: def.data_type.clone(),
                not_null: def.not_null,
            })
            .collect();
        self.tables.insert(key, Table::new(name, columns)?);
        Ok(true)
    }

    /// Drops a table. Returns `false` when it was absent and `if_exists` was set.
    pub fn drop_table(&mut self, name: &str, if_exists: bool) -> CoreResult<bool> {
        match self.tables.remove(&name.to_ascii_lowercase()) {
            Some(_) => Ok(true),
            None if if_exists => Ok(false),
            None => Err(missing_table(name)),
        }
    }

    /// Looks up a table.
    pub fn table(&self, name: &str) -> CoreResult<&Table> {
        self.tables
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| missing_table(name))
    }

    /// Looks up a table for modification.
    pub fn table_mut(&mut self, name: &str) -> CoreResult<&mut Table> {
        self.tables
            .get_mut(&name.to_ascii_lowercase())
            .ok_or_else(|| missing_table(name))
    }

    /// Table names in sorted order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.values().map(Table::name)
    }

    /// Number of tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true when no tables exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn missing_table(name: &str) -> CoreError {
    CoreError::query(format!(
        "Catalog Error: Table with name {name} does not exist!"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn defs() -> Vec<ColumnDef> {
        vec![
            ColumnDef {
                name: "id".into(),
                data_type: DataType::Integer,
                not_null: true,
            },
            ColumnDef {
                name: "Name".into(),
                data_type: DataType::Varchar,
                not_null: false,
            },
        ]
    }

    #[test]
    fn create_lookup_drop() {
        let mut catalog = Catalog::new();
        assert!(catalog.create_table("Items", &defs(), false).unwrap());
        assert_eq!(catalog.table("items").unwrap().name(), "Items");
        assert_eq!(catalog.table("ITEMS").unwrap().column_index("name"), Some(1));

        assert!(!catalog.create_table("items", &defs(), true).unwrap());
        let err = catalog.create_table("items", &defs(), false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Query);

        assert!(catalog.drop_table("items", false).unwrap());
        assert!(!catalog.drop_table("items", true).unwrap());
        assert!(catalog.drop_table("items", false).is_err());
        assert!(catalog.is_empty());
    }

    #[test]
    fn duplicate_columns_rejected() {
        let mut columns = defs();
        columns[1].name = "ID".into();
        assert!(Catalog::new().create_table("t", &columns, false).is_err());
    }

    #[test]
    fn inserts_are_all_or_nothing() {
        let mut catalog = Catalog::new();
        catalog.create_table("t", &defs(), false).unwrap();
        let table = catalog.table_mut("t").unwrap();
        let rows = vec![
            vec![Value::Integer(1), Value::varchar("a")],
            vec![Value::Null, Value::varchar("b")],
        ];
        let err = table.insert_rows(rows).unwrap_err();
        assert!(err.to_string().contains("NOT NULL"));
        assert_eq!(table.row_count(), 0);

        let ok = vec![vec![Value::Integer(1), Value::Null]];
        assert_eq!(table.insert_rows(ok).unwrap(), 1);
        assert!(table.insert_rows(vec![vec![Value::Integer(2)]]).is_err());
    }
}
