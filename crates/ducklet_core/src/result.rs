//! Materialized query results.

use crate::cast;
use crate::error::{CoreError, CoreResult};
use crate::types::{DataType, LogicalType};
use crate::value::Value;
use crate::vector::Column;

/// Name and type of one result column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeta {
    /// Column name as shown to the caller.
    pub name: String,
    /// Declared type.
    pub data_type: DataType,
}

/// An immutable, columnar query result.
///
/// Row and column counts never change after construction. Typed accessors
/// return `Ok(None)` for null cells and never a sentinel value.
///
/// # Example
///
/// ```rust,ignore
/// let result = conn.query("SELECT 1, 'a', NULL")?;
/// assert_eq!(result.value_i32(0, 0)?, Some(1));
/// assert_eq!(result.value_string(1, 0)?.as_deref(), Some("a"));
/// assert_eq!(result.value_i32(2, 0)?, None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    meta: Vec<ColumnMeta>,
    columns: Vec<Column>,
    row_count: usize,
}

impl ResultSet {
    /// Assembles a result from named columns.
    ///
    /// # Errors
    ///
    /// Returns a query error when the columns disagree on row count.
    pub fn new(names: Vec<String>, columns: Vec<Column>) -> CoreResult<Self> {
        if names.len() != columns.len() {
            return Err(CoreError::query(format!(
                "result has {} names for {} columns",
                names.len(),
                columns.len()
            )));
        }
        let row_count = columns.first().map_or(0, Column::len);
        if let Some(bad) = columns.iter().find(|c| c.len() != row_count) {
            return Err(CoreError::query(format!(
                "result columns disagree on row count ({} vs {row_count})",
                bad.len()
            )));
        }
        let meta = names
            .into_iter()
            .zip(&columns)
            .map(|(name, column)| ColumnMeta {
                name,
                data_type: column.data_type().clone(),
            })
            .collect();
        Ok(Self {
            meta,
            columns,
            row_count,
        })
    }

    /// A result with no columns and no rows (DDL statements).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            meta: Vec::new(),
            columns: Vec::new(),
            row_count: 0,
        }
    }

    /// Number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Column metadata in projection order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnMeta] {
        &self.meta
    }

    /// Name of column `index`.
    pub fn column_name(&self, index: usize) -> CoreResult<&str> {
        self.meta
            .get(index)
            .map(|m| m.name.as_str())
            .ok_or(CoreError::ColumnOutOfRange {
                index,
                count: self.column_count(),
            })
    }

    /// Type tag of column `index`.
    pub fn column_type(&self, index: usize) -> CoreResult<LogicalType> {
        self.column_data_type(index).map(DataType::logical_type)
    }

    /// Full type of column `index`.
    pub fn column_data_type(&self, index: usize) -> CoreResult<&DataType> {
        self.column(index).map(Column::data_type)
    }

    /// Value store of column `index`.
    pub fn column(&self, index: usize) -> CoreResult<&Column> {
        self.columns.get(index).ok_or(CoreError::ColumnOutOfRange {
            index,
            count: self.column_count(),
        })
    }

    fn cell(&self, col: usize, row: usize) -> CoreResult<Option<Value>> {
        let column = self.column(col)?;
        if row >= self.row_count {
            return Err(CoreError::RowOutOfRange {
                index: row,
                count: self.row_count,
            });
        }
        Ok(column.get(row).filter(|v| !v.is_null()))
    }

    fn typed<T>(
        &self,
        col: usize,
        row: usize,
        convert: impl FnOnce(&Value) -> CoreResult<T>,
    ) -> CoreResult<Option<T>> {
        match self.cell(col, row)? {
            Some(value) => convert(&value).map(Some),
            None => Ok(None),
        }
    }

    /// Returns true when the cell is null.
    pub fn is_null(&self, col: usize, row: usize) -> CoreResult<bool> {
        Ok(self.cell(col, row)?.is_none())
    }

    /// Reads a cell as a dynamic [`Value`]; nulls are `None`.
    pub fn value(&self, col: usize, row: usize) -> CoreResult<Option<Value>> {
        self.cell(col, row)
    }

    /// Reads a cell as `bool`.
    pub fn value_bool(&self, col: usize, row: usize) -> CoreResult<Option<bool>> {
        self.typed(col, row, cast::to_bool)
    }

    /// Reads a cell as `i8`.
    pub fn value_i8(&self, col: usize, row: usize) -> CoreResult<Option<i8>> {
        self.typed(col, row, |v| cast::to_integer(v, LogicalType::TinyInt))
    }

    /// Reads a cell as `i16`.
    pub fn value_i16(&self, col: usize, row: usize) -> CoreResult<Option<i16>> {
        self.typed(col, row, |v| cast::to_integer(v, LogicalType::SmallInt))
    }

    /// Reads a cell as `i32`.
    pub fn value_i32(&self, col: usize, row: usize) -> CoreResult<Option<i32>> {
        self.typed(col, row, |v| cast::to_integer(v, LogicalType::Integer))
    }

    /// Reads a cell as `i64`.
    pub fn value_i64(&self, col: usize, row: usize) -> CoreResult<Option<i64>> {
        self.typed(col, row, |v| cast::to_integer(v, LogicalType::BigInt))
    }

    /// Reads a cell as `i128`.
    pub fn value_i128(&self, col: usize, row: usize) -> CoreResult<Option<i128>> {
        self.typed(col, row, |v| cast::to_integer(v, LogicalType::HugeInt))
    }

    /// Reads a cell as `u8`.
    pub fn value_u8(&self, col: usize, row: usize) -> CoreResult<Option<u8>> {
        self.typed(col, row, |v| cast::to_integer(v, LogicalType::UTinyInt))
    }

    /// Reads a cell as `u16`.
    pub fn value_u16(&self, col: usize, row: usize) -> CoreResult<Option<u16>> {
        self.typed(col, row, |v| cast::to_integer(v, LogicalType::USmallInt))
    }

    /// Reads a cell as `u32`.
    pub fn value_u32(&self, col: usize, row: usize) -> CoreResult<Option<u32>> {
        self.typed(col, row, |v| cast::to_integer(v, LogicalType::UInteger))
    }

    /// Reads a cell as `u64`.
    pub fn value_u64(&self, col: usize, row: usize) -> CoreResult<Option<u64>> {
        self.typed(col, row, |v| cast::to_integer(v, LogicalType::UBigInt))
    }

    /// Reads a cell as `f32`.
    pub fn value_f32(&self, col: usize, row: usize) -> CoreResult<Option<f32>> {
        self.typed(col, row, cast::to_f32)
    }

    /// Reads a cell as `f64`.
    pub fn value_f64(&self, col: usize, row: usize) -> CoreResult<Option<f64>> {
        self.typed(col, row, cast::to_f64)
    }

    /// Reads a cell as a string using canonical formatting.
    pub fn value_string(&self, col: usize, row: usize) -> CoreResult<Option<String>> {
        self.typed(col, row, |v| Ok(cast::to_string(v)))
    }

    /// Reads a cell as bytes.
    pub fn value_blob(&self, col: usize, row: usize) -> CoreResult<Option<Vec<u8>>> {
        self.typed(col, row, cast::to_blob)
    }

    /// Iterates rows as vectors of values (`Value::Null` for nulls).
    pub fn rows(&self) -> impl Iterator<Item = Vec<Value>> + '_ {
        (0..self.row_count).map(move |row| {
            self.columns
                .iter()
                .map(|c| c.get(row).unwrap_or(Value::Null))
                .collect()
        })
    }
}
