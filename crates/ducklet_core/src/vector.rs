//! Columnar value storage.
//!
//! A [`Column`] holds one result column: a declared [`DataType`], a dense
//! typed buffer ([`ColumnData`]) and a [`Validity`] bitmap. Columns are
//! built append-only through [`ColumnBuilder`] and are immutable once
//! finished.
//!
//! Null cells still occupy a slot in the typed buffer (holding the type's
//! default), so row `i` is always at index `i` of the buffer.

use crate::cast;
use crate::error::{CoreError, CoreResult};
use crate::temporal::Interval;
use crate::types::DataType;
use crate::value::Value;
use uuid::Uuid;

const BITS_PER_WORD: usize = 64;

/// Per-row presence bitmap. A set bit means the cell holds a value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validity {
    words: Vec<u64>,
    len: usize,
}

impl Validity {
    /// Creates an empty bitmap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty bitmap with room for `capacity` rows.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            words: Vec::with_capacity(capacity.div_ceil(BITS_PER_WORD)),
            len: 0,
        }
    }

    /// Appends one presence bit.
    pub fn push(&mut self, valid: bool) {
        let bit = self.len % BITS_PER_WORD;
        if bit == 0 {
            self.words.push(0);
        }
        if valid {
            if let Some(word) = self.words.last_mut() {
                *word |= 1 << bit;
            }
        }
        self.len += 1;
    }

    /// Returns true when row `index` holds a value.
    ///
    /// Out-of-range rows report `false`.
    #[must_use]
    pub fn is_valid(&self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.words[index / BITS_PER_WORD] & (1 << (index % BITS_PER_WORD)) != 0
    }

    /// Number of rows tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true when no rows are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of null rows.
    #[must_use]
    pub fn null_count(&self) -> usize {
        let set: usize = self.words.iter().map(|w| w.count_ones() as usize).sum();
        self.len - set
    }

    /// Raw bitmap words, least significant bit first.
    #[must_use]
    pub fn words(&self) -> &[u64] {
        &self.words
    }
}

/// Dense typed storage, one variant per physical layout.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// `BOOLEAN`
    Boolean(Vec<bool>),
    /// `TINYINT`
    Int8(Vec<i8>),
    /// `SMALLINT`
    Int16(Vec<i16>),
    /// `INTEGER`, also `DATE` days.
    Int32(Vec<i32>),
    /// `BIGINT`, also `TIME` / `TIMESTAMP` microseconds.
    Int64(Vec<i64>),
    /// `HUGEINT`, also unscaled `DECIMAL`.
    Int128(Vec<i128>),
    /// `UTINYINT`
    UInt8(Vec<u8>),
    /// `USMALLINT`
    UInt16(Vec<u16>),
    /// `UINTEGER`
    UInt32(Vec<u32>),
    /// `UBIGINT`
    UInt64(Vec<u64>),
    /// `UHUGEINT`
    UInt128(Vec<u128>),
    /// `FLOAT`
    Float32(Vec<f32>),
    /// `DOUBLE`
    Float64(Vec<f64>),
    /// `VARCHAR`
    Varchar(Vec<String>),
    /// `BLOB`
    Blob(Vec<Vec<u8>>),
    /// `INTERVAL`
    Interval(Vec<Interval>),
    /// `UUID`
    Uuid(Vec<Uuid>),
    /// `LIST`, one element vector per row.
    List(Vec<Vec<Value>>),
    /// All-null column; only the row count is stored.
    Null(usize),
}

impl ColumnData {
    fn for_type(ty: &DataType, capacity: usize) -> Self {
        match ty {
            DataType::Boolean => ColumnData::Boolean(Vec::with_capacity(capacity)),
            DataType::TinyInt => ColumnData::Int8(Vec::with_capacity(capacity)),
            DataType::SmallInt => ColumnData::Int16(Vec::with_capacity(capacity)),
            DataType::Integer | DataType::Date => ColumnData::Int32(Vec::with_capacity(capacity)),
            DataType::BigInt | DataType::Time | DataType::Timestamp | DataType::TimestampTz => {
                ColumnData::Int64(Vec::with_capacity(capacity))
            }
            DataType::HugeInt | DataType::Decimal { .. } => {
                ColumnData::Int128(Vec::with_capacity(capacity))
            }
            DataType::UTinyInt => ColumnData::UInt8(Vec::with_capacity(capacity)),
            DataType::USmallInt => ColumnData::UInt16(Vec::with_capacity(capacity)),
            DataType::UInteger => ColumnData::UInt32(Vec::with_capacity(capacity)),
            DataType::UBigInt => ColumnData::UInt64(Vec::with_capacity(capacity)),
            DataType::UHugeInt => ColumnData::UInt128(Vec::with_capacity(capacity)),
            DataType::Float => ColumnData::Float32(Vec::with_capacity(capacity)),
            DataType::Double => ColumnData::Float64(Vec::with_capacity(capacity)),
            DataType::Varchar => ColumnData::Varchar(Vec::with_capacity(capacity)),
            DataType::Blob => ColumnData::Blob(Vec::with_capacity(capacity)),
            DataType::Interval => ColumnData::Interval(Vec::with_capacity(capacity)),
            DataType::Uuid => ColumnData::Uuid(Vec::with_capacity(capacity)),
            DataType::List(_) => ColumnData::List(Vec::with_capacity(capacity)),
            DataType::SqlNull => ColumnData::Null(0),
        }
    }

    /// Number of slots stored.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Boolean(v) => v.len(),
            ColumnData::Int8(v) => v.len(),
            ColumnData::Int16(v) => v.len(),
            ColumnData::Int32(v) => v.len(),
            ColumnData::Int64(v) => v.len(),
            ColumnData::Int128(v) => v.len(),
            ColumnData::UInt8(v) => v.len(),
            ColumnData::UInt16(v) => v.len(),
            ColumnData::UInt32(v) => v.len(),
            ColumnData::UInt64(v) => v.len(),
            ColumnData::UInt128(v) => v.len(),
            ColumnData::Float32(v) => v.len(),
            ColumnData::Float64(v) => v.len(),
            ColumnData::Varchar(v) => v.len(),
            ColumnData::Blob(v) => v.len(),
            ColumnData::Interval(v) => v.len(),
            ColumnData::Uuid(v) => v.len(),
            ColumnData::List(v) => v.len(),
            ColumnData::Null(n) => *n,
        }
    }

    /// Returns true when no slots are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pushes the default placeholder used for null cells.
    fn push_placeholder(&mut self) {
        match self {
            ColumnData::Boolean(v) => v.push(false),
            ColumnData::Int8(v) => v.push(0),
            ColumnData::Int16(v) => v.push(0),
            ColumnData::Int32(v) => v.push(0),
            ColumnData::Int64(v) => v.push(0),
            ColumnData::Int128(v) => v.push(0),
            ColumnData::UInt8(v) => v.push(0),
            ColumnData::UInt16(v) => v.push(0),
            ColumnData::UInt32(v) => v.push(0),
            ColumnData::UInt64(v) => v.push(0),
            ColumnData::UInt128(v) => v.push(0),
            ColumnData::Float32(v) => v.push(0.0),
            ColumnData::Float64(v) => v.push(0.0),
            ColumnData::Varchar(v) => v.push(String::new()),
            ColumnData::Blob(v) => v.push(Vec::new()),
            ColumnData::Interval(v) => v.push(Interval::default()),
            ColumnData::Uuid(v) => v.push(Uuid::nil()),
            ColumnData::List(v) => v.push(Vec::new()),
            ColumnData::Null(n) => *n += 1,
        }
    }

    /// Pushes a value already cast to the column type.
    fn push_value(&mut self, value: Value) -> Result<(), Value> {
        match (self, value) {
            (ColumnData::Boolean(v), Value::Boolean(x)) => v.push(x),
            (ColumnData::Int8(v), Value::TinyInt(x)) => v.push(x),
            (ColumnData::Int16(v), Value::SmallInt(x)) => v.push(x),
            (ColumnData::Int32(v), Value::Integer(x) | Value::Date(x)) => v.push(x),
            (
                ColumnData::Int64(v),
                Value::BigInt(x) | Value::Time(x) | Value::Timestamp(x) | Value::TimestampTz(x),
            ) => v.push(x),
            (ColumnData::Int128(v), Value::HugeInt(x)) => v.push(x),
            (ColumnData::Int128(v), Value::Decimal { value, .. }) => v.push(value),
            (ColumnData::UInt8(v), Value::UTinyInt(x)) => v.push(x),
            (ColumnData::UInt16(v), Value::USmallInt(x)) => v.push(x),
            (ColumnData::UInt32(v), Value::UInteger(x)) => v.push(x),
            (ColumnData::UInt64(v), Value::UBigInt(x)) => v.push(x),
            (ColumnData::UInt128(v), Value::UHugeInt(x)) => v.push(x),
            (ColumnData::Float32(v), Value::Float(x)) => v.push(x),
            (ColumnData::Float64(v), Value::Double(x)) => v.push(x),
            (ColumnData::Varchar(v), Value::Varchar(x)) => v.push(x),
            (ColumnData::Blob(v), Value::Blob(x)) => v.push(x),
            (ColumnData::Interval(v), Value::Interval(x)) => v.push(x),
            (ColumnData::Uuid(v), Value::Uuid(x)) => v.push(x),
            (ColumnData::List(v), Value::List { values, .. }) => v.push(values),
            (_, other) => return Err(other),
        }
        Ok(())
    }
}

/// Append-only builder for a [`Column`].
#[derive(Debug)]
pub struct ColumnBuilder {
    data_type: DataType,
    data: ColumnData,
    validity: Validity,
}

impl ColumnBuilder {
    /// Creates a builder for the given type.
    #[must_use]
    pub fn new(data_type: DataType) -> Self {
        Self::with_capacity(data_type, 0)
    }

    /// Creates a builder with room for `capacity` rows.
    #[must_use]
    pub fn with_capacity(data_type: DataType, capacity: usize) -> Self {
        Self {
            data: ColumnData::for_type(&data_type, capacity),
            validity: Validity::with_capacity(capacity),
            data_type,
        }
    }

    /// Appends a value, coercing it to the column type first.
    ///
    /// # Errors
    ///
    /// Returns a `Format` or `Overflow` error when the value cannot be
    /// coerced. The builder is unchanged in that case.
    pub fn append(&mut self, value: &Value) -> CoreResult<()> {
        if value.is_null() {
            self.append_null();
            return Ok(());
        }
        let cast = cast::cast_value(value, &self.data_type)?;
        self.data.push_value(cast).map_err(|rejected| {
            CoreError::conversion(
                rejected.data_type().logical_type(),
                self.data_type.logical_type(),
                &rejected,
            )
        })?;
        self.validity.push(true);
        Ok(())
    }

    /// Appends a null cell.
    pub fn append_null(&mut self) {
        self.data.push_placeholder();
        self.validity.push(false);
    }

    /// Number of rows appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.validity.len()
    }

    /// Returns true when nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validity.is_empty()
    }

    /// Freezes the builder into an immutable column.
    #[must_use]
    pub fn finish(self) -> Column {
        Column {
            data_type: self.data_type,
            data: self.data,
            validity: self.validity,
        }
    }
}

/// An immutable typed column with a null bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    data_type: DataType,
    data: ColumnData,
    validity: Validity,
}

impl Column {
    /// Builds a column from values in one pass.
    pub fn from_values(data_type: DataType, values: &[Value]) -> CoreResult<Self> {
        let mut builder = ColumnBuilder::with_capacity(data_type, values.len());
        for v in values {
            builder.append(v)?;
        }
        Ok(builder.finish())
    }

    /// Declared type.
    #[must_use]
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.validity.len()
    }

    /// Returns true when the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validity.is_empty()
    }

    /// Typed storage for bulk access. Null slots hold placeholders.
    #[must_use]
    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    /// Presence bitmap.
    #[must_use]
    pub fn validity(&self) -> &Validity {
        &self.validity
    }

    /// Returns true when row `row` is null. Caller checks bounds.
    #[must_use]
    pub fn is_null(&self, row: usize) -> bool {
        !self.validity.is_valid(row)
    }

    /// Reads row `row` back as a [`Value`].
    ///
    /// Returns `None` when `row` is out of range.
    #[must_use]
    pub fn get(&self, row: usize) -> Option<Value> {
        if row >= self.len() {
            return None;
        }
        if self.is_null(row) {
            return Some(Value::Null);
        }
        let value = match (&self.data, &self.data_type) {
            (ColumnData::Boolean(v), _) => Value::Boolean(v[row]),
            (ColumnData::Int8(v), _) => Value::TinyInt(v[row]),
            (ColumnData::Int16(v), _) => Value::SmallInt(v[row]),
            (ColumnData::Int32(v), DataType::Date) => Value::Date(v[row]),
            (ColumnData::Int32(v), _) => Value::Integer(v[row]),
            (ColumnData::Int64(v), DataType::Time) => Value::Time(v[row]),
            (ColumnData::Int64(v), DataType::Timestamp) => Value::Timestamp(v[row]),
            (ColumnData::Int64(v), DataType::TimestampTz) => Value::TimestampTz(v[row]),
            (ColumnData::Int64(v), _) => Value::BigInt(v[row]),
            (ColumnData::Int128(v), DataType::Decimal { width, scale }) => Value::Decimal {
                value: v[row],
                width: *width,
                scale: *scale,
            },
            (ColumnData::Int128(v), _) => Value::HugeInt(v[row]),
            (ColumnData::UInt8(v), _) => Value::UTinyInt(v[row]),
            (ColumnData::UInt16(v), _) => Value::USmallInt(v[row]),
            (ColumnData::UInt32(v), _) => Value::UInteger(v[row]),
            (ColumnData::UInt64(v), _) => Value::UBigInt(v[row]),
            (ColumnData::UInt128(v), _) => Value::UHugeInt(v[row]),
            (ColumnData::Float32(v), _) => Value::Float(v[row]),
            (ColumnData::Float64(v), _) => Value::Double(v[row]),
            (ColumnData::Varchar(v), _) => Value::Varchar(v[row].clone()),
            (ColumnData::Blob(v), _) => Value::Blob(v[row].clone()),
            (ColumnData::Interval(v), _) => Value::Interval(v[row]),
            (ColumnData::Uuid(v), _) => Value::Uuid(v[row]),
            (ColumnData::List(v), DataType::List(element)) => Value::List {
                element: (**element).clone(),
                values: v[row].clone(),
            },
            (ColumnData::List(v), _) => Value::List {
                element: DataType::SqlNull,
                values: v[row].clone(),
            },
            (ColumnData::Null(_), _) => Value::Null,
        };
        Some(value)
    }

    /// Borrows a `VARCHAR` cell without cloning. Caller checks bounds.
    #[must_use]
    pub fn str_at(&self, row: usize) -> Option<&str> {
        match &self.data {
            ColumnData::Varchar(v) if !self.is_null(row) => v.get(row).map(String::as_str),
            _ => None,
        }
    }

    /// Typed `INTEGER` slice, if this is an `INTEGER` column.
    #[must_use]
    pub fn as_i32_slice(&self) -> Option<&[i32]> {
        match (&self.data, &self.data_type) {
            (ColumnData::Int32(v), DataType::Integer) => Some(v),
            _ => None,
        }
    }

    /// Typed `BIGINT` slice, if this is a `BIGINT` column.
    #[must_use]
    pub fn as_i64_slice(&self) -> Option<&[i64]> {
        match (&self.data, &self.data_type) {
            (ColumnData::Int64(v), DataType::BigInt) => Some(v),
            _ => None,
        }
    }

    /// Typed `DOUBLE` slice, if this is a `DOUBLE` column.
    #[must_use]
    pub fn as_f64_slice(&self) -> Option<&[f64]> {
        match &self.data {
            ColumnData::Float64(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn validity_bits() {
        let mut validity = Validity::new();
        for i in 0..130 {
            validity.push(i % 3 != 0);
        }
        assert_eq!(validity.len(), 130);
        assert_eq!(validity.words().len(), 3);
        assert!(!validity.is_valid(0));
        assert!(validity.is_valid(1));
        assert!(!validity.is_valid(129));
        assert!(!validity.is_valid(500));
        assert_eq!(validity.null_count(), 44);
    }

    #[test]
    fn builder_appends_and_nulls() {
        let mut builder = ColumnBuilder::new(DataType::Integer);
        builder.append(&Value::Integer(1)).unwrap();
        builder.append(&Value::Null).unwrap();
        builder.append(&Value::SmallInt(3)).unwrap();
        let column = builder.finish();

        assert_eq!(column.len(), 3);
        assert_eq!(column.as_i32_slice(), Some(&[1, 0, 3][..]));
        assert_eq!(column.get(0), Some(Value::Integer(1)));
        assert_eq!(column.get(1), Some(Value::Null));
        assert_eq!(column.get(2), Some(Value::Integer(3)));
        assert_eq!(column.get(3), None);
        assert!(column.is_null(1));
    }

    #[test]
    fn append_coerces_or_fails() {
        let mut builder = ColumnBuilder::new(DataType::TinyInt);
        let err = builder.append(&Value::Integer(300)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
        assert!(builder.is_empty());

        builder.append(&Value::varchar("12")).unwrap();
        assert_eq!(builder.finish().get(0), Some(Value::TinyInt(12)));
    }

    #[test]
    fn temporal_and_decimal_round_trip() {
        let column = Column::from_values(
            DataType::Decimal { width: 6, scale: 2 },
            &[Value::varchar("12.5"), Value::Null],
        )
        .unwrap();
        assert_eq!(column.get(0).unwrap().to_string(), "12.50");

        let column = Column::from_values(DataType::Date, &[Value::Date(5)]).unwrap();
        assert_eq!(column.get(0), Some(Value::Date(5)));
    }

    #[test]
    fn null_column() {
        let column = Column::from_values(DataType::SqlNull, &[Value::Null, Value::Null]).unwrap();
        assert_eq!(column.len(), 2);
        assert_eq!(column.data().len(), 2);
        assert_eq!(column.get(1), Some(Value::Null));
        assert_eq!(column.validity().null_count(), 2);
    }

    #[test]
    fn typed_slices_match_physical_type() {
        let bigints =
            Column::from_values(DataType::BigInt, &[Value::Integer(7), Value::Null]).unwrap();
        assert_eq!(bigints.as_i64_slice(), Some(&[7, 0][..]));
        assert_eq!(bigints.as_f64_slice(), None);

        let doubles = Column::from_values(DataType::Double, &[Value::Double(0.5)]).unwrap();
        assert_eq!(doubles.as_f64_slice(), Some(&[0.5][..]));
        assert_eq!(doubles.as_i64_slice(), None);
    }

    #[test]
    fn varchar_borrow() {
        let column =
            Column::from_values(DataType::Varchar, &[Value::varchar("a"), Value::Null]).unwrap();
        assert_eq!(column.str_at(0), Some("a"));
        assert_eq!(column.str_at(1), None);
    }
}
