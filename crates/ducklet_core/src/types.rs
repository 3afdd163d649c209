//! Logical type definitions.
//!
//! [`LogicalType`] is the flat type tag exposed across the C ABI. Its integer
//! codes are fixed and must never be renumbered. [`DataType`] is the
//! parameterized type carried by result columns and table definitions
//! (decimal precision, list element type).

use crate::error::{CoreError, CoreResult};
use std::fmt;

/// Maximum precision of a `DECIMAL`.
pub const MAX_DECIMAL_WIDTH: u8 = 38;

/// Default precision used for `DECIMAL` without parameters.
pub const DEFAULT_DECIMAL_WIDTH: u8 = 18;

/// Default scale used for `DECIMAL` without parameters.
pub const DEFAULT_DECIMAL_SCALE: u8 = 3;

/// Type tag with stable integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum LogicalType {
    /// Unknown or invalid type.
    Invalid = 0,
    /// `BOOLEAN`
    Boolean = 1,
    /// `TINYINT` (i8)
    TinyInt = 2,
    /// `SMALLINT` (i16)
    SmallInt = 3,
    /// `INTEGER` (i32)
    Integer = 4,
    /// `BIGINT` (i64)
    BigInt = 5,
    /// `UTINYINT` (u8)
    UTinyInt = 6,
    /// `USMALLINT` (u16)
    USmallInt = 7,
    /// `UINTEGER` (u32)
    UInteger = 8,
    /// `UBIGINT` (u64)
    UBigInt = 9,
    /// `FLOAT` (f32)
    Float = 10,
    /// `DOUBLE` (f64)
    Double = 11,
    /// `TIMESTAMP` (microseconds)
    Timestamp = 12,
    /// `DATE`
    Date = 13,
    /// `TIME`
    Time = 14,
    /// `INTERVAL`
    Interval = 15,
    /// `HUGEINT` (i128)
    HugeInt = 16,
    /// `VARCHAR`
    Varchar = 17,
    /// `BLOB`
    Blob = 18,
    /// `DECIMAL(width, scale)`
    Decimal = 19,
    /// `TIMESTAMP_S`
    TimestampS = 20,
    /// `TIMESTAMP_MS`
    TimestampMs = 21,
    /// `TIMESTAMP_NS`
    TimestampNs = 22,
    /// `ENUM`
    Enum = 23,
    /// `LIST`
    List = 24,
    /// `STRUCT`
    Struct = 25,
    /// `MAP`
    Map = 26,
    /// `UUID`
    Uuid = 27,
    /// `UNION`
    Union = 28,
    /// `BIT`
    Bit = 29,
    /// `TIME WITH TIME ZONE`
    TimeTz = 30,
    /// `TIMESTAMP WITH TIME ZONE`
    TimestampTz = 31,
    /// `UHUGEINT` (u128)
    UHugeInt = 32,
    /// `ARRAY`
    Array = 33,
    /// `ANY`
    Any = 34,
    /// `VARINT`
    Varint = 35,
    /// Type of the `NULL` literal.
    SqlNull = 36,
    /// Untyped string literal.
    StringLiteral = 37,
    /// Untyped integer literal.
    IntegerLiteral = 38,
}

impl LogicalType {
    const ALL: [LogicalType; 39] = [
        LogicalType::Invalid,
        LogicalType::Boolean,
        LogicalType::TinyInt,
        LogicalType::SmallInt,
        LogicalType::Integer,
        LogicalType::BigInt,
        LogicalType::UTinyInt,
        LogicalType::USmallInt,
        LogicalType::UInteger,
        LogicalType::UBigInt,
        LogicalType::Float,
        LogicalType::Double,
        LogicalType::Timestamp,
        LogicalType::Date,
        LogicalType::Time,
        LogicalType::Interval,
        LogicalType::HugeInt,
        LogicalType::Varchar,
        LogicalType::Blob,
        LogicalType::Decimal,
        LogicalType::TimestampS,
        LogicalType::TimestampMs,
        LogicalType::TimestampNs,
        LogicalType::Enum,
        LogicalType::List,
        LogicalType::Struct,
        LogicalType::Map,
        LogicalType::Uuid,
        LogicalType::Union,
        LogicalType::Bit,
        LogicalType::TimeTz,
        LogicalType::TimestampTz,
        LogicalType::UHugeInt,
        LogicalType::Array,
        LogicalType::Any,
        LogicalType::Varint,
        LogicalType::SqlNull,
        LogicalType::StringLiteral,
        LogicalType::IntegerLiteral,
    ];

    /// Returns the stable integer code.
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Looks up a type by code. Unknown codes map to `Invalid`.
    #[must_use]
    pub fn from_code(code: u32) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.code() == code)
            .unwrap_or(LogicalType::Invalid)
    }

    /// Returns every type tag, ordered by declaration.
    #[must_use]
    pub fn all() -> &'static [LogicalType] {
        &Self::ALL
    }

    /// Returns the SQL name of this type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            LogicalType::Invalid => "INVALID",
            LogicalType::Boolean => "BOOLEAN",
            LogicalType::TinyInt => "TINYINT",
            LogicalType::SmallInt => "SMALLINT",
            LogicalType::Integer => "INTEGER",
            LogicalType::BigInt => "BIGINT",
            LogicalType::UTinyInt => "UTINYINT",
            LogicalType::USmallInt => "USMALLINT",
            LogicalType::UInteger => "UINTEGER",
            LogicalType::UBigInt => "UBIGINT",
            LogicalType::Float => "FLOAT",
            LogicalType::Double => "DOUBLE",
            LogicalType::Timestamp => "TIMESTAMP",
            LogicalType::Date => "DATE",
            LogicalType::Time => "TIME",
            LogicalType::Interval => "INTERVAL",
            LogicalType::HugeInt => "HUGEINT",
            LogicalType::Varchar => "VARCHAR",
            LogicalType::Blob => "BLOB",
            LogicalType::Decimal => "DECIMAL",
            LogicalType::TimestampS => "TIMESTAMP_S",
            LogicalType::TimestampMs => "TIMESTAMP_MS",
            LogicalType::TimestampNs => "TIMESTAMP_NS",
            LogicalType::Enum => "ENUM",
            LogicalType::List => "LIST",
            LogicalType::Struct => "STRUCT",
            LogicalType::Map => "MAP",
            LogicalType::Uuid => "UUID",
            LogicalType::Union => "UNION",
            LogicalType::Bit => "BIT",
            LogicalType::TimeTz => "TIME WITH TIME ZONE",
            LogicalType::TimestampTz => "TIMESTAMP WITH TIME ZONE",
            LogicalType::UHugeInt => "UHUGEINT",
            LogicalType::Array => "ARRAY",
            LogicalType::Any => "ANY",
            LogicalType::Varint => "VARINT",
            LogicalType::SqlNull => "NULL",
            LogicalType::StringLiteral => "STRING_LITERAL",
            LogicalType::IntegerLiteral => "INTEGER_LITERAL",
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fully parameterized column type.
///
/// Only the types the engine can materialize have a variant here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    /// `BOOLEAN`
    Boolean,
    /// `TINYINT`
    TinyInt,
    /// `SMALLINT`
    SmallInt,
    /// `INTEGER`
    Integer,
    /// `BIGINT`
    BigInt,
    /// `HUGEINT`
    HugeInt,
    /// `UTINYINT`
    UTinyInt,
    /// `USMALLINT`
    USmallInt,
    /// `UINTEGER`
    UInteger,
    /// `UBIGINT`
    UBigInt,
    /// `UHUGEINT`
    UHugeInt,
    /// `FLOAT`
    Float,
    /// `DOUBLE`
    Double,
    /// `DECIMAL(width, scale)`
    Decimal {
        /// Total number of digits.
        width: u8,
        /// Digits after the decimal point.
        scale: u8,
    },
    /// `VARCHAR`
    Varchar,
    /// `BLOB`
    Blob,
    /// `DATE`
    Date,
    /// `TIME`
    Time,
    /// `TIMESTAMP`
    Timestamp,
    /// `TIMESTAMP WITH TIME ZONE`
    TimestampTz,
    /// `INTERVAL`
    Interval,
    /// `UUID`
    Uuid,
    /// `T[]`
    List(Box<DataType>),
    /// Type of an expression that is always `NULL`.
    SqlNull,
}

impl DataType {
    /// Returns the flat type tag.
    #[must_use]
    pub fn logical_type(&self) -> LogicalType {
        match self {
            DataType::Boolean => LogicalType::Boolean,
            DataType::TinyInt => LogicalType::TinyInt,
            DataType::SmallInt => LogicalType::SmallInt,
            DataType::Integer => LogicalType::Integer,
            DataType::BigInt => LogicalType::BigInt,
            DataType::HugeInt => LogicalType::HugeInt,
            DataType::UTinyInt => LogicalType::UTinyInt,
            DataType::USmallInt => LogicalType::USmallInt,
            DataType::UInteger => LogicalType::UInteger,
            DataType::UBigInt => LogicalType::UBigInt,
            DataType::UHugeInt => LogicalType::UHugeInt,
            DataType::Float => LogicalType::Float,
            DataType::Double => LogicalType::Double,
            DataType::Decimal { .. } => LogicalType::Decimal,
            DataType::Varchar => LogicalType::Varchar,
            DataType::Blob => LogicalType::Blob,
            DataType::Date => LogicalType::Date,
            DataType::Time => LogicalType::Time,
            DataType::Timestamp => LogicalType::Timestamp,
            DataType::TimestampTz => LogicalType::TimestampTz,
            DataType::Interval => LogicalType::Interval,
            DataType::Uuid => LogicalType::Uuid,
            DataType::List(_) => LogicalType::List,
            DataType::SqlNull => LogicalType::SqlNull,
        }
    }

    /// Returns true for the signed and unsigned integer types.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::TinyInt
                | DataType::SmallInt
                | DataType::Integer
                | DataType::BigInt
                | DataType::HugeInt
                | DataType::UTinyInt
                | DataType::USmallInt
                | DataType::UInteger
                | DataType::UBigInt
                | DataType::UHugeInt
        )
    }

    /// Returns true for the floating point types.
    #[must_use]
    pub fn is_floating(&self) -> bool {
        matches!(self, DataType::Float | DataType::Double)
    }

    /// Returns true for any numeric type, including decimals.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_floating() || matches!(self, DataType::Decimal { .. })
    }

    /// Returns `(bits, signed)` for integer types.
    #[must_use]
    pub fn integer_layout(&self) -> Option<(u32, bool)> {
        let layout = match self {
            DataType::TinyInt => (8, true),
            DataType::SmallInt => (16, true),
            DataType::Integer => (32, true),
            DataType::BigInt => (64, true),
            DataType::HugeInt => (128, true),
            DataType::UTinyInt => (8, false),
            DataType::USmallInt => (16, false),
            DataType::UInteger => (32, false),
            DataType::UBigInt => (64, false),
            DataType::UHugeInt => (128, false),
            _ => return None,
        };
        Some(layout)
    }

    /// Builds an integer type from its layout.
    #[must_use]
    pub fn integer_from_layout(bits: u32, signed: bool) -> DataType {
        match (bits, signed) {
            (0..=8, true) => DataType::TinyInt,
            (9..=16, true) => DataType::SmallInt,
            (17..=32, true) => DataType::Integer,
            (33..=64, true) => DataType::BigInt,
            (_, true) => DataType::HugeInt,
            (0..=8, false) => DataType::UTinyInt,
            (9..=16, false) => DataType::USmallInt,
            (17..=32, false) => DataType::UInteger,
            (33..=64, false) => DataType::UBigInt,
            (_, false) => DataType::UHugeInt,
        }
    }

    /// Resolves a SQL type name with optional numeric parameters.
    ///
    /// Recognized but unsupported types (e.g. `STRUCT`) produce a query error.
    pub fn from_sql_name(name: &str, params: &[u32]) -> CoreResult<DataType> {
        let upper = name.to_ascii_uppercase();
        let ty = match upper.as_str() {
            "BOOLEAN" | "BOOL" | "LOGICAL" => DataType::Boolean,
            "TINYINT" | "INT1" => DataType::TinyInt,
            "SMALLINT" | "INT2" | "SHORT" => DataType::SmallInt,
            "INTEGER" | "INT" | "INT4" | "SIGNED" => DataType::Integer,
            "BIGINT" | "INT8" | "LONG" => DataType::BigInt,
            "HUGEINT" | "INT128" => DataType::HugeInt,
            "UTINYINT" => DataType::UTinyInt,
            "USMALLINT" => DataType::USmallInt,
            "UINTEGER" => DataType::UInteger,
            "UBIGINT" => DataType::UBigInt,
            "UHUGEINT" => DataType::UHugeInt,
            "FLOAT" | "FLOAT4" | "REAL" => DataType::Float,
            "DOUBLE" | "FLOAT8" | "DOUBLE PRECISION" => DataType::Double,
            "DECIMAL" | "NUMERIC" => return Self::decimal_from_params(params),
            "VARCHAR" | "TEXT" | "STRING" | "CHAR" | "BPCHAR" | "CHARACTER"
            | "CHARACTER VARYING" => DataType::Varchar,
            "BLOB" | "BYTEA" | "BINARY" | "VARBINARY" => DataType::Blob,
            "DATE" => DataType::Date,
            "TIME" => DataType::Time,
            "TIMESTAMP" | "DATETIME" => DataType::Timestamp,
            "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" => DataType::TimestampTz,
            "INTERVAL" => DataType::Interval,
            "UUID" => DataType::Uuid,
            "ENUM" | "STRUCT" | "MAP" | "UNION" | "BIT" | "BITSTRING" | "VARINT" | "TIMETZ"
            | "TIME WITH TIME ZONE" | "TIMESTAMP_S" | "TIMESTAMP_MS" | "TIMESTAMP_NS" | "ARRAY" => {
                return Err(CoreError::query(format!(
                    "Not implemented Error: type {upper} is not supported"
                )));
            }
            _ => {
                return Err(CoreError::query(format!(
                    "Catalog Error: Type with name {name} does not exist!"
                )));
            }
        };

        // VARCHAR(n) is accepted and the length ignored
        if !params.is_empty() && ty != DataType::Varchar {
            return Err(CoreError::query(format!(
                "Parser Error: type {upper} does not accept parameters"
            )));
        }
        Ok(ty)
    }

    fn decimal_from_params(params: &[u32]) -> CoreResult<DataType> {
        let (width, scale) = match params {
            [] => (u32::from(DEFAULT_DECIMAL_WIDTH), u32::from(DEFAULT_DECIMAL_SCALE)),
            [w] => (*w, 0),
            [w, s] => (*w, *s),
            _ => {
                return Err(CoreError::query(
                    "Parser Error: DECIMAL takes at most two parameters",
                ))
            }
        };
        if width == 0 || width > u32::from(MAX_DECIMAL_WIDTH) {
            return Err(CoreError::query(format!(
                "Parser Error: DECIMAL width must be between 1 and {MAX_DECIMAL_WIDTH}"
            )));
        }
        if scale > width {
            return Err(CoreError::query(
                "Parser Error: DECIMAL scale cannot be bigger than width",
            ));
        }
        Ok(DataType::Decimal {
            width: width as u8,
            scale: scale as u8,
        })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Decimal { width, scale } => write!(f, "DECIMAL({width},{scale})"),
            DataType::List(child) => write!(f, "{child}[]"),
            other => f.write_str(other.logical_type().name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(LogicalType::Invalid.code(), 0);
        assert_eq!(LogicalType::Boolean.code(), 1);
        assert_eq!(LogicalType::Integer.code(), 4);
        assert_eq!(LogicalType::HugeInt.code(), 16);
        assert_eq!(LogicalType::Varchar.code(), 17);
        assert_eq!(LogicalType::UHugeInt.code(), 32);
        assert_eq!(LogicalType::Array.code(), 33);
        assert_eq!(LogicalType::IntegerLiteral.code(), 38);
    }

    #[test]
    fn code_round_trip() {
        for ty in LogicalType::all() {
            assert_eq!(LogicalType::from_code(ty.code()), *ty);
        }
        assert_eq!(LogicalType::from_code(999), LogicalType::Invalid);
    }

    #[test]
    fn sql_names() {
        assert_eq!(DataType::from_sql_name("int", &[]).unwrap(), DataType::Integer);
        assert_eq!(DataType::from_sql_name("TEXT", &[]).unwrap(), DataType::Varchar);
        assert_eq!(DataType::from_sql_name("varchar", &[20]).unwrap(), DataType::Varchar);
        assert_eq!(
            DataType::from_sql_name("numeric", &[10, 2]).unwrap(),
            DataType::Decimal { width: 10, scale: 2 }
        );
        assert_eq!(
            DataType::from_sql_name("decimal", &[]).unwrap(),
            DataType::Decimal { width: 18, scale: 3 }
        );
        assert!(DataType::from_sql_name("decimal", &[40, 2]).is_err());
        assert!(DataType::from_sql_name("decimal", &[4, 5]).is_err());
        assert!(DataType::from_sql_name("struct", &[]).is_err());
        assert!(DataType::from_sql_name("nope", &[]).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(DataType::Decimal { width: 4, scale: 1 }.to_string(), "DECIMAL(4,1)");
        assert_eq!(DataType::List(Box::new(DataType::Integer)).to_string(), "INTEGER[]");
        assert_eq!(DataType::SqlNull.to_string(), "NULL");
    }

    #[test]
    fn integer_layouts() {
        assert_eq!(DataType::SmallInt.integer_layout(), Some((16, true)));
        assert_eq!(DataType::UBigInt.integer_layout(), Some((64, false)));
        assert_eq!(DataType::Varchar.integer_layout(), None);
        assert_eq!(DataType::integer_from_layout(64, true), DataType::BigInt);
        assert_eq!(DataType::integer_from_layout(8, false), DataType::UTinyInt);
    }
}
