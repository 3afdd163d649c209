//! Dynamic scalar values.

use crate::temporal::{self, Interval};
use crate::types::DataType;
use std::fmt;
use uuid::Uuid;

/// A single SQL value.
///
/// The evaluator works on `Value`s; result columns store them in typed,
/// columnar form (see [`crate::vector`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL `NULL`.
    Null,
    /// `BOOLEAN`
    Boolean(bool),
    /// `TINYINT`
    TinyInt(i8),
    /// `SMALLINT`
    SmallInt(i16),
    /// `INTEGER`
    Integer(i32),
    /// `BIGINT`
    BigInt(i64),
    /// `HUGEINT`
    HugeInt(i128),
    /// `UTINYINT`
    UTinyInt(u8),
    /// `USMALLINT`
    USmallInt(u16),
    /// `UINTEGER`
    UInteger(u32),
    /// `UBIGINT`
    UBigInt(u64),
    /// `UHUGEINT`
    UHugeInt(u128),
    /// `FLOAT`
    Float(f32),
    /// `DOUBLE`
    Double(f64),
    /// `DECIMAL(width, scale)`, stored as an unscaled integer.
    Decimal {
        /// Unscaled value (`1.25` with scale 2 is `125`).
        value: i128,
        /// Total digits.
        width: u8,
        /// Fractional digits.
        scale: u8,
    },
    /// `VARCHAR`
    Varchar(String),
    /// `BLOB`
    Blob(Vec<u8>),
    /// `DATE`, days since 1970-01-01.
    Date(i32),
    /// `TIME`, microseconds since midnight.
    Time(i64),
    /// `TIMESTAMP`, microseconds since the epoch.
    Timestamp(i64),
    /// `TIMESTAMP WITH TIME ZONE`, microseconds since the epoch in UTC.
    TimestampTz(i64),
    /// `INTERVAL`
    Interval(Interval),
    /// `UUID`
    Uuid(Uuid),
    /// `LIST` of values sharing one element type.
    List {
        /// Element type.
        element: DataType,
        /// Elements, possibly `Null`.
        values: Vec<Value>,
    },
}

impl Value {
    /// Returns true for `NULL`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the type of this value.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::SqlNull,
            Value::Boolean(_) => DataType::Boolean,
            Value::TinyInt(_) => DataType::TinyInt,
            Value::SmallInt(_) => DataType::SmallInt,
            Value::Integer(_) => DataType::Integer,
            Value::BigInt(_) => DataType::BigInt,
            Value::HugeInt(_) => DataType::HugeInt,
            Value::UTinyInt(_) => DataType::UTinyInt,
            Value::USmallInt(_) => DataType::USmallInt,
            Value::UInteger(_) => DataType::UInteger,
            Value::UBigInt(_) => DataType::UBigInt,
            Value::UHugeInt(_) => DataType::UHugeInt,
            Value::Float(_) => DataType::Float,
            Value::Double(_) => DataType::Double,
            Value::Decimal { width, scale, .. } => DataType::Decimal {
                width: *width,
                scale: *scale,
            },
            Value::Varchar(_) => DataType::Varchar,
            Value::Blob(_) => DataType::Blob,
            Value::Date(_) => DataType::Date,
            Value::Time(_) => DataType::Time,
            Value::Timestamp(_) => DataType::Timestamp,
            Value::TimestampTz(_) => DataType::TimestampTz,
            Value::Interval(_) => DataType::Interval,
            Value::Uuid(_) => DataType::Uuid,
            Value::List { element, .. } => DataType::List(Box::new(element.clone())),
        }
    }

    /// Returns the value of any integer variant widened to `i128`.
    ///
    /// `UHUGEINT` values above `i128::MAX` return `None`.
    #[must_use]
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::TinyInt(v) => Some(i128::from(*v)),
            Value::SmallInt(v) => Some(i128::from(*v)),
            Value::Integer(v) => Some(i128::from(*v)),
            Value::BigInt(v) => Some(i128::from(*v)),
            Value::HugeInt(v) => Some(*v),
            Value::UTinyInt(v) => Some(i128::from(*v)),
            Value::USmallInt(v) => Some(i128::from(*v)),
            Value::UInteger(v) => Some(i128::from(*v)),
            Value::UBigInt(v) => Some(i128::from(*v)),
            Value::UHugeInt(v) => i128::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Returns the value of any numeric variant as `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            Value::UHugeInt(v) => Some(*v as f64),
            Value::Decimal { value, scale, .. } => {
                Some(*value as f64 / 10f64.powi(i32::from(*scale)))
            }
            other => other.as_i128().map(|v| v as f64),
        }
    }

    /// Returns the string payload of a `VARCHAR`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Varchar(s) => Some(s),
            _ => None,
        }
    }

    /// Builds the smallest-typed integer value among INTEGER, BIGINT, HUGEINT.
    #[must_use]
    pub fn integer_literal(v: i128) -> Value {
        if let Ok(v) = i32::try_from(v) {
            Value::Integer(v)
        } else if let Ok(v) = i64::try_from(v) {
            Value::BigInt(v)
        } else {
            Value::HugeInt(v)
        }
    }

    /// Builds a `VARCHAR` value.
    pub fn varchar(s: impl Into<String>) -> Value {
        Value::Varchar(s.into())
    }
}

/// Formats an unscaled decimal with exactly `scale` fractional digits.
#[must_use]
pub fn format_decimal(value: i128, scale: u8) -> String {
    if scale == 0 {
        return value.to_string();
    }
    let digits = value.unsigned_abs().to_string();
    let scale = usize::from(scale);
    let padded = if digits.len() <= scale {
        format!("{}{digits}", "0".repeat(scale - digits.len() + 1))
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    let sign = if value < 0 { "-" } else { "" };
    format!("{sign}{int_part}.{frac_part}")
}

/// Formats a float the way result sets print them.
#[must_use]
pub fn format_float(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        v.to_string()
    }
}

fn format_blob(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for b in bytes {
        if b.is_ascii_graphic() || *b == b' ' {
            if *b == b'\\' {
                out.push_str("\\\\");
            } else {
                out.push(char::from(*b));
            }
        } else {
            out.push_str(&format!("\\x{b:02X}"));
        }
    }
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::TinyInt(v) => write!(f, "{v}"),
            Value::SmallInt(v) => write!(f, "{v}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::BigInt(v) => write!(f, "{v}"),
            Value::HugeInt(v) => write!(f, "{v}"),
            Value::UTinyInt(v) => write!(f, "{v}"),
            Value::USmallInt(v) => write!(f, "{v}"),
            Value::UInteger(v) => write!(f, "{v}"),
            Value::UBigInt(v) => write!(f, "{v}"),
            Value::UHugeInt(v) => write!(f, "{v}"),
            Value::Float(v) => f.write_str(&format_float(f64::from(*v))),
            Value::Double(v) => f.write_str(&format_float(*v)),
            Value::Decimal { value, scale, .. } => f.write_str(&format_decimal(*value, *scale)),
            Value::Varchar(s) => f.write_str(s),
            Value::Blob(bytes) => f.write_str(&format_blob(bytes)),
            Value::Date(days) => f.write_str(&temporal::format_date(*days)),
            Value::Time(micros) => f.write_str(&temporal::format_time(*micros)),
            Value::Timestamp(micros) => f.write_str(&temporal::format_timestamp(*micros)),
            Value::TimestampTz(micros) => {
                write!(f, "{}+00", temporal::format_timestamp(*micros))
            }
            Value::Interval(interval) => write!(f, "{interval}"),
            Value::Uuid(uuid) => write!(f, "{}", uuid.hyphenated()),
            Value::List { values, .. } => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match v {
                        Value::Varchar(s) => write!(f, "'{s}'")?,
                        other => write!(f, "{other}")?,
                    }
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Varchar(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Varchar(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_formatting() {
        assert_eq!(format_decimal(12345, 2), "123.45");
        assert_eq!(format_decimal(-5, 3), "-0.005");
        assert_eq!(format_decimal(7, 0), "7");
        assert_eq!(format_decimal(100, 2), "1.00");
    }

    #[test]
    fn float_formatting() {
        assert_eq!(Value::Double(1.5).to_string(), "1.5");
        assert_eq!(Value::Double(3.0).to_string(), "3");
        assert_eq!(Value::Double(f64::INFINITY).to_string(), "inf");
        assert_eq!(Value::Float(f32::NAN).to_string(), "nan");
    }

    #[test]
    fn display_variants() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::Blob(vec![b'a', 0, 0xff]).to_string(), "a\\x00\\xFF");
        assert_eq!(Value::Date(0).to_string(), "1970-01-01");
        assert_eq!(Value::TimestampTz(0).to_string(), "1970-01-01 00:00:00+00");
        let list = Value::List {
            element: DataType::Varchar,
            values: vec![Value::varchar("a"), Value::Null],
        };
        assert_eq!(list.to_string(), "['a', NULL]");
    }

    #[test]
    fn integer_literal_typing() {
        assert_eq!(Value::integer_literal(1), Value::Integer(1));
        assert_eq!(
            Value::integer_literal(i128::from(i32::MAX) + 1),
            Value::BigInt(i64::from(i32::MAX) + 1)
        );
        assert_eq!(
            Value::integer_literal(i128::from(i64::MAX) + 1).data_type(),
            DataType::HugeInt
        );
    }

    #[test]
    fn numeric_views() {
        assert_eq!(Value::UTinyInt(200).as_i128(), Some(200));
        assert_eq!(Value::UHugeInt(u128::MAX).as_i128(), None);
        let dec = Value::Decimal {
            value: 125,
            width: 5,
            scale: 2,
        };
        assert_eq!(dec.as_f64(), Some(1.25));
        assert_eq!(Value::from(Some(3)), Value::Integer(3));
        assert_eq!(Value::from(None::<i32>), Value::Null);
    }
}
