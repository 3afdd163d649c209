//! Value coercion rules.
//!
//! Every type pair has one fixed rule:
//!
//! - integer to integer: widening is lossless, narrowing fails with
//!   `Overflow` when the value does not fit
//! - float/decimal to integer: round half away from zero, then range check.
//!   NaN and infinities overflow
//! - anything to string: canonical formatting (`Value`'s `Display`)
//! - string to number: trimmed parse, `Format` when unparsable, `Overflow`
//!   when out of range
//! - string to bool: `true/false/t/f/yes/no/y/n/1/0`, case-insensitive
//! - pairs not listed fail with `Format`
//!
//! The typed result accessors and SQL `CAST` share these functions.

use crate::error::{CoreError, CoreResult};
use crate::temporal::{self, Interval};
use crate::types::{DataType, LogicalType};
use crate::value::Value;
use std::num::IntErrorKind;
use uuid::Uuid;

/// Returns `10^n`, or `None` past `i128` range.
#[must_use]
pub fn pow10(n: u32) -> Option<i128> {
    10i128.checked_pow(n)
}

/// Divides rounding half away from zero.
#[must_use]
pub fn div_round(value: i128, divisor: i128) -> i128 {
    let quotient = value / divisor;
    let remainder = value % divisor;
    if remainder.unsigned_abs() * 2 >= divisor.unsigned_abs() {
        quotient + value.signum() * divisor.signum()
    } else {
        quotient
    }
}

/// Changes the scale of an unscaled decimal, rounding when scale shrinks.
#[must_use]
pub fn rescale(value: i128, from: u32, to: u32) -> Option<i128> {
    if to >= from {
        value.checked_mul(pow10(to - from)?)
    } else {
        match pow10(from - to) {
            Some(divisor) => Some(div_round(value, divisor)),
            // Every i128 rounds to zero at this scale
            None => Some(0),
        }
    }
}

fn conversion(value: &Value, to: LogicalType) -> CoreError {
    CoreError::conversion(value.data_type().logical_type(), to, value)
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "1" => Some(true),
        "false" | "f" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Parses plain decimal text into `(unscaled, fractional digits)`.
fn parse_decimal_text(text: &str) -> Option<(i128, u32)> {
    let text = text.trim();
    let (negative, body) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let mut unscaled: i128 = 0;
    for ch in int_part.chars().chain(frac_part.chars()) {
        let digit = ch.to_digit(10)?;
        unscaled = unscaled.checked_mul(10)?.checked_add(i128::from(digit))?;
    }
    let scale = u32::try_from(frac_part.len()).ok()?;
    Some((if negative { -unscaled } else { unscaled }, scale))
}

fn float_to_i128(v: f64, value: &Value, target: LogicalType) -> CoreResult<i128> {
    // i128 spans roughly +/- 1.7e38
    if !v.is_finite() || v.abs() >= 1.7e38 {
        return Err(CoreError::overflow(value, target));
    }
    Ok(v.round() as i128)
}

fn integer_of(value: &Value, target: LogicalType) -> CoreResult<i128> {
    match value {
        Value::Boolean(b) => Ok(i128::from(*b)),
        Value::UHugeInt(v) => i128::try_from(*v).map_err(|_| CoreError::overflow(value, target)),
        Value::Float(v) => float_to_i128(f64::from(*v), value, target),
        Value::Double(v) => float_to_i128(*v, value, target),
        Value::Decimal { value: v, scale, .. } => {
            Ok(rescale(*v, u32::from(*scale), 0).unwrap_or(0))
        }
        Value::Varchar(s) => match s.trim().parse::<i128>() {
            Ok(v) => Ok(v),
            Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
                Err(CoreError::overflow(s, target))
            }
            Err(_) => match s.trim().parse::<f64>() {
                Ok(f) if !s.trim().is_empty() && !s.trim().chars().any(char::is_alphabetic) => {
                    float_to_i128(f, value, target)
                }
                _ => Err(conversion(value, target)),
            },
        },
        other => other.as_i128().ok_or_else(|| conversion(value, target)),
    }
}

/// Coerces to an integer type `T`, reporting overflow against `target`.
pub fn to_integer<T: TryFrom<i128>>(value: &Value, target: LogicalType) -> CoreResult<T> {
    let wide = integer_of(value, target)?;
    T::try_from(wide).map_err(|_| CoreError::overflow(wide, target))
}

/// Coerces to `u128`. Separate because `u128` exceeds the `i128` pivot.
pub fn to_u128(value: &Value) -> CoreResult<u128> {
    match value {
        Value::UHugeInt(v) => Ok(*v),
        Value::Varchar(s) => match s.trim().parse::<u128>() {
            Ok(v) => Ok(v),
            Err(_) => to_integer(value, LogicalType::UHugeInt),
        },
        other => to_integer(other, LogicalType::UHugeInt),
    }
}

/// Coerces to `bool`.
pub fn to_bool(value: &Value) -> CoreResult<bool> {
    match value {
        Value::Boolean(b) => Ok(*b),
        Value::Float(v) => Ok(*v != 0.0),
        Value::Double(v) => Ok(*v != 0.0),
        Value::Decimal { value: v, .. } => Ok(*v != 0),
        Value::UHugeInt(v) => Ok(*v != 0),
        Value::Varchar(s) => parse_bool(s).ok_or_else(|| conversion(value, LogicalType::Boolean)),
        other => other
            .as_i128()
            .map(|v| v != 0)
            .ok_or_else(|| conversion(value, LogicalType::Boolean)),
    }
}

/// Coerces to `f64`.
pub fn to_f64(value: &Value) -> CoreResult<f64> {
    match value {
        Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Varchar(s) => {
            let t = s.trim().to_ascii_lowercase();
            match t.as_str() {
                "inf" | "infinity" | "+inf" | "+infinity" => Ok(f64::INFINITY),
                "-inf" | "-infinity" => Ok(f64::NEG_INFINITY),
                "nan" => Ok(f64::NAN),
                _ => t.parse::<f64>().map_err(|_| conversion(value, LogicalType::Double)),
            }
        }
        other => other
            .as_f64()
            .ok_or_else(|| conversion(value, LogicalType::Double)),
    }
}

/// Coerces to `f32`. Finite values beyond `f32` range overflow.
pub fn to_f32(value: &Value) -> CoreResult<f32> {
    if let Value::Float(v) = value {
        return Ok(*v);
    }
    let wide = to_f64(value).map_err(|_| conversion(value, LogicalType::Float))?;
    if wide.is_finite() && wide.abs() > f64::from(f32::MAX) {
        return Err(CoreError::overflow(value, LogicalType::Float));
    }
    Ok(wide as f32)
}

/// Coerces to a string with canonical formatting.
#[must_use]
pub fn to_string(value: &Value) -> String {
    value.to_string()
}

/// Coerces to bytes. Only `BLOB` and `VARCHAR` convert.
pub fn to_blob(value: &Value) -> CoreResult<Vec<u8>> {
    match value {
        Value::Blob(bytes) => Ok(bytes.clone()),
        Value::Varchar(s) => Ok(s.as_bytes().to_vec()),
        other => Err(conversion(other, LogicalType::Blob)),
    }
}

/// Coerces to an unscaled decimal of the given precision.
pub fn to_decimal(value: &Value, width: u8, scale: u8) -> CoreResult<i128> {
    let target = LogicalType::Decimal;
    let to_scale = u32::from(scale);
    let overflow = || CoreError::overflow(value, target);
    let unscaled = match value {
        Value::Decimal {
            value: v,
            scale: from,
            ..
        } => rescale(*v, u32::from(*from), to_scale).ok_or_else(overflow)?,
        Value::Float(_) | Value::Double(_) => {
            let f = to_f64(value)?;
            let factor = pow10(to_scale).ok_or_else(overflow)? as f64;
            float_to_i128(f * factor, value, target)?
        }
        Value::Varchar(s) => match parse_decimal_text(s) {
            Some((v, from)) => rescale(v, from, to_scale).ok_or_else(overflow)?,
            None => {
                let f = s
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| conversion(value, target))?;
                let factor = pow10(to_scale).ok_or_else(overflow)? as f64;
                float_to_i128(f * factor, value, target)?
            }
        },
        other => {
            let v = integer_of(other, target)?;
            rescale(v, 0, to_scale).ok_or_else(overflow)?
        }
    };
    let limit = pow10(u32::from(width)).ok_or_else(overflow)?;
    if unscaled.unsigned_abs() >= limit.unsigned_abs() {
        return Err(overflow());
    }
    Ok(unscaled)
}

fn to_date(value: &Value) -> CoreResult<i32> {
    match value {
        Value::Date(d) => Ok(*d),
        Value::Timestamp(ts) | Value::TimestampTz(ts) => temporal::timestamp_to_date(*ts)
            .ok_or_else(|| CoreError::overflow(value, LogicalType::Date)),
        Value::Varchar(s) => {
            temporal::parse_date(s).ok_or_else(|| conversion(value, LogicalType::Date))
        }
        other => Err(conversion(other, LogicalType::Date)),
    }
}

fn to_time(value: &Value) -> CoreResult<i64> {
    match value {
        Value::Time(t) => Ok(*t),
        Value::Timestamp(ts) | Value::TimestampTz(ts) => {
            Ok(ts.rem_euclid(temporal::MICROS_PER_DAY))
        }
        Value::Varchar(s) => {
            temporal::parse_time(s).ok_or_else(|| conversion(value, LogicalType::Time))
        }
        other => Err(conversion(other, LogicalType::Time)),
    }
}

fn to_timestamp(value: &Value, target: LogicalType) -> CoreResult<i64> {
    match value {
        Value::Timestamp(ts) | Value::TimestampTz(ts) => Ok(*ts),
        Value::Date(d) => {
            temporal::date_to_timestamp(*d).ok_or_else(|| CoreError::overflow(value, target))
        }
        Value::Varchar(s) => temporal::parse_timestamp(s).ok_or_else(|| conversion(value, target)),
        other => Err(conversion(other, target)),
    }
}

fn to_interval(value: &Value) -> CoreResult<Interval> {
    match value {
        Value::Interval(i) => Ok(*i),
        Value::Varchar(s) => {
            Interval::parse(s, None).ok_or_else(|| conversion(value, LogicalType::Interval))
        }
        other => Err(conversion(other, LogicalType::Interval)),
    }
}

fn to_uuid(value: &Value) -> CoreResult<Uuid> {
    match value {
        Value::Uuid(u) => Ok(*u),
        Value::Varchar(s) => {
            Uuid::parse_str(s.trim()).map_err(|_| conversion(value, LogicalType::Uuid))
        }
        other => Err(conversion(other, LogicalType::Uuid)),
    }
}

/// Casts a value to `target` with SQL `CAST` semantics.
///
/// `NULL` casts to `NULL` for every target.
pub fn cast_value(value: &Value, target: &DataType) -> CoreResult<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    if value.data_type() == *target {
        return Ok(value.clone());
    }
    let tag = target.logical_type();
    let cast = match target {
        DataType::Boolean => Value::Boolean(to_bool(value)?),
        DataType::TinyInt => Value::TinyInt(to_integer(value, tag)?),
        DataType::SmallInt => Value::SmallInt(to_integer(value, tag)?),
        DataType::Integer => Value::Integer(to_integer(value, tag)?),
        DataType::BigInt => Value::BigInt(to_integer(value, tag)?),
        DataType::HugeInt => Value::HugeInt(to_integer(value, tag)?),
        DataType::UTinyInt => Value::UTinyInt(to_integer(value, tag)?),
        DataType::USmallInt => Value::USmallInt(to_integer(value, tag)?),
        DataType::UInteger => Value::UInteger(to_integer(value, tag)?),
        DataType::UBigInt => Value::UBigInt(to_integer(value, tag)?),
        DataType::UHugeInt => Value::UHugeInt(to_u128(value)?),
        DataType::Float => Value::Float(to_f32(value)?),
        DataType::Double => Value::Double(to_f64(value)?),
        DataType::Decimal { width, scale } => Value::Decimal {
            value: to_decimal(value, *width, *scale)?,
            width: *width,
            scale: *scale,
        },
        DataType::Varchar => Value::Varchar(to_string(value)),
        DataType::Blob => Value::Blob(to_blob(value)?),
        DataType::Date => Value::Date(to_date(value)?),
        DataType::Time => Value::Time(to_time(value)?),
        DataType::Timestamp => Value::Timestamp(to_timestamp(value, tag)?),
        DataType::TimestampTz => Value::TimestampTz(to_timestamp(value, tag)?),
        DataType::Interval => Value::Interval(to_interval(value)?),
        DataType::Uuid => Value::Uuid(to_uuid(value)?),
        DataType::List(element) => match value {
            Value::List { values, .. } => Value::List {
                element: (**element).clone(),
                values: values
                    .iter()
                    .map(|v| cast_value(v, element))
                    .collect::<CoreResult<_>>()?,
            },
            other => return Err(conversion(other, tag)),
        },
        DataType::SqlNull => return Err(conversion(value, tag)),
    };
    Ok(cast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn widening_is_lossless() {
        assert_eq!(to_integer::<i64>(&Value::TinyInt(-5), LogicalType::BigInt).unwrap(), -5);
        assert_eq!(to_integer::<i32>(&Value::UInteger(7), LogicalType::Integer).unwrap(), 7);
    }

    #[test]
    fn narrowing_overflows() {
        let err = to_integer::<i8>(&Value::Integer(300), LogicalType::TinyInt).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
        let err = to_integer::<u8>(&Value::Integer(-1), LogicalType::UTinyInt).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
        assert_eq!(to_integer::<i8>(&Value::Integer(127), LogicalType::TinyInt).unwrap(), 127);
    }

    #[test]
    fn float_to_integer_rounds() {
        assert_eq!(to_integer::<i32>(&Value::Double(2.5), LogicalType::Integer).unwrap(), 3);
        assert_eq!(to_integer::<i32>(&Value::Double(-2.5), LogicalType::Integer).unwrap(), -3);
        let err = to_integer::<i32>(&Value::Double(f64::NAN), LogicalType::Integer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
    }

    #[test]
    fn string_to_number() {
        let v = Value::varchar(" 42 ");
        assert_eq!(to_integer::<i32>(&v, LogicalType::Integer).unwrap(), 42);
        let err = to_integer::<i32>(&Value::varchar("abc"), LogicalType::Integer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        let err = to_integer::<i8>(&Value::varchar("300"), LogicalType::TinyInt).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
        assert_eq!(to_f64(&Value::varchar("1.5")).unwrap(), 1.5);
        assert!(to_f64(&Value::varchar("x1")).is_err());
    }

    #[test]
    fn numeric_to_string() {
        assert_eq!(to_string(&Value::Integer(-7)), "-7");
        assert_eq!(to_string(&Value::Double(0.25)), "0.25");
    }

    #[test]
    fn booleans() {
        assert!(to_bool(&Value::varchar("TRUE")).unwrap());
        assert!(!to_bool(&Value::Integer(0)).unwrap());
        assert_eq!(to_bool(&Value::varchar("maybe")).unwrap_err().kind(), ErrorKind::Format);
        for text in [" true ", "T", "Yes", "1"] {
            assert!(to_bool(&Value::varchar(text)).unwrap(), "{text}");
        }
        for text in ["false", "f", "NO", "0"] {
            assert!(!to_bool(&Value::varchar(text)).unwrap(), "{text}");
        }
        for text in ["y", "n", ""] {
            let err = to_bool(&Value::varchar(text)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format, "{text}");
        }
        assert_eq!(to_integer::<i32>(&Value::Boolean(true), LogicalType::Integer).unwrap(), 1);
    }

    #[test]
    fn decimals() {
        assert_eq!(to_decimal(&Value::varchar("1.005"), 10, 2).unwrap(), 101);
        assert_eq!(to_decimal(&Value::Integer(12), 4, 2).unwrap(), 1200);
        let err = to_decimal(&Value::Integer(120), 4, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
        let dec = Value::Decimal {
            value: 1250,
            width: 6,
            scale: 3,
        };
        assert_eq!(to_integer::<i32>(&dec, LogicalType::Integer).unwrap(), 1);
        assert_eq!(div_round(-15, 10), -2);
    }

    #[test]
    fn blobs() {
        assert_eq!(to_blob(&Value::varchar("ab")).unwrap(), b"ab".to_vec());
        assert_eq!(to_blob(&Value::Integer(1)).unwrap_err().kind(), ErrorKind::Format);
    }

    #[test]
    fn sql_casts() {
        assert_eq!(
            cast_value(&Value::varchar("2024-01-01"), &DataType::Date).unwrap(),
            Value::Date(19_723)
        );
        assert_eq!(
            cast_value(&Value::Date(1), &DataType::Timestamp).unwrap(),
            Value::Timestamp(temporal::MICROS_PER_DAY)
        );
        assert_eq!(cast_value(&Value::Null, &DataType::Integer).unwrap(), Value::Null);
        let list = Value::List {
            element: DataType::Integer,
            values: vec![Value::Integer(1), Value::Null],
        };
        let cast = cast_value(&list, &DataType::List(Box::new(DataType::Varchar))).unwrap();
        assert_eq!(cast.to_string(), "['1', NULL]");
        assert!(cast_value(&Value::Date(0), &DataType::Integer).is_err());
    }

    #[test]
    fn uuid_cast() {
        let text = "6ba7b810-9dad-11d1-80b4-00c04fd430c8";
        let v = cast_value(&Value::varchar(text), &DataType::Uuid).unwrap();
        assert_eq!(v.to_string(), text);
    }
}
