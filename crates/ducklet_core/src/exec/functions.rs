//! Built-in scalar functions.

use super::evaluator::{compare_values, supertype, BoundExpr};
use crate::cast::{self, div_round, pow10};
use crate::error::{CoreError, CoreResult};
use crate::temporal;
use crate::types::DataType;
use crate::value::Value;
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use uuid::Uuid;

/// A resolved scalar function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarFunction {
    /// `lower(s)`
    Lower,
    /// `upper(s)`
    Upper,
    /// `length(s)`, characters or list elements.
    Length,
    /// `abs(x)`
    Abs,
    /// `round(x [, digits])`, half away from zero.
    Round,
    /// `concat(a, ...)`, skipping NULLs.
    Concat,
    /// `coalesce(a, ...)`
    Coalesce,
    /// `nullif(a, b)`
    NullIf,
    /// `gen_random_uuid()`
    GenRandomUuid,
    /// `sha256(s)` as lower-case hex.
    Sha256,
    /// `now()`
    Now,
    /// `current_date`
    CurrentDate,
}

/// Names of every function callable from SQL.
pub const FUNCTION_NAMES: &[&str] = &[
    "abs",
    "coalesce",
    "concat",
    "current_date",
    "current_timestamp",
    "gen_random_uuid",
    "length",
    "lower",
    "now",
    "nullif",
    "round",
    "sha256",
    "today",
    "typeof",
    "upper",
    "uuid",
];

fn lookup(name: &str) -> Option<ScalarFunction> {
    let function = match name {
        "lower" | "lcase" => ScalarFunction::Lower,
        "upper" | "ucase" => ScalarFunction::Upper,
        "length" | "len" => ScalarFunction::Length,
        "abs" => ScalarFunction::Abs,
        "round" => ScalarFunction::Round,
        "concat" => ScalarFunction::Concat,
        "coalesce" | "ifnull" => ScalarFunction::Coalesce,
        "nullif" => ScalarFunction::NullIf,
        "gen_random_uuid" | "uuid" => ScalarFunction::GenRandomUuid,
        "sha256" => ScalarFunction::Sha256,
        "now" | "current_timestamp" | "get_current_timestamp" => ScalarFunction::Now,
        "current_date" | "today" => ScalarFunction::CurrentDate,
        _ => return None,
    };
    Some(function)
}

fn arity_error(name: &str, args: &[BoundExpr]) -> CoreError {
    let types = args
        .iter()
        .map(|a| a.data_type().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    CoreError::query(format!(
        "Binder Error: No function matches the given name and argument types '{name}({types})'"
    ))
}

/// Resolves `name` and types its arguments.
pub fn bind_function(name: &str, args: Vec<BoundExpr>) -> CoreResult<BoundExpr> {
    if name == "typeof" {
        if args.len() != 1 {
            return Err(arity_error(name, &args));
        }
        return Ok(BoundExpr::constant(Value::Varchar(
            args[0].data_type().to_string(),
        )));
    }
    let function = lookup(name).ok_or_else(|| {
        CoreError::query(format!(
            "Catalog Error: Scalar Function with name {name} does not exist!"
        ))
    })?;

    let arity_ok = match function {
        ScalarFunction::Lower
        | ScalarFunction::Upper
        | ScalarFunction::Length
        | ScalarFunction::Abs
        | ScalarFunction::Sha256 => args.len() == 1,
        ScalarFunction::Round => matches!(args.len(), 1 | 2),
        ScalarFunction::Concat | ScalarFunction::Coalesce => !args.is_empty(),
        ScalarFunction::NullIf => args.len() == 2,
        ScalarFunction::GenRandomUuid | ScalarFunction::Now | ScalarFunction::CurrentDate => {
            args.is_empty()
        }
    };
    if !arity_ok {
        return Err(arity_error(name, &args));
    }

    let varchar_args = |args: Vec<BoundExpr>| -> Vec<BoundExpr> {
        args.into_iter()
            .map(|a| a.cast_to(&DataType::Varchar))
            .collect()
    };

    let (args, data_type) = match function {
        ScalarFunction::Lower | ScalarFunction::Upper => (varchar_args(args), DataType::Varchar),
        ScalarFunction::Concat => (varchar_args(args), DataType::Varchar),
        ScalarFunction::Length => match args[0].data_type() {
            DataType::List(_) => (args, DataType::BigInt),
            _ => (varchar_args(args), DataType::BigInt),
        },
        ScalarFunction::Abs => {
            let ty = args[0].data_type().clone();
            if !(ty.is_numeric() || ty == DataType::SqlNull) {
                return Err(arity_error(name, &args));
            }
            (args, ty)
        }
        ScalarFunction::Round => {
            let ty = match args[0].data_type() {
                DataType::Float => DataType::Double,
                other if other.is_numeric() || *other == DataType::SqlNull => other.clone(),
                _ => return Err(arity_error(name, &args)),
            };
            let mut args = args;
            args[0] = args[0].clone().cast_to(&ty);
            if let Some(digits) = args.get_mut(1) {
                *digits = digits.clone().cast_to(&DataType::Integer);
            }
            (args, ty)
        }
        ScalarFunction::Coalesce | ScalarFunction::NullIf => {
            let ty = supertype(args.iter().map(BoundExpr::data_type))?;
            let args = args.into_iter().map(|a| a.cast_to(&ty)).collect();
            (args, ty)
        }
        ScalarFunction::Sha256 => match args[0].data_type() {
            DataType::Blob => (args, DataType::Varchar),
            _ => (varchar_args(args), DataType::Varchar),
        },
        ScalarFunction::GenRandomUuid => (args, DataType::Uuid),
        ScalarFunction::Now => (args, DataType::TimestampTz),
        ScalarFunction::CurrentDate => (args, DataType::Date),
    };
    Ok(BoundExpr::function(function, args, data_type))
}

/// Lower-case hex encoding.
fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn round_unscaled(value: i128, drop_digits: u32) -> Option<i128> {
    if drop_digits == 0 {
        return Some(value);
    }
    match pow10(drop_digits) {
        Some(factor) => div_round(value, factor).checked_mul(factor),
        None => Some(0),
    }
}

fn round(value: &Value, digits: i32, target: &DataType) -> CoreResult<Value> {
    let overflow = || CoreError::overflow(value, target.logical_type());
    match value {
        Value::Double(v) => {
            let factor = 10f64.powi(digits);
            let rounded = (v * factor).round() / factor;
            Ok(Value::Double(if rounded.is_finite() { rounded } else { *v }))
        }
        Value::Decimal {
            value: v,
            width,
            scale,
        } => {
            let keep = i64::from(digits).max(0);
            let drop = (i64::from(*scale) - keep).max(0);
            let drop = u32::try_from(drop).map_err(|_| overflow())?;
            let rounded = if digits < 0 {
                let extra = digits.unsigned_abs();
                round_unscaled(*v, u32::from(*scale) + extra)
            } else {
                round_unscaled(*v, drop)
            }
            .ok_or_else(overflow)?;
            let limit = pow10(u32::from(*width)).ok_or_else(overflow)?;
            if rounded.unsigned_abs() >= limit.unsigned_abs() {
                return Err(overflow());
            }
            Ok(Value::Decimal {
                value: rounded,
                width: *width,
                scale: *scale,
            })
        }
        other if digits >= 0 => Ok(other.clone()),
        Value::UHugeInt(v) => {
            let v = i128::try_from(*v).map_err(|_| overflow())?;
            let rounded = round_unscaled(v, digits.unsigned_abs()).ok_or_else(overflow)?;
            cast::cast_value(&Value::HugeInt(rounded), target).map_err(|_| overflow())
        }
        other => {
            let v = other.as_i128().ok_or_else(overflow)?;
            let rounded = round_unscaled(v, digits.unsigned_abs()).ok_or_else(overflow)?;
            cast::cast_value(&Value::HugeInt(rounded), target).map_err(|_| overflow())
        }
    }
}

fn abs(value: &Value, target: &DataType) -> CoreResult<Value> {
    let result = match value {
        Value::Float(v) => Value::Float(v.abs()),
        Value::Double(v) => Value::Double(v.abs()),
        Value::Decimal {
            value: v,
            width,
            scale,
        } => Value::Decimal {
            value: v.abs(),
            width: *width,
            scale: *scale,
        },
        Value::UTinyInt(_)
        | Value::USmallInt(_)
        | Value::UInteger(_)
        | Value::UBigInt(_)
        | Value::UHugeInt(_) => value.clone(),
        other => {
            let overflow =
                || CoreError::overflow(format_args!("abs({other})"), target.logical_type());
            let v = other
                .as_i128()
                .and_then(i128::checked_abs)
                .ok_or_else(overflow)?;
            cast::cast_value(&Value::HugeInt(v), target).map_err(|_| overflow())?
        }
    };
    Ok(result)
}

impl ScalarFunction {
    /// Applies the function to evaluated arguments.
    pub fn call(self, args: &[Value], data_type: &DataType) -> CoreResult<Value> {
        match self {
            ScalarFunction::Concat => {
                let joined: String = args.iter().filter_map(Value::as_str).collect();
                return Ok(Value::Varchar(joined));
            }
            ScalarFunction::Coalesce => {
                return Ok(args
                    .iter()
                    .find(|v| !v.is_null())
                    .cloned()
                    .unwrap_or(Value::Null));
            }
            ScalarFunction::GenRandomUuid => return Ok(Value::Uuid(Uuid::new_v4())),
            ScalarFunction::Now => return Ok(Value::TimestampTz(temporal::now_utc())),
            ScalarFunction::CurrentDate => return Ok(Value::Date(temporal::today_utc())),
            _ => {}
        }

        let Some(first) = args.first() else {
            return Ok(Value::Null);
        };
        if first.is_null() {
            return Ok(Value::Null);
        }
        match self {
            ScalarFunction::Lower => Ok(Value::Varchar(
                first.as_str().unwrap_or_default().to_lowercase(),
            )),
            ScalarFunction::Upper => Ok(Value::Varchar(
                first.as_str().unwrap_or_default().to_uppercase(),
            )),
            ScalarFunction::Length => {
                let len = match first {
                    Value::List { values, .. } => values.len(),
                    other => other.as_str().unwrap_or_default().chars().count(),
                };
                Ok(Value::BigInt(i64::try_from(len).unwrap_or(i64::MAX)))
            }
            ScalarFunction::Abs => abs(first, data_type),
            ScalarFunction::Round => {
                let digits = match args.get(1) {
                    None => 0,
                    Some(Value::Integer(d)) => *d,
                    Some(_) => return Ok(Value::Null),
                };
                round(first, digits, data_type)
            }
            ScalarFunction::NullIf => match args.get(1) {
                Some(other)
                    if !other.is_null() && compare_values(first, other) == Ordering::Equal =>
                {
                    Ok(Value::Null)
                }
                _ => Ok(first.clone()),
            },
            ScalarFunction::Sha256 => {
                let digest = match first {
                    Value::Blob(bytes) => Sha256::digest(bytes),
                    other => Sha256::digest(other.as_str().unwrap_or_default().as_bytes()),
                };
                Ok(Value::Varchar(hex(&digest)))
            }
            ScalarFunction::Concat
            | ScalarFunction::Coalesce
            | ScalarFunction::GenRandomUuid
            | ScalarFunction::Now
            | ScalarFunction::CurrentDate => Ok(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::evaluator::{bind, Scope};
    use crate::sql::lexer::Lexer;
    use crate::sql::Parser;

    fn eval(sql: &str) -> CoreResult<Value> {
        let tokens = Lexer::new(sql).tokenize().unwrap();
        let expr = Parser::new(tokens).parse_expr().unwrap();
        bind(&expr, &Scope::empty())?.eval(&[])
    }

    fn text(sql: &str) -> String {
        eval(sql).unwrap().to_string()
    }

    #[test]
    fn string_functions() {
        assert_eq!(text("lower('HeLLo')"), "hello");
        assert_eq!(text("upper('straße')"), "STRASSE");
        assert_eq!(eval("length('héllo')").unwrap(), Value::BigInt(5));
        assert_eq!(eval("length([1, 2, 3])").unwrap(), Value::BigInt(3));
        assert_eq!(text("concat('a', NULL, 1, 'b')"), "a1b");
        assert_eq!(eval("lower(NULL)").unwrap(), Value::Null);
    }

    #[test]
    fn numeric_functions() {
        assert_eq!(eval("abs(-5)").unwrap(), Value::Integer(5));
        assert_eq!(text("abs(-1.25)"), "1.25");
        assert_eq!(eval("abs(-2147483648)").unwrap_err().kind(), crate::error::ErrorKind::Overflow);
        assert_eq!(text("round(2.456, 2)"), "2.460");
        assert_eq!(text("round(2.5)"), "3.0");
        assert_eq!(eval("round(1234, -2)").unwrap(), Value::Integer(1200));
        assert_eq!(eval("round(2.5e0)").unwrap(), Value::Double(3.0));
        assert_eq!(eval("round(-2.5e0)").unwrap(), Value::Double(-3.0));
    }

    #[test]
    fn null_handling_functions() {
        assert_eq!(eval("coalesce(NULL, 2, 3)").unwrap(), Value::Integer(2));
        assert_eq!(eval("coalesce(NULL, NULL)").unwrap(), Value::Null);
        assert_eq!(eval("nullif(1, 1)").unwrap(), Value::Null);
        assert_eq!(eval("nullif(1, 2)").unwrap(), Value::Integer(1));
        assert_eq!(text("typeof(1.5)"), "DECIMAL(2,1)");
        assert_eq!(text("typeof(NULL)"), "NULL");
    }

    #[test]
    fn generated_values() {
        assert_eq!(eval("gen_random_uuid()").unwrap().data_type(), DataType::Uuid);
        assert_ne!(eval("uuid()").unwrap(), eval("uuid()").unwrap());
        assert_eq!(eval("now()").unwrap().data_type(), DataType::TimestampTz);
        assert_eq!(eval("current_date").unwrap().data_type(), DataType::Date);
        assert_eq!(
            text("sha256('abc')"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn binding_errors() {
        let err = eval("no_such_fn(1)").unwrap_err();
        assert!(err.to_string().contains("no_such_fn"));
        assert!(eval("lower('a', 'b')").is_err());
        assert!(eval("abs('x')").is_err());
        assert!(eval("now(1)").is_err());
    }
}
