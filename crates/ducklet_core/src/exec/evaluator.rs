//! Expression binding and evaluation.
//!
//! Binding resolves column references against a [`Scope`], infers the
//! static type of every node and inserts casts, so evaluation only ever
//! sees operands of the type it expects.

use super::functions;
use crate::cast::{self, cast_value, pow10, rescale};
use crate::error::{CoreError, CoreResult};
use crate::sql::ast::{BinaryOp, Expr, Literal, UnaryOp};
use crate::temporal::{self, Interval, MICROS_PER_DAY};
use crate::types::{DataType, LogicalType, MAX_DECIMAL_WIDTH};
use crate::value::Value;
use std::cmp::Ordering;

/// A column visible to expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeColumn {
    /// Table name or alias that qualifies the column.
    pub qualifier: Option<String>,
    /// Column name.
    pub name: String,
    /// Column type.
    pub data_type: DataType,
}

/// Columns an expression may reference, in row order.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    columns: Vec<ScopeColumn>,
}

impl Scope {
    /// A scope with no columns (`SELECT` without `FROM`, `VALUES`).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A scope over the given columns.
    #[must_use]
    pub fn new(columns: Vec<ScopeColumn>) -> Self {
        Self { columns }
    }

    /// The visible columns.
    #[must_use]
    pub fn columns(&self) -> &[ScopeColumn] {
        &self.columns
    }

    fn qualifies(column: &ScopeColumn, table: &str) -> bool {
        column
            .qualifier
            .as_deref()
            .is_some_and(|q| q.eq_ignore_ascii_case(table))
    }

    /// Resolves a possibly qualified column name to its row position.
    pub fn resolve(&self, table: Option<&str>, name: &str) -> CoreResult<usize> {
        if let Some(table) = table {
            if !self.columns.iter().any(|c| Self::qualifies(c, table)) {
                return Err(CoreError::query(format!(
                    "Binder Error: Referenced table \"{table}\" not found!"
                )));
            }
        }
        self.columns
            .iter()
            .position(|c| {
                c.name.eq_ignore_ascii_case(name) && table.map_or(true, |t| Self::qualifies(c, t))
            })
            .ok_or_else(|| {
                CoreError::query(format!(
                    "Binder Error: Referenced column \"{name}\" not found in FROM clause!"
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
}

impl ArithOp {
    fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::IntDiv => "//",
            ArithOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone)]
enum BoundKind {
    Constant(Value),
    Column(usize),
    Cast(Box<BoundExpr>),
    Negate(Box<BoundExpr>),
    Not(Box<BoundExpr>),
    And(Box<BoundExpr>, Box<BoundExpr>),
    Or(Box<BoundExpr>, Box<BoundExpr>),
    Arithmetic {
        op: ArithOp,
        left: Box<BoundExpr>,
        right: Box<BoundExpr>,
    },
    Concat(Box<BoundExpr>, Box<BoundExpr>),
    Compare {
        op: BinaryOp,
        left: Box<BoundExpr>,
        right: Box<BoundExpr>,
    },
    IsNull {
        expr: Box<BoundExpr>,
        negated: bool,
    },
    InList {
        expr: Box<BoundExpr>,
        list: Vec<BoundExpr>,
        negated: bool,
    },
    Like {
        expr: Box<BoundExpr>,
        pattern: Box<BoundExpr>,
        negated: bool,
    },
    Case {
        branches: Vec<(BoundExpr, BoundExpr)>,
        else_result: Option<Box<BoundExpr>>,
    },
    Function {
        function: functions::ScalarFunction,
        args: Vec<BoundExpr>,
    },
    List(Vec<BoundExpr>),
}

/// A type-checked expression ready for evaluation.
#[derive(Debug, Clone)]
pub struct BoundExpr {
    kind: BoundKind,
    data_type: DataType,
}

impl BoundExpr {
    fn new(kind: BoundKind, data_type: DataType) -> Self {
        Self { kind, data_type }
    }

    /// A constant; its type is the value's type.
    #[must_use]
    pub fn constant(value: Value) -> Self {
        let data_type = value.data_type();
        Self::new(BoundKind::Constant(value), data_type)
    }

    /// A reference to row position `index`.
    #[must_use]
    pub fn column(index: usize, data_type: DataType) -> Self {
        Self::new(BoundKind::Column(index), data_type)
    }

    pub(crate) fn function(
        function: functions::ScalarFunction,
        args: Vec<BoundExpr>,
        data_type: DataType,
    ) -> Self {
        Self::new(BoundKind::Function { function, args }, data_type)
    }

    /// Static result type.
    #[must_use]
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Wraps the expression in a cast unless it already has `target` type.
    #[must_use]
    pub fn cast_to(self, target: &DataType) -> BoundExpr {
        if self.data_type == *target {
            return self;
        }
        BoundExpr::new(BoundKind::Cast(Box::new(self)), target.clone())
    }

    /// Evaluates a predicate; only `TRUE` passes, `NULL` and `FALSE` do not.
    pub fn is_true(&self, row: &[Value]) -> CoreResult<bool> {
        Ok(truth(&self.eval(row)?) == Some(true))
    }

    /// Evaluates the expression against one row.
    pub fn eval(&self, row: &[Value]) -> CoreResult<Value> {
        match &self.kind {
            BoundKind::Constant(value) => Ok(value.clone()),
            BoundKind::Column(index) => Ok(row.get(*index).cloned().unwrap_or(Value::Null)),
            BoundKind::Cast(expr) => cast_value(&expr.eval(row)?, &self.data_type),
            BoundKind::Negate(expr) => negate(&expr.eval(row)?, &self.data_type),
            BoundKind::Not(expr) => Ok(match truth(&expr.eval(row)?) {
                Some(b) => Value::Boolean(!b),
                None => Value::Null,
            }),
            BoundKind::And(left, right) => {
                let l = truth(&left.eval(row)?);
                if l == Some(false) {
                    return Ok(Value::Boolean(false));
                }
                Ok(match (l, truth(&right.eval(row)?)) {
                    (_, Some(false)) => Value::Boolean(false),
                    (Some(true), Some(true)) => Value::Boolean(true),
                    _ => Value::Null,
                })
            }
            BoundKind::Or(left, right) => {
                let l = truth(&left.eval(row)?);
                if l == Some(true) {
                    return Ok(Value::Boolean(true));
                }
                Ok(match (l, truth(&right.eval(row)?)) {
                    (_, Some(true)) => Value::Boolean(true),
                    (Some(false), Some(false)) => Value::Boolean(false),
                    _ => Value::Null,
                })
            }
            BoundKind::Arithmetic { op, left, right } => {
                let (l, r) = (left.eval(row)?, right.eval(row)?);
                if l.is_null() || r.is_null() {
                    return Ok(Value::Null);
                }
                arithmetic(*op, &l, &r, &self.data_type)
            }
            BoundKind::Concat(left, right) => {
                let (l, r) = (left.eval(row)?, right.eval(row)?);
                if l.is_null() || r.is_null() {
                    return Ok(Value::Null);
                }
                Ok(Value::Varchar(format!("{l}{r}")))
            }
            BoundKind::Compare { op, left, right } => {
                let (l, r) = (left.eval(row)?, right.eval(row)?);
                if l.is_null() || r.is_null() {
                    return Ok(Value::Null);
                }
                let ord = compare_values(&l, &r);
                let result = match op {
                    BinaryOp::Eq => ord == Ordering::Equal,
                    BinaryOp::NotEq => ord != Ordering::Equal,
                    BinaryOp::Lt => ord == Ordering::Less,
                    BinaryOp::LtEq => ord != Ordering::Greater,
                    BinaryOp::Gt => ord == Ordering::Greater,
                    _ => ord != Ordering::Less,
                };
                Ok(Value::Boolean(result))
            }
            BoundKind::IsNull { expr, negated } => {
                Ok(Value::Boolean(expr.eval(row)?.is_null() != *negated))
            }
            BoundKind::InList {
                expr,
                list,
                negated,
            } => {
                let needle = expr.eval(row)?;
                if needle.is_null() {
                    return Ok(Value::Null);
                }
                let mut saw_null = false;
                for item in list {
                    let candidate = item.eval(row)?;
                    if candidate.is_null() {
                        saw_null = true;
                    } else if compare_values(&needle, &candidate) == Ordering::Equal {
                        return Ok(Value::Boolean(!*negated));
                    }
                }
                Ok(if saw_null {
                    Value::Null
                } else {
                    Value::Boolean(*negated)
                })
            }
            BoundKind::Like {
                expr,
                pattern,
                negated,
            } => {
                let (text, pattern) = (expr.eval(row)?, pattern.eval(row)?);
                match (text.as_str(), pattern.as_str()) {
                    (Some(t), Some(p)) => Ok(Value::Boolean(like_match(t, p) != *negated)),
                    _ => Ok(Value::Null),
                }
            }
            BoundKind::Case {
                branches,
                else_result,
            } => {
                for (condition, result) in branches {
                    if condition.is_true(row)? {
                        return result.eval(row);
                    }
                }
                match else_result {
                    Some(result) => result.eval(row),
                    None => Ok(Value::Null),
                }
            }
            BoundKind::Function { function, args } => {
                let values = args
                    .iter()
                    .map(|arg| arg.eval(row))
                    .collect::<CoreResult<Vec<_>>>()?;
                function.call(&values, &self.data_type)
            }
            BoundKind::List(items) => {
                let element = match &self.data_type {
                    DataType::List(element) => (**element).clone(),
                    _ => DataType::SqlNull,
                };
                let values = items
                    .iter()
                    .map(|item| item.eval(row))
                    .collect::<CoreResult<Vec<_>>>()?;
                Ok(Value::List { element, values })
            }
        }
    }
}

fn truth(value: &Value) -> Option<bool> {
    match value {
        Value::Boolean(b) => Some(*b),
        _ => None,
    }
}

/// Binds an expression against `scope`.
pub fn bind(expr: &Expr, scope: &Scope) -> CoreResult<BoundExpr> {
    match expr {
        Expr::Literal(literal) => bind_literal(literal),
        Expr::Column { table, name } => {
            let index = scope.resolve(table.as_deref(), name)?;
            Ok(BoundExpr::column(index, scope.columns[index].data_type.clone()))
        }
        Expr::Unary { op, expr } => {
            let operand = bind(expr, scope)?;
            match op {
                UnaryOp::Plus => Ok(operand),
                UnaryOp::Not => Ok(BoundExpr::new(
                    BoundKind::Not(Box::new(as_predicate(operand))),
                    DataType::Boolean,
                )),
                UnaryOp::Minus => {
                    let ty = operand.data_type.clone();
                    if !(ty.is_numeric() || matches!(ty, DataType::Interval | DataType::SqlNull)) {
                        return Err(no_match("-", &[&ty]));
                    }
                    Ok(BoundExpr::new(BoundKind::Negate(Box::new(operand)), ty))
                }
            }
        }
        Expr::Binary { op, left, right } => {
            let (l, r) = (bind(left, scope)?, bind(right, scope)?);
            match op {
                BinaryOp::And => Ok(BoundExpr::new(
                    BoundKind::And(Box::new(as_predicate(l)), Box::new(as_predicate(r))),
                    DataType::Boolean,
                )),
                BinaryOp::Or => Ok(BoundExpr::new(
                    BoundKind::Or(Box::new(as_predicate(l)), Box::new(as_predicate(r))),
                    DataType::Boolean,
                )),
                BinaryOp::Concat => Ok(BoundExpr::new(
                    BoundKind::Concat(
                        Box::new(l.cast_to(&DataType::Varchar)),
                        Box::new(r.cast_to(&DataType::Varchar)),
                    ),
                    DataType::Varchar,
                )),
                BinaryOp::Plus => bind_arithmetic(ArithOp::Add, l, r),
                BinaryOp::Minus => bind_arithmetic(ArithOp::Sub, l, r),
                BinaryOp::Multiply => bind_arithmetic(ArithOp::Mul, l, r),
                BinaryOp::Divide => bind_arithmetic(ArithOp::Div, l, r),
                BinaryOp::IntegerDivide => bind_arithmetic(ArithOp::IntDiv, l, r),
                BinaryOp::Modulo => bind_arithmetic(ArithOp::Mod, l, r),
                comparison => bind_comparison(*comparison, l, r),
            }
        }
        Expr::IsNull { expr, negated } => Ok(BoundExpr::new(
            BoundKind::IsNull {
                expr: Box::new(bind(expr, scope)?),
                negated: *negated,
            },
            DataType::Boolean,
        )),
        Expr::Between {
            expr,
            negated,
            low,
            high,
        } => {
            let range = Expr::binary(
                BinaryOp::And,
                Expr::binary(BinaryOp::GtEq, (**expr).clone(), (**low).clone()),
                Expr::binary(BinaryOp::LtEq, (**expr).clone(), (**high).clone()),
            );
            let bound = bind(&range, scope)?;
            if *negated {
                Ok(BoundExpr::new(BoundKind::Not(Box::new(bound)), DataType::Boolean))
            } else {
                Ok(bound)
            }
        }
        Expr::InList {
            expr,
            list,
            negated,
        } => {
            let needle = bind(expr, scope)?;
            let items = list
                .iter()
                .map(|item| bind(item, scope))
                .collect::<CoreResult<Vec<_>>>()?;
            let mut ty = needle.data_type.clone();
            for item in &items {
                ty = comparison_type(&ty, &item.data_type)?;
            }
            Ok(BoundExpr::new(
                BoundKind::InList {
                    expr: Box::new(needle.cast_to(&ty)),
                    list: items.into_iter().map(|item| item.cast_to(&ty)).collect(),
                    negated: *negated,
                },
                DataType::Boolean,
            ))
        }
        Expr::Like {
            expr,
            pattern,
            negated,
        } => Ok(BoundExpr::new(
            BoundKind::Like {
                expr: Box::new(bind(expr, scope)?.cast_to(&DataType::Varchar)),
                pattern: Box::new(bind(pattern, scope)?.cast_to(&DataType::Varchar)),
                negated: *negated,
            },
            DataType::Boolean,
        )),
        Expr::Case {
            operand,
            branches,
            else_result,
        } => bind_case(operand.as_deref(), branches, else_result.as_deref(), scope),
        Expr::Cast { expr, data_type } => Ok(bind(expr, scope)?.cast_to(data_type)),
        Expr::Function { name, args } => {
            let args = args
                .iter()
                .map(|arg| bind(arg, scope))
                .collect::<CoreResult<Vec<_>>>()?;
            functions::bind_function(name, args)
        }
        Expr::List(items) => {
            let items = items
                .iter()
                .map(|item| bind(item, scope))
                .collect::<CoreResult<Vec<_>>>()?;
            let element = supertype(items.iter().map(BoundExpr::data_type))?;
            Ok(BoundExpr::new(
                BoundKind::List(items.into_iter().map(|item| item.cast_to(&element)).collect()),
                DataType::List(Box::new(element)),
            ))
        }
    }
}

/// Binds an expression used as a condition, coercing it to `BOOLEAN`.
pub fn bind_predicate(expr: &Expr, scope: &Scope) -> CoreResult<BoundExpr> {
    bind(expr, scope).map(as_predicate)
}

fn as_predicate(expr: BoundExpr) -> BoundExpr {
    match expr.data_type {
        DataType::Boolean | DataType::SqlNull => expr,
        _ => expr.cast_to(&DataType::Boolean),
    }
}

fn bind_literal(literal: &Literal) -> CoreResult<BoundExpr> {
    let value = match literal {
        Literal::Null => Value::Null,
        Literal::Boolean(b) => Value::Boolean(*b),
        Literal::Number(text) => number_literal(text)?,
        Literal::String(s) => Value::Varchar(s.clone()),
        Literal::Typed { data_type, text } => cast_value(&Value::Varchar(text.clone()), data_type)?,
        Literal::Interval { text, unit } => Value::Interval(
            Interval::parse(text, unit.as_deref()).ok_or_else(|| {
                CoreError::conversion(LogicalType::Varchar, LogicalType::Interval, text)
            })?,
        ),
    };
    Ok(BoundExpr::constant(value))
}

/// Types a numeric literal: INTEGER/BIGINT/HUGEINT for integers, DECIMAL
/// for a decimal point, DOUBLE for an exponent or out-of-range values.
pub fn number_literal(text: &str) -> CoreResult<Value> {
    let as_double = || {
        text.parse::<f64>()
            .map(Value::Double)
            .map_err(|_| CoreError::query(format!("Parser Error: invalid number \"{text}\"")))
    };
    if text.contains(['e', 'E']) {
        return as_double();
    }
    if let Some((int_part, frac_part)) = text.split_once('.') {
        let int_digits = int_part.trim_start_matches(['-', '+']).trim_start_matches('0').len();
        let scale = frac_part.len();
        let width = (int_digits + scale).max(1);
        if width > usize::from(MAX_DECIMAL_WIDTH) {
            return as_double();
        }
        let (width, scale) = (width as u8, scale as u8);
        let value = cast::to_decimal(&Value::varchar(text), width, scale)?;
        return Ok(Value::Decimal {
            value,
            width,
            scale,
        });
    }
    if let Ok(v) = text.parse::<i128>() {
        return Ok(Value::integer_literal(v));
    }
    match text.parse::<u128>() {
        Ok(v) => Ok(Value::UHugeInt(v)),
        Err(_) => as_double(),
    }
}

fn bind_case(
    operand: Option<&Expr>,
    branches: &[(Expr, Expr)],
    else_result: Option<&Expr>,
    scope: &Scope,
) -> CoreResult<BoundExpr> {
    let operand = operand.map(|o| bind(o, scope)).transpose()?;
    let mut conditions = Vec::with_capacity(branches.len());
    let mut results = Vec::with_capacity(branches.len());
    for (when, then) in branches {
        let condition = match &operand {
            Some(operand) => bind_comparison(BinaryOp::Eq, operand.clone(), bind(when, scope)?)?,
            None => bind_predicate(when, scope)?,
        };
        conditions.push(condition);
        results.push(bind(then, scope)?);
    }
    let else_result = else_result.map(|e| bind(e, scope)).transpose()?;

    let ty = supertype(
        results
            .iter()
            .chain(else_result.iter())
            .map(BoundExpr::data_type),
    )?;
    let branches = conditions
        .into_iter()
        .zip(results)
        .map(|(condition, result)| (condition, result.cast_to(&ty)))
        .collect();
    Ok(BoundExpr::new(
        BoundKind::Case {
            branches,
            else_result: else_result.map(|e| Box::new(e.cast_to(&ty))),
        },
        ty,
    ))
}

/// Folds [`common_type`] over `types`, starting from `SQLNULL`.
pub fn supertype<'a>(types: impl IntoIterator<Item = &'a DataType>) -> CoreResult<DataType> {
    let mut ty = DataType::SqlNull;
    for next in types {
        ty = common_type(&ty, next).ok_or_else(|| {
            CoreError::query(format!(
                "Binder Error: Cannot mix values of type {ty} and {next}"
            ))
        })?;
    }
    Ok(ty)
}

fn integer_digits(ty: &DataType) -> Option<u8> {
    let digits = match ty {
        DataType::TinyInt | DataType::UTinyInt => 3,
        DataType::SmallInt | DataType::USmallInt => 5,
        DataType::Integer | DataType::UInteger => 10,
        DataType::BigInt => 19,
        DataType::UBigInt => 20,
        DataType::HugeInt | DataType::UHugeInt => MAX_DECIMAL_WIDTH,
        _ => return None,
    };
    Some(digits)
}

/// Width and scale of a numeric type viewed as a decimal.
fn decimal_shape(ty: &DataType) -> Option<(u8, u8)> {
    match ty {
        DataType::Decimal { width, scale } => Some((*width, *scale)),
        other => integer_digits(other).map(|w| (w, 0)),
    }
}

fn integer_common(a: &DataType, b: &DataType) -> Option<DataType> {
    let (a_bits, a_signed) = a.integer_layout()?;
    let (b_bits, b_signed) = b.integer_layout()?;
    if a_signed == b_signed {
        return Some(DataType::integer_from_layout(a_bits.max(b_bits), a_signed));
    }
    let (signed_bits, unsigned_bits) = if a_signed {
        (a_bits, b_bits)
    } else {
        (b_bits, a_bits)
    };
    let bits = signed_bits.max(unsigned_bits * 2).min(128);
    Some(DataType::integer_from_layout(bits, true))
}

/// The narrowest type both `a` and `b` convert to without loss, if any.
#[must_use]
pub fn common_type(a: &DataType, b: &DataType) -> Option<DataType> {
    use DataType as T;
    if a == b {
        return Some(a.clone());
    }
    match (a, b) {
        (T::SqlNull, other) | (other, T::SqlNull) => Some(other.clone()),
        (T::Varchar, _) | (_, T::Varchar) => Some(T::Varchar),
        (T::List(x), T::List(y)) => common_type(x, y).map(|t| T::List(Box::new(t))),
        (T::Date, T::Timestamp) | (T::Timestamp, T::Date) => Some(T::Timestamp),
        (T::Date | T::Timestamp, T::TimestampTz) | (T::TimestampTz, T::Date | T::Timestamp) => {
            Some(T::TimestampTz)
        }
        _ if !(a.is_numeric() && b.is_numeric()) => None,
        _ if a.is_floating() || b.is_floating() => Some(T::Double),
        (T::Decimal { .. }, _) | (_, T::Decimal { .. }) => {
            let (aw, as_) = decimal_shape(a)?;
            let (bw, bs) = decimal_shape(b)?;
            let scale = as_.max(bs);
            let width = (aw - as_).max(bw - bs) + scale;
            if width > MAX_DECIMAL_WIDTH {
                Some(T::Double)
            } else {
                Some(T::Decimal { width, scale })
            }
        }
        _ => integer_common(a, b),
    }
}

fn comparison_type(a: &DataType, b: &DataType) -> CoreResult<DataType> {
    match (a, b) {
        // A string compared with a typed value is read as that type
        (DataType::Varchar, other) | (other, DataType::Varchar)
            if !matches!(other, DataType::Varchar | DataType::SqlNull) =>
        {
            Ok(other.clone())
        }
        _ => common_type(a, b).ok_or_else(|| {
            CoreError::query(format!(
                "Binder Error: Cannot compare values of type {a} and type {b}"
            ))
        }),
    }
}

fn bind_comparison(op: BinaryOp, left: BoundExpr, right: BoundExpr) -> CoreResult<BoundExpr> {
    let ty = comparison_type(&left.data_type, &right.data_type)?;
    Ok(BoundExpr::new(
        BoundKind::Compare {
            op,
            left: Box::new(left.cast_to(&ty)),
            right: Box::new(right.cast_to(&ty)),
        },
        DataType::Boolean,
    ))
}

fn no_match(symbol: &str, types: &[&DataType]) -> CoreError {
    let args = types
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    CoreError::query(format!(
        "Binder Error: No function matches the given name and argument types '{symbol}({args})'"
    ))
}

/// Result type plus the types each operand is cast to.
fn arithmetic_signature(
    op: ArithOp,
    left: &DataType,
    right: &DataType,
) -> Option<(DataType, DataType, DataType)> {
    use ArithOp::{Add, Div, Mul, Sub};
    use DataType as T;
    let triple = |r: &T, l: &T, rt: &T| Some((r.clone(), l.clone(), rt.clone()));
    match (op, left, right) {
        (Add | Sub, T::Date, t) if t.is_integer() => triple(&T::Date, &T::Date, &T::Integer),
        (Add, t, T::Date) if t.is_integer() => triple(&T::Date, &T::Integer, &T::Date),
        (Sub, T::Date, T::Date) => triple(&T::BigInt, &T::Date, &T::Date),
        (Add | Sub, T::Date | T::Timestamp, T::Interval) => {
            triple(&T::Timestamp, &T::Timestamp, &T::Interval)
        }
        (Add | Sub, T::TimestampTz, T::Interval) => {
            triple(&T::TimestampTz, &T::TimestampTz, &T::Interval)
        }
        (Add, T::Interval, T::Date | T::Timestamp) => {
            triple(&T::Timestamp, &T::Interval, &T::Timestamp)
        }
        (Add, T::Interval, T::TimestampTz) => {
            triple(&T::TimestampTz, &T::Interval, &T::TimestampTz)
        }
        (Sub, T::Timestamp, T::Timestamp) | (Sub, T::TimestampTz, T::TimestampTz) => {
            triple(&T::Interval, left, right)
        }
        (Add | Sub, T::Time, T::Interval) => triple(&T::Time, &T::Time, &T::Interval),
        (Add, T::Interval, T::Time) => triple(&T::Time, &T::Interval, &T::Time),
        (Add | Sub, T::Interval, T::Interval) => {
            triple(&T::Interval, &T::Interval, &T::Interval)
        }
        (_, l, r) if l.is_numeric() && r.is_numeric() => {
            if op == Div || l.is_floating() || r.is_floating() {
                return triple(&T::Double, &T::Double, &T::Double);
            }
            if l.is_integer() && r.is_integer() {
                let common = integer_common(l, r)?;
                return triple(&common, &common, &common);
            }
            let (lw, ls) = decimal_shape(l)?;
            let (rw, rs) = decimal_shape(r)?;
            let (lt, rt) = (
                T::Decimal {
                    width: lw,
                    scale: ls,
                },
                T::Decimal {
                    width: rw,
                    scale: rs,
                },
            );
            match op {
                Add | Sub => {
                    let scale = ls.max(rs);
                    let width = ((lw - ls).max(rw - rs) + 1 + scale).min(MAX_DECIMAL_WIDTH);
                    Some((T::Decimal { width, scale }, lt, rt))
                }
                Mul if ls + rs <= MAX_DECIMAL_WIDTH => {
                    let width = (lw + rw).min(MAX_DECIMAL_WIDTH);
                    Some((
                        T::Decimal {
                            width,
                            scale: ls + rs,
                        },
                        lt,
                        rt,
                    ))
                }
                _ => triple(&T::Double, &T::Double, &T::Double),
            }
        }
        _ => None,
    }
}

fn bind_arithmetic(op: ArithOp, left: BoundExpr, right: BoundExpr) -> CoreResult<BoundExpr> {
    let (lt, rt) = (left.data_type.clone(), right.data_type.clone());
    let (result, left_ty, right_ty) = match (&lt, &rt) {
        (DataType::SqlNull, DataType::SqlNull) => {
            (DataType::SqlNull, DataType::SqlNull, DataType::SqlNull)
        }
        (DataType::SqlNull, other) | (other, DataType::SqlNull) => {
            arithmetic_signature(op, other, other)
                .ok_or_else(|| no_match(op.symbol(), &[&lt, &rt]))?
        }
        (l, r) => {
            arithmetic_signature(op, l, r).ok_or_else(|| no_match(op.symbol(), &[&lt, &rt]))?
        }
    };
    Ok(BoundExpr::new(
        BoundKind::Arithmetic {
            op,
            left: Box::new(left.cast_to(&left_ty)),
            right: Box::new(right.cast_to(&right_ty)),
        },
        result,
    ))
}

fn overflow_in(op: ArithOp, l: &Value, r: &Value, target: &DataType) -> CoreError {
    CoreError::overflow(
        format_args!("{l} {} {r}", op.symbol()),
        target.logical_type(),
    )
}

fn arithmetic(op: ArithOp, l: &Value, r: &Value, target: &DataType) -> CoreResult<Value> {
    let overflow = || overflow_in(op, l, r, target);
    match (l, r) {
        (Value::Date(d), Value::Integer(n)) | (Value::Integer(n), Value::Date(d)) => {
            let days = if op == ArithOp::Sub {
                d.checked_sub(*n)
            } else {
                d.checked_add(*n)
            };
            return days.map(Value::Date).ok_or_else(overflow);
        }
        (Value::Date(a), Value::Date(b)) => {
            return Ok(Value::BigInt(i64::from(*a) - i64::from(*b)));
        }
        (Value::Timestamp(ts), Value::Interval(i)) | (Value::Interval(i), Value::Timestamp(ts)) => {
            let i = if op == ArithOp::Sub {
                i.checked_neg().ok_or_else(overflow)?
            } else {
                *i
            };
            return temporal::add_interval(*ts, i)
                .map(Value::Timestamp)
                .ok_or_else(overflow);
        }
        (Value::TimestampTz(ts), Value::Interval(i))
        | (Value::Interval(i), Value::TimestampTz(ts)) => {
            let i = if op == ArithOp::Sub {
                i.checked_neg().ok_or_else(overflow)?
            } else {
                *i
            };
            return temporal::add_interval(*ts, i)
                .map(Value::TimestampTz)
                .ok_or_else(overflow);
        }
        (Value::Timestamp(a), Value::Timestamp(b))
        | (Value::TimestampTz(a), Value::TimestampTz(b)) => {
            let diff = a.checked_sub(*b).ok_or_else(overflow)?;
            let days = i32::try_from(diff / MICROS_PER_DAY).map_err(|_| overflow())?;
            return Ok(Value::Interval(Interval::new(0, days, diff % MICROS_PER_DAY)));
        }
        (Value::Time(t), Value::Interval(i)) | (Value::Interval(i), Value::Time(t)) => {
            let delta = if op == ArithOp::Sub {
                i.micros.checked_neg().ok_or_else(overflow)?
            } else {
                i.micros
            };
            let shifted = t.checked_add(delta).ok_or_else(overflow)?;
            return Ok(Value::Time(shifted.rem_euclid(MICROS_PER_DAY)));
        }
        (Value::Interval(a), Value::Interval(b)) => {
            let b = if op == ArithOp::Sub {
                b.checked_neg().ok_or_else(overflow)?
            } else {
                *b
            };
            return a.checked_add(b).map(Value::Interval).ok_or_else(overflow);
        }
        _ => {}
    }

    match target {
        DataType::Double | DataType::Float => {
            let (a, b) = (cast::to_f64(l)?, cast::to_f64(r)?);
            let zero_divisor =
                b == 0.0 && matches!(op, ArithOp::Div | ArithOp::IntDiv | ArithOp::Mod);
            if zero_divisor {
                return Ok(Value::Null);
            }
            let v = match op {
                ArithOp::Add => a + b,
                ArithOp::Sub => a - b,
                ArithOp::Mul => a * b,
                ArithOp::Div => a / b,
                ArithOp::IntDiv => (a / b).trunc(),
                ArithOp::Mod => a % b,
            };
            Ok(Value::Double(v))
        }
        DataType::Decimal { width, scale } => {
            let parts = |v: &Value| match v {
                Value::Decimal { value, scale, .. } => Some((*value, u32::from(*scale))),
                other => other.as_i128().map(|x| (x, 0)),
            };
            let ((a, a_scale), (b, b_scale)) = parts(l).zip(parts(r)).ok_or_else(overflow)?;
            let to = u32::from(*scale);
            let v = match op {
                ArithOp::Add | ArithOp::Sub => {
                    let a = rescale(a, a_scale, to).ok_or_else(overflow)?;
                    let b = rescale(b, b_scale, to).ok_or_else(overflow)?;
                    if op == ArithOp::Add {
                        a.checked_add(b)
                    } else {
                        a.checked_sub(b)
                    }
                }
                _ => a.checked_mul(b),
            }
            .ok_or_else(overflow)?;
            let limit = pow10(u32::from(*width)).ok_or_else(overflow)?;
            if v.unsigned_abs() >= limit.unsigned_abs() {
                return Err(overflow());
            }
            Ok(Value::Decimal {
                value: v,
                width: *width,
                scale: *scale,
            })
        }
        DataType::UHugeInt => {
            let (a, b) = (cast::to_u128(l)?, cast::to_u128(r)?);
            if b == 0 && matches!(op, ArithOp::IntDiv | ArithOp::Mod) {
                return Ok(Value::Null);
            }
            let v = match op {
                ArithOp::Add => a.checked_add(b),
                ArithOp::Sub => a.checked_sub(b),
                ArithOp::Mul => a.checked_mul(b),
                ArithOp::Mod => a.checked_rem(b),
                ArithOp::Div | ArithOp::IntDiv => a.checked_div(b),
            };
            v.map(Value::UHugeInt).ok_or_else(overflow)
        }
        _ => {
            let (a, b) = l.as_i128().zip(r.as_i128()).ok_or_else(overflow)?;
            if b == 0 && matches!(op, ArithOp::IntDiv | ArithOp::Mod) {
                return Ok(Value::Null);
            }
            let v = match op {
                ArithOp::Add => a.checked_add(b),
                ArithOp::Sub => a.checked_sub(b),
                ArithOp::Mul => a.checked_mul(b),
                ArithOp::Mod => a.checked_rem(b),
                ArithOp::Div | ArithOp::IntDiv => a.checked_div(b),
            }
            .ok_or_else(overflow)?;
            cast_value(&Value::HugeInt(v), target).map_err(|_| overflow())
        }
    }
}

fn negate(value: &Value, target: &DataType) -> CoreResult<Value> {
    let negated = match value {
        Value::Null => Value::Null,
        Value::Float(v) => Value::Float(-v),
        Value::Double(v) => Value::Double(-v),
        Value::Decimal {
            value: v,
            width,
            scale,
        } => Value::Decimal {
            value: -v,
            width: *width,
            scale: *scale,
        },
        Value::Interval(i) => i.checked_neg().map(Value::Interval).ok_or_else(|| {
            CoreError::overflow(format_args!("-({i})"), target.logical_type())
        })?,
        other => {
            let overflow = || CoreError::overflow(format_args!("-{other}"), target.logical_type());
            let v = other.as_i128().and_then(i128::checked_neg).ok_or_else(overflow)?;
            cast_value(&Value::HugeInt(v), target).map_err(|_| overflow())?
        }
    };
    Ok(negated)
}

fn compare_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn interval_key(i: &Interval) -> i128 {
    (i128::from(i.months) * 30 + i128::from(i.days)) * i128::from(MICROS_PER_DAY)
        + i128::from(i.micros)
}

/// Total order over values of one type. NULL sorts after everything and
/// NaN after every other float.
#[must_use]
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        (Value::UHugeInt(x), Value::UHugeInt(y)) => x.cmp(y),
        (Value::Float(_) | Value::Double(_), _) | (_, Value::Float(_) | Value::Double(_)) => {
            match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => compare_f64(x, y),
                _ => a.to_string().cmp(&b.to_string()),
            }
        }
        (
            Value::Decimal {
                value: x, scale: xs, ..
            },
            Value::Decimal {
                value: y, scale: ys, ..
            },
        ) => {
            let to = u32::from(*xs.max(ys));
            match (
                rescale(*x, u32::from(*xs), to),
                rescale(*y, u32::from(*ys), to),
            ) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => compare_f64(a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0)),
            }
        }
        (Value::Varchar(x), Value::Varchar(y)) => x.cmp(y),
        (Value::Blob(x), Value::Blob(y)) => x.cmp(y),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),
        (Value::Time(x), Value::Time(y))
        | (Value::Timestamp(x), Value::Timestamp(y))
        | (Value::TimestampTz(x), Value::TimestampTz(y)) => x.cmp(y),
        (Value::Interval(x), Value::Interval(y)) => interval_key(x).cmp(&interval_key(y)),
        (Value::Uuid(x), Value::Uuid(y)) => x.cmp(y),
        (Value::List { values: x, .. }, Value::List { values: y, .. }) => x
            .iter()
            .zip(y)
            .map(|(x, y)| compare_values(x, y))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => match (a.as_i128(), b.as_i128()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => a.to_string().cmp(&b.to_string()),
        },
    }
}

/// SQL `LIKE` matching: `%` matches any run, `_` any single character.
#[must_use]
pub fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '_' || (pattern[p] != '%' && pattern[p] == text[t]))
        {
            t += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            t = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|c| *c == '%')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::sql::lexer::Lexer;
    use crate::sql::Parser;

    fn scope() -> Scope {
        Scope::new(vec![
            ScopeColumn {
                qualifier: Some("t".into()),
                name: "a".into(),
                data_type: DataType::Integer,
            },
            ScopeColumn {
                qualifier: Some("t".into()),
                name: "s".into(),
                data_type: DataType::Varchar,
            },
        ])
    }

    fn expr(sql: &str) -> Expr {
        let tokens = Lexer::new(sql).tokenize().unwrap();
        Parser::new(tokens).parse_expr().unwrap()
    }

    fn eval_with(sql: &str, row: &[Value]) -> CoreResult<Value> {
        bind(&expr(sql), &scope())?.eval(row)
    }

    fn eval(sql: &str) -> Value {
        eval_with(sql, &[Value::Integer(7), Value::varchar("hello")]).unwrap()
    }

    fn type_of(sql: &str) -> DataType {
        bind(&expr(sql), &scope()).unwrap().data_type().clone()
    }

    #[test]
    fn literal_types() {
        assert_eq!(type_of("1"), DataType::Integer);
        assert_eq!(type_of("3000000000"), DataType::BigInt);
        assert_eq!(type_of("170141183460469231731687303715884105727"), DataType::HugeInt);
        assert_eq!(type_of("-2147483648"), DataType::Integer);
        assert_eq!(type_of("340282366920938463463374607431768211455"), DataType::UHugeInt);
        assert_eq!(type_of("340282366920938463463374607431768211456"), DataType::Double);
        assert_eq!(type_of("1.50"), DataType::Decimal { width: 3, scale: 2 });
        assert_eq!(type_of("0.5"), DataType::Decimal { width: 1, scale: 1 });
        assert_eq!(type_of("1e3"), DataType::Double);
        assert_eq!(type_of("'x'"), DataType::Varchar);
        assert_eq!(type_of("NULL"), DataType::SqlNull);
        assert_eq!(type_of("DATE '2024-02-29'"), DataType::Date);
        assert_eq!(type_of("INTERVAL '2' HOUR"), DataType::Interval);
    }

    #[test]
    fn unsigned_hugeint_literal_casts_exactly() {
        let max = "340282366920938463463374607431768211455";
        let value = eval(&format!("CAST({max} AS UHUGEINT)"));
        assert_eq!(value, Value::UHugeInt(u128::MAX));
        assert_eq!(value.to_string(), max);
        let err = eval_with(&format!("CAST({max} AS HUGEINT)"), &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
    }

    #[test]
    fn integer_arithmetic() {
        assert_eq!(eval("a + 1"), Value::Integer(8));
        assert_eq!(eval("a * 2 - 4"), Value::Integer(10));
        assert_eq!(eval("a // 2"), Value::Integer(3));
        assert_eq!(eval("-a % 4"), Value::Integer(-3));
        assert_eq!(eval("a / 2"), Value::Double(3.5));
        assert_eq!(eval("a / 0"), Value::Null);
        assert_eq!(eval("a // 0"), Value::Null);
        assert_eq!(eval("a + NULL"), Value::Null);
        assert_eq!(type_of("a + 3000000000"), DataType::BigInt);
    }

    #[test]
    fn integer_overflow_is_an_error() {
        let err = eval_with("2147483647 + a", &[Value::Integer(1), Value::Null]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
        let err = eval_with("-(-2147483648)", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
    }

    #[test]
    fn decimal_and_float_arithmetic() {
        assert_eq!(eval("1.5 + 1").to_string(), "2.5");
        assert_eq!(eval("1.25 * 2.0").to_string(), "2.500");
        assert_eq!(eval("0.1 + 0.2").to_string(), "0.3");
        assert_eq!(type_of("1.5 + 1e0"), DataType::Double);
        assert_eq!(eval("1.5 * 2e0"), Value::Double(3.0));
    }

    #[test]
    fn three_valued_logic() {
        assert_eq!(eval("NULL AND FALSE"), Value::Boolean(false));
        assert_eq!(eval("NULL AND TRUE"), Value::Null);
        assert_eq!(eval("NULL OR TRUE"), Value::Boolean(true));
        assert_eq!(eval("NULL OR FALSE"), Value::Null);
        assert_eq!(eval("NOT NULL"), Value::Null);
        assert_eq!(eval("NOT (a > 1)"), Value::Boolean(false));
    }

    #[test]
    fn comparisons_and_predicates() {
        assert_eq!(eval("a = 7"), Value::Boolean(true));
        assert_eq!(eval("a <> 7.0"), Value::Boolean(false));
        assert_eq!(eval("a = '7'"), Value::Boolean(true));
        assert_eq!(eval("a BETWEEN 1 AND 7"), Value::Boolean(true));
        assert_eq!(eval("a NOT BETWEEN 1 AND 7"), Value::Boolean(false));
        assert_eq!(eval("a IN (1, 7)"), Value::Boolean(true));
        assert_eq!(eval("a IN (1, NULL)"), Value::Null);
        assert_eq!(eval("a NOT IN (1, 2)"), Value::Boolean(true));
        assert_eq!(eval("s LIKE 'h%o'"), Value::Boolean(true));
        assert_eq!(eval("s LIKE 'h_llo'"), Value::Boolean(true));
        assert_eq!(eval("s NOT LIKE '%x%'"), Value::Boolean(true));
        assert_eq!(eval("NULL IS NULL"), Value::Boolean(true));
        assert_eq!(eval("s IS NOT NULL"), Value::Boolean(true));
        assert_eq!(eval("NULL = NULL"), Value::Null);
    }

    #[test]
    fn case_uses_common_type() {
        assert_eq!(
            type_of("CASE WHEN a > 1 THEN 1 ELSE 2.5 END"),
            DataType::Decimal { width: 11, scale: 1 }
        );
        assert_eq!(eval("CASE a WHEN 7 THEN 'seven' ELSE 'other' END"), Value::varchar("seven"));
        assert_eq!(eval("CASE WHEN a < 0 THEN 1 END"), Value::Null);
        assert!(bind(&expr("CASE WHEN a THEN TRUE ELSE DATE '2020-01-01' END"), &scope()).is_err());
    }

    #[test]
    fn casts_keep_their_error_kind() {
        assert_eq!(eval("CAST('42' AS INTEGER) + 1"), Value::Integer(43));
        assert_eq!(eval("'42'::BIGINT"), Value::BigInt(42));
        let err = eval_with("CAST(s AS INTEGER)", &[Value::Null, Value::varchar("x")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        let err = eval_with("CAST(300 AS TINYINT)", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
    }

    #[test]
    fn temporal_arithmetic() {
        assert_eq!(eval("DATE '2024-01-31' + 1").to_string(), "2024-02-01");
        assert_eq!(eval("DATE '2024-03-01' - DATE '2024-02-01'"), Value::BigInt(29));
        assert_eq!(
            eval("DATE '2024-01-31' + INTERVAL '1 month'").to_string(),
            "2024-02-29 00:00:00"
        );
        assert_eq!(
            eval("TIMESTAMP '2024-01-02 03:00:00' - TIMESTAMP '2024-01-01 00:00:00'").to_string(),
            "1 day 03:00:00"
        );
    }

    #[test]
    fn interval_overflow_is_an_error() {
        for sql in [
            "TIME '01:00:00' + INTERVAL '9223372036854775807 microseconds'",
            "TIME '01:00:00' - INTERVAL '-9223372036854775808 microseconds'",
            "-INTERVAL '-9223372036854775808 microseconds'",
            "INTERVAL '1 day' - INTERVAL '-9223372036854775808 microseconds'",
            "TIMESTAMP '2024-01-01 00:00:00' - INTERVAL '-9223372036854775808 microseconds'",
        ] {
            let err = eval_with(sql, &[]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Overflow, "{sql}");
        }
        assert_eq!(
            eval("TIME '23:30:00' + INTERVAL '1 hour'").to_string(),
            "00:30:00"
        );
        assert_eq!(eval("-INTERVAL '2 days'").to_string(), "-2 days");
    }

    #[test]
    fn concat_and_lists() {
        assert_eq!(eval("s || ' ' || a"), Value::varchar("hello 7"));
        assert_eq!(eval("s || NULL"), Value::Null);
        assert_eq!(type_of("[1, 2.5]").to_string(), "DECIMAL(11,1)[]");
        assert_eq!(eval("[a, NULL]").to_string(), "[7, NULL]");
    }

    #[test]
    fn binder_errors() {
        let err = bind(&expr("missing + 1"), &scope()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Query);
        assert!(err.to_string().contains("missing"));
        assert!(bind(&expr("u.a"), &scope()).is_err());
        assert!(bind(&expr("t.a"), &scope()).is_ok());
        assert!(bind(&expr("s - 1"), &scope()).is_err());
        assert!(bind(&expr("TRUE = 1"), &scope()).is_err());
    }

    #[test]
    fn common_types() {
        assert_eq!(
            common_type(&DataType::Integer, &DataType::UInteger),
            Some(DataType::BigInt)
        );
        assert_eq!(
            common_type(&DataType::TinyInt, &DataType::BigInt),
            Some(DataType::BigInt)
        );
        assert_eq!(
            common_type(&DataType::Date, &DataType::Timestamp),
            Some(DataType::Timestamp)
        );
        assert_eq!(common_type(&DataType::Boolean, &DataType::Integer), None);
        assert_eq!(
            common_type(&DataType::SqlNull, &DataType::Blob),
            Some(DataType::Blob)
        );
    }

    #[test]
    fn ordering() {
        assert_eq!(
            compare_values(&Value::Double(f64::NAN), &Value::Double(1.0)),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(&Value::Null, &Value::Integer(1)),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(&Value::varchar("a"), &Value::varchar("b")),
            Ordering::Less
        );
        let d = |value, scale| Value::Decimal {
            value,
            width: 10,
            scale,
        };
        assert_eq!(compare_values(&d(150, 2), &d(15, 1)), Ordering::Equal);
    }

    #[test]
    fn like_patterns() {
        assert!(like_match("", "%"));
        assert!(like_match("abc", "abc"));
        assert!(like_match("abc", "a%"));
        assert!(like_match("abc", "%c"));
        assert!(like_match("abcbc", "%b_"));
        assert!(!like_match("abc", "a_"));
        assert!(!like_match("abc", "b%"));
        assert!(like_match("a%c", "a%%c"));
    }
}
