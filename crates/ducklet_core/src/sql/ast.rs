//! Abstract syntax tree.
//!
//! `Display` renders expressions back to SQL. Unaliased result columns are
//! named with that rendering, so binary operations are parenthesized
//! (`SELECT 1 + 2` yields a column named `(1 + 2)`).

use crate::types::DataType;
use std::fmt;

/// A parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `SELECT ...` or `VALUES ...`.
    Query(Box<Query>),
    /// `CREATE TABLE`.
    CreateTable(CreateTable),
    /// `INSERT INTO`.
    Insert(Insert),
    /// `DROP TABLE`.
    DropTable {
        /// Table name.
        name: String,
        /// `IF EXISTS` was given.
        if_exists: bool,
    },
    /// `DELETE FROM`.
    Delete {
        /// Target table.
        table: String,
        /// Optional `WHERE` predicate.
        selection: Option<Expr>,
    },
    /// `UPDATE ... SET`.
    Update {
        /// Target table.
        table: String,
        /// `column = expr` pairs.
        assignments: Vec<(String, Expr)>,
        /// Optional `WHERE` predicate.
        selection: Option<Expr>,
    },
}

impl Statement {
    /// Returns true for statements that change the catalog or table data.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Statement::Query(_))
    }
}

/// A row-producing query.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// `SELECT`.
    Select(Select),
    /// `VALUES (..), (..)`.
    Values(Vec<Vec<Expr>>),
}

/// A `SELECT` statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    /// `SELECT DISTINCT`.
    pub distinct: bool,
    /// Projection list.
    pub projection: Vec<SelectItem>,
    /// Source table, if any.
    pub from: Option<TableRef>,
    /// `WHERE` predicate.
    pub selection: Option<Expr>,
    /// `ORDER BY` terms.
    pub order_by: Vec<OrderByExpr>,
    /// `LIMIT` expression.
    pub limit: Option<Expr>,
    /// `OFFSET` expression.
    pub offset: Option<Expr>,
}

/// One projection item.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// `*`
    Wildcard,
    /// `t.*`
    QualifiedWildcard(String),
    /// `expr [AS alias]`
    Expr {
        /// The expression.
        expr: Expr,
        /// Output name override.
        alias: Option<String>,
    },
}

/// A table in `FROM`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    /// Table name.
    pub name: String,
    /// Optional alias.
    pub alias: Option<String>,
}

/// An `ORDER BY` term.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    /// Sort key.
    pub expr: Expr,
    /// `Some(true)` for ASC, `Some(false)` for DESC, `None` for the default.
    pub asc: Option<bool>,
    /// `Some(true)` for NULLS FIRST, `Some(false)` for NULLS LAST.
    pub nulls_first: Option<bool>,
}

/// `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    /// Table name.
    pub name: String,
    /// `IF NOT EXISTS` was given.
    pub if_not_exists: bool,
    /// Column definitions.
    pub columns: Vec<ColumnDef>,
}

/// A column in `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Declared type.
    pub data_type: DataType,
    /// `NOT NULL` constraint.
    pub not_null: bool,
}

/// `INSERT INTO`.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    /// Target table.
    pub table: String,
    /// Explicit column list; empty means all columns in order.
    pub columns: Vec<String>,
    /// Row source.
    pub source: Box<Query>,
}

/// Literal values as written.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `NULL`
    Null,
    /// `TRUE` / `FALSE`
    Boolean(bool),
    /// Numeric text; typed during evaluation.
    Number(String),
    /// `'text'`
    String(String),
    /// `DATE '..'`, `TIME '..'`, `TIMESTAMP '..'` and similar.
    Typed {
        /// Target type.
        data_type: DataType,
        /// Literal text.
        text: String,
    },
    /// `INTERVAL '..' [unit]`
    Interval {
        /// Quantity text.
        text: String,
        /// Unit when given separately.
        unit: Option<String>,
    },
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `NOT`
    Not,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `//`
    IntegerDivide,
    /// `%`
    Modulo,
    /// `||`
    Concat,
    /// `=`
    Eq,
    /// `<>`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `AND`
    And,
    /// `OR`
    Or,
}

impl BinaryOp {
    fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::IntegerDivide => "//",
            BinaryOp::Modulo => "%",
            BinaryOp::Concat => "||",
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        }
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value.
    Literal(Literal),
    /// Column reference, optionally qualified.
    Column {
        /// Table or alias qualifier.
        table: Option<String>,
        /// Column name.
        name: String,
    },
    /// Unary operation.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        expr: Box<Expr>,
    },
    /// Binary operation.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// `IS [NOT] NULL`
    IsNull {
        /// Operand.
        expr: Box<Expr>,
        /// `IS NOT NULL`.
        negated: bool,
    },
    /// `[NOT] BETWEEN low AND high`
    Between {
        /// Operand.
        expr: Box<Expr>,
        /// `NOT BETWEEN`.
        negated: bool,
        /// Lower bound.
        low: Box<Expr>,
        /// Upper bound.
        high: Box<Expr>,
    },
    /// `[NOT] IN (list)`
    InList {
        /// Operand.
        expr: Box<Expr>,
        /// Candidates.
        list: Vec<Expr>,
        /// `NOT IN`.
        negated: bool,
    },
    /// `[NOT] LIKE pattern`
    Like {
        /// Operand.
        expr: Box<Expr>,
        /// Pattern with `%` and `_`.
        pattern: Box<Expr>,
        /// `NOT LIKE`.
        negated: bool,
    },
    /// `CASE [operand] WHEN .. THEN .. [ELSE ..] END`
    Case {
        /// Simple-case operand.
        operand: Option<Box<Expr>>,
        /// `(WHEN, THEN)` pairs.
        branches: Vec<(Expr, Expr)>,
        /// `ELSE` result.
        else_result: Option<Box<Expr>>,
    },
    /// `CAST(expr AS type)` or `expr::type`
    Cast {
        /// Operand.
        expr: Box<Expr>,
        /// Target type.
        data_type: DataType,
    },
    /// Scalar function call.
    Function {
        /// Lower-cased function name.
        name: String,
        /// Arguments.
        args: Vec<Expr>,
    },
    /// `[a, b, ...]`
    List(Vec<Expr>),
}

impl Expr {
    /// Builds a binary expression.
    #[must_use]
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("NULL"),
            Literal::Boolean(b) => write!(f, "{b}"),
            Literal::Number(n) => f.write_str(n),
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Literal::Typed { data_type, text } => {
                write!(f, "CAST('{}' AS {data_type})", text.replace('\'', "''"))
            }
            Literal::Interval { text, unit } => match unit {
                Some(unit) => write!(f, "INTERVAL '{text}' {}", unit.to_ascii_uppercase()),
                None => write!(f, "INTERVAL '{text}'"),
            },
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(lit) => write!(f, "{lit}"),
            Expr::Column { table: Some(t), name } => write!(f, "{t}.{name}"),
            Expr::Column { table: None, name } => f.write_str(name),
            Expr::Unary { op: UnaryOp::Minus, expr } => write!(f, "-{expr}"),
            Expr::Unary { op: UnaryOp::Plus, expr } => write!(f, "+{expr}"),
            Expr::Unary { op: UnaryOp::Not, expr } => write!(f, "(NOT {expr})"),
            Expr::Binary { op, left, right } => write!(f, "({left} {} {right})", op.as_str()),
            Expr::IsNull { expr, negated } => {
                write!(f, "({expr} IS {}NULL)", if *negated { "NOT " } else { "" })
            }
            Expr::Between {
                expr,
                negated,
                low,
                high,
            } => write!(
                f,
                "({expr} {}BETWEEN {low} AND {high})",
                if *negated { "NOT " } else { "" }
            ),
            Expr::InList { expr, list, negated } => {
                write!(f, "({expr} {}IN (", if *negated { "NOT " } else { "" })?;
                write_list(f, list)?;
                f.write_str("))")
            }
            Expr::Like {
                expr,
                pattern,
                negated,
            } => write!(f, "({expr} {}LIKE {pattern})", if *negated { "NOT " } else { "" }),
            Expr::Case {
                operand,
                branches,
                else_result,
            } => {
                f.write_str("CASE")?;
                if let Some(operand) = operand {
                    write!(f, " {operand}")?;
                }
                for (when, then) in branches {
                    write!(f, " WHEN {when} THEN {then}")?;
                }
                if let Some(else_result) = else_result {
                    write!(f, " ELSE {else_result}")?;
                }
                f.write_str(" END")
            }
            Expr::Cast { expr, data_type } => write!(f, "CAST({expr} AS {data_type})"),
            Expr::Function { name, args } => {
                write!(f, "{name}(")?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Expr::List(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: &str) -> Expr {
        Expr::Literal(Literal::Number(n.to_string()))
    }

    #[test]
    fn renders_like_sql() {
        let sum = Expr::binary(BinaryOp::Plus, num("1"), num("2"));
        assert_eq!(sum.to_string(), "(1 + 2)");

        let cast = Expr::Cast {
            expr: Box::new(Expr::Column {
                table: None,
                name: "x".into(),
            }),
            data_type: DataType::Integer,
        };
        assert_eq!(cast.to_string(), "CAST(x AS INTEGER)");

        let quoted = Expr::Literal(Literal::String("it's".into()));
        assert_eq!(quoted.to_string(), "'it''s'");

        let call = Expr::Function {
            name: "coalesce".into(),
            args: vec![Expr::Literal(Literal::Null), num("3")],
        };
        assert_eq!(call.to_string(), "coalesce(NULL, 3)");
    }
}
