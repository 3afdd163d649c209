//! SQL front end: lexer, parser and syntax tree.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{Expr, Query, Statement};
pub use parser::{ParseError, Parser};

use crate::error::{CoreError, CoreResult};

/// Parses `sql` into statements, mapping syntax errors to query errors.
pub fn parse(sql: &str) -> CoreResult<Vec<Statement>> {
    Parser::parse_sql(sql).map_err(|e| CoreError::query(e.message))
}
