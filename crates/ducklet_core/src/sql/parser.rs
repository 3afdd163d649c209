//! Recursive-descent SQL parser.
//!
//! Precedence, loosest first: `OR`, `AND`, `NOT`, comparison and
//! predicates (`IS`, `BETWEEN`, `IN`, `LIKE`), `||`, `+ -`, `* / // %`,
//! unary sign, `::` casts, primaries.

use super::ast::{
    BinaryOp, ColumnDef, CreateTable, Expr, Insert, Literal, OrderByExpr, Query, Select,
    SelectItem, Statement, TableRef, UnaryOp,
};
use super::lexer::{Lexer, LexerError};
use super::token::{Keyword, Token};
use crate::error::CoreError;
use crate::temporal::Interval;
use crate::types::DataType;
use std::fmt;

/// Deepest expression nesting the parser accepts.
pub const MAX_EXPRESSION_DEPTH: usize = 128;

/// Error returned when parsing fails.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// What went wrong.
    pub message: String,
}

impl ParseError {
    fn new(message: impl fmt::Display) -> Self {
        ParseError {
            message: format!("Parser Error: {message}"),
        }
    }
}

impl From<CoreError> for ParseError {
    fn from(err: CoreError) -> Self {
        ParseError {
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<LexerError> for ParseError {
    fn from(err: LexerError) -> Self {
        ParseError::new(err)
    }
}

/// SQL parser over a token stream.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser {
    /// Creates a parser over already lexed tokens.
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    /// Parses every `;`-separated statement in `sql`.
    pub fn parse_sql(sql: &str) -> Result<Vec<Statement>, ParseError> {
        let tokens = Lexer::new(sql).tokenize()?;
        Parser::new(tokens).parse_statements()
    }

    /// Parses statements until end of input.
    pub fn parse_statements(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();
        loop {
            while self.try_consume(&Token::Semicolon) {}
            if self.peek() == &Token::Eof {
                return Ok(statements);
            }
            statements.push(self.parse_statement()?);
            match self.peek() {
                Token::Semicolon | Token::Eof => {}
                _ => return Err(self.syntax_error()),
            }
        }
    }

    /// Parses one statement.
    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek() {
            Token::Keyword(Keyword::Select | Keyword::Values) => {
                Ok(Statement::Query(Box::new(self.parse_query()?)))
            }
            Token::Keyword(Keyword::Create) => self.parse_create_table(),
            Token::Keyword(Keyword::Insert) => self.parse_insert(),
            Token::Keyword(Keyword::Drop) => self.parse_drop_table(),
            Token::Keyword(Keyword::Delete) => self.parse_delete(),
            Token::Keyword(Keyword::Update) => self.parse_update(),
            _ => Err(self.syntax_error()),
        }
    }

    fn parse_query(&mut self) -> Result<Query, ParseError> {
        if self.try_consume_keyword(Keyword::Values) {
            return self.parse_values().map(Query::Values);
        }
        self.parse_select().map(Query::Select)
    }

    fn parse_values(&mut self) -> Result<Vec<Vec<Expr>>, ParseError> {
        let mut rows = Vec::new();
        loop {
            self.expect_token(&Token::LParen)?;
            let row = self.parse_expr_list()?;
            self.expect_token(&Token::RParen)?;
            if let Some(first) = rows.first().map(Vec::len) {
                if first != row.len() {
                    return Err(ParseError::new("VALUES lists must all be the same length"));
                }
            }
            rows.push(row);
            if !self.try_consume(&Token::Comma) {
                return Ok(rows);
            }
        }
    }

    fn parse_select(&mut self) -> Result<Select, ParseError> {
        self.expect_keyword(Keyword::Select)?;
        let mut select = Select {
            distinct: self.try_consume_keyword(Keyword::Distinct),
            ..Select::default()
        };
        loop {
            select.projection.push(self.parse_select_item()?);
            if !self.try_consume(&Token::Comma) {
                break;
            }
        }
        if self.try_consume_keyword(Keyword::From) {
            select.from = Some(self.parse_table_ref()?);
        }
        if self.try_consume_keyword(Keyword::Where) {
            select.selection = Some(self.parse_expr()?);
        }
        if self.try_consume_keyword(Keyword::Order) {
            self.expect_keyword(Keyword::By)?;
            loop {
                select.order_by.push(self.parse_order_by_expr()?);
                if !self.try_consume(&Token::Comma) {
                    break;
                }
            }
        }
        // LIMIT and OFFSET may come in either order
        for _ in 0..2 {
            if select.limit.is_none() && self.try_consume_keyword(Keyword::Limit) {
                select.limit = Some(self.parse_expr()?);
            } else if select.offset.is_none() && self.try_consume_keyword(Keyword::Offset) {
                select.offset = Some(self.parse_expr()?);
            }
        }
        Ok(select)
    }

    fn parse_select_item(&mut self) -> Result<SelectItem, ParseError> {
        if self.try_consume(&Token::Symbol('*')) {
            return Ok(SelectItem::Wildcard);
        }
        if let (
            Token::Identifier(name) | Token::QuotedIdentifier(name),
            Token::Symbol('.'),
            Token::Symbol('*'),
        ) = (self.peek(), self.peek_at_offset(1), self.peek_at_offset(2))
        {
            let name = name.clone();
            self.position += 3;
            return Ok(SelectItem::QualifiedWildcard(name));
        }
        let expr = self.parse_expr()?;
        let alias = self.parse_optional_alias()?;
        Ok(SelectItem::Expr { expr, alias })
    }

    fn parse_optional_alias(&mut self) -> Result<Option<String>, ParseError> {
        if self.try_consume_keyword(Keyword::As) {
            if let Token::String(alias) = self.peek() {
                let alias = alias.clone();
                self.advance();
                return Ok(Some(alias));
            }
            return self.parse_identifier().map(Some);
        }
        match self.peek() {
            Token::Identifier(_) | Token::QuotedIdentifier(_) => self.parse_identifier().map(Some),
            _ => Ok(None),
        }
    }

    fn parse_table_ref(&mut self) -> Result<TableRef, ParseError> {
        let name = self.parse_identifier()?;
        let alias = self.parse_optional_alias()?;
        Ok(TableRef { name, alias })
    }

    fn parse_order_by_expr(&mut self) -> Result<OrderByExpr, ParseError> {
        let expr = self.parse_expr()?;
        let asc = if self.try_consume_word("asc") {
            Some(true)
        } else if self.try_consume_word("desc") {
            Some(false)
        } else {
            None
        };
        let nulls_first = if self.try_consume_word("nulls") {
            if self.try_consume_word("first") {
                Some(true)
            } else if self.try_consume_word("last") {
                Some(false)
            } else {
                return Err(self.syntax_error());
            }
        } else {
            None
        };
        Ok(OrderByExpr {
            expr,
            asc,
            nulls_first,
        })
    }

    fn parse_create_table(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Create)?;
        self.expect_keyword(Keyword::Table)?;
        let if_not_exists = if self.try_consume_word("if") {
            self.expect_keyword(Keyword::Not)?;
            self.expect_word("exists")?;
            true
        } else {
            false
        };
        let name = self.parse_identifier()?;
        self.expect_token(&Token::LParen)?;
        let mut columns = Vec::new();
        loop {
            let column = self.parse_identifier()?;
            let data_type = self.parse_data_type()?;
            let not_null = if self.try_consume_keyword(Keyword::Not) {
                self.expect_keyword(Keyword::Null)?;
                true
            } else {
                self.try_consume_keyword(Keyword::Null);
                false
            };
            columns.push(ColumnDef {
                name: column,
                data_type,
                not_null,
            });
            if !self.try_consume(&Token::Comma) {
                break;
            }
        }
        self.expect_token(&Token::RParen)?;
        Ok(Statement::CreateTable(CreateTable {
            name,
            if_not_exists,
            columns,
        }))
    }

    fn parse_insert(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Insert)?;
        self.expect_keyword(Keyword::Into)?;
        let table = self.parse_identifier()?;
        let mut columns = Vec::new();
        if self.try_consume(&Token::LParen) {
            loop {
                columns.push(self.parse_identifier()?);
                if !self.try_consume(&Token::Comma) {
                    break;
                }
            }
            self.expect_token(&Token::RParen)?;
        }
        match self.peek() {
            Token::Keyword(Keyword::Values | Keyword::Select) => {}
            _ => return Err(self.syntax_error()),
        }
        let source = Box::new(self.parse_query()?);
        Ok(Statement::Insert(Insert {
            table,
            columns,
            source,
        }))
    }

    fn parse_drop_table(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Drop)?;
        self.expect_keyword(Keyword::Table)?;
        let if_exists = if self.try_consume_word("if") {
            self.expect_word("exists")?;
            true
        } else {
            false
        };
        let name = self.parse_identifier()?;
        Ok(Statement::DropTable { name, if_exists })
    }

    fn parse_delete(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Delete)?;
        self.expect_keyword(Keyword::From)?;
        let table = self.parse_identifier()?;
        let selection = if self.try_consume_keyword(Keyword::Where) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(Statement::Delete { table, selection })
    }

    fn parse_update(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Update)?;
        let table = self.parse_identifier()?;
        self.expect_keyword(Keyword::Set)?;
        let mut assignments = Vec::new();
        loop {
            let column = self.parse_identifier()?;
            self.expect_token(&Token::Symbol('='))?;
            assignments.push((column, self.parse_expr()?));
            if !self.try_consume(&Token::Comma) {
                break;
            }
        }
        let selection = if self.try_consume_keyword(Keyword::Where) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(Statement::Update {
            table,
            assignments,
            selection,
        })
    }

    /// Parses a type name such as `INTEGER`, `DECIMAL(10,2)`,
    /// `TIMESTAMP WITH TIME ZONE` or `VARCHAR[]`.
    pub fn parse_data_type(&mut self) -> Result<DataType, ParseError> {
        let mut name = match self.peek() {
            Token::Identifier(word) => word.to_ascii_uppercase(),
            _ => return Err(self.syntax_error()),
        };
        self.advance();
        match name.as_str() {
            "DOUBLE" if self.try_consume_word("precision") => name.push_str(" PRECISION"),
            "CHARACTER" if self.try_consume_word("varying") => name.push_str(" VARYING"),
            "TIMESTAMP" | "TIME" => {
                if self.peek_word("with") {
                    self.advance();
                    self.expect_word("time")?;
                    self.expect_word("zone")?;
                    name.push_str(" WITH TIME ZONE");
                } else if self.try_consume_word("without") {
                    self.expect_word("time")?;
                    self.expect_word("zone")?;
                }
            }
            _ => {}
        }

        let mut params = Vec::new();
        if self.try_consume(&Token::LParen) {
            loop {
                match self.peek() {
                    Token::Number(n) => {
                        let value = n.parse::<u32>().map_err(|_| {
                            ParseError::new(format_args!("invalid type parameter {n}"))
                        })?;
                        params.push(value);
                        self.advance();
                    }
                    _ => return Err(self.syntax_error()),
                }
                if !self.try_consume(&Token::Comma) {
                    break;
                }
            }
            self.expect_token(&Token::RParen)?;
        }

        let mut data_type = DataType::from_sql_name(&name, &params)?;
        let depth = self.depth;
        while self.peek() == &Token::Symbol('[') && self.peek_at_offset(1) == &Token::Symbol(']') {
            self.descend()?;
            self.position += 2;
            data_type = DataType::List(Box::new(data_type));
        }
        self.depth = depth;
        Ok(data_type)
    }

    /// Parses an expression.
    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let depth = self.depth;
        self.descend()?;
        let expr = self.parse_or_expression();
        self.depth = depth;
        expr
    }

    /// Enters one more level of expression nesting.
    fn descend(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_EXPRESSION_DEPTH {
            return Err(ParseError::new(format_args!(
                "expression nesting exceeds {MAX_EXPRESSION_DEPTH} levels"
            )));
        }
        Ok(())
    }

    fn parse_expr_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut items = vec![self.parse_expr()?];
        while self.try_consume(&Token::Comma) {
            items.push(self.parse_expr()?);
        }
        Ok(items)
    }

    fn parse_or_expression(&mut self) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let mut left = self.parse_and_expression()?;
        while self.try_consume_keyword(Keyword::Or) {
            self.descend()?;
            let right = self.parse_and_expression()?;
            left = Expr::binary(BinaryOp::Or, left, right);
        }
        self.depth = depth;
        Ok(left)
    }

    fn parse_and_expression(&mut self) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let mut left = self.parse_not_expression()?;
        while self.try_consume_keyword(Keyword::And) {
            self.descend()?;
            let right = self.parse_not_expression()?;
            left = Expr::binary(BinaryOp::And, left, right);
        }
        self.depth = depth;
        Ok(left)
    }

    fn parse_not_expression(&mut self) -> Result<Expr, ParseError> {
        if self.try_consume_keyword(Keyword::Not) {
            let depth = self.depth;
            self.descend()?;
            let expr = self.parse_not_expression();
            self.depth = depth;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                expr: Box::new(expr?),
            });
        }
        self.parse_comparison_expression()
    }

    fn parse_comparison_expression(&mut self) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let mut left = self.parse_concat_expression()?;
        loop {
            if self.try_consume_keyword(Keyword::Is) {
                self.descend()?;
                let negated = self.try_consume_keyword(Keyword::Not);
                self.expect_keyword(Keyword::Null)?;
                left = Expr::IsNull {
                    expr: Box::new(left),
                    negated,
                };
                continue;
            }

            let negated = match (self.peek(), self.peek_at_offset(1)) {
                (
                    Token::Keyword(Keyword::Not),
                    Token::Keyword(Keyword::Between | Keyword::In | Keyword::Like),
                ) => {
                    self.advance();
                    true
                }
                _ => false,
            };
            if self.try_consume_keyword(Keyword::Between) {
                self.descend()?;
                let low = self.parse_concat_expression()?;
                self.expect_keyword(Keyword::And)?;
                let high = self.parse_concat_expression()?;
                left = Expr::Between {
                    expr: Box::new(left),
                    negated,
                    low: Box::new(low),
                    high: Box::new(high),
                };
                continue;
            }
            if self.try_consume_keyword(Keyword::In) {
                self.descend()?;
                self.expect_token(&Token::LParen)?;
                if self.peek_keyword(Keyword::Select) {
                    return Err(ParseError::new("subqueries are not supported"));
                }
                let list = self.parse_expr_list()?;
                self.expect_token(&Token::RParen)?;
                left = Expr::InList {
                    expr: Box::new(left),
                    list,
                    negated,
                };
                continue;
            }
            if self.try_consume_keyword(Keyword::Like) {
                self.descend()?;
                let pattern = self.parse_concat_expression()?;
                left = Expr::Like {
                    expr: Box::new(left),
                    pattern: Box::new(pattern),
                    negated,
                };
                continue;
            }

            let op = match self.peek() {
                Token::Symbol('=') | Token::Operator("==") => BinaryOp::Eq,
                Token::Operator("<>" | "!=") => BinaryOp::NotEq,
                Token::Symbol('<') => BinaryOp::Lt,
                Token::Operator("<=") => BinaryOp::LtEq,
                Token::Symbol('>') => BinaryOp::Gt,
                Token::Operator(">=") => BinaryOp::GtEq,
                _ => break,
            };
            self.advance();
            self.descend()?;
            let right = self.parse_concat_expression()?;
            left = Expr::binary(op, left, right);
        }
        self.depth = depth;
        Ok(left)
    }

    fn parse_concat_expression(&mut self) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let mut left = self.parse_additive_expression()?;
        while self.try_consume(&Token::Operator("||")) {
            self.descend()?;
            let right = self.parse_additive_expression()?;
            left = Expr::binary(BinaryOp::Concat, left, right);
        }
        self.depth = depth;
        Ok(left)
    }

    fn parse_additive_expression(&mut self) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let mut left = self.parse_multiplicative_expression()?;
        loop {
            let op = match self.peek() {
                Token::Symbol('+') => BinaryOp::Plus,
                Token::Symbol('-') => BinaryOp::Minus,
                _ => break,
            };
            self.advance();
            self.descend()?;
            let right = self.parse_multiplicative_expression()?;
            left = Expr::binary(op, left, right);
        }
        self.depth = depth;
        Ok(left)
    }

    fn parse_multiplicative_expression(&mut self) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let mut left = self.parse_unary_expression()?;
        loop {
            let op = match self.peek() {
                Token::Symbol('*') => BinaryOp::Multiply,
                Token::Symbol('/') => BinaryOp::Divide,
                Token::Operator("//") => BinaryOp::IntegerDivide,
                Token::Symbol('%') => BinaryOp::Modulo,
                _ => break,
            };
            self.advance();
            self.descend()?;
            let right = self.parse_unary_expression()?;
            left = Expr::binary(op, left, right);
        }
        self.depth = depth;
        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Token::Symbol('-') => {
                self.advance();
                // Fold the sign into numeric literals so -2147483648 stays INTEGER
                if let Token::Number(n) = self.peek() {
                    let literal = Expr::Literal(Literal::Number(format!("-{n}")));
                    self.advance();
                    return self.parse_postfix(literal);
                }
                let expr = self.parse_signed_operand()?;
                Ok(Expr::Unary {
                    op: UnaryOp::Minus,
                    expr: Box::new(expr),
                })
            }
            Token::Symbol('+') => {
                self.advance();
                let expr = self.parse_signed_operand()?;
                Ok(Expr::Unary {
                    op: UnaryOp::Plus,
                    expr: Box::new(expr),
                })
            }
            _ => {
                let primary = self.parse_primary_expression()?;
                self.parse_postfix(primary)
            }
        }
    }

    fn parse_signed_operand(&mut self) -> Result<Expr, ParseError> {
        let depth = self.depth;
        self.descend()?;
        let expr = self.parse_unary_expression();
        self.depth = depth;
        expr
    }

    fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr, ParseError> {
        let depth = self.depth;
        while self.try_consume(&Token::Operator("::")) {
            self.descend()?;
            let data_type = self.parse_data_type()?;
            expr = Expr::Cast {
                expr: Box::new(expr),
                data_type,
            };
        }
        self.depth = depth;
        Ok(expr)
    }

    fn parse_primary_expression(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();
        match token {
            Token::Number(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Number(n)))
            }
            Token::String(s) => {
                self.advance();
                Ok(Expr::Literal(Literal::String(s)))
            }
            Token::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(true)))
            }
            Token::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(false)))
            }
            Token::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }
            Token::Keyword(Keyword::Case) => self.parse_case(),
            Token::Keyword(Keyword::Cast) => {
                self.advance();
                self.expect_token(&Token::LParen)?;
                let expr = self.parse_expr()?;
                self.expect_keyword(Keyword::As)?;
                let data_type = self.parse_data_type()?;
                self.expect_token(&Token::RParen)?;
                Ok(Expr::Cast {
                    expr: Box::new(expr),
                    data_type,
                })
            }
            Token::LParen => {
                self.advance();
                if self.peek_keyword(Keyword::Select) {
                    return Err(ParseError::new("subqueries are not supported"));
                }
                let expr = self.parse_expr()?;
                self.expect_token(&Token::RParen)?;
                Ok(expr)
            }
            Token::Symbol('[') => {
                self.advance();
                let items = if self.peek() == &Token::Symbol(']') {
                    Vec::new()
                } else {
                    self.parse_expr_list()?
                };
                self.expect_token(&Token::Symbol(']'))?;
                Ok(Expr::List(items))
            }
            Token::Identifier(word) => self.parse_word(word),
            Token::QuotedIdentifier(name) => {
                self.advance();
                self.parse_column_ref(name)
            }
            _ => Err(self.syntax_error()),
        }
    }

    fn parse_word(&mut self, word: String) -> Result<Expr, ParseError> {
        let lower = word.to_ascii_lowercase();
        let next = self.peek_at_offset(1).clone();

        match (lower.as_str(), &next) {
            ("date" | "time" | "timestamp" | "timestamptz", Token::String(text)) => {
                let data_type = DataType::from_sql_name(&lower, &[])?;
                self.position += 2;
                return Ok(Expr::Literal(Literal::Typed {
                    data_type,
                    text: text.clone(),
                }));
            }
            ("interval", Token::String(text) | Token::Number(text)) => {
                self.position += 2;
                let unit = match self.peek() {
                    Token::Identifier(unit) if Interval::from_unit(1.0, unit).is_some() => {
                        let unit = unit.to_ascii_lowercase();
                        self.advance();
                        Some(unit)
                    }
                    _ => None,
                };
                return Ok(Expr::Literal(Literal::Interval {
                    text: text.clone(),
                    unit,
                }));
            }
            ("current_timestamp" | "current_date", t) if t != &Token::LParen => {
                self.advance();
                return Ok(Expr::Function {
                    name: lower,
                    args: Vec::new(),
                });
            }
            (_, Token::LParen) => {
                self.position += 2;
                let args = if self.peek() == &Token::RParen {
                    Vec::new()
                } else {
                    self.parse_expr_list()?
                };
                self.expect_token(&Token::RParen)?;
                return Ok(Expr::Function { name: lower, args });
            }
            _ => {}
        }

        self.advance();
        self.parse_column_ref(word)
    }

    fn parse_column_ref(&mut self, first: String) -> Result<Expr, ParseError> {
        if self.peek() == &Token::Symbol('.') {
            self.advance();
            let name = self.parse_identifier()?;
            return Ok(Expr::Column {
                table: Some(first),
                name,
            });
        }
        Ok(Expr::Column {
            table: None,
            name: first,
        })
    }

    fn parse_case(&mut self) -> Result<Expr, ParseError> {
        self.expect_keyword(Keyword::Case)?;
        let operand = if self.peek_keyword(Keyword::When) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        let mut branches = Vec::new();
        while self.try_consume_keyword(Keyword::When) {
            let when = self.parse_expr()?;
            self.expect_keyword(Keyword::Then)?;
            let then = self.parse_expr()?;
            branches.push((when, then));
        }
        if branches.is_empty() {
            return Err(ParseError::new("CASE requires at least one WHEN clause"));
        }
        let else_result = if self.try_consume_keyword(Keyword::Else) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        self.expect_keyword(Keyword::End)?;
        Ok(Expr::Case {
            operand,
            branches,
            else_result,
        })
    }

    fn parse_identifier(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Token::Identifier(name) | Token::QuotedIdentifier(name) => {
                let identifier = name.clone();
                self.advance();
                Ok(identifier)
            }
            _ => Err(self.syntax_error()),
        }
    }

    fn syntax_error(&self) -> ParseError {
        match self.peek() {
            Token::Eof => ParseError::new("syntax error at end of input"),
            token => ParseError::new(format!("syntax error at or near \"{token}\"")),
        }
    }

    fn peek(&self) -> &Token {
        self.peek_at_offset(0)
    }

    fn peek_at_offset(&self, offset: usize) -> &Token {
        self.tokens.get(self.position + offset).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn peek_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.peek(), Token::Keyword(k) if *k == keyword)
    }

    fn peek_word(&self, word: &str) -> bool {
        matches!(self.peek(), Token::Identifier(w) if w.eq_ignore_ascii_case(word))
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), ParseError> {
        if self.try_consume_keyword(keyword) {
            Ok(())
        } else {
            Err(self.syntax_error())
        }
    }

    fn expect_word(&mut self, word: &str) -> Result<(), ParseError> {
        if self.try_consume_word(word) {
            Ok(())
        } else {
            Err(self.syntax_error())
        }
    }

    fn expect_token(&mut self, expected: &Token) -> Result<(), ParseError> {
        if self.try_consume(expected) {
            Ok(())
        } else {
            Err(self.syntax_error())
        }
    }

    fn try_consume_keyword(&mut self, keyword: Keyword) -> bool {
        if self.peek_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn try_consume_word(&mut self, word: &str) -> bool {
        if self.peek_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn try_consume(&mut self, token: &Token) -> bool {
        if self.peek() == token {
            self.advance();
            true
        } else {
            false
        }
    }
}
