//! Tokens produced by the lexer.

use std::fmt;

/// Reserved SQL keywords.
///
/// Words that are only meaningful in one position (`ASC`, `NULLS`, `IF`,
/// type names, ...) stay identifiers and are matched in context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// `AND`
    And,
    /// `AS`
    As,
    /// `BETWEEN`
    Between,
    /// `BY`
    By,
    /// `CASE`
    Case,
    /// `CAST`
    Cast,
    /// `CREATE`
    Create,
    /// `DELETE`
    Delete,
    /// `DISTINCT`
    Distinct,
    /// `DROP`
    Drop,
    /// `ELSE`
    Else,
    /// `END`
    End,
    /// `FALSE`
    False,
    /// `FROM`
    From,
    /// `IN`
    In,
    /// `INSERT`
    Insert,
    /// `INTO`
    Into,
    /// `IS`
    Is,
    /// `LIKE`
    Like,
    /// `LIMIT`
    Limit,
    /// `NOT`
    Not,
    /// `NULL`
    Null,
    /// `OFFSET`
    Offset,
    /// `OR`
    Or,
    /// `ORDER`
    Order,
    /// `SELECT`
    Select,
    /// `SET`
    Set,
    /// `TABLE`
    Table,
    /// `THEN`
    Then,
    /// `TRUE`
    True,
    /// `UPDATE`
    Update,
    /// `VALUES`
    Values,
    /// `WHEN`
    When,
    /// `WHERE`
    Where,
}

impl Keyword {
    /// Looks up a reserved word, case-insensitively.
    #[must_use]
    pub fn lookup(word: &str) -> Option<Keyword> {
        let keyword = match word.to_ascii_uppercase().as_str() {
            "AND" => Keyword::And,
            "AS" => Keyword::As,
            "BETWEEN" => Keyword::Between,
            "BY" => Keyword::By,
            "CASE" => Keyword::Case,
            "CAST" => Keyword::Cast,
            "CREATE" => Keyword::Create,
            "DELETE" => Keyword::Delete,
            "DISTINCT" => Keyword::Distinct,
            "DROP" => Keyword::Drop,
            "ELSE" => Keyword::Else,
            "END" => Keyword::End,
            "FALSE" => Keyword::False,
            "FROM" => Keyword::From,
            "IN" => Keyword::In,
            "INSERT" => Keyword::Insert,
            "INTO" => Keyword::Into,
            "IS" => Keyword::Is,
            "LIKE" => Keyword::Like,
            "LIMIT" => Keyword::Limit,
            "NOT" => Keyword::Not,
            "NULL" => Keyword::Null,
            "OFFSET" => Keyword::Offset,
            "OR" => Keyword::Or,
            "ORDER" => Keyword::Order,
            "SELECT" => Keyword::Select,
            "SET" => Keyword::Set,
            "TABLE" => Keyword::Table,
            "THEN" => Keyword::Then,
            "TRUE" => Keyword::True,
            "UPDATE" => Keyword::Update,
            "VALUES" => Keyword::Values,
            "WHEN" => Keyword::When,
            "WHERE" => Keyword::Where,
            _ => return None,
        };
        Some(keyword)
    }

    /// The keyword as written in SQL.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::And => "AND",
            Keyword::As => "AS",
            Keyword::Between => "BETWEEN",
            Keyword::By => "BY",
            Keyword::Case => "CASE",
            Keyword::Cast => "CAST",
            Keyword::Create => "CREATE",
            Keyword::Delete => "DELETE",
            Keyword::Distinct => "DISTINCT",
            Keyword::Drop => "DROP",
            Keyword::Else => "ELSE",
            Keyword::End => "END",
            Keyword::False => "FALSE",
            Keyword::From => "FROM",
            Keyword::In => "IN",
            Keyword::Insert => "INSERT",
            Keyword::Into => "INTO",
            Keyword::Is => "IS",
            Keyword::Like => "LIKE",
            Keyword::Limit => "LIMIT",
            Keyword::Not => "NOT",
            Keyword::Null => "NULL",
            Keyword::Offset => "OFFSET",
            Keyword::Or => "OR",
            Keyword::Order => "ORDER",
            Keyword::Select => "SELECT",
            Keyword::Set => "SET",
            Keyword::Table => "TABLE",
            Keyword::Then => "THEN",
            Keyword::True => "TRUE",
            Keyword::Update => "UPDATE",
            Keyword::Values => "VALUES",
            Keyword::When => "WHEN",
            Keyword::Where => "WHERE",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Reserved word.
    Keyword(Keyword),
    /// Bare identifier, original spelling.
    Identifier(String),
    /// `"quoted"` identifier.
    QuotedIdentifier(String),
    /// Numeric literal text (`42`, `1.5`, `1e3`).
    Number(String),
    /// `'string'` literal with escapes resolved.
    String(String),
    /// Multi-character operator (`<=`, `||`, `::`, ...).
    Operator(&'static str),
    /// Single-character symbol.
    Symbol(char),
    /// `,`
    Comma,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `;`
    Semicolon,
    /// End of input.
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Keyword(k) => write!(f, "{k}"),
            Token::Identifier(s) | Token::Number(s) => f.write_str(s),
            Token::QuotedIdentifier(s) => write!(f, "\"{s}\""),
            Token::String(s) => write!(f, "'{s}'"),
            Token::Operator(op) => f.write_str(op),
            Token::Symbol(c) => write!(f, "{c}"),
            Token::Comma => f.write_str(","),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Semicolon => f.write_str(";"),
            Token::Eof => f.write_str("end of input"),
        }
    }
}
