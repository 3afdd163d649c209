//! SQL lexer: turns SQL text into a token stream.

use super::token::{Keyword, Token};
use std::fmt;

/// Error returned when tokenization fails.
#[derive(Debug, Clone, PartialEq)]
pub struct LexerError {
    /// What went wrong.
    pub message: String,
    /// Character offset into the input.
    pub position: usize,
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at position {}", self.message, self.position)
    }
}

impl std::error::Error for LexerError {}

/// SQL lexer.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    /// Creates a lexer over `input`.
    #[must_use]
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Tokenizes the whole input. The last token is always [`Token::Eof`].
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments()?;
            if self.is_eof() {
                tokens.push(Token::Eof);
                return Ok(tokens);
            }
            tokens.push(self.next_token()?);
        }
    }

    fn next_token(&mut self) -> Result<Token, LexerError> {
        let ch = self.current_char();
        match ch {
            ';' => self.single(Token::Semicolon),
            ',' => self.single(Token::Comma),
            '(' => self.single(Token::LParen),
            ')' => self.single(Token::RParen),
            '.' if self.peek(1).is_some_and(|c| c.is_ascii_digit()) => self.tokenize_number(),
            '.' | '+' | '-' | '*' | '%' | '[' | ']' => self.single(Token::Symbol(ch)),
            '=' | '<' | '>' | '!' | '|' | ':' | '/' => self.tokenize_operator(ch),
            '\'' => self.tokenize_string(),
            '"' => self.tokenize_quoted_identifier(),
            '0'..='9' => self.tokenize_number(),
            c if c.is_alphabetic() || c == '_' => Ok(self.tokenize_word()),
            _ => Err(self.error(format!("unexpected character '{ch}'"))),
        }
    }

    fn single(&mut self, token: Token) -> Result<Token, LexerError> {
        self.advance();
        Ok(token)
    }

    fn tokenize_operator(&mut self, ch: char) -> Result<Token, LexerError> {
        let next = self.peek(1);
        let op = match (ch, next) {
            ('<', Some('=')) => "<=",
            ('<', Some('>')) => "<>",
            ('>', Some('=')) => ">=",
            ('!', Some('=')) => "!=",
            ('=', Some('=')) => "==",
            ('|', Some('|')) => "||",
            (':', Some(':')) => "::",
            ('/', Some('/')) => "//",
            ('=' | '<' | '>' | '/', _) => return self.single(Token::Symbol(ch)),
            _ => return Err(self.error(format!("unexpected character '{ch}'"))),
        };
        self.advance();
        self.advance();
        Ok(Token::Operator(op))
    }

    fn tokenize_string(&mut self) -> Result<Token, LexerError> {
        let start = self.position;
        self.advance();
        let mut text = String::new();
        loop {
            if self.is_eof() {
                return Err(LexerError {
                    message: "unterminated quoted string".to_string(),
                    position: start,
                });
            }
            let ch = self.current_char();
            self.advance();
            if ch == '\'' {
                if self.current_char() == '\'' && !self.is_eof() {
                    text.push('\'');
                    self.advance();
                } else {
                    return Ok(Token::String(text));
                }
            } else {
                text.push(ch);
            }
        }
    }

    fn tokenize_quoted_identifier(&mut self) -> Result<Token, LexerError> {
        let start = self.position;
        self.advance();
        let mut text = String::new();
        loop {
            if self.is_eof() {
                return Err(LexerError {
                    message: "unterminated quoted identifier".to_string(),
                    position: start,
                });
            }
            let ch = self.current_char();
            self.advance();
            if ch == '"' {
                if self.current_char() == '"' && !self.is_eof() {
                    text.push('"');
                    self.advance();
                } else if text.is_empty() {
                    return Err(LexerError {
                        message: "zero-length delimited identifier".to_string(),
                        position: start,
                    });
                } else {
                    return Ok(Token::QuotedIdentifier(text));
                }
            } else {
                text.push(ch);
            }
        }
    }

    fn tokenize_number(&mut self) -> Result<Token, LexerError> {
        let mut text = String::new();
        self.take_digits(&mut text);
        if self.current_char() == '.' && !self.is_eof() {
            text.push('.');
            self.advance();
            self.take_digits(&mut text);
        }
        if matches!(self.current_char(), 'e' | 'E') && !self.is_eof() {
            let sign = self.peek(1);
            let digit_at = if matches!(sign, Some('+' | '-')) { 2 } else { 1 };
            if self.peek(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    text.push(self.current_char());
                    self.advance();
                }
                self.take_digits(&mut text);
            } else {
                return Err(self.error(format!("malformed number '{text}e'")));
            }
        }
        // 1abc is never valid
        let ch = self.current_char();
        if !self.is_eof() && (ch.is_alphabetic() || ch == '_') {
            return Err(self.error(format!("malformed number near '{text}{ch}'")));
        }
        Ok(Token::Number(text))
    }

    fn take_digits(&mut self, text: &mut String) {
        while !self.is_eof() {
            let ch = self.current_char();
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else if ch == '_' && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn tokenize_word(&mut self) -> Token {
        let mut word = String::new();
        while !self.is_eof() {
            let ch = self.current_char();
            if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        match Keyword::lookup(&word) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Identifier(word),
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexerError> {
        loop {
            while !self.is_eof() && self.current_char().is_whitespace() {
                self.advance();
            }
            if self.current_char() == '-' && self.peek(1) == Some('-') {
                while !self.is_eof() && self.current_char() != '\n' {
                    self.advance();
                }
            } else if self.current_char() == '/' && self.peek(1) == Some('*') {
                let start = self.position;
                self.advance();
                self.advance();
                loop {
                    if self.is_eof() {
                        return Err(LexerError {
                            message: "unterminated comment".to_string(),
                            position: start,
                        });
                    }
                    if self.current_char() == '*' && self.peek(1) == Some('/') {
                        self.advance();
                        self.advance();
                        break;
                    }
                    self.advance();
                }
            } else {
                return Ok(());
            }
        }
    }

    fn error(&self, message: String) -> LexerError {
        LexerError {
            message,
            position: self.position,
        }
    }

    fn current_char(&self) -> char {
        self.input.get(self.position).copied().unwrap_or('\0')
    }

    fn peek(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    fn advance(&mut self) {
        if !self.is_eof() {
            self.position += 1;
        }
    }

    fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }
}
