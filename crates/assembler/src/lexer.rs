//! Tokenizer shared by the expression parser and the assembler.
//!
//! The lexer is lazy: tokens are produced one at a time as the parser asks
//! for them. It is also cheap to clone, so a parser can look ahead by
//! cloning the lexer and discarding the copy.

use std::fmt;

use rvm_common::{Position, Value};

use crate::error::LexError;

/// Operators, longest first so that `<=` wins over `<`.
const OPERATORS: [&str; 12] = ["==", "!=", "<=", ">=", "+", "-", "*", "/", "%", "<", ">", "="];

const PUNCTUATION: [char; 4] = ['(', ')', ',', ':'];

/// What a token is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Number(Value),
    /// Mnemonic, register, label, or variable name. Case is preserved.
    Identifier(String),
    Operator(&'static str),
    Punctuation(char),
    EndOfInput,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(v) => write!(f, "{v}"),
            TokenKind::Identifier(name) => f.write_str(name),
            TokenKind::Operator(op) => f.write_str(op),
            TokenKind::Punctuation(c) => write!(f, "{c}"),
            TokenKind::EndOfInput => f.write_str("end of input"),
        }
    }
}

/// A token and the position of its first character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
}

impl Token {
    pub fn new(kind: TokenKind, pos: Position) -> Self {
        Self { kind, pos }
    }

    pub fn is_end(&self) -> bool {
        self.kind == TokenKind::EndOfInput
    }

    pub fn is_operator(&self, symbol: &str) -> bool {
        matches!(self.kind, TokenKind::Operator(op) if op == symbol)
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punctuation(c)
    }
}

/// Lazy tokenizer over a source string.
///
/// Whitespace and comments (`;` or `#` to end of line) are skipped.
/// Iteration yields tokens up to and including one `EndOfInput`, or stops
/// after the first error.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    rest: &'a str,
    line: usize,
    column: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Lex `src` starting at line 1.
    pub fn new(src: &'a str) -> Self {
        Self::at_line(src, 1)
    }

    /// Lex `src` as if it began on line `line`. The assembler uses this to
    /// tokenize one source line at a time.
    pub fn at_line(src: &'a str, line: usize) -> Self {
        Self {
            rest: src,
            line,
            column: 1,
            finished: false,
        }
    }

    fn pos(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.rest = &self.rest[c.len_utf8()..];
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.bump();
            } else if c == ';' || c == '#' {
                while self.peek_char().is_some_and(|c| c != '\n') {
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    /// Produce the next token. Returns `EndOfInput` forever once the input
    /// is exhausted.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia();
        let pos = self.pos();

        let Some(c) = self.peek_char() else {
            return Ok(Token::new(TokenKind::EndOfInput, pos));
        };

        if c.is_ascii_digit() || (c == '.' && self.rest[1..].starts_with(|d: char| d.is_ascii_digit()))
        {
            return self.number(pos);
        }

        if c.is_ascii_alphabetic() || c == '_' {
            return Ok(self.identifier(pos));
        }

        if let Some(&op) = OPERATORS.iter().find(|op| self.rest.starts_with(**op)) {
            for _ in 0..op.len() {
                self.bump();
            }
            return Ok(Token::new(TokenKind::Operator(op), pos));
        }

        if PUNCTUATION.contains(&c) {
            self.bump();
            return Ok(Token::new(TokenKind::Punctuation(c), pos));
        }

        Err(LexError::UnexpectedChar { ch: c, pos })
    }

    fn number(&mut self, pos: Position) -> Result<Token, LexError> {
        let start = self.rest;
        let mut len = 0;
        let mut dots = 0;

        while let Some(c) = self.peek_char() {
            match c {
                '0'..='9' => {}
                '.' => dots += 1,
                _ => break,
            }
            self.bump();
            len += 1;
        }

        let text = &start[..len];
        if dots > 1 {
            return Err(LexError::MalformedNumber {
                text: text.to_string(),
                pos,
            });
        }

        let value = text
            .parse::<f64>()
            .ok()
            .and_then(Value::new)
            .ok_or_else(|| LexError::NumberOutOfRange {
                text: text.to_string(),
                pos,
            })?;

        Ok(Token::new(TokenKind::Number(value), pos))
    }

    fn identifier(&mut self, pos: Position) -> Token {
        let start = self.rest;
        let mut len = 0;
        while self
            .peek_char()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.bump();
            len += 1;
        }
        Token::new(TokenKind::Identifier(start[..len].to_string()), pos)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        if !matches!(&result, Ok(token) if !token.is_end()) {
            self.finished = true;
        }
        Some(result)
    }
}

/// Tokenize all of `src`, ending with `EndOfInput`.
pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(src).collect()
}
