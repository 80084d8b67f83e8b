//! Precedence-climbing parser for arithmetic expressions and
//! expression-only scripts.
//!
//! Precedence, lowest to highest:
//!
//! | Level | Operators              | Associativity |
//! |-------|------------------------|---------------|
//! | 1     | `== != < <= > >=`      | left          |
//! | 2     | `+ -`                  | left          |
//! | 3     | `* / %`                | left          |
//! | 4     | prefix `-` `+`         | right         |

use std::mem;

use rvm_common::{BinaryOp, Expr, Position, Script, Statement, UnaryOp};

use crate::error::SyntaxError;
use crate::lexer::{Lexer, Token, TokenKind};

/// Maximum depth of nested parentheses and prefix operators.
pub const MAX_NESTING: usize = 256;

fn precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 1,
        BinaryOp::Add | BinaryOp::Sub => 2,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 3,
    }
}

/// Single-token-lookahead parser pulling tokens lazily from a [`Lexer`].
pub(crate) struct ExprParser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    depth: usize,
    allow_variables: bool,
}

impl<'a> ExprParser<'a> {
    pub(crate) fn new(mut lexer: Lexer<'a>, allow_variables: bool) -> Result<Self, SyntaxError> {
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            depth: 0,
            allow_variables,
        })
    }

    fn advance(&mut self) -> Result<Token, SyntaxError> {
        let next = self.lexer.next_token()?;
        Ok(mem::replace(&mut self.current, next))
    }

    /// Parse one complete expression and require the input to end there.
    pub(crate) fn parse_complete(mut self) -> Result<Expr, SyntaxError> {
        let expr = self.expression()?;
        self.finish()?;
        Ok(expr)
    }

    fn expression(&mut self) -> Result<Expr, SyntaxError> {
        self.binary(1)
    }

    fn binary(&mut self, min_prec: u8) -> Result<Expr, SyntaxError> {
        let mut left = self.unary()?;

        while let Some(op) = self.current_binary_op() {
            let prec = precedence(op);
            if prec < min_prec {
                break;
            }
            let op_token = self.advance()?;
            let right = self.binary(prec + 1)?;
            left = Expr::binary(op, left, right, op_token.pos);
        }

        Ok(left)
    }

    fn current_binary_op(&self) -> Option<BinaryOp> {
        match self.current.kind {
            TokenKind::Operator(symbol) => BinaryOp::from_symbol(symbol),
            _ => None,
        }
    }

    fn unary(&mut self) -> Result<Expr, SyntaxError> {
        let op = if self.current.is_operator("-") {
            UnaryOp::Neg
        } else if self.current.is_operator("+") {
            UnaryOp::Plus
        } else {
            return self.primary();
        };

        let op_token = self.advance()?;
        self.enter(op_token.pos)?;
        let operand = self.unary()?;
        self.depth -= 1;
        Ok(Expr::unary(op, operand, op_token.pos))
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::Number(value) => Ok(Expr::Literal(value)),
            TokenKind::Identifier(name) if self.allow_variables => Ok(Expr::Variable {
                name,
                pos: token.pos,
            }),
            TokenKind::Punctuation('(') => {
                self.enter(token.pos)?;
                let inner = self.expression()?;
                if self.current.is_punct(')') {
                    self.advance()?;
                } else if self.current.is_end() {
                    return Err(SyntaxError::UnclosedParen { pos: token.pos });
                } else {
                    return Err(SyntaxError::UnexpectedToken {
                        expected: "')'",
                        found: self.current.kind.to_string(),
                        pos: self.current.pos,
                    });
                }
                self.depth -= 1;
                Ok(inner)
            }
            TokenKind::EndOfInput => Err(SyntaxError::UnexpectedEnd {
                expected: "an expression",
                pos: token.pos,
            }),
            other => Err(SyntaxError::UnexpectedToken {
                expected: if self.allow_variables {
                    "a number, name, or '('"
                } else {
                    "a number or '('"
                },
                found: other.to_string(),
                pos: token.pos,
            }),
        }
    }

    fn enter(&mut self, pos: Position) -> Result<(), SyntaxError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(SyntaxError::TooDeep { pos });
        }
        Ok(())
    }

    /// Require end of input; anything else is trailing input.
    fn finish(&mut self) -> Result<(), SyntaxError> {
        if self.current.is_end() {
            Ok(())
        } else if self.current.is_punct(')') {
            Err(SyntaxError::UnmatchedParen {
                pos: self.current.pos,
            })
        } else {
            Err(SyntaxError::TrailingInput {
                found: self.current.kind.to_string(),
                pos: self.current.pos,
            })
        }
    }
}

/// Parse a single arithmetic expression. Names are not allowed.
pub fn parse_expression(src: &str) -> Result<Expr, SyntaxError> {
    ExprParser::new(Lexer::new(src), false)?.parse_complete()
}

/// Parse an expression-only script: one statement per line, each either
/// `name = expr` or a bare expression.
///
/// A script with no assignments is first read as one expression spanning
/// every line, so arithmetic broken across lines means the same thing here
/// as in [`parse_expression`]. Only if that fails is it split into lines.
pub fn parse_script(src: &str) -> Result<Script, SyntaxError> {
    if !has_assignment(src) {
        let lexer = Lexer::new(src);
        let line = lexer.clone().next_token().map_or(1, |token| token.pos.line);
        if let Ok(expr) = ExprParser::new(lexer, true).and_then(ExprParser::parse_complete) {
            return Ok(Script::new(vec![Statement::Expr { expr, line }]));
        }
    }

    let mut statements = Vec::new();

    for (idx, line) in src.lines().enumerate() {
        let line_num = idx + 1;
        let lexer = Lexer::at_line(line, line_num);

        let mut lookahead = lexer.clone();
        let Some((first, second)) = leading_pair(&mut lookahead)? else {
            continue;
        };

        let statement = match first.kind {
            TokenKind::Identifier(name) if second.is_operator("=") => Statement::Assign {
                name,
                value: ExprParser::new(lookahead, true)?.parse_complete()?,
                line: line_num,
            },
            _ => Statement::Expr {
                expr: ExprParser::new(lexer, true)?.parse_complete()?,
                line: line_num,
            },
        };
        statements.push(statement);
    }

    if statements.is_empty() {
        return Err(SyntaxError::EmptyProgram);
    }

    Ok(Script::new(statements))
}

/// The first two tokens of a line, or `None` for a blank line.
fn leading_pair(lexer: &mut Lexer<'_>) -> Result<Option<(Token, Token)>, SyntaxError> {
    let first = lexer.next_token()?;
    if first.is_end() {
        return Ok(None);
    }
    let second = lexer.next_token()?;
    Ok(Some((first, second)))
}

/// Whether any line starts with `name =`. Lex errors are left for the
/// real parse to report.
fn has_assignment(src: &str) -> bool {
    src.lines().enumerate().any(|(idx, line)| {
        matches!(
            leading_pair(&mut Lexer::at_line(line, idx + 1)),
            Ok(Some((first, second)))
                if matches!(first.kind, TokenKind::Identifier(_)) && second.is_operator("=")
        )
    })
}
