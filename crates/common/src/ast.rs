//! Expression trees and expression-only scripts.

use std::fmt;
use std::mem;

use crate::error::Position;
use crate::value::Value;

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Plus,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
        }
    }
}

/// Infix operators. Comparisons yield 1 or 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }

    /// Look up an infix operator by its source symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Mod,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            _ => return None,
        })
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

/// An expression tree node. Positions point at the operator or name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(Value),
    Variable {
        name: String,
        pos: Position,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        pos: Position,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        pos: Position,
    },
}

impl Expr {
    pub fn unary(op: UnaryOp, operand: Expr, pos: Position) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
            pos,
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr, pos: Position) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            pos,
        }
    }
}

/// Parsed chains can be millions of nodes deep, so children are torn down
/// from a work list rather than by the default recursive drop.
impl Drop for Expr {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        detach_children(self, &mut pending);
        while let Some(mut node) = pending.pop() {
            detach_children(&mut node, &mut pending);
        }
    }
}

fn detach_children(expr: &mut Expr, pending: &mut Vec<Expr>) {
    let leaf = || Expr::Literal(Value::ZERO);
    match expr {
        Expr::Unary { operand, .. } => pending.push(mem::replace(&mut **operand, leaf())),
        Expr::Binary { left, right, .. } => {
            pending.push(mem::replace(&mut **left, leaf()));
            pending.push(mem::replace(&mut **right, leaf()));
        }
        Expr::Literal(_) | Expr::Variable { .. } => {}
    }
}

/// Fully parenthesized form, e.g. `(2 + (3 * 4))`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(v) => write!(f, "{v}"),
            Expr::Variable { name, .. } => f.write_str(name),
            Expr::Unary { op, operand, .. } => write!(f, "({}{operand})", op.symbol()),
            Expr::Binary {
                op, left, right, ..
            } => write!(f, "({left} {} {right})", op.symbol()),
        }
    }
}

/// One line of an expression-only script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `name = expr`
    Assign {
        name: String,
        value: Expr,
        line: usize,
    },
    /// A bare expression.
    Expr { expr: Expr, line: usize },
}

/// An expression-only program. Its result is the value of the last
/// statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    pub statements: Vec<Statement>,
}

impl Script {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
