//! Expression mode: evaluation of expression trees and scripts.
//!
//! Trees are walked post-order with an explicit work list instead of
//! recursion, so long operator chains can't exhaust the native stack.

use std::collections::HashMap;

use log::debug;

use crate::arith::{self, Fault};
use crate::error::RuntimeError;
use rvm_common::{Expr, Location, Script, Statement, UnaryOp, Value};

enum Task<'e> {
    Visit(&'e Expr),
    Apply(&'e Expr),
}

/// Variable bindings for one script run.
#[derive(Debug, Default)]
pub struct Environment {
    vars: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.vars.get(name).copied()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    /// Evaluate an expression against these bindings.
    pub fn eval(&self, expr: &Expr) -> Result<Value, RuntimeError> {
        let mut tasks = vec![Task::Visit(expr)];
        let mut values: Vec<Value> = Vec::new();

        while let Some(task) = tasks.pop() {
            match task {
                Task::Visit(node) => match node {
                    Expr::Literal(value) => values.push(*value),
                    Expr::Variable { name, pos } => {
                        let value = self.get(name).ok_or_else(|| RuntimeError::UndefinedVariable {
                            name: name.clone(),
                            at: Location::Source(*pos),
                        })?;
                        values.push(value);
                    }
                    Expr::Unary { operand, .. } => {
                        tasks.push(Task::Apply(node));
                        tasks.push(Task::Visit(operand));
                    }
                    Expr::Binary { left, right, .. } => {
                        tasks.push(Task::Apply(node));
                        tasks.push(Task::Visit(right));
                        tasks.push(Task::Visit(left));
                    }
                },
                Task::Apply(Expr::Unary { op, .. }) => {
                    let value = pop(&mut values);
                    values.push(match op {
                        UnaryOp::Neg => value.negated(),
                        UnaryOp::Plus => value,
                    });
                }
                Task::Apply(Expr::Binary { op, pos, .. }) => {
                    let b = pop(&mut values);
                    let a = pop(&mut values);
                    let at = Location::Source(*pos);
                    let result = arith::binary(*op, a, b).map_err(|fault| match fault {
                        Fault::DivisionByZero => RuntimeError::DivisionByZero { at },
                        Fault::Overflow => RuntimeError::NumericOverflow {
                            op: op.symbol(),
                            at,
                        },
                    })?;
                    values.push(result);
                }
                // Leaves are never scheduled for Apply.
                Task::Apply(Expr::Literal(_) | Expr::Variable { .. }) => {}
            }
        }

        Ok(pop(&mut values))
    }

    /// Run a script, returning the value of its last statement. An
    /// assignment yields the assigned value.
    pub fn run_script(&mut self, script: &Script) -> Result<Value, RuntimeError> {
        let mut last = Value::ZERO;
        for statement in &script.statements {
            last = match statement {
                Statement::Assign { name, value, .. } => {
                    let value = self.eval(value)?;
                    self.set(name.as_str(), value);
                    value
                }
                Statement::Expr { expr, .. } => self.eval(expr)?,
            };
        }
        debug!(
            "script of {} statement(s) evaluated to {}",
            script.len(),
            last
        );
        Ok(last)
    }
}

// Every Apply follows the Visits that push its operands, so the value stack
// is never short here.
fn pop(values: &mut Vec<Value>) -> Value {
    values.pop().unwrap_or_default()
}
