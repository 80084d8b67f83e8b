//! Arithmetic shared by program mode and expression mode.

use rvm_common::{BinaryOp, Value};

/// Arithmetic failure without a location; callers attach one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    DivisionByZero,
    Overflow,
}

/// Apply a binary operator. Comparisons yield 1 or 0. `%` keeps the sign of
/// the dividend.
pub(crate) fn binary(op: BinaryOp, a: Value, b: Value) -> Result<Value, Fault> {
    let (x, y) = (a.as_f64(), b.as_f64());
    let raw = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div | BinaryOp::Mod if b.is_zero() => return Err(Fault::DivisionByZero),
        BinaryOp::Div => x / y,
        BinaryOp::Mod => x % y,
        BinaryOp::Eq => return Ok(Value::from_bool(x == y)),
        BinaryOp::Ne => return Ok(Value::from_bool(x != y)),
        BinaryOp::Lt => return Ok(Value::from_bool(x < y)),
        BinaryOp::Le => return Ok(Value::from_bool(x <= y)),
        BinaryOp::Gt => return Ok(Value::from_bool(x > y)),
        BinaryOp::Ge => return Ok(Value::from_bool(x >= y)),
    };
    Value::new(raw).ok_or(Fault::Overflow)
}
