//! RosettaVM execution engine.
//!
//! Two modes share one arithmetic core:
//! - **Program mode** runs an assembled [`Program`] on a machine with an
//!   operand stack, eight registers, and a call stack, bounded by the limits
//!   in [`VmConfig`].
//! - **Expression mode** evaluates an [`Expr`] tree or a [`Script`] of
//!   assignments and expressions.
//!
//! # Usage
//!
//! ```
//! use std::collections::BTreeMap;
//! use rvm_common::{Instruction, Opcode, Operand, Program, Value};
//! use rvm_vm::run;
//!
//! let program = Program::new(
//!     vec![
//!         Instruction::new(Opcode::Push, vec![Operand::Immediate(Value::from(42))], 1),
//!         Instruction::new(Opcode::Halt, vec![], 2),
//!     ],
//!     BTreeMap::new(),
//! );
//!
//! let result = run(&program).unwrap();
//! assert_eq!(result, Value::from(42));
//! ```

pub mod config;
pub mod error;
pub mod eval;
pub mod execute;
pub mod machine;

mod arith;

pub use config::{CancelToken, VmConfig};
pub use error::RuntimeError;
pub use eval::Environment;
pub use machine::VM;

use rvm_common::{Expr, Program, Script, Value};

/// Execute a program with the default limits and return its result.
///
/// The result is the top of the operand stack at halt; with an empty stack
/// it is `r0` if that was written, otherwise zero.
///
/// # Errors
///
/// Returns [`RuntimeError`] on the first fault (stack underflow, division by
/// zero, step limit, etc.).
pub fn run(program: &Program) -> Result<Value, RuntimeError> {
    run_with(program, &VmConfig::default())
}

/// Execute a program under the given limits.
pub fn run_with(program: &Program, config: &VmConfig) -> Result<Value, RuntimeError> {
    VM::new(program, config).execute()
}

/// Evaluate a single expression with no variables bound.
pub fn eval_expr(expr: &Expr) -> Result<Value, RuntimeError> {
    Environment::new().eval(expr)
}

/// Evaluate a script in a fresh environment.
pub fn eval_script(script: &Script) -> Result<Value, RuntimeError> {
    Environment::new().run_script(script)
}
