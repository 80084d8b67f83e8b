//! Runtime errors for the RVM.
//!
//! Program-mode faults carry the instruction index and source line;
//! expression-mode faults carry the source position of the operator or name
//! that failed. Both are a [`Location`].

use rvm_common::{ErrorKind, Location, Register};
use thiserror::Error;

/// Errors that occur while running a program or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Division or modulo by zero.
    #[error("division by zero at {at}")]
    DivisionByZero { at: Location },

    /// Arithmetic produced infinity or NaN.
    #[error("'{op}' produced a non-finite result at {at}")]
    NumericOverflow { op: &'static str, at: Location },

    /// Pop on an empty operand stack.
    #[error("stack underflow at {at}")]
    StackUnderflow { at: Location },

    /// Operand stack grew past `max_stack_depth`.
    #[error("stack overflow: more than {limit} values at {at}")]
    StackOverflow { limit: usize, at: Location },

    /// Call stack grew past `max_call_depth`.
    #[error("call depth exceeded limit {limit} at {at}")]
    CallDepthExceeded { limit: usize, at: Location },

    /// Read of a register that was never written.
    #[error("register {register} read before assignment at {at}")]
    UndefinedRegister { register: Register, at: Location },

    /// Read of a script variable that was never assigned.
    #[error("undefined variable '{name}' at {at}")]
    UndefinedVariable { name: String, at: Location },

    /// Immediate jump target past the end of the program.
    #[error("jump target {target} outside program of {len} instruction(s) at {at}")]
    InvalidJumpTarget {
        target: String,
        len: usize,
        at: Location,
    },

    /// Jump to a label missing from the program's label table. Assembled
    /// programs never hit this; hand-built ones can.
    #[error("unresolved label '{label}' at {at}")]
    UnknownLabel { label: String, at: Location },

    /// Operands that don't match the opcode's shape in a hand-built program.
    #[error("malformed '{mnemonic}' instruction at {at}")]
    MalformedInstruction { mnemonic: &'static str, at: Location },

    /// The step ceiling was reached.
    #[error("execution limit of {limit} steps exceeded at {at}")]
    ExecutionLimitExceeded { limit: u64, at: Location },

    /// The cancellation token was set.
    #[error("execution cancelled at {at}")]
    Cancelled { at: Location },
}

impl RuntimeError {
    /// The error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::DivisionByZero { .. } => ErrorKind::DivisionByZero,
            RuntimeError::NumericOverflow { .. } => ErrorKind::NumericOverflow,
            RuntimeError::StackUnderflow { .. } => ErrorKind::StackUnderflow,
            RuntimeError::StackOverflow { .. } | RuntimeError::CallDepthExceeded { .. } => {
                ErrorKind::StackOverflow
            }
            RuntimeError::UndefinedRegister { .. } => ErrorKind::UndefinedRegister,
            RuntimeError::UndefinedVariable { .. } => ErrorKind::UndefinedVariable,
            RuntimeError::InvalidJumpTarget { .. } => ErrorKind::InvalidJumpTarget,
            RuntimeError::UnknownLabel { .. } => ErrorKind::UnresolvedLabel,
            RuntimeError::MalformedInstruction { .. } => ErrorKind::InvalidInstruction,
            RuntimeError::ExecutionLimitExceeded { .. } => ErrorKind::ExecutionLimitExceeded,
            RuntimeError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Where the error happened.
    pub fn location(&self) -> Location {
        match self {
            RuntimeError::DivisionByZero { at }
            | RuntimeError::NumericOverflow { at, .. }
            | RuntimeError::StackUnderflow { at }
            | RuntimeError::StackOverflow { at, .. }
            | RuntimeError::CallDepthExceeded { at, .. }
            | RuntimeError::UndefinedRegister { at, .. }
            | RuntimeError::UndefinedVariable { at, .. }
            | RuntimeError::InvalidJumpTarget { at, .. }
            | RuntimeError::UnknownLabel { at, .. }
            | RuntimeError::MalformedInstruction { at, .. }
            | RuntimeError::ExecutionLimitExceeded { at, .. }
            | RuntimeError::Cancelled { at } => *at,
        }
    }
}
