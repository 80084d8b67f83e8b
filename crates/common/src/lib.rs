//! RosettaVM common types.
//!
//! This crate provides the data structures shared by the RVM assembler and
//! virtual machine:
//!
//! - [`Opcode`]: the fixed instruction set and each opcode's operand shape
//! - [`Instruction`], [`Operand`], [`Register`]: assembled instructions
//! - [`Program`]: an instruction sequence plus its resolved label table
//! - [`Expr`], [`Script`]: expression trees for the arithmetic front end
//! - [`Value`]: the finite numeric value every evaluation produces
//! - [`ErrorKind`], [`Position`], [`Location`]: the shared error taxonomy

pub mod ast;
pub mod error;
pub mod instruction;
pub mod opcode;
pub mod program;
pub mod value;

// Re-export commonly used types at the crate root.
pub use ast::{BinaryOp, Expr, Script, Statement, UnaryOp};
pub use error::{ErrorKind, Location, NameError, Position};
pub use instruction::{Instruction, Operand, Register, REGISTER_COUNT};
pub use opcode::{OperandKind, Opcode};
pub use program::{Label, Program, ENTRY_LABEL};
pub use value::Value;
