//! Opcode definitions for the RVM instruction set.
//!
//! Every opcode has a fixed operand shape. The assembler rejects any
//! instruction whose operands don't match it, so the VM never has to
//! re-check arity.

use std::fmt;
use std::str::FromStr;

use crate::error::NameError;

/// Identifies the operation to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Control
    /// No operation.
    Nop,
    /// Stop execution. The result is the top of the stack.
    Halt,

    // Stack & registers
    /// Push an immediate or register value.
    Push,
    /// Pop the top of the stack into a register.
    Pop,
    /// Duplicate the top of the stack.
    Dup,
    /// Swap the top two stack values.
    Swap,
    /// Discard the top of the stack.
    Drop,
    /// Load an immediate or register value into a register.
    Mov,
    /// Increment a register by one.
    Inc,
    /// Decrement a register by one.
    Dec,

    // Arithmetic: pop b, pop a, push a op b
    Add,
    Sub,
    Mul,
    /// Division by zero is a runtime error.
    Div,
    /// Remainder; zero divisor is a runtime error.
    Mod,
    /// Negate the top of the stack.
    Neg,

    // Comparison: pop b, pop a, push 1 or 0
    Eq,
    Lt,
    Gt,

    // Jumps
    /// Unconditional jump.
    Jmp,
    /// Pop; jump if the value is zero.
    Jz,
    /// Pop; jump if the value is non-zero.
    Jnz,
    /// Push the return address on the call stack and jump.
    Call,
    /// Return to the caller, or halt when the call stack is empty.
    Ret,
}

/// Kind of operand an opcode slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// Immediate number or register.
    Value,
    /// Register only.
    Register,
    /// Label or absolute instruction index.
    Target,
}

impl OperandKind {
    pub fn placeholder(self) -> &'static str {
        match self {
            OperandKind::Value => "<value>",
            OperandKind::Register => "<register>",
            OperandKind::Target => "<label>",
        }
    }
}

/// All opcodes, in definition order. Useful for exhaustive testing.
pub const ALL_OPCODES: [Opcode; 24] = [
    Opcode::Nop,
    Opcode::Halt,
    Opcode::Push,
    Opcode::Pop,
    Opcode::Dup,
    Opcode::Swap,
    Opcode::Drop,
    Opcode::Mov,
    Opcode::Inc,
    Opcode::Dec,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Div,
    Opcode::Mod,
    Opcode::Neg,
    Opcode::Eq,
    Opcode::Lt,
    Opcode::Gt,
    Opcode::Jmp,
    Opcode::Jz,
    Opcode::Jnz,
    Opcode::Call,
    Opcode::Ret,
];

impl Opcode {
    /// Canonical lowercase mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "nop",
            Opcode::Halt => "halt",
            Opcode::Push => "push",
            Opcode::Pop => "pop",
            Opcode::Dup => "dup",
            Opcode::Swap => "swap",
            Opcode::Drop => "drop",
            Opcode::Mov => "mov",
            Opcode::Inc => "inc",
            Opcode::Dec => "dec",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Mod => "mod",
            Opcode::Neg => "neg",
            Opcode::Eq => "eq",
            Opcode::Lt => "lt",
            Opcode::Gt => "gt",
            Opcode::Jmp => "jmp",
            Opcode::Jz => "jz",
            Opcode::Jnz => "jnz",
            Opcode::Call => "call",
            Opcode::Ret => "ret",
        }
    }

    /// The fixed operand shape of this opcode.
    pub fn shape(self) -> &'static [OperandKind] {
        use OperandKind::*;
        match self {
            Opcode::Push => &[Value],
            Opcode::Pop | Opcode::Inc | Opcode::Dec => &[Register],
            Opcode::Mov => &[Register, Value],
            Opcode::Jmp | Opcode::Jz | Opcode::Jnz | Opcode::Call => &[Target],
            Opcode::Nop
            | Opcode::Halt
            | Opcode::Dup
            | Opcode::Swap
            | Opcode::Drop
            | Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Mod
            | Opcode::Neg
            | Opcode::Eq
            | Opcode::Lt
            | Opcode::Gt
            | Opcode::Ret => &[],
        }
    }

    /// Number of operands the opcode takes.
    pub fn arity(self) -> usize {
        self.shape().len()
    }

    /// Human-readable usage, e.g. `mov <register>, <value>`.
    pub fn usage(self) -> String {
        let operands: Vec<&str> = self.shape().iter().map(|k| k.placeholder()).collect();
        if operands.is_empty() {
            self.mnemonic().to_string()
        } else {
            format!("{} {}", self.mnemonic(), operands.join(", "))
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Mnemonics are matched case-insensitively.
impl FromStr for Opcode {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_OPCODES
            .iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| NameError::UnknownMnemonic(s.to_string()))
    }
}
