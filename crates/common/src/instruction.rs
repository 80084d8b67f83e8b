//! Instructions and operands for the RVM instruction set.

use std::fmt;
use std::str::FromStr;

use crate::error::NameError;
use crate::opcode::{OperandKind, Opcode};
use crate::value::Value;

/// Number of general-purpose registers (`r0` through `r7`).
pub const REGISTER_COUNT: usize = 8;

/// A general-purpose register id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Register(u8);

impl Register {
    /// Create a register from its id. Returns `None` if out of range.
    pub fn new(id: u8) -> Option<Self> {
        if (id as usize) < REGISTER_COUNT {
            Some(Register(id))
        } else {
            None
        }
    }

    pub fn id(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns true if `name` is spelled like a register (`r` or `R`
    /// followed by digits), whether or not it is in range.
    pub fn looks_like_register(name: &str) -> bool {
        let mut chars = name.chars();
        matches!(chars.next(), Some('r' | 'R'))
            && !chars.as_str().is_empty()
            && chars.all(|c| c.is_ascii_digit())
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Register names are matched case-insensitively: `r3` and `R3` are the
/// same register.
impl FromStr for Register {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !Register::looks_like_register(s) {
            return Err(NameError::NotARegister(s.to_string()));
        }
        let out_of_range = || NameError::RegisterOutOfRange {
            name: s.to_string(),
            max: (REGISTER_COUNT - 1) as u8,
        };
        let id: u8 = s[1..].parse().map_err(|_| out_of_range())?;
        Register::new(id).ok_or_else(out_of_range)
    }
}

/// A single instruction operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A literal number. Also used for absolute jump targets.
    Immediate(Value),
    /// A general-purpose register.
    Register(Register),
    /// A reference to a label, resolved through the program's label table.
    Label(String),
}

impl Operand {
    /// Returns true if this operand can fill a slot of the given kind.
    pub fn fits(&self, kind: OperandKind) -> bool {
        matches!(
            (kind, self),
            (OperandKind::Value, Operand::Immediate(_) | Operand::Register(_))
                | (OperandKind::Register, Operand::Register(_))
                | (OperandKind::Target, Operand::Immediate(_) | Operand::Label(_))
        )
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Immediate(v) => write!(f, "{v}"),
            Operand::Register(r) => write!(f, "{r}"),
            Operand::Label(name) => f.write_str(name),
        }
    }
}

/// One assembled instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// The operation to perform.
    pub opcode: Opcode,
    /// Operands, already checked against `opcode.shape()`.
    pub operands: Vec<Operand>,
    /// 1-based source line the instruction came from.
    pub line: usize,
}

impl Instruction {
    pub fn new(opcode: Opcode, operands: Vec<Operand>, line: usize) -> Self {
        Self {
            opcode,
            operands,
            line,
        }
    }

    /// The operand at `idx`, if present.
    pub fn operand(&self, idx: usize) -> Option<&Operand> {
        self.operands.get(idx)
    }
}

/// Canonical assembly text for the instruction, e.g. `mov r0, 5`.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.mnemonic())?;
        for (i, operand) in self.operands.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{operand}")?;
        }
        Ok(())
    }
}
