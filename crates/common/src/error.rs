//! Error taxonomy and source locations shared by every RVM component.

use std::fmt;

use thiserror::Error;

/// Category of every failure an RVM operation can report.
///
/// The display form is the bare variant name (`DivisionByZero`), which is
/// what the string-returning entry points prefix their error text with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unrecognized character or malformed numeric literal.
    LexError,
    /// Token sequence does not form a valid expression or statement.
    ParseError,
    /// Unknown mnemonic or operands that don't match its shape.
    InvalidInstruction,
    /// The same label defined twice.
    DuplicateLabel,
    /// A jump target names a label that is never defined.
    UnresolvedLabel,
    /// Division or modulo by zero.
    DivisionByZero,
    /// Pop on an empty operand stack.
    StackUnderflow,
    /// Operand stack or call stack grew past its configured limit.
    StackOverflow,
    /// Read of a register that was never written.
    UndefinedRegister,
    /// Read of a script variable that was never assigned.
    UndefinedVariable,
    /// Jump to an instruction index outside the program.
    InvalidJumpTarget,
    /// Arithmetic produced infinity or NaN.
    NumericOverflow,
    /// The step ceiling was reached.
    ExecutionLimitExceeded,
    /// Execution was stopped through a cancellation token.
    Cancelled,
}

/// All error kinds, in definition order.
pub const ALL_ERROR_KINDS: [ErrorKind; 14] = [
    ErrorKind::LexError,
    ErrorKind::ParseError,
    ErrorKind::InvalidInstruction,
    ErrorKind::DuplicateLabel,
    ErrorKind::UnresolvedLabel,
    ErrorKind::DivisionByZero,
    ErrorKind::StackUnderflow,
    ErrorKind::StackOverflow,
    ErrorKind::UndefinedRegister,
    ErrorKind::UndefinedVariable,
    ErrorKind::InvalidJumpTarget,
    ErrorKind::NumericOverflow,
    ErrorKind::ExecutionLimitExceeded,
    ErrorKind::Cancelled,
];

impl ErrorKind {
    /// The variant name as it appears in error text.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::LexError => "LexError",
            ErrorKind::ParseError => "ParseError",
            ErrorKind::InvalidInstruction => "InvalidInstruction",
            ErrorKind::DuplicateLabel => "DuplicateLabel",
            ErrorKind::UnresolvedLabel => "UnresolvedLabel",
            ErrorKind::DivisionByZero => "DivisionByZero",
            ErrorKind::StackUnderflow => "StackUnderflow",
            ErrorKind::StackOverflow => "StackOverflow",
            ErrorKind::UndefinedRegister => "UndefinedRegister",
            ErrorKind::UndefinedVariable => "UndefinedVariable",
            ErrorKind::InvalidJumpTarget => "InvalidJumpTarget",
            ErrorKind::NumericOverflow => "NumericOverflow",
            ErrorKind::ExecutionLimitExceeded => "ExecutionLimitExceeded",
            ErrorKind::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A 1-based line/column position in source text. Columns count characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Where a failure happened: a source position for syntax and expression
/// errors, an instruction for program-mode runtime faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Source(Position),
    Instruction { index: usize, line: usize },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Source(pos) => pos.fmt(f),
            Location::Instruction { index, line } => {
                write!(f, "instruction {index} (line {line})")
            }
        }
    }
}

/// Errors from looking up mnemonics and register names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("unknown mnemonic '{0}'")]
    UnknownMnemonic(String),

    #[error("'{0}' is not a register name")]
    NotARegister(String),

    #[error("register '{name}' out of range (r0-r{max})")]
    RegisterOutOfRange { name: String, max: u8 },
}
