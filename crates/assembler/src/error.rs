//! Error types for the RVM lexer, parsers, and assembler.

use rvm_common::{ErrorKind, Location, Position};
use thiserror::Error;

/// Errors produced while splitting source text into tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// A character that starts no token.
    #[error("unexpected character '{ch}' at {pos}")]
    UnexpectedChar { ch: char, pos: Position },

    /// A numeric literal with more than one decimal point.
    #[error("malformed number '{text}' at {pos}")]
    MalformedNumber { text: String, pos: Position },

    /// A numeric literal too large to represent.
    #[error("number '{text}' out of range at {pos}")]
    NumberOutOfRange { text: String, pos: Position },
}

impl LexError {
    pub fn pos(&self) -> Position {
        match self {
            LexError::UnexpectedChar { pos, .. }
            | LexError::MalformedNumber { pos, .. }
            | LexError::NumberOutOfRange { pos, .. } => *pos,
        }
    }
}

/// Errors produced while parsing expressions, scripts, or assembly.
///
/// Every variant carries the source position of the offending token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),

    /// A token appeared where something else was required.
    #[error("expected {expected}, found '{found}' at {pos}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        pos: Position,
    },

    /// Input ended where something else was required.
    #[error("expected {expected}, found end of input at {pos}")]
    UnexpectedEnd { expected: &'static str, pos: Position },

    /// A complete expression was followed by more tokens.
    #[error("unexpected trailing input '{found}' at {pos}")]
    TrailingInput { found: String, pos: Position },

    /// An opening parenthesis that is never closed.
    #[error("unclosed '(' at {pos}")]
    UnclosedParen { pos: Position },

    /// A closing parenthesis with no matching opener.
    #[error("unmatched ')' at {pos}")]
    UnmatchedParen { pos: Position },

    /// Parentheses or prefix operators nested past the parser's limit.
    #[error("expression nested too deeply at {pos}")]
    TooDeep { pos: Position },

    /// An expression-only script with no statements.
    #[error("empty program")]
    EmptyProgram,

    /// A mnemonic that is not in the instruction set.
    #[error("unknown mnemonic '{mnemonic}' at {pos}")]
    UnknownMnemonic { mnemonic: String, pos: Position },

    /// Operand count or kinds don't match the mnemonic's shape.
    #[error("'{mnemonic}' expects {expected} operand(s): {usage} (found {found}) at {pos}")]
    WrongOperands {
        mnemonic: &'static str,
        usage: String,
        expected: usize,
        found: usize,
        pos: Position,
    },

    /// A register name outside `r0`..`r7`.
    #[error("invalid register '{name}' at {pos}")]
    InvalidRegister { name: String, pos: Position },

    /// An immediate jump target that is not a non-negative integer.
    #[error("'{mnemonic}' target must be a label or non-negative integer, found '{value}' at {pos}")]
    BadJumpTarget {
        mnemonic: &'static str,
        value: String,
        pos: Position,
    },

    /// A label defined more than once.
    #[error("duplicate label '{label}' at {pos} (first defined on line {first_line})")]
    DuplicateLabel {
        label: String,
        first_line: usize,
        pos: Position,
    },

    /// A label referenced but never defined.
    #[error("unresolved label '{label}' at {pos}")]
    UnresolvedLabel { label: String, pos: Position },
}

impl SyntaxError {
    /// The taxonomy category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyntaxError::Lex(_) => ErrorKind::LexError,
            SyntaxError::UnexpectedToken { .. }
            | SyntaxError::UnexpectedEnd { .. }
            | SyntaxError::TrailingInput { .. }
            | SyntaxError::UnclosedParen { .. }
            | SyntaxError::UnmatchedParen { .. }
            | SyntaxError::TooDeep { .. }
            | SyntaxError::EmptyProgram => ErrorKind::ParseError,
            SyntaxError::UnknownMnemonic { .. }
            | SyntaxError::WrongOperands { .. }
            | SyntaxError::InvalidRegister { .. }
            | SyntaxError::BadJumpTarget { .. } => ErrorKind::InvalidInstruction,
            SyntaxError::DuplicateLabel { .. } => ErrorKind::DuplicateLabel,
            SyntaxError::UnresolvedLabel { .. } => ErrorKind::UnresolvedLabel,
        }
    }

    /// Source position of the error, if it has one.
    pub fn pos(&self) -> Option<Position> {
        match self {
            SyntaxError::Lex(e) => Some(e.pos()),
            SyntaxError::EmptyProgram => None,
            SyntaxError::UnexpectedToken { pos, .. }
            | SyntaxError::UnexpectedEnd { pos, .. }
            | SyntaxError::TrailingInput { pos, .. }
            | SyntaxError::UnclosedParen { pos }
            | SyntaxError::UnmatchedParen { pos }
            | SyntaxError::TooDeep { pos }
            | SyntaxError::UnknownMnemonic { pos, .. }
            | SyntaxError::WrongOperands { pos, .. }
            | SyntaxError::InvalidRegister { pos, .. }
            | SyntaxError::BadJumpTarget { pos, .. }
            | SyntaxError::DuplicateLabel { pos, .. }
            | SyntaxError::UnresolvedLabel { pos, .. } => Some(*pos),
        }
    }

    pub fn location(&self) -> Option<Location> {
        self.pos().map(Location::Source)
    }
}
