//! RosettaVM front end: lexer, expression parser, and assembler.
//!
//! Three pipelines share one [`Lexer`]:
//!
//! - [`parse_expression`]: a single arithmetic expression
//! - [`parse_script`]: an expression-only script, one statement per line
//! - [`assemble`]: RVM assembly to a [`Program`] with resolved labels
//!
//! [`DebugReport`] turns an assembled program into structured data.
//!
//! # Usage
//!
//! ```
//! use rvm_assembler::{assemble, DebugReport};
//!
//! let program = assemble("push 2\npush 3\nadd\nhalt\n").unwrap();
//! assert_eq!(program.len(), 4);
//!
//! let report = DebugReport::new(&program);
//! assert_eq!(report.instructions[2].mnemonic, "add");
//! ```
//!
//! Every function returns the first error encountered; there is no
//! recovery.

pub mod error;
pub mod lexer;
pub mod report;

mod expr;
mod parser;

pub use error::{LexError, SyntaxError};
pub use expr::{parse_expression, parse_script, MAX_NESTING};
pub use lexer::{tokenize, Lexer, Token, TokenKind};
pub use report::DebugReport;

use std::collections::BTreeMap;

use log::debug;
use parser::parse_line;
use rvm_common::{Label, Program};

/// Assemble source text into a program.
///
/// Labels are collected in a first pass over the lines, then every label
/// reference is checked in a second pass.
pub fn assemble(text: &str) -> Result<Program, SyntaxError> {
    let mut instructions = Vec::new();
    let mut labels: BTreeMap<String, Label> = BTreeMap::new();
    let mut references = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_num = idx + 1;
        let Some(parsed) = parse_line(Lexer::at_line(line, line_num), line_num)? else {
            continue;
        };

        if let Some(def) = parsed.label {
            if let Some(existing) = labels.get(&def.name) {
                return Err(SyntaxError::DuplicateLabel {
                    label: def.name,
                    first_line: existing.line,
                    pos: def.pos,
                });
            }
            labels.insert(
                def.name,
                Label {
                    index: instructions.len(),
                    line: line_num,
                },
            );
        }

        if let Some(parsed) = parsed.instruction {
            references.extend(parsed.label_refs);
            instructions.push(parsed.instruction);
        }
    }

    for (label, pos) in references {
        if !labels.contains_key(&label) {
            return Err(SyntaxError::UnresolvedLabel { label, pos });
        }
    }

    debug!(
        "assembled {} instruction(s), {} label(s)",
        instructions.len(),
        labels.len()
    );

    Ok(Program::new(instructions, labels))
}
