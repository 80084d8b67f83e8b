//! Program representation: an instruction sequence plus its label table.

use std::collections::BTreeMap;

use crate::instruction::{Instruction, Operand};

/// Label that, when defined, marks where execution starts.
pub const ENTRY_LABEL: &str = "main";

/// A resolved label definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    /// Index of the instruction the label points at. Equal to the program
    /// length when the label follows the last instruction.
    pub index: usize,
    /// 1-based source line of the definition.
    pub line: usize,
}

/// An assembled RVM program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    /// The instruction stream.
    pub instructions: Vec<Instruction>,
    /// Label name to definition. Names are unique.
    pub labels: BTreeMap<String, Label>,
}

impl Program {
    /// Create a new program from instructions and a label table.
    pub fn new(instructions: Vec<Instruction>, labels: BTreeMap<String, Label>) -> Self {
        Self {
            instructions,
            labels,
        }
    }

    /// Number of instructions in the program.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Look up a label's instruction index.
    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.labels.get(name).map(|label| label.index)
    }

    /// Where execution starts: the `main` label if defined, otherwise 0.
    pub fn entry(&self) -> usize {
        self.resolve(ENTRY_LABEL).unwrap_or(0)
    }

    /// Every label referenced by an operand, with the index of the
    /// referencing instruction, in program order.
    pub fn label_references(&self) -> impl Iterator<Item = (usize, &str)> {
        self.instructions
            .iter()
            .enumerate()
            .flat_map(|(idx, instr)| {
                instr.operands.iter().filter_map(move |op| match op {
                    Operand::Label(name) => Some((idx, name.as_str())),
                    _ => None,
                })
            })
    }
}
