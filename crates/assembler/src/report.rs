//! Debug report: an assembled program as structured, serializable data.
//!
//! The report mirrors the assembler's output exactly. Field order is fixed
//! by the struct definitions, and labels are listed in name order, so the
//! JSON form is stable across runs.

use rvm_common::{Operand, Program, Value};
use serde::Serialize;
use serde_json::Number;

/// Top-level report for one program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugReport {
    pub instruction_count: usize,
    /// Index where execution starts.
    pub entry: usize,
    pub labels: Vec<LabelReport>,
    pub instructions: Vec<InstructionReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelReport {
    pub name: String,
    pub index: usize,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstructionReport {
    pub index: usize,
    pub line: usize,
    pub mnemonic: &'static str,
    /// Canonical assembly text, e.g. `mov r0, 5`.
    pub text: String,
    pub operands: Vec<OperandReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperandReport {
    Immediate { value: Number },
    Register { id: u8, name: String },
    Label { name: String, target: usize },
}

/// Integral values serialize as JSON integers, everything else as floats.
fn number(value: Value) -> Number {
    match value.as_integer() {
        Some(n) => Number::from(n),
        // Values are finite, so from_f64 only fails on a broken invariant.
        None => Number::from_f64(value.as_f64()).unwrap_or_else(|| Number::from(0)),
    }
}

fn operand_report(program: &Program, operand: &Operand) -> OperandReport {
    match operand {
        Operand::Immediate(value) => OperandReport::Immediate {
            value: number(*value),
        },
        Operand::Register(reg) => OperandReport::Register {
            id: reg.id(),
            name: reg.to_string(),
        },
        Operand::Label(name) => OperandReport::Label {
            name: name.clone(),
            // Assembly guarantees every referenced label resolves.
            target: program.resolve(name).unwrap_or(program.len()),
        },
    }
}

impl DebugReport {
    /// Build the report for an assembled program.
    pub fn new(program: &Program) -> Self {
        let labels = program
            .labels
            .iter()
            .map(|(name, label)| LabelReport {
                name: name.clone(),
                index: label.index,
                line: label.line,
            })
            .collect();

        let instructions = program
            .instructions
            .iter()
            .enumerate()
            .map(|(index, instr)| InstructionReport {
                index,
                line: instr.line,
                mnemonic: instr.opcode.mnemonic(),
                text: instr.to_string(),
                operands: instr
                    .operands
                    .iter()
                    .map(|op| operand_report(program, op))
                    .collect(),
            })
            .collect();

        Self {
            instruction_count: program.len(),
            entry: program.entry(),
            labels,
            instructions,
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("debug report holds only strings and numbers")
    }
}
