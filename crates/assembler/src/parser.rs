//! Parser for RVM assembly lines → instructions.
//!
//! A line is blank, a label definition (`name:`), an instruction, or a label
//! followed by an instruction. Operands are comma-separated and checked
//! against the opcode's fixed shape.

use rvm_common::{Instruction, Opcode, Operand, OperandKind, Position, Register};

use crate::error::SyntaxError;
use crate::lexer::{Lexer, Token, TokenKind};

/// A label defined on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LabelDef {
    pub name: String,
    pub pos: Position,
}

/// An instruction plus the labels its operands refer to, kept for the
/// assembler's resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedInstruction {
    pub instruction: Instruction,
    pub label_refs: Vec<(String, Position)>,
}

/// Result of parsing a single non-blank line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedLine {
    pub label: Option<LabelDef>,
    pub instruction: Option<ParsedInstruction>,
}

fn unexpected(expected: &'static str, token: &Token) -> SyntaxError {
    if token.is_end() {
        SyntaxError::UnexpectedEnd {
            expected,
            pos: token.pos,
        }
    } else {
        SyntaxError::UnexpectedToken {
            expected,
            found: token.kind.to_string(),
            pos: token.pos,
        }
    }
}

/// Parse one line of assembly.
///
/// Returns `Ok(None)` for blank and comment-only lines.
pub(crate) fn parse_line(
    mut lexer: Lexer<'_>,
    line_num: usize,
) -> Result<Option<ParsedLine>, SyntaxError> {
    let first = lexer.next_token()?;
    if first.is_end() {
        return Ok(None);
    }

    let name = match &first.kind {
        TokenKind::Identifier(name) => name.clone(),
        _ => return Err(unexpected("a mnemonic or label", &first)),
    };

    let mut probe = lexer.clone();
    let (label, head) = if probe.next_token()?.is_punct(':') {
        if Register::looks_like_register(&name) {
            return Err(SyntaxError::UnexpectedToken {
                expected: "a label name that is not a register",
                found: name,
                pos: first.pos,
            });
        }
        lexer = probe;
        let head = lexer.next_token()?;
        (
            Some(LabelDef {
                name,
                pos: first.pos,
            }),
            head,
        )
    } else {
        (None, first)
    };

    let instruction = if head.is_end() {
        None
    } else {
        Some(parse_instruction(head, &mut lexer, line_num)?)
    };

    Ok(Some(ParsedLine { label, instruction }))
}

fn parse_instruction(
    head: Token,
    lexer: &mut Lexer<'_>,
    line_num: usize,
) -> Result<ParsedInstruction, SyntaxError> {
    let opcode = match &head.kind {
        TokenKind::Identifier(mnemonic) => {
            mnemonic
                .parse::<Opcode>()
                .map_err(|_| SyntaxError::UnknownMnemonic {
                    mnemonic: mnemonic.clone(),
                    pos: head.pos,
                })?
        }
        _ => return Err(unexpected("a mnemonic", &head)),
    };

    let mut operands = Vec::new();
    let mut positions = Vec::new();

    let mut token = lexer.next_token()?;
    if !token.is_end() {
        loop {
            let pos = token.pos;
            operands.push(parse_operand(token, lexer)?);
            positions.push(pos);

            let sep = lexer.next_token()?;
            if sep.is_end() {
                break;
            }
            if !sep.is_punct(',') {
                return Err(unexpected("',' or end of line", &sep));
            }
            token = lexer.next_token()?;
            if token.is_end() {
                return Err(unexpected("an operand", &token));
            }
        }
    }

    check_shape(opcode, &operands, &positions, head.pos)?;

    let label_refs = operands
        .iter()
        .zip(&positions)
        .filter_map(|(operand, pos)| match operand {
            Operand::Label(name) => Some((name.clone(), *pos)),
            _ => None,
        })
        .collect();

    Ok(ParsedInstruction {
        instruction: Instruction::new(opcode, operands, line_num),
        label_refs,
    })
}

fn parse_operand(token: Token, lexer: &mut Lexer<'_>) -> Result<Operand, SyntaxError> {
    let pos = token.pos;
    match token.kind {
        TokenKind::Number(value) => Ok(Operand::Immediate(value)),
        TokenKind::Operator(sign @ ("-" | "+")) => {
            let next = lexer.next_token()?;
            match next.kind {
                TokenKind::Number(value) if sign == "-" => Ok(Operand::Immediate(value.negated())),
                TokenKind::Number(value) => Ok(Operand::Immediate(value)),
                _ => Err(unexpected("a number", &next)),
            }
        }
        TokenKind::Identifier(name) if Register::looks_like_register(&name) => name
            .parse::<Register>()
            .map(Operand::Register)
            .map_err(|_| SyntaxError::InvalidRegister { name, pos }),
        TokenKind::Identifier(name) => Ok(Operand::Label(name)),
        kind => Err(unexpected("an operand", &Token::new(kind, pos))),
    }
}

/// Check operand count and kinds against the opcode's shape.
fn check_shape(
    opcode: Opcode,
    operands: &[Operand],
    positions: &[Position],
    pos: Position,
) -> Result<(), SyntaxError> {
    let shape = opcode.shape();
    let mismatch = operands.len() != opcode.arity()
        || operands
            .iter()
            .zip(shape)
            .any(|(operand, kind)| !operand.fits(*kind));

    if mismatch {
        return Err(SyntaxError::WrongOperands {
            mnemonic: opcode.mnemonic(),
            usage: opcode.usage(),
            expected: opcode.arity(),
            found: operands.len(),
            pos,
        });
    }

    for ((operand, kind), operand_pos) in operands.iter().zip(shape).zip(positions) {
        if let (OperandKind::Target, Operand::Immediate(value)) = (kind, operand) {
            if value.as_index().is_none() {
                return Err(SyntaxError::BadJumpTarget {
                    mnemonic: opcode.mnemonic(),
                    value: value.to_string(),
                    pos: *operand_pos,
                });
            }
        }
    }

    Ok(())
}
