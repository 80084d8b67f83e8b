//! Integration tests for the RVM execution engine.
//!
//! Programs are built by hand from instructions so these tests exercise the
//! VM independently of the assembler. Organized by instruction group.

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use rvm_common::{
    BinaryOp, ErrorKind, Expr, Instruction, Label, Location, Opcode, Operand, Position, Program,
    Register, Script, Statement, UnaryOp, Value,
};
use rvm_vm::{eval_expr, eval_script, run, run_with, CancelToken, RuntimeError, VmConfig};

// ============================================================
// Helper functions
// ============================================================

/// Shorthand for an instruction; the source line is `index + 1` once placed
/// by `program`.
fn instr(op: Opcode, operands: Vec<Operand>) -> Instruction {
    Instruction::new(op, operands, 0)
}

fn imm(n: f64) -> Operand {
    Operand::Immediate(Value::new(n).unwrap())
}

fn reg(id: u8) -> Operand {
    Operand::Register(Register::new(id).unwrap())
}

fn label(name: &str) -> Operand {
    Operand::Label(name.to_string())
}

fn push(n: f64) -> Instruction {
    instr(Opcode::Push, vec![imm(n)])
}

fn op(opcode: Opcode) -> Instruction {
    instr(opcode, vec![])
}

fn halt() -> Instruction {
    op(Opcode::Halt)
}

fn v(n: f64) -> Value {
    Value::new(n).unwrap()
}

/// Build a program, numbering lines from 1 and attaching the given labels.
fn program(instructions: Vec<Instruction>, labels: &[(&str, usize)]) -> Program {
    let instructions = instructions
        .into_iter()
        .enumerate()
        .map(|(i, mut ins)| {
            ins.line = i + 1;
            ins
        })
        .collect();
    let labels: BTreeMap<String, Label> = labels
        .iter()
        .map(|&(name, index)| {
            (
                name.to_string(),
                Label {
                    index,
                    line: index + 1,
                },
            )
        })
        .collect();
    Program::new(instructions, labels)
}

fn run_program(instructions: Vec<Instruction>) -> Result<Value, RuntimeError> {
    run(&program(instructions, &[]))
}

fn at(index: usize) -> Location {
    Location::Instruction {
        index,
        line: index + 1,
    }
}

// ============================================================
// Termination and result selection
// ============================================================

#[test]
fn empty_program_returns_zero() {
    assert_eq!(run_program(vec![]), Ok(Value::ZERO));
}

#[test]
fn halt_returns_top_of_stack() {
    let result = run_program(vec![push(1.0), push(2.0), halt()]);
    assert_eq!(result, Ok(v(2.0)));
}

#[test]
fn halt_with_empty_stack_returns_r0() {
    let result = run_program(vec![instr(Opcode::Mov, vec![reg(0), imm(9.0)]), halt()]);
    assert_eq!(result, Ok(v(9.0)));
}

#[test]
fn halt_with_nothing_returns_zero() {
    let result = run_program(vec![instr(Opcode::Mov, vec![reg(1), imm(9.0)]), halt()]);
    assert_eq!(result, Ok(Value::ZERO));
}

#[test]
fn falling_off_the_end_halts() {
    let result = run_program(vec![push(4.0), push(5.0), op(Opcode::Mul)]);
    assert_eq!(result, Ok(v(20.0)));
}

#[test]
fn instructions_after_halt_do_not_run() {
    let result = run_program(vec![push(1.0), halt(), op(Opcode::Drop), op(Opcode::Drop)]);
    assert_eq!(result, Ok(v(1.0)));
}

#[test]
fn ret_with_empty_call_stack_halts() {
    let result = run_program(vec![push(3.0), op(Opcode::Ret), push(4.0)]);
    assert_eq!(result, Ok(v(3.0)));
}

#[test]
fn entry_point_is_main_label() {
    let p = program(vec![push(1.0), halt(), push(2.0), halt()], &[("main", 2)]);
    assert_eq!(run(&p), Ok(v(2.0)));
}

#[test]
fn main_at_end_halts_immediately() {
    let p = program(vec![push(1.0)], &[("main", 1)]);
    assert_eq!(run(&p), Ok(Value::ZERO));
}

// ============================================================
// Stack instructions
// ============================================================

#[test]
fn push_register_value() {
    let result = run_program(vec![
        instr(Opcode::Mov, vec![reg(3), imm(-2.5)]),
        instr(Opcode::Push, vec![reg(3)]),
        halt(),
    ]);
    assert_eq!(result, Ok(v(-2.5)));
}

#[test]
fn pop_into_register() {
    let result = run_program(vec![
        push(11.0),
        instr(Opcode::Pop, vec![reg(0)]),
        halt(),
    ]);
    // Stack is empty at halt, so r0 is the result.
    assert_eq!(result, Ok(v(11.0)));
}

#[test]
fn dup_duplicates_top() {
    let result = run_program(vec![push(6.0), op(Opcode::Dup), op(Opcode::Mul), halt()]);
    assert_eq!(result, Ok(v(36.0)));
}

#[test]
fn swap_exchanges_top_two() {
    let result = run_program(vec![push(1.0), push(8.0), op(Opcode::Swap), op(Opcode::Div)]);
    assert_eq!(result, Ok(v(8.0)));
}

#[test]
fn drop_discards_top() {
    let result = run_program(vec![push(1.0), push(2.0), op(Opcode::Drop), halt()]);
    assert_eq!(result, Ok(v(1.0)));
}

#[test]
fn pop_on_empty_stack_underflows() {
    let result = run_program(vec![instr(Opcode::Pop, vec![reg(0)])]);
    assert_eq!(result, Err(RuntimeError::StackUnderflow { at: at(0) }));
}

#[test]
fn add_with_one_value_underflows() {
    let result = run_program(vec![push(1.0), op(Opcode::Nop), op(Opcode::Add)]);
    assert_eq!(result, Err(RuntimeError::StackUnderflow { at: at(2) }));
}

#[test]
fn dup_and_swap_underflow() {
    assert_eq!(
        run_program(vec![op(Opcode::Dup)]).unwrap_err().kind(),
        ErrorKind::StackUnderflow
    );
    assert_eq!(
        run_program(vec![push(1.0), op(Opcode::Swap)])
            .unwrap_err()
            .kind(),
        ErrorKind::StackUnderflow
    );
}

#[test]
fn stack_overflow_at_limit() {
    let p = program(
        vec![push(1.0), instr(Opcode::Jmp, vec![label("top")])],
        &[("top", 0)],
    );
    let config = VmConfig::default().with_max_stack_depth(10);
    let err = run_with(&p, &config).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::StackOverflow {
            limit: 10,
            at: at(0)
        }
    );
}

// ============================================================
// Register instructions
// ============================================================

#[test]
fn mov_register_to_register() {
    let result = run_program(vec![
        instr(Opcode::Mov, vec![reg(1), imm(5.0)]),
        instr(Opcode::Mov, vec![reg(0), reg(1)]),
        halt(),
    ]);
    assert_eq!(result, Ok(v(5.0)));
}

#[test]
fn inc_and_dec() {
    let result = run_program(vec![
        instr(Opcode::Mov, vec![reg(2), imm(10.0)]),
        instr(Opcode::Inc, vec![reg(2)]),
        instr(Opcode::Inc, vec![reg(2)]),
        instr(Opcode::Dec, vec![reg(2)]),
        instr(Opcode::Push, vec![reg(2)]),
    ]);
    assert_eq!(result, Ok(v(11.0)));
}

#[test]
fn reading_unset_register_fails() {
    let result = run_program(vec![push(1.0), instr(Opcode::Push, vec![reg(5)])]);
    assert_eq!(
        result,
        Err(RuntimeError::UndefinedRegister {
            register: Register::new(5).unwrap(),
            at: at(1)
        })
    );
}

#[test]
fn mov_from_unset_register_fails() {
    let err = run_program(vec![instr(Opcode::Mov, vec![reg(0), reg(7)])]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UndefinedRegister);
}

// ============================================================
// Arithmetic and comparison
// ============================================================

fn binary(a: f64, b: f64, opcode: Opcode) -> Result<Value, RuntimeError> {
    run_program(vec![push(a), push(b), op(opcode), halt()])
}

#[test]
fn arithmetic_operand_order() {
    assert_eq!(binary(7.0, 2.0, Opcode::Add), Ok(v(9.0)));
    assert_eq!(binary(7.0, 2.0, Opcode::Sub), Ok(v(5.0)));
    assert_eq!(binary(7.0, 2.0, Opcode::Mul), Ok(v(14.0)));
    assert_eq!(binary(7.0, 2.0, Opcode::Div), Ok(v(3.5)));
    assert_eq!(binary(7.0, 2.0, Opcode::Mod), Ok(v(1.0)));
}

#[test]
fn comparisons_push_one_or_zero() {
    assert_eq!(binary(3.0, 3.0, Opcode::Eq), Ok(Value::ONE));
    assert_eq!(binary(3.0, 4.0, Opcode::Eq), Ok(Value::ZERO));
    assert_eq!(binary(3.0, 4.0, Opcode::Lt), Ok(Value::ONE));
    assert_eq!(binary(4.0, 3.0, Opcode::Lt), Ok(Value::ZERO));
    assert_eq!(binary(4.0, 3.0, Opcode::Gt), Ok(Value::ONE));
}

#[test]
fn neg_flips_sign() {
    let result = run_program(vec![push(4.0), op(Opcode::Neg)]);
    assert_eq!(result, Ok(v(-4.0)));
    let result = run_program(vec![push(0.0), op(Opcode::Neg)]);
    assert_eq!(result.map(|v| v.to_string()), Ok("0".to_string()));
}

#[test]
fn division_by_zero() {
    assert_eq!(
        binary(1.0, 0.0, Opcode::Div),
        Err(RuntimeError::DivisionByZero { at: at(2) })
    );
    assert_eq!(
        binary(1.0, 0.0, Opcode::Mod).unwrap_err().kind(),
        ErrorKind::DivisionByZero
    );
}

#[test]
fn overflow_is_an_error() {
    let err = binary(1e308, 1e308, Opcode::Add).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::NumericOverflow {
            op: "+",
            at: at(2)
        }
    );
}

// ============================================================
// Control flow
// ============================================================

#[test]
fn jmp_skips_instructions() {
    let p = program(
        vec![
            push(1.0),
            instr(Opcode::Jmp, vec![label("end")]),
            push(99.0),
            halt(),
        ],
        &[("end", 3)],
    );
    assert_eq!(run(&p), Ok(v(1.0)));
}

#[test]
fn jmp_to_immediate_index() {
    let result = run_program(vec![instr(Opcode::Jmp, vec![imm(2.0)]), push(99.0), push(5.0)]);
    assert_eq!(result, Ok(v(5.0)));
}

#[test]
fn jmp_to_len_is_implicit_halt() {
    let result = run_program(vec![push(7.0), instr(Opcode::Jmp, vec![imm(3.0)]), push(9.0)]);
    assert_eq!(result, Ok(v(7.0)));
}

#[test]
fn jmp_past_end_is_invalid() {
    let result = run_program(vec![instr(Opcode::Jmp, vec![imm(5.0)]), halt()]);
    assert_eq!(
        result,
        Err(RuntimeError::InvalidJumpTarget {
            target: "5".to_string(),
            len: 2,
            at: at(0)
        })
    );
}

#[test]
fn fractional_immediate_target_is_invalid() {
    let err = run_program(vec![instr(Opcode::Jmp, vec![imm(0.5)])]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidJumpTarget);
}

#[test]
fn unknown_label_in_hand_built_program() {
    let err = run_program(vec![instr(Opcode::Jmp, vec![label("nowhere")])]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnresolvedLabel);
}

#[test]
fn jz_and_jnz() {
    // jz taken when zero
    let p = program(
        vec![
            push(0.0),
            instr(Opcode::Jz, vec![label("yes")]),
            push(1.0),
            halt(),
            push(2.0),
        ],
        &[("yes", 4)],
    );
    assert_eq!(run(&p), Ok(v(2.0)));

    // jnz not taken when zero
    let p = program(
        vec![
            push(0.0),
            instr(Opcode::Jnz, vec![label("yes")]),
            push(1.0),
            halt(),
            push(2.0),
        ],
        &[("yes", 4)],
    );
    assert_eq!(run(&p), Ok(v(1.0)));
}

#[test]
fn jz_pops_its_operand() {
    let result = run_program(vec![push(5.0), push(1.0), instr(Opcode::Jz, vec![imm(0.0)])]);
    assert_eq!(result, Ok(v(5.0)));
}

#[test]
fn countdown_loop() {
    // r0 = 5; r1 = 0; loop: r1 += r0; r0 -= 1; jnz r0 loop
    let p = program(
        vec![
            instr(Opcode::Mov, vec![reg(0), imm(5.0)]),
            instr(Opcode::Mov, vec![reg(1), imm(0.0)]),
            instr(Opcode::Push, vec![reg(1)]),
            instr(Opcode::Push, vec![reg(0)]),
            op(Opcode::Add),
            instr(Opcode::Pop, vec![reg(1)]),
            instr(Opcode::Dec, vec![reg(0)]),
            instr(Opcode::Push, vec![reg(0)]),
            instr(Opcode::Jnz, vec![label("loop")]),
            instr(Opcode::Push, vec![reg(1)]),
            halt(),
        ],
        &[("loop", 2)],
    );
    assert_eq!(run(&p), Ok(v(15.0)));
}

#[test]
fn call_and_ret() {
    // main: push 3; call square; halt   square: dup; mul; ret
    let p = program(
        vec![
            push(3.0),
            instr(Opcode::Call, vec![label("square")]),
            push(1.0),
            op(Opcode::Add),
            halt(),
            op(Opcode::Dup),
            op(Opcode::Mul),
            op(Opcode::Ret),
        ],
        &[("square", 5)],
    );
    assert_eq!(run(&p), Ok(v(10.0)));
}

#[test]
fn nested_calls() {
    let p = program(
        vec![
            push(1.0),
            instr(Opcode::Call, vec![label("outer")]),
            halt(),
            // outer:
            instr(Opcode::Call, vec![label("inner")]),
            push(10.0),
            op(Opcode::Mul),
            op(Opcode::Ret),
            // inner:
            push(2.0),
            op(Opcode::Add),
            op(Opcode::Ret),
        ],
        &[("outer", 3), ("inner", 7)],
    );
    assert_eq!(run(&p), Ok(v(30.0)));
}

#[test]
fn unbounded_recursion_overflows_call_stack() {
    let p = program(vec![instr(Opcode::Call, vec![label("f")])], &[("f", 0)]);
    let err = run(&p).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::CallDepthExceeded {
            limit: 256,
            at: at(0)
        }
    );
    assert_eq!(err.kind(), ErrorKind::StackOverflow);
}

// ============================================================
// Limits and cancellation
// ============================================================

#[test]
fn infinite_loop_hits_step_limit() {
    let p = program(vec![instr(Opcode::Jmp, vec![label("loop")])], &[("loop", 0)]);
    let err = run(&p).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::ExecutionLimitExceeded {
            limit: 100_000,
            at: at(0)
        }
    );
}

#[test]
fn step_limit_is_exact() {
    let instructions = vec![op(Opcode::Nop), op(Opcode::Nop), op(Opcode::Nop)];
    let p = program(instructions, &[]);

    let exact = VmConfig::default().with_max_steps(3);
    assert_eq!(run_with(&p, &exact), Ok(Value::ZERO));

    let short = VmConfig::default().with_max_steps(2);
    assert_eq!(
        run_with(&p, &short),
        Err(RuntimeError::ExecutionLimitExceeded {
            limit: 2,
            at: at(2)
        })
    );
}

#[test]
fn cancelled_before_start() {
    let token = CancelToken::new();
    token.cancel();
    let config = VmConfig::default().with_cancel_token(token);
    let p = program(vec![push(1.0)], &[]);
    assert_eq!(
        run_with(&p, &config),
        Err(RuntimeError::Cancelled { at: at(0) })
    );
}

#[test]
fn cancelled_from_another_thread() {
    let token = CancelToken::new();
    let config = VmConfig::default()
        .with_max_steps(u64::MAX)
        .with_cancel_token(token.clone());
    let p = program(vec![instr(Opcode::Jmp, vec![label("spin")])], &[("spin", 0)]);

    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        token.cancel();
    });
    let err = run_with(&p, &config).unwrap_err();
    canceller.join().unwrap();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

// ============================================================
// Expression mode
// ============================================================

fn lit(n: f64) -> Expr {
    Expr::Literal(v(n))
}

fn bin(op: BinaryOp, left: Expr, right: Expr, column: usize) -> Expr {
    Expr::binary(op, left, right, Position::new(1, column))
}

#[test]
fn expression_precedence_tree() {
    // (2 + 3) * 4
    let expr = bin(
        BinaryOp::Mul,
        bin(BinaryOp::Add, lit(2.0), lit(3.0), 3),
        lit(4.0),
        6,
    );
    assert_eq!(eval_expr(&expr), Ok(v(20.0)));
}

#[test]
fn expression_comparison_yields_flag() {
    let expr = bin(BinaryOp::Le, lit(2.0), lit(2.0), 3);
    assert_eq!(eval_expr(&expr), Ok(Value::ONE));
}

#[test]
fn expression_division_by_zero_location() {
    let expr = bin(BinaryOp::Div, lit(5.0), lit(0.0), 2);
    let err = eval_expr(&expr).unwrap_err();
    assert_eq!(err.location(), Location::Source(Position::new(1, 2)));
    assert_eq!(err.to_string(), "division by zero at line 1, column 2");
}

#[test]
fn expression_unary_minus() {
    let expr = Expr::unary(UnaryOp::Neg, lit(0.5), Position::new(1, 1));
    assert_eq!(eval_expr(&expr), Ok(v(-0.5)));
}

#[test]
fn script_uses_previous_assignments() {
    let script = Script::new(vec![
        Statement::Assign {
            name: "width".into(),
            value: lit(3.0),
            line: 1,
        },
        Statement::Expr {
            expr: bin(
                BinaryOp::Mul,
                Expr::Variable {
                    name: "width".into(),
                    pos: Position::new(2, 1),
                },
                lit(2.0),
                7,
            ),
            line: 2,
        },
    ]);
    assert_eq!(eval_script(&script), Ok(v(6.0)));
}

#[test]
fn script_undefined_variable() {
    let script = Script::new(vec![Statement::Expr {
        expr: Expr::Variable {
            name: "ghost".into(),
            pos: Position::new(1, 1),
        },
        line: 1,
    }]);
    assert_eq!(
        eval_script(&script),
        Err(RuntimeError::UndefinedVariable {
            name: "ghost".into(),
            at: Location::Source(Position::new(1, 1))
        })
    );
}

// ============================================================
// Properties
// ============================================================

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// push a; push b; add agrees with f64 addition.
        #[test]
        fn add_matches_float(a in -1e9f64..1e9, b in -1e9f64..1e9) {
            let result = run_program(vec![push(a), push(b), op(Opcode::Add)]).unwrap();
            prop_assert_eq!(result, v(a + b));
        }

        /// Any program of only pushes and nops halts with the last push.
        #[test]
        fn straight_line_pushes(values in prop::collection::vec(-1000i32..1000, 1..50)) {
            let instructions: Vec<_> = values
                .iter()
                .flat_map(|&n| [push(f64::from(n)), op(Opcode::Nop)])
                .collect();
            let last = *values.last().unwrap();
            prop_assert_eq!(run_program(instructions), Ok(Value::from(last)));
        }

        /// A self-loop always stops at exactly the configured step limit.
        #[test]
        fn self_loop_respects_limit(limit in 1u64..5000) {
            let p = program(vec![instr(Opcode::Jmp, vec![imm(0.0)])], &[]);
            let config = VmConfig::default().with_max_steps(limit);
            let err = run_with(&p, &config).unwrap_err();
            prop_assert_eq!(err, RuntimeError::ExecutionLimitExceeded { limit, at: at(0) });
        }
    }
}
