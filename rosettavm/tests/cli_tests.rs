//! Integration tests for the `rvm` CLI.
//!
//! These tests invoke the `rvm` binary as a subprocess and check
//! exit codes, stdout, and stderr.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[allow(deprecated)]
fn rvm() -> Command {
    Command::cargo_bin("rvm").unwrap()
}

/// Return the workspace root (parent of rosettavm/).
fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .to_path_buf()
}

/// Return the absolute path to a test program file.
fn test_program(name: &str) -> PathBuf {
    workspace_root().join("tests/programs").join(name)
}

/// Helper: write source text to a temp file and return its path.
fn write_temp(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

// ---- No-args / help ----

#[test]
fn no_args_prints_usage_and_exits_1() {
    rvm()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Usage: rvm"));
}

#[test]
fn help_flag_exits_0() {
    rvm()
        .arg("--help")
        .assert()
        .success()
        .stderr(predicate::str::contains("Commands:"));
}

#[test]
fn unknown_command_exits_1() {
    rvm()
        .arg("frobnicate")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown command"));
}

#[test]
fn version_prints_name_and_semver() {
    rvm()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("rosettavm "));
}

// ---- calc ----

#[test]
fn calc_precedence() {
    rvm()
        .args(["calc", "2+3*4"])
        .assert()
        .success()
        .stdout("14\n");
}

#[test]
fn calc_joins_arguments() {
    rvm()
        .args(["calc", "(2", "+", "3)", "*", "4"])
        .assert()
        .success()
        .stdout("20\n");
}

#[test]
fn calc_division_by_zero_exits_3() {
    rvm()
        .args(["calc", "5/0"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains(
            "DivisionByZero: division by zero at line 1, column 2",
        ));
}

#[test]
fn calc_syntax_error_exits_1() {
    rvm()
        .args(["calc", "2+*3"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("ParseError:"));
}

#[test]
fn calc_malformed_number_exits_1() {
    rvm()
        .args(["calc", "2..3"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("LexError:"));
}

#[test]
fn calc_without_expression_exits_1() {
    rvm()
        .arg("calc")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("requires an expression"));
}

// ---- run ----

#[test]
fn run_sum_loop() {
    rvm()
        .args(["run", test_program("sum_to_ten.rvm").to_str().unwrap()])
        .assert()
        .success()
        .stdout("55\n");
}

#[test]
fn run_subroutine() {
    rvm()
        .args(["run", test_program("factorial.rvm").to_str().unwrap()])
        .assert()
        .success()
        .stdout("720\n");
}

#[test]
fn run_runtime_error_exits_3() {
    rvm()
        .args(["run", test_program("divide_by_zero.rvm").to_str().unwrap()])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains(
            "DivisionByZero: division by zero at instruction 2 (line 3)",
        ));
}

#[test]
fn run_unresolved_label_exits_1() {
    rvm()
        .args(["run", test_program("bad_label.rvm").to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("UnresolvedLabel: unresolved label 'finish'"));
}

#[test]
fn run_infinite_loop_hits_limit() {
    rvm()
        .args([
            "run",
            test_program("spin.rvm").to_str().unwrap(),
            "--max-steps",
            "50",
        ])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains(
            "ExecutionLimitExceeded: execution limit of 50 steps exceeded",
        ));
}

#[test]
fn run_bad_max_steps_exits_1() {
    rvm()
        .args([
            "run",
            test_program("spin.rvm").to_str().unwrap(),
            "--max-steps",
            "lots",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid --max-steps"));
}

#[test]
fn run_missing_file_exits_1() {
    rvm()
        .args(["run", "/nonexistent/prog.rvm"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn run_temp_program() {
    let dir = TempDir::new().unwrap();
    let path = write_temp(&dir, "prog.rvm", "MOV r0, 2.5\nhalt\n");
    rvm()
        .args(["run", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout("2.5\n");
}

#[test]
fn verbose_logs_to_stderr() {
    let dir = TempDir::new().unwrap();
    let path = write_temp(&dir, "prog.rvm", "push 1\n");
    rvm()
        .args(["-v", "run", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout("1\n")
        .stderr(predicate::str::contains("[DEBUG"));
}

#[test]
fn quiet_by_default() {
    let dir = TempDir::new().unwrap();
    let path = write_temp(&dir, "prog.rvm", "push 1\n");
    rvm()
        .args(["run", path.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

// ---- expr ----

#[test]
fn expr_script_with_assignments() {
    rvm()
        .args(["expr", test_program("area.expr").to_str().unwrap()])
        .assert()
        .success()
        .stdout("30\n");
}

#[test]
fn expr_undefined_variable_exits_3() {
    rvm()
        .args(["expr", test_program("undefined.expr").to_str().unwrap()])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("UndefinedVariable: undefined variable 'b'"));
}

#[test]
fn expr_empty_script_exits_1() {
    let dir = TempDir::new().unwrap();
    let path = write_temp(&dir, "empty.expr", "# nothing\n\n");
    rvm()
        .args(["expr", path.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("ParseError: empty program"));
}

// ---- parse ----

#[test]
fn parse_prints_json_report() {
    let output = rvm()
        .args(["parse", test_program("sum_to_ten.rvm").to_str().unwrap()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["instruction_count"], 11);
    assert_eq!(report["entry"], 0);
    assert_eq!(report["labels"][0]["name"], "loop");
    assert_eq!(report["labels"][1]["name"], "main");
    assert_eq!(report["instructions"][0]["mnemonic"], "mov");
}

#[test]
fn parse_duplicate_label_exits_1() {
    let dir = TempDir::new().unwrap();
    let path = write_temp(&dir, "dup.rvm", "top: nop\ntop: halt\n");
    rvm()
        .args(["parse", path.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("DuplicateLabel: duplicate label 'top'"));
}

// ---- Programs run through the library and the binary agree ----

#[test]
fn binary_matches_library() {
    for name in ["sum_to_ten.rvm", "factorial.rvm"] {
        let path = test_program(name);
        let source = fs::read_to_string(&path).unwrap();
        let expected = format!("{}\n", rosettavm::evaluate(&source));
        rvm()
            .args(["run", path.to_str().unwrap()])
            .assert()
            .success()
            .stdout(expected);
    }
}
