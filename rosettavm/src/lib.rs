//! RosettaVM: a small stack-and-register virtual machine with an
//! arithmetic front end.
//!
//! Four string-in, string-out operations cover the whole surface:
//!
//! - [`calculate`]: evaluate one arithmetic expression
//! - [`evaluate_expr`]: run an expression-only script (`name = expr` lines)
//! - [`evaluate`]: assemble and run an RVM assembly program
//! - [`parse_rvm`]: assemble a program and describe it as JSON
//!
//! Each returns either the result or error text of the form
//! `"<Kind>: <message>"`. The `try_*` variants return a typed
//! [`Result`] with a [`Failure`] instead.
//!
//! # Usage
//!
//! ```
//! assert_eq!(rosettavm::calculate("2+3*4"), "14");
//! assert_eq!(
//!     rosettavm::calculate("5/0"),
//!     "DivisionByZero: division by zero at line 1, column 2"
//! );
//! assert_eq!(rosettavm::evaluate("push 2\npush 3\nadd\nhalt\n"), "5");
//! ```

use std::panic;
use std::sync::Once;

use log::{debug, error};
use thiserror::Error;

pub use rvm_assembler::DebugReport;
pub use rvm_common::{ErrorKind, Location, Value};
pub use rvm_vm::{CancelToken, VmConfig};

use rvm_assembler::{assemble, parse_expression, parse_script, SyntaxError};
use rvm_vm::RuntimeError;

/// Version string reported by [`version`].
pub const VERSION: &str = concat!("rosettavm ", env!("CARGO_PKG_VERSION"));

/// Any error from any stage, reduced to its category, message, and location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct Failure {
    pub kind: ErrorKind,
    /// Human-readable description, including the location when known.
    pub message: String,
    pub location: Option<Location>,
}

impl Failure {
    /// Whether the failure happened while running, as opposed to while
    /// reading the source.
    pub fn is_runtime(&self) -> bool {
        !matches!(
            self.kind,
            ErrorKind::LexError
                | ErrorKind::ParseError
                | ErrorKind::InvalidInstruction
                | ErrorKind::DuplicateLabel
                | ErrorKind::UnresolvedLabel
        )
    }
}

impl From<SyntaxError> for Failure {
    fn from(e: SyntaxError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
            location: e.location(),
        }
    }
}

impl From<RuntimeError> for Failure {
    fn from(e: RuntimeError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
            location: Some(e.location()),
        }
    }
}

fn logged<T>(op: &str, result: Result<T, Failure>) -> Result<T, Failure> {
    if let Err(failure) = &result {
        debug!("{op} failed: {failure}");
    }
    result
}

fn render<T: ToString>(result: Result<T, Failure>) -> String {
    match result {
        Ok(value) => value.to_string(),
        Err(failure) => failure.to_string(),
    }
}

/// Evaluate a single arithmetic expression.
pub fn try_calculate(expr: &str) -> Result<Value, Failure> {
    let result = parse_expression(expr)
        .map_err(Failure::from)
        .and_then(|tree| rvm_vm::eval_expr(&tree).map_err(Failure::from));
    logged("calculate", result)
}

/// Run an expression-only script and return the value of its last
/// statement.
pub fn try_evaluate_expr(source: &str) -> Result<Value, Failure> {
    let result = parse_script(source)
        .map_err(Failure::from)
        .and_then(|script| rvm_vm::eval_script(&script).map_err(Failure::from));
    logged("evaluate_expr", result)
}

/// Assemble and run a program with the default limits.
pub fn try_evaluate(source: &str) -> Result<Value, Failure> {
    try_evaluate_with(source, &VmConfig::default())
}

/// Assemble and run a program under the given limits.
pub fn try_evaluate_with(source: &str, config: &VmConfig) -> Result<Value, Failure> {
    let result = assemble(source)
        .map_err(Failure::from)
        .and_then(|program| rvm_vm::run_with(&program, config).map_err(Failure::from));
    logged("evaluate", result)
}

/// Assemble a program and build its debug report.
pub fn try_parse_rvm(source: &str) -> Result<DebugReport, Failure> {
    let result = assemble(source)
        .map(|program| DebugReport::new(&program))
        .map_err(Failure::from);
    logged("parse_rvm", result)
}

/// Evaluate an arithmetic expression: `"2+3*4"` → `"14"`.
pub fn calculate(expr: &str) -> String {
    render(try_calculate(expr))
}

/// Run an expression-only script.
pub fn evaluate_expr(source: &str) -> String {
    render(try_evaluate_expr(source))
}

/// Assemble and run an RVM assembly program.
pub fn evaluate(source: &str) -> String {
    render(try_evaluate(source))
}

/// [`evaluate`] with custom limits or a cancellation token.
pub fn evaluate_with(source: &str, config: &VmConfig) -> String {
    render(try_evaluate_with(source, config))
}

/// Assemble a program and return its debug report as pretty-printed JSON.
pub fn parse_rvm(source: &str) -> String {
    match try_parse_rvm(source) {
        Ok(report) => report.to_json(),
        Err(failure) => failure.to_string(),
    }
}

/// The library name and version, e.g. `rosettavm 0.1.0`.
pub fn version() -> String {
    VERSION.to_string()
}

static INIT: Once = Once::new();

/// One-time process setup: routes panics through `log::error!` before the
/// previously installed hook runs. Later calls do nothing.
pub fn init() {
    INIT.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            error!("panic: {info}");
            previous(info);
        }));
        debug!("{VERSION} initialized");
    });
}
