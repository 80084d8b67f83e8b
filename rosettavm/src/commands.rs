//! CLI command implementations.

use std::fs;

use rosettavm::{Failure, VmConfig};

/// Exit code for a failed evaluation: 3 at runtime, 1 for bad source.
fn report(failure: &Failure) -> i32 {
    if failure.is_runtime() {
        eprintln!("runtime error: {failure}");
        3
    } else {
        eprintln!("error: {failure}");
        1
    }
}

fn read_source(command: &str, args: &[String]) -> Result<String, i32> {
    let Some(input) = args.first() else {
        eprintln!("error: {command} requires an input file");
        eprintln!("Usage: rvm {command} <file>");
        return Err(1);
    };
    fs::read_to_string(input).map_err(|e| {
        eprintln!("error: cannot read '{input}': {e}");
        1
    })
}

/// Evaluate an arithmetic expression given on the command line. Multiple
/// arguments are joined with spaces, so quoting is optional.
pub fn calc(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: calc requires an expression");
        eprintln!("Usage: rvm calc <expression>");
        return Err(1);
    }

    let expr = args.join(" ");
    let value = rosettavm::try_calculate(&expr).map_err(|f| report(&f))?;
    println!("{value}");
    Ok(())
}

/// Assemble and run an RVM assembly file.
pub fn run(args: &[String]) -> Result<(), i32> {
    let mut config = VmConfig::default();

    // Parse --max-steps flag
    let mut files = Vec::new();
    let mut rest = args.iter();
    while let Some(arg) = rest.next() {
        if arg == "--max-steps" {
            let Some(raw) = rest.next() else {
                eprintln!("error: --max-steps requires a value");
                return Err(1);
            };
            config.max_steps = raw.parse().map_err(|_| {
                eprintln!("error: invalid --max-steps value '{raw}'");
                1
            })?;
        } else {
            files.push(arg.clone());
        }
    }

    let text = read_source("run", &files)?;
    let value = rosettavm::try_evaluate_with(&text, &config).map_err(|f| report(&f))?;
    println!("{value}");
    Ok(())
}

/// Evaluate an expression-only script file.
pub fn expr(args: &[String]) -> Result<(), i32> {
    let text = read_source("expr", args)?;
    let value = rosettavm::try_evaluate_expr(&text).map_err(|f| report(&f))?;
    println!("{value}");
    Ok(())
}

/// Print the debug report of an RVM assembly file.
pub fn parse(args: &[String]) -> Result<(), i32> {
    let text = read_source("parse", args)?;
    let report_json = rosettavm::try_parse_rvm(&text)
        .map_err(|f| report(&f))?
        .to_json();
    println!("{report_json}");
    Ok(())
}

pub fn version() -> Result<(), i32> {
    println!("{}", rosettavm::version());
    Ok(())
}
