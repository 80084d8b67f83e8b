//! RosettaVM command-line interface.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Usage/input/syntax error
//! - 3: Runtime error

mod commands;
mod logger;

use std::process;

fn main() {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let verbose = args.iter().any(|a| a == "-v" || a == "--verbose");
    args.retain(|a| a != "-v" && a != "--verbose");
    logger::init(verbose);
    rosettavm::init();

    if args.is_empty() {
        print_usage();
        process::exit(1);
    }

    let result = match args[0].as_str() {
        "calc" => commands::calc(&args[1..]),
        "run" => commands::run(&args[1..]),
        "expr" => commands::expr(&args[1..]),
        "parse" => commands::parse(&args[1..]),
        "version" | "--version" => commands::version(),
        "--help" | "-h" | "help" => {
            print_usage();
            process::exit(0);
        }
        other => {
            eprintln!("error: unknown command '{other}'");
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    if let Err(code) = result {
        process::exit(code);
    }
}

fn print_usage() {
    eprintln!("Usage: rvm [-v] <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  calc <expression>                 Evaluate an arithmetic expression");
    eprintln!("  run <file.rvm> [--max-steps N]    Assemble and run a program");
    eprintln!("  expr <file>                       Evaluate an expression script");
    eprintln!("  parse <file.rvm>                  Print the program's debug report as JSON");
    eprintln!("  version                           Print the version");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -v, --verbose                     Log debug output to stderr");
}
