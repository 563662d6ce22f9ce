//! Keel probe entry point.

use colored::Colorize;
use keel_core::{init_tracing, run_program, LogContext};
use keel_types::{ExitCode, Program};

mod probe;

use probe::ProbeProgram;

fn main() -> std::process::ExitCode {
    let context = LogContext::global();
    init_tracing(context.clone());

    let program = ProbeProgram;
    let code = run_program(&program, std::env::args_os(), context);
    if code != ExitCode::Ok {
        eprintln!("{} {} exited with {}", "Error:".red().bold(), program.name(), code);
    }
    code.into()
}
