//! Stack VM CLI
//!
//! Entry point for the `stackvm` binary. Parses CLI arguments and delegates
//! to the Runtime for execution.

use std::process::ExitCode;

use clap::Parser;
use vm_cli::{init_logging, Cli, CliError, CliResult, Runtime};

fn run(cli: Cli) -> CliResult<()> {
    let file = cli
        .file
        .clone()
        .ok_or_else(|| CliError::Usage("no program image given (use --file <IMAGE>)".into()))?;

    let mut runtime = Runtime::new(cli.vm_config()).with_args(cli.entry_args()?);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let top = runtime.execute_file(&file, &mut out)?;
    tracing::info!(
        instructions = runtime.instructions_executed(),
        exit_value = ?top,
        "program finished"
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
