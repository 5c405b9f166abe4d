//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;
use core_types::Cell;
use interpreter::VmConfig;

use crate::error::{CliError, CliResult};

/// Run a compiled stack VM program image
#[derive(Debug, Parser)]
#[command(name = "stackvm", version, about)]
pub struct Cli {
    /// Program image to run
    #[arg(short, long, value_name = "IMAGE")]
    pub file: Option<PathBuf>,

    /// Top-level argument, stored into the next entry slot
    /// (integer, else float, else string)
    #[arg(long = "arg", value_name = "VALUE")]
    pub args: Vec<String>,

    /// Maximum operand stack depth, in cells
    #[arg(long, value_name = "CELLS")]
    pub max_stack: Option<usize>,

    /// Maximum call depth
    #[arg(long, value_name = "CALLS")]
    pub max_calls: Option<usize>,

    /// Abort after this many instructions
    #[arg(long, value_name = "INSTRUCTIONS")]
    pub budget: Option<u64>,

    /// Log calls, returns and native calls to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// VM limits requested on the command line, defaults elsewhere
    pub fn vm_config(&self) -> VmConfig {
        let mut config = VmConfig::new();
        if let Some(depth) = self.max_stack {
            config = config.with_max_stack_depth(depth);
        }
        if let Some(depth) = self.max_calls {
            config = config.with_max_call_depth(depth);
        }
        if let Some(budget) = self.budget {
            config = config.with_instruction_budget(budget);
        }
        config
    }

    /// Parsed `--arg` values, in order
    pub fn entry_args(&self) -> CliResult<Vec<Cell>> {
        self.args.iter().map(|a| parse_arg(a)).collect()
    }
}

/// Interpret a command-line value as a cell: integer, then float, else string
pub fn parse_arg(raw: &str) -> CliResult<Cell> {
    if let Ok(n) = raw.parse::<i64>() {
        return Ok(Cell::Int(n));
    }
    if let Ok(d) = raw.parse::<f64>() {
        return Ok(Cell::Double(d));
    }
    Cell::string(raw).map_err(|e| CliError::Usage(format!("argument {:?}: {}", raw, e.message)))
}
