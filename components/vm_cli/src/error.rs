//! Error types for the CLI

use core_types::VmError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// The program failed while running
    #[error("{0}")]
    Vm(#[from] VmError),

    /// File I/O error
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    /// The program image could not be loaded
    #[error("cannot load image: {0}")]
    Image(#[source] VmError),

    /// Bad command-line input
    #[error("usage: {0}")]
    Usage(String),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
