//! Stack VM CLI Library
//!
//! Provides the Runtime struct and supporting modules for the `stackvm`
//! binary: argument parsing, image loading, host natives and logging setup.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod natives;
pub mod runtime;

pub use cli::{parse_arg, Cli};
pub use error::{CliError, CliResult};
pub use natives::HostNatives;
pub use runtime::Runtime;

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging to stderr.
///
/// `RUST_LOG` overrides the default filter, which is `warn`, or `debug`
/// when `verbose` is set.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second initialization (e.g. from tests) keeps the first subscriber.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
