//! Runtime orchestration for program execution
//!
//! The Runtime struct ties the pieces together: it loads a program image,
//! resolves its natives against the host library, and runs it on the VM.

use std::io::Write;
use std::path::Path;

use bytecode_system::Program;
use core_types::Cell;
use interpreter::{Executor, VmConfig, VM};
use tracing::info;

use crate::error::{CliError, CliResult};
use crate::natives::HostNatives;

/// Loads and runs program images
#[derive(Debug, Default)]
pub struct Runtime {
    vm: VM,
    args: Vec<Cell>,
}

impl Runtime {
    /// Create a runtime whose VM applies `config`
    ///
    /// # Example
    /// ```
    /// use interpreter::VmConfig;
    /// use vm_cli::Runtime;
    ///
    /// let runtime = Runtime::new(VmConfig::new().with_instruction_budget(100));
    /// ```
    pub fn new(config: VmConfig) -> Self {
        Self {
            vm: VM::with_config(config),
            args: Vec::new(),
        }
    }

    /// Set the top-level arguments passed to the entry function
    pub fn with_args(mut self, args: Vec<Cell>) -> Self {
        self.args = args;
        self
    }

    /// Read and decode a program image, resolving natives on this host
    ///
    /// # Errors
    /// `CliError::Io` if the file cannot be read, `CliError::Image` if it
    /// is not a valid image
    pub fn load_image(&self, path: impl AsRef<Path>) -> CliResult<Program> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let program = Program::from_bytes(&bytes, &HostNatives).map_err(CliError::Image)?;
        let unresolved: Vec<&str> = program
            .natives()
            .iter()
            .filter(|n| n.code.is_none())
            .map(|n| n.name.as_str())
            .collect();
        if !unresolved.is_empty() {
            tracing::warn!(?unresolved, "natives not provided by this host");
        }
        info!(
            image = %path.display(),
            functions = program.functions().len(),
            constants = program.constants().len(),
            "image loaded"
        );
        Ok(program)
    }

    /// Run an already loaded program, printing to `out`
    pub fn execute(&mut self, program: &Program, out: &mut dyn Write) -> CliResult<Option<Cell>> {
        Ok(self.vm.execute(program, &self.args, out)?)
    }

    /// Load the image at `path` and run it, printing to `out`
    ///
    /// # Returns
    /// The top of the operand stack when the program ended, if any
    ///
    /// # Example
    /// ```no_run
    /// use interpreter::VmConfig;
    /// use vm_cli::Runtime;
    ///
    /// let mut runtime = Runtime::new(VmConfig::default());
    /// runtime.execute_file("program.svm", &mut std::io::stdout()).unwrap();
    /// ```
    pub fn execute_file(
        &mut self,
        path: impl AsRef<Path>,
        out: &mut dyn Write,
    ) -> CliResult<Option<Cell>> {
        let program = self.load_image(path)?;
        self.execute(&program, out)
    }

    /// Instructions executed by the most recent run
    pub fn instructions_executed(&self) -> u64 {
        self.vm.last_instruction_count()
    }
}
