//! Virtual Machine for bytecode execution
//!
//! Main entry point for running programs.

use std::io::Write;

use bytecode_system::Program;
use core_types::{Cell, ErrorKind, VmError, VmResult};

use crate::config::VmConfig;
use crate::dispatch::Dispatcher;

/// An execution strategy for programs
///
/// The bytecode interpreter ([`VM`]) is one implementation; a backend that
/// compiles functions to machine code would be another.
pub trait Executor {
    /// Run `program` from its entry function.
    ///
    /// # Arguments
    ///
    /// * `program` - The program to run
    /// * `args` - Stored into slots `0..args.len()` of the entry frame
    /// * `out` - Sink for print instructions, flushed before returning
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Cell))` - The top of the operand stack at termination
    /// * `Ok(None)` - The program ended with an empty operand stack
    /// * `Err(VmError)` - The run was aborted
    fn execute(
        &mut self,
        program: &Program,
        args: &[Cell],
        out: &mut dyn Write,
    ) -> VmResult<Option<Cell>>;
}

/// Bytecode interpreter
///
/// Each call to [`execute`](Executor::execute) starts from a fresh operand
/// stack, frame stack and call work list, so one VM can run many programs
/// one after another.
///
/// # Example
///
/// ```
/// use interpreter::{Executor, VM};
/// use bytecode_system::{BytecodeBuilder, Opcode, ProgramBuilder, Signature};
/// use core_types::VarType;
///
/// let mut code = BytecodeBuilder::new();
/// code.iload(2).iload(3).emit(Opcode::IAdd).emit(Opcode::IPrint).emit(Opcode::Stop);
///
/// let mut builder = ProgramBuilder::new();
/// let main = builder.add_function(
///     "<top>",
///     Signature::new(VarType::Void, vec![]),
///     0,
///     code.finish().unwrap(),
/// );
/// let program = builder.build(main).unwrap();
///
/// let mut out = Vec::new();
/// let mut vm = VM::new();
/// vm.execute(&program, &[], &mut out).unwrap();
/// assert_eq!(out, b"5");
/// ```
#[derive(Debug, Clone, Default)]
pub struct VM {
    config: VmConfig,
    last_instruction_count: u64,
}

impl VM {
    /// Create a VM with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a VM with the given limits
    pub fn with_config(config: VmConfig) -> Self {
        Self {
            config,
            last_instruction_count: 0,
        }
    }

    /// Limits applied to each run
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Instructions dispatched by the most recent run
    pub fn last_instruction_count(&self) -> u64 {
        self.last_instruction_count
    }
}

impl Executor for VM {
    #[tracing::instrument(level = "info", skip_all, fields(entry = program.entry(), args = args.len()))]
    fn execute(
        &mut self,
        program: &Program,
        args: &[Cell],
        out: &mut dyn Write,
    ) -> VmResult<Option<Cell>> {
        tracing::info!(
            functions = program.functions().len(),
            natives = program.natives().len(),
            "run start"
        );
        let mut dispatcher = Dispatcher::new(self.config);
        let result = dispatcher.run(program, args, out);
        self.last_instruction_count = dispatcher.instructions_executed();

        // Flush whatever was printed before a failure too; the run's own
        // error takes precedence over a flush error.
        let flushed = out.flush();
        match result {
            Ok(top) => {
                flushed.map_err(|e| VmError::new(ErrorKind::Output, format!("flush failed: {}", e)))?;
                tracing::info!(instructions = self.last_instruction_count, top = ?top, "run finished");
                Ok(top)
            }
            Err(err) => {
                tracing::error!(
                    instructions = self.last_instruction_count,
                    kind = %err.kind,
                    "run aborted: {}",
                    err
                );
                Err(err)
            }
        }
    }
}
