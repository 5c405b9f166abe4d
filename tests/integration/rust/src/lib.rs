//! Integration test suite for the stack VM
//!
//! This crate provides integration tests that verify components work
//! together correctly across component boundaries, plus small helpers for
//! building and running single-function programs.

use bytecode_system::{BytecodeBuilder, Program, ProgramBuilder, Signature};
use core_types::{Cell, VarType, VmResult};
use interpreter::{Executor, VmConfig, VM};

/// Re-export components for test convenience
pub mod components {
    pub use bytecode_system;
    pub use core_types;
    pub use interpreter;
    pub use vm_cli;
}

/// Outcome of one run: the result and everything printed
#[derive(Debug)]
pub struct Run {
    /// Value returned by `execute`
    pub result: VmResult<Option<Cell>>,
    /// Print output, decoded as UTF-8
    pub output: String,
}

/// Wrap `code` as the entry function of a program with `locals` slots
pub fn single_function(code: BytecodeBuilder, locals: u16) -> Program {
    let mut builder = ProgramBuilder::new();
    let main = builder.add_function(
        "<top>",
        Signature::new(VarType::Void, vec![]),
        locals,
        code.finish().expect("labels bound"),
    );
    builder.build(main).expect("valid program")
}

/// Run `program` with default limits and no arguments
pub fn run(program: &Program) -> Run {
    run_with(program, VmConfig::default(), &[])
}

/// Run `program` with the given limits and top-level arguments
pub fn run_with(program: &Program, config: VmConfig, args: &[Cell]) -> Run {
    let mut out = Vec::new();
    let result = VM::with_config(config).execute(program, args, &mut out);
    Run {
        result,
        output: String::from_utf8_lossy(&out).into_owned(),
    }
}
