//! Bytecode interpreter for the stack VM
//!
//! This crate provides the execution engine:
//! - Operand stack of typed cells with a depth bound
//! - Frame stack with typed local slots and context-qualified access
//! - Dispatch loop with an explicit call work list instead of host recursion
//! - Native bridge calling registered functions through typed trampolines
//!
//! # Example
//!
//! ```
//! use interpreter::{Executor, VmConfig, VM};
//! use bytecode_system::{BytecodeBuilder, Opcode, ProgramBuilder, Signature};
//! use core_types::{Cell, VarType};
//!
//! let mut code = BytecodeBuilder::new();
//! code.emit(Opcode::LoadIVar0).iload(6).emit(Opcode::IMul);
//!
//! let mut builder = ProgramBuilder::new();
//! let main = builder.add_function("<top>", Signature::new(VarType::Int, vec![VarType::Int]), 1, code.finish().unwrap());
//! let program = builder.build(main).unwrap();
//!
//! let mut vm = VM::with_config(VmConfig::new().with_instruction_budget(1_000));
//! let top = vm.execute(&program, &[Cell::Int(7)], &mut std::io::sink()).unwrap();
//! assert_eq!(top, Some(Cell::Int(42)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod call_frame;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod native;
pub mod stack;
pub mod vm;

// Re-export main types at crate root
pub use call_frame::Continuation;
pub use config::VmConfig;
pub use context::{ContextStack, Frame, Scope};
pub use dispatch::Dispatcher;
pub use stack::OperandStack;
pub use vm::{Executor, VM};
