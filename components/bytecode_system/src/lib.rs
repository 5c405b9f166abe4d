//! Bytecode system for the stack VM
//!
//! This crate provides the instruction set, the immutable bytecode buffer
//! with its fixed-width field reads, and the program model the interpreter
//! executes.
//!
//! # Features
//!
//! - Closed opcode enumeration with per-opcode operand layout
//! - Bounds-checked little-endian field reads at an explicit cursor
//! - Label-based bytecode emitter
//! - Programs: functions, string constants and native bindings by id
//! - Binary program images with name-based native resolution
//!
//! # Example
//!
//! ```
//! use bytecode_system::{BytecodeBuilder, NoNatives, Opcode, Program, ProgramBuilder, Signature};
//! use core_types::VarType;
//!
//! let mut code = BytecodeBuilder::new();
//! code.iload(2).iload(3).emit(Opcode::IAdd).emit(Opcode::IPrint).emit(Opcode::Stop);
//!
//! let mut builder = ProgramBuilder::new();
//! let main = builder.add_function("<top>", Signature::new(VarType::Void, vec![]), 0, code.finish().unwrap());
//! let program = builder.build(main).unwrap();
//!
//! // Serialize
//! let bytes = program.to_bytes().unwrap();
//! let restored = Program::from_bytes(&bytes, &NoNatives).unwrap();
//! assert_eq!(restored, program);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod bytecode;
pub mod function;
pub mod image;
pub mod native;
pub mod opcode;
pub mod program;

// Re-export main types at crate root
pub use builder::{BytecodeBuilder, Label};
pub use bytecode::Bytecode;
pub use function::{Function, FunctionId, Signature};
pub use native::{NativeBinding, NativeCode, NativeId, NativeResolver, NoNatives};
pub use opcode::{Opcode, OperandLayout, OPCODE_COUNT};
pub use program::{Program, ProgramBuilder};
