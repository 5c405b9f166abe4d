//! Unit tests for bytecode_system components

mod test_opcode;
mod test_program;
