//! Contract tests for interpreter API
//!
//! These tests verify the public API matches the execution contract.

use bytecode_system::{BytecodeBuilder, Opcode, Program, ProgramBuilder, Signature};
use core_types::{Cell, ErrorKind, VarType};
use interpreter::{Executor, VmConfig, VM};

fn program(code: BytecodeBuilder, locals: u16) -> Program {
    let mut b = ProgramBuilder::new();
    let main = b.add_function(
        "<top>",
        Signature::new(VarType::Void, vec![]),
        locals,
        code.finish().unwrap(),
    );
    b.build(main).unwrap()
}

fn execute(code: BytecodeBuilder) -> (Result<Option<Cell>, core_types::VmError>, Vec<u8>) {
    let p = program(code, 4);
    let mut out = Vec::new();
    let result = VM::new().execute(&p, &[], &mut out);
    (result, out)
}

/// Contract: execute works through the Executor trait object
#[test]
fn test_executor_is_object_safe() {
    let mut code = BytecodeBuilder::new();
    code.emit(Opcode::ILoadM1);
    let p = program(code, 0);
    let mut exec: Box<dyn Executor> = Box::new(VM::new());
    let top = exec.execute(&p, &[], &mut std::io::sink()).unwrap();
    assert_eq!(top, Some(Cell::Int(-1)));
}

/// Contract: an empty entry function succeeds with no exit value
#[test]
fn test_empty_program_contract() {
    let (result, out) = execute(BytecodeBuilder::new());
    assert_eq!(result.unwrap(), None);
    assert!(out.is_empty());
}

/// Contract: print instructions consume their operand
#[test]
fn test_print_consumes_contract() {
    let mut code = BytecodeBuilder::new();
    code.iload(12).emit(Opcode::IPrint);
    let (result, out) = execute(code);
    assert_eq!(result.unwrap(), None);
    assert_eq!(out, b"12");
}

/// Contract: output printed before a failure reaches the sink
#[test]
fn test_partial_output_on_failure_contract() {
    let mut code = BytecodeBuilder::new();
    code.iload(1).emit(Opcode::IPrint).iload(1).iload(0).emit(Opcode::IMod);
    let (result, out) = execute(code);
    assert_eq!(result.unwrap_err().kind, ErrorKind::Arithmetic);
    assert_eq!(out, b"1");
}

/// Contract: popping an empty stack is a stack discipline error
#[test]
fn test_empty_pop_contract() {
    let mut code = BytecodeBuilder::new();
    code.emit(Opcode::IAdd);
    assert_eq!(execute(code).0.unwrap_err().kind, ErrorKind::StackDiscipline);
}

/// Contract: arithmetic on the wrong cell kind is a stack discipline error
#[test]
fn test_kind_mismatch_contract() {
    let mut code = BytecodeBuilder::new();
    code.dload(1.0).dload(2.0).emit(Opcode::IAdd);
    assert_eq!(execute(code).0.unwrap_err().kind, ErrorKind::StackDiscipline);
}

/// Contract: unknown function, constant and native ids are bounds errors
#[test]
fn test_unknown_ids_contract() {
    let mut code = BytecodeBuilder::new();
    code.call(9);
    assert_eq!(execute(code).0.unwrap_err().kind, ErrorKind::Bounds);

    let mut code = BytecodeBuilder::new();
    code.sload(3);
    assert_eq!(execute(code).0.unwrap_err().kind, ErrorKind::Bounds);

    let mut code = BytecodeBuilder::new();
    code.call_native(0);
    assert_eq!(execute(code).0.unwrap_err().kind, ErrorKind::Bounds);
}

/// Contract: errors name the failing function and offset
#[test]
fn test_error_location_contract() {
    let mut code = BytecodeBuilder::new();
    code.emit(Opcode::ILoad0).emit(Opcode::Pop).emit(Opcode::Pop);
    let err = execute(code).0.unwrap_err();
    assert_eq!(err.function, Some(0));
    assert_eq!(err.offset, Some(2));
    assert!(err.to_string().contains("offset 2"));
}

/// Contract: the instruction budget aborts between instructions
#[test]
fn test_budget_contract() {
    let mut code = BytecodeBuilder::new();
    code.emit(Opcode::ILoad1).emit(Opcode::IPrint).jump_raw(Opcode::Ja, -5);
    let p = program(code, 0);
    let mut out = Vec::new();
    let mut vm = VM::with_config(VmConfig::new().with_instruction_budget(7));
    let err = vm.execute(&p, &[], &mut out).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InstructionBudget);
    assert_eq!(out, b"11");
    assert_eq!(vm.last_instruction_count(), 7);
}
