//! Tests for Program and ProgramBuilder

use bytecode_system::{
    Bytecode, BytecodeBuilder, NativeBinding, NoNatives, Opcode, Program, ProgramBuilder,
    Signature,
};
use core_types::{ErrorKind, VarType};

fn void_sig() -> Signature {
    Signature::new(VarType::Void, vec![])
}

#[test]
fn test_builder_assigns_dense_ids() {
    let mut b = ProgramBuilder::new();
    let a = b.add_function("a", void_sig(), 0, Bytecode::default());
    let c = b.add_function("c", void_sig(), 0, Bytecode::default());
    assert_eq!((a, c), (0, 1));
    let program = b.build(c).unwrap();
    assert_eq!(program.entry(), 1);
    assert_eq!(program.entry_function().name, "c");
}

#[test]
fn test_constant_lookup() {
    let mut b = ProgramBuilder::new();
    let id = b.add_constant("text").unwrap();
    let main = b.add_function("main", void_sig(), 0, Bytecode::default());
    let program = b.build(main).unwrap();
    assert_eq!(program.constant(id).unwrap().to_bytes(), b"text");
}

#[test]
fn test_constant_with_nul_rejected() {
    let mut b = ProgramBuilder::new();
    assert_eq!(b.add_constant("a\0").unwrap_err().kind, ErrorKind::Decode);
}

#[test]
fn test_unresolved_native_lookup() {
    let mut b = ProgramBuilder::new();
    let id = b.push_native(NativeBinding::unresolved(
        "missing",
        Signature::new(VarType::Int, vec![VarType::Int]),
    ));
    let main = b.add_function("main", void_sig(), 0, Bytecode::default());
    let program = b.build(main).unwrap();
    let binding = program.native(id).unwrap();
    assert_eq!(binding.name, "missing");
    assert!(binding.code.is_none());
}

#[test]
fn test_image_roundtrip_multiple_functions() {
    let mut b = ProgramBuilder::new();
    let s = b.add_constant("done").unwrap();
    let callee = b.declare_function("callee", Signature::new(VarType::Int, vec![VarType::Int]));
    let mut main_code = BytecodeBuilder::new();
    main_code.iload(20).call(callee).emit(Opcode::IPrint).sload(s).emit(Opcode::SPrint);
    let main = b.add_function("<top>", void_sig(), 0, main_code.finish().unwrap());
    let mut callee_code = BytecodeBuilder::new();
    callee_code
        .emit(Opcode::StoreIVar0)
        .emit(Opcode::LoadIVar0)
        .emit(Opcode::ILoad1)
        .emit(Opcode::IAdd)
        .emit(Opcode::Return);
    b.define_function(callee, 1, callee_code.finish().unwrap()).unwrap();
    let program = b.build(main).unwrap();

    let restored = Program::from_bytes(&program.to_bytes().unwrap(), &NoNatives).unwrap();
    assert_eq!(restored, program);
}

#[test]
fn test_image_entry_out_of_range() {
    let mut b = ProgramBuilder::new();
    let main = b.add_function("main", void_sig(), 0, Bytecode::default());
    let mut bytes = b.build(main).unwrap().to_bytes().unwrap();
    // entry id follows magic and version
    bytes[5] = 9;
    let err = Program::from_bytes(&bytes, &NoNatives).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Bounds);
}
