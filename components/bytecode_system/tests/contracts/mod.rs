//! Contract compliance tests for bytecode_system
//!
//! These tests pin the encoding the interpreter and translators share.

use bytecode_system::{Bytecode, BytecodeBuilder, Opcode, OPCODE_COUNT};

/// Contract: opcode tags are stable
#[test]
fn test_opcode_tag_contract() {
    assert_eq!(Opcode::Invalid.tag(), 0);
    assert_eq!(Opcode::DLoad.tag(), 1);
    assert_eq!(Opcode::ILoad.tag(), 2);
    assert_eq!(Opcode::SLoad.tag(), 3);
    assert_eq!(Opcode::IAdd.tag(), 12);
    assert_eq!(Opcode::IDiv.tag(), 18);
    assert_eq!(Opcode::IPrint.tag(), 25);
    assert_eq!(Opcode::LoadDVar0.tag(), 33);
    assert_eq!(Opcode::StoreSVar3.tag(), 56);
    assert_eq!(Opcode::LoadCtxDVar.tag(), 63);
    assert_eq!(Opcode::DCmp.tag(), 69);
    assert_eq!(Opcode::Ja.tag(), 71);
    assert_eq!(Opcode::Stop.tag(), 79);
    assert_eq!(Opcode::CallNative.tag(), 81);
    assert_eq!(Opcode::Break.tag(), 83);
    assert_eq!(OPCODE_COUNT, 84);
}

/// Contract: operands are little-endian and immediately follow the tag
#[test]
fn test_operand_encoding_contract() {
    let bc = Bytecode::new(vec![Opcode::Call.tag(), 0x02, 0x01]);
    assert_eq!(bc.opcode_at(0), Some(Opcode::Call));
    assert_eq!(bc.read_u16(1), Some(0x0102));
}

/// Contract: reads past the end report absence instead of panicking
#[test]
fn test_reads_report_truncation_contract() {
    let bc = Bytecode::new(vec![Opcode::ILoad.tag(), 1, 2]);
    assert_eq!(bc.read_i64(1), None);
}

/// Contract: jump offsets are relative to the byte after the offset field
#[test]
fn test_jump_offset_contract() {
    let mut b = BytecodeBuilder::new();
    let target = b.new_label();
    b.jump(Opcode::Ja, target);
    b.bind(target);
    let bc = b.finish().unwrap();
    assert_eq!(bc.read_i16(1), Some(0));
}
