//! Tests for the Opcode enum

use bytecode_system::{Opcode, OperandLayout, OPCODE_COUNT};

#[test]
fn test_every_tag_decodes_to_itself() {
    for tag in 0..OPCODE_COUNT as u8 {
        let op = Opcode::from_u8(tag).expect("defined tag");
        assert_eq!(op.tag(), tag);
    }
}

#[test]
fn test_tags_past_the_table_are_unknown() {
    for tag in OPCODE_COUNT as u8..=u8::MAX {
        assert!(Opcode::from_u8(tag).is_none(), "tag {} decoded", tag);
    }
}

#[test]
fn test_literal_opcodes() {
    assert_eq!(Opcode::DLoad.layout(), OperandLayout::Double);
    assert_eq!(Opcode::ILoad.layout(), OperandLayout::Int);
    assert_eq!(Opcode::SLoad.layout(), OperandLayout::Id);
    for op in [
        Opcode::DLoad0,
        Opcode::ILoad0,
        Opcode::SLoad0,
        Opcode::DLoad1,
        Opcode::ILoad1,
        Opcode::DLoadM1,
        Opcode::ILoadM1,
    ] {
        assert_eq!(op.length(), 1, "{}", op);
    }
}

#[test]
fn test_variable_opcodes() {
    assert_eq!(Opcode::LoadIVar.length(), 3);
    assert_eq!(Opcode::StoreSVar.length(), 3);
    assert_eq!(Opcode::LoadIVar0.length(), 1);
    assert_eq!(Opcode::StoreCtxDVar.layout(), OperandLayout::ContextSlot);
    assert_eq!(Opcode::StoreCtxDVar.length(), 5);
}

#[test]
fn test_call_opcodes() {
    assert_eq!(Opcode::Call.layout(), OperandLayout::Id);
    assert_eq!(Opcode::CallNative.layout(), OperandLayout::Id);
    assert_eq!(Opcode::Return.length(), 1);
}

#[test]
fn test_mnemonics() {
    assert_eq!(Opcode::IfICmpGe.mnemonic(), "IFICMPGE");
    assert_eq!(Opcode::CallNative.to_string(), "CALLNATIVE");
    assert_eq!(Opcode::LoadCtxSVar.to_string(), "LOADCTXSVAR");
}

#[test]
fn test_terminators() {
    assert!(Opcode::Return.is_terminator());
    assert!(Opcode::Stop.is_terminator());
    assert!(!Opcode::Ja.is_terminator());
    assert!(!Opcode::Call.is_terminator());
}
