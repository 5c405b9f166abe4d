//! Unit tests for interpreter components

use bytecode_system::{NativeBinding, NativeCode, Signature};
use core_types::{Cell, ErrorKind, VarType};
use interpreter::native::{marshal, BANK_SIZE};
use interpreter::{ContextStack, Continuation, OperandStack, Scope, VmConfig, VM};

// ============================================================================
// Operand stack
// ============================================================================

#[test]
fn test_stack_lifo_order() {
    let mut stack = OperandStack::new(8);
    stack.push_int(1).unwrap();
    stack.push_int(2).unwrap();
    stack.push_int(3).unwrap();
    assert_eq!(stack.pop_int().unwrap(), 3);
    assert_eq!(stack.pop_int().unwrap(), 2);
    assert_eq!(stack.pop_int().unwrap(), 1);
}

#[test]
fn test_stack_pop_discards_any_kind() {
    let mut stack = OperandStack::new(8);
    stack.push(Cell::string("x").unwrap()).unwrap();
    stack.pop().unwrap();
    assert!(stack.is_empty());
}

#[test]
fn test_stack_typed_pop_mismatch() {
    let mut stack = OperandStack::new(8);
    stack.push_int(1).unwrap();
    let err = stack.pop_typed(VarType::String).unwrap_err();
    assert_eq!(err.kind, ErrorKind::StackDiscipline);
}

// ============================================================================
// Context stack
// ============================================================================

#[test]
fn test_scope_push_pop_depth() {
    let mut ctx = ContextStack::new();
    ctx.push_scope(0, 1);
    ctx.push_scope(1, 1);
    assert_eq!(ctx.depth(), 2);
    assert_eq!(ctx.pop_scope().unwrap().function(), 1);
    assert_eq!(ctx.depth(), 1);
}

#[test]
fn test_fresh_frame_per_invocation() {
    let mut ctx = ContextStack::new();
    ctx.push_scope(0, 1);
    ctx.set_int(0, 99).unwrap();
    ctx.pop_scope().unwrap();
    ctx.push_scope(0, 1);
    assert_eq!(ctx.get_int(0).unwrap(), 0);
}

#[test]
fn test_store_and_load_through_scope() {
    let mut ctx = ContextStack::new();
    ctx.push_scope(4, 2);
    ctx.push_scope(5, 0);
    ctx.store(Scope::Context(4), 1, Cell::Double(2.5)).unwrap();
    assert_eq!(
        ctx.load(Scope::Context(4), VarType::Double, 1).unwrap(),
        Cell::Double(2.5)
    );
    // top frame has no slots
    assert_eq!(
        ctx.load(Scope::Top, VarType::Double, 0).unwrap_err().kind,
        ErrorKind::Bounds
    );
}

#[test]
fn test_string_slot_shares_buffer() {
    let mut ctx = ContextStack::new();
    ctx.push_scope(0, 1);
    let s = match Cell::string("shared").unwrap() {
        Cell::Str(s) => s,
        _ => unreachable!(),
    };
    ctx.set_str(0, s.clone()).unwrap();
    let back = ctx.get_str(0).unwrap();
    assert!(std::sync::Arc::ptr_eq(&s, &back));
}

#[test]
fn test_void_bank_rejected() {
    let mut ctx = ContextStack::new();
    ctx.push_scope(0, 1);
    assert!(ctx.load(Scope::Top, VarType::Void, 0).is_err());
}

// ============================================================================
// Call work list, config and native marshalling
// ============================================================================

#[test]
fn test_continuation_fields() {
    let k = Continuation::new(42, 7);
    assert_eq!((k.return_cursor, k.caller), (42, 7));
}

#[test]
fn test_vm_keeps_config() {
    let config = VmConfig::new().with_max_call_depth(3);
    let vm = VM::with_config(config);
    assert_eq!(vm.config().max_call_depth, 3);
}

extern "C" fn placeholder() -> i64 {
    0
}

#[test]
fn test_six_doubles_fit_the_float_bank() {
    let mut stack = OperandStack::new(16);
    for n in 0..BANK_SIZE {
        stack.push_double(n as f64).unwrap();
    }
    let code = unsafe { NativeCode::from_raw(placeholder as *const std::ffi::c_void) };
    let binding = NativeBinding::new(
        "six",
        Signature::new(VarType::Double, vec![VarType::Double; BANK_SIZE]),
        code,
    );
    let banks = marshal(&mut stack, &binding).unwrap();
    assert_eq!(banks.floats(), &[5.0, 4.0, 3.0, 2.0, 1.0, 0.0]);
    assert!(banks.ints().is_empty());
}

#[test]
fn test_seventh_double_overflows() {
    let mut stack = OperandStack::new(16);
    for n in 0..=BANK_SIZE {
        stack.push_double(n as f64).unwrap();
    }
    let code = unsafe { NativeCode::from_raw(placeholder as *const std::ffi::c_void) };
    let binding = NativeBinding::new(
        "seven",
        Signature::new(VarType::Double, vec![VarType::Double; BANK_SIZE + 1]),
        code,
    );
    assert_eq!(
        marshal(&mut stack, &binding).unwrap_err().kind,
        ErrorKind::NativeSignature
    );
}
