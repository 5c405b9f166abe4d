//! Bytecode emitter
//!
//! Used by translators and tests to produce well-formed instruction
//! streams. Jump targets are expressed as labels and patched when bound.

use crate::bytecode::Bytecode;
use crate::opcode::{Opcode, OperandLayout};

/// Forward or backward jump target inside one function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(usize);

#[derive(Debug, Default)]
struct LabelState {
    bound: Option<usize>,
    /// Positions of offset fields waiting for this label
    pending: Vec<usize>,
}

/// Incremental bytecode writer
///
/// # Example
///
/// ```
/// use bytecode_system::{BytecodeBuilder, Opcode};
///
/// let mut b = BytecodeBuilder::new();
/// b.iload(2).iload(3).emit(Opcode::IAdd).emit(Opcode::IPrint);
/// let code = b.finish().unwrap();
/// assert_eq!(code.len(), 9 + 9 + 1 + 1);
/// ```
#[derive(Debug, Default)]
pub struct BytecodeBuilder {
    code: Vec<u8>,
    labels: Vec<LabelState>,
    /// First jump whose distance did not fit its offset field
    overflow: Option<String>,
}

impl BytecodeBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Current write position
    pub fn position(&self) -> usize {
        self.code.len()
    }

    /// Emit an opcode that takes no inline operand
    ///
    /// # Panics
    ///
    /// Panics if `op` expects an operand; use the typed emitters instead.
    pub fn emit(&mut self, op: Opcode) -> &mut Self {
        assert_eq!(
            op.layout(),
            OperandLayout::None,
            "{} takes an inline operand",
            op
        );
        self.code.push(op.tag());
        self
    }

    /// Emit a raw byte, bypassing all checks
    pub fn raw(&mut self, byte: u8) -> &mut Self {
        self.code.push(byte);
        self
    }

    /// `ILOAD value`
    pub fn iload(&mut self, value: i64) -> &mut Self {
        self.code.push(Opcode::ILoad.tag());
        self.code.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// `DLOAD value`
    pub fn dload(&mut self, value: f64) -> &mut Self {
        self.code.push(Opcode::DLoad.tag());
        self.code.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// `SLOAD constant_id`
    pub fn sload(&mut self, constant_id: u16) -> &mut Self {
        self.with_id(Opcode::SLoad, constant_id)
    }

    /// Any opcode whose operand is a single 2-byte id
    /// (generic variable access, `CALL`, `CALLNATIVE`, `SLOAD`)
    ///
    /// # Panics
    ///
    /// Panics if `op` does not take a single id operand.
    pub fn with_id(&mut self, op: Opcode, id: u16) -> &mut Self {
        assert_eq!(op.layout(), OperandLayout::Id, "{} does not take an id", op);
        self.code.push(op.tag());
        self.code.extend_from_slice(&id.to_le_bytes());
        self
    }

    /// `CALL function_id`
    pub fn call(&mut self, function_id: u16) -> &mut Self {
        self.with_id(Opcode::Call, function_id)
    }

    /// `CALLNATIVE native_id`
    pub fn call_native(&mut self, native_id: u16) -> &mut Self {
        self.with_id(Opcode::CallNative, native_id)
    }

    /// Context-qualified variable access: context id, then slot id
    ///
    /// # Panics
    ///
    /// Panics if `op` is not a context-qualified load or store.
    pub fn with_context(&mut self, op: Opcode, context_id: u16, slot: u16) -> &mut Self {
        assert_eq!(
            op.layout(),
            OperandLayout::ContextSlot,
            "{} is not context-qualified",
            op
        );
        self.code.push(op.tag());
        self.code.extend_from_slice(&context_id.to_le_bytes());
        self.code.extend_from_slice(&slot.to_le_bytes());
        self
    }

    /// Allocate an unbound label
    pub fn new_label(&mut self) -> Label {
        self.labels.push(LabelState::default());
        Label(self.labels.len() - 1)
    }

    /// Bind `label` to the current position and patch pending jumps to it
    ///
    /// A patched jump distance that does not fit in 16 bits is reported
    /// by [`finish`](BytecodeBuilder::finish).
    ///
    /// # Panics
    ///
    /// Panics if the label was already bound.
    pub fn bind(&mut self, label: Label) -> &mut Self {
        let here = self.code.len();
        let state = &mut self.labels[label.0];
        assert!(state.bound.is_none(), "label bound twice");
        state.bound = Some(here);
        let pending = std::mem::take(&mut state.pending);
        for field in pending {
            self.patch(field, here);
        }
        self
    }

    /// Emit a jump to `label`
    ///
    /// # Panics
    ///
    /// Panics if `op` is not a jump.
    pub fn jump(&mut self, op: Opcode, label: Label) -> &mut Self {
        assert!(op.is_jump(), "{} is not a jump", op);
        self.code.push(op.tag());
        let field = self.code.len();
        self.code.extend_from_slice(&0i16.to_le_bytes());
        match self.labels[label.0].bound {
            Some(target) => self.patch(field, target),
            None => self.labels[label.0].pending.push(field),
        }
        self
    }

    /// Emit a jump with an explicit offset, relative to the end of the
    /// offset field
    pub fn jump_raw(&mut self, op: Opcode, offset: i16) -> &mut Self {
        assert!(op.is_jump(), "{} is not a jump", op);
        self.code.push(op.tag());
        self.code.extend_from_slice(&offset.to_le_bytes());
        self
    }

    fn patch(&mut self, field: usize, target: usize) {
        let offset = target as i64 - (field as i64 + 2);
        match i16::try_from(offset) {
            Ok(offset) => self.code[field..field + 2].copy_from_slice(&offset.to_le_bytes()),
            Err(_) => {
                self.overflow.get_or_insert_with(|| {
                    format!(
                        "jump at offset {} spans {} bytes, beyond the 16-bit offset field",
                        field - 1,
                        offset
                    )
                });
            }
        }
    }

    /// Finish the stream; fails if a label was used but never bound, or a
    /// jump distance overflowed its offset field
    pub fn finish(self) -> Result<Bytecode, String> {
        if let Some(overflow) = self.overflow {
            return Err(overflow);
        }
        if let Some(idx) = self.labels.iter().position(|l| !l.pending.is_empty()) {
            return Err(format!("label {} used but never bound", idx));
        }
        Ok(Bytecode::new(self.code))
    }
}
