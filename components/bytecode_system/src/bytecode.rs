//! Immutable bytecode buffer with fixed-width field reads.
//!
//! Reads never advance anything: callers own the cursor and add the width
//! they consumed. A read that would cross the end of the buffer returns
//! `None`; turning that into an error is the interpreter's job.

use crate::opcode::Opcode;

/// Encoded instruction stream of one function
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bytecode {
    code: Box<[u8]>,
}

impl Bytecode {
    /// Wrap an encoded instruction stream
    pub fn new(code: impl Into<Box<[u8]>>) -> Self {
        Self { code: code.into() }
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Whether the stream is empty
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Raw encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.code
    }

    /// Raw tag byte at `pos`
    pub fn tag_at(&self, pos: usize) -> Option<u8> {
        self.code.get(pos).copied()
    }

    /// Decoded opcode at `pos`; `None` past the end or for unknown tags
    pub fn opcode_at(&self, pos: usize) -> Option<Opcode> {
        self.tag_at(pos).and_then(Opcode::from_u8)
    }

    fn field<const N: usize>(&self, pos: usize) -> Option<[u8; N]> {
        let end = pos.checked_add(N)?;
        self.code.get(pos..end)?.try_into().ok()
    }

    /// Read a `u8` at `pos`
    pub fn read_u8(&self, pos: usize) -> Option<u8> {
        self.tag_at(pos)
    }

    /// Read a little-endian `u16` at `pos`
    pub fn read_u16(&self, pos: usize) -> Option<u16> {
        self.field(pos).map(u16::from_le_bytes)
    }

    /// Read a little-endian `i16` at `pos`
    pub fn read_i16(&self, pos: usize) -> Option<i16> {
        self.field(pos).map(i16::from_le_bytes)
    }

    /// Read a little-endian `u32` at `pos`
    pub fn read_u32(&self, pos: usize) -> Option<u32> {
        self.field(pos).map(u32::from_le_bytes)
    }

    /// Read a little-endian `i64` at `pos`
    pub fn read_i64(&self, pos: usize) -> Option<i64> {
        self.field(pos).map(i64::from_le_bytes)
    }

    /// Read a little-endian `f64` at `pos`
    pub fn read_f64(&self, pos: usize) -> Option<f64> {
        self.field(pos).map(f64::from_le_bytes)
    }
}

impl From<Vec<u8>> for Bytecode {
    fn from(code: Vec<u8>) -> Self {
        Self::new(code)
    }
}
