//! Continuations on the explicit call work list

use bytecode_system::FunctionId;

/// Where to resume once a callee returns
///
/// Pushed by `CALL`, popped when the callee's bytecode is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Continuation {
    /// Cursor in the caller's bytecode, just past the `CALL` operand
    pub return_cursor: usize,
    /// The calling function
    pub caller: FunctionId,
}

impl Continuation {
    /// Create a continuation
    pub fn new(return_cursor: usize, caller: FunctionId) -> Self {
        Self {
            return_cursor,
            caller,
        }
    }
}
