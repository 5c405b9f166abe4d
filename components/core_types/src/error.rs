//! Terminal execution errors.
//!
//! Every fatal condition met while loading or running a program is reported
//! as a single [`VmError`]. There is no recovery inside the VM: the run that
//! produced the error is over.

use std::fmt;

use thiserror::Error;

/// The category of a terminal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Cursor ran past the bytecode, unknown opcode, or malformed image
    Decode,
    /// Pop from an empty stack, or pop with an accessor of the wrong type
    StackDiscipline,
    /// Operand stack or call depth limit exceeded
    StackOverflow,
    /// Slot, context, function, constant or native id out of range
    Bounds,
    /// Integer division or modulo by zero
    Arithmetic,
    /// Native signature does not fit the calling convention
    NativeSignature,
    /// Native binding cannot be invoked on this host
    UnsupportedNative,
    /// Configured instruction budget ran out
    InstructionBudget,
    /// The print sink rejected a write
    Output,
}

impl ErrorKind {
    /// Human-readable category name
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Decode => "decode error",
            ErrorKind::StackDiscipline => "stack discipline error",
            ErrorKind::StackOverflow => "stack overflow",
            ErrorKind::Bounds => "bounds error",
            ErrorKind::Arithmetic => "arithmetic error",
            ErrorKind::NativeSignature => "native signature error",
            ErrorKind::UnsupportedNative => "unsupported native call",
            ErrorKind::InstructionBudget => "instruction budget exhausted",
            ErrorKind::Output => "output error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A terminal error with message and the location it was raised at.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, VmError};
///
/// let error = VmError::new(ErrorKind::Bounds, "slot 9 out of range")
///     .at(2, 17);
///
/// assert_eq!(error.function, Some(2));
/// assert_eq!(
///     error.to_string(),
///     "bounds error: slot 9 out of range (function 2, offset 17)"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}{}", location_suffix(.function, .offset))]
pub struct VmError {
    /// The type of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Function executing when the error was raised
    pub function: Option<u16>,
    /// Bytecode offset of the faulting instruction
    pub offset: Option<usize>,
}

impl VmError {
    /// Create an error with no location attached
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            function: None,
            offset: None,
        }
    }

    /// Attach the faulting function and instruction offset.
    ///
    /// A location that is already set is kept, so the innermost site wins.
    pub fn at(mut self, function: u16, offset: usize) -> Self {
        if self.function.is_none() {
            self.function = Some(function);
            self.offset = Some(offset);
        }
        self
    }

    /// Shorthand for a [`ErrorKind::Decode`] error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    /// Shorthand for a [`ErrorKind::Bounds`] error
    pub fn bounds(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Bounds, message)
    }

    /// Shorthand for a [`ErrorKind::StackDiscipline`] error
    pub fn stack_discipline(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StackDiscipline, message)
    }
}

fn location_suffix(function: &Option<u16>, offset: &Option<usize>) -> String {
    match (function, offset) {
        (Some(function), Some(offset)) => format!(" (function {}, offset {})", function, offset),
        (Some(function), None) => format!(" (function {})", function),
        _ => String::new(),
    }
}

/// Result type for VM operations
pub type VmResult<T> = Result<T, VmError>;
