//! Core value types and error handling for the stack VM.
//!
//! This crate provides the foundational types shared by every component:
//! the typed cell that lives on the operand stack and in variable slots,
//! the declared variable types used by function and native signatures,
//! and the single terminal error returned by a failed run.
//!
//! # Overview
//!
//! - [`Cell`] - Tagged integer / double / string value
//! - [`VarType`] - Declared type of a parameter, return value or slot
//! - [`VmError`] - Terminal execution error with location
//! - [`ErrorKind`] - Category of a terminal error
//!
//! # Examples
//!
//! ```
//! use core_types::{Cell, ErrorKind, VarType, VmError};
//!
//! let n = Cell::Int(42);
//! assert_eq!(n.var_type(), VarType::Int);
//! assert_eq!(n.to_string(), "42");
//!
//! let err = VmError::new(ErrorKind::Arithmetic, "integer division by zero");
//! assert_eq!(err.kind, ErrorKind::Arithmetic);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod value;

pub use error::{ErrorKind, VmError, VmResult};
pub use value::{format_double, Cell, VarType};
