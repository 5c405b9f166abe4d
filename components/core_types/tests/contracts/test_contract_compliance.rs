//! Contract compliance tests for core_types
//!
//! These tests verify the public API other components rely on.

use core_types::{Cell, ErrorKind, VarType, VmError};

#[cfg(test)]
mod cell_contract_tests {
    use super::*;

    /// Contract: Cell has exactly the three runtime kinds
    #[test]
    fn test_cell_has_three_kinds() {
        let cells = [Cell::Int(0), Cell::Double(0.0), Cell::empty_string()];
        let kinds: Vec<VarType> = cells.iter().map(Cell::var_type).collect();
        assert_eq!(kinds, vec![VarType::Int, VarType::Double, VarType::String]);
    }

    /// Contract: a cell is never reinterpreted through another accessor
    #[test]
    fn test_mismatched_accessor_returns_none() {
        assert!(Cell::Int(1).as_double().is_none());
        assert!(Cell::Int(1).as_str().is_none());
        assert!(Cell::Double(1.0).as_int().is_none());
        assert!(Cell::empty_string().as_int().is_none());
    }

    /// Contract: string cells are NUL-terminated for native calls
    #[test]
    fn test_string_cell_is_nul_terminated() {
        let cell = Cell::string("abc").unwrap();
        let s = cell.as_str().unwrap();
        assert_eq!(s.to_bytes_with_nul(), b"abc\0");
    }
}

#[cfg(test)]
mod error_contract_tests {
    use super::*;

    /// Contract: VmError carries kind, message and optional location
    #[test]
    fn test_vm_error_fields() {
        let error = VmError::new(ErrorKind::NativeSignature, "too many int parameters").at(0, 3);
        assert_eq!(error.kind, ErrorKind::NativeSignature);
        assert_eq!(error.message, "too many int parameters");
        assert_eq!(error.function, Some(0));
        assert_eq!(error.offset, Some(3));
    }

    /// Contract: the message is human readable through Display
    #[test]
    fn test_vm_error_display_mentions_kind_and_message() {
        let text = VmError::new(ErrorKind::Arithmetic, "integer modulo by zero").to_string();
        assert!(text.starts_with("arithmetic error"));
        assert!(text.contains("integer modulo by zero"));
    }
}
