//! Typed cells and declared variable types.
//!
//! A [`Cell`] is one unit of storage on the operand stack or in a frame
//! slot. Every cell carries its tag; reading it through the wrong accessor
//! yields `None` and the caller turns that into a stack-discipline error.

use std::ffi::{CStr, CString};
use std::fmt;
use std::sync::Arc;

use crate::error::{ErrorKind, VmError, VmResult};

/// Declared type of a parameter, return value or variable.
///
/// The discriminants are the on-disk encoding used by program images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VarType {
    /// Placeholder for an unset type; never valid at runtime
    Invalid = 0,
    /// No value (only meaningful as a return type)
    Void = 1,
    /// 64-bit IEEE 754 float
    Double = 2,
    /// 64-bit signed integer
    Int = 3,
    /// Reference to a NUL-terminated string
    String = 4,
}

impl VarType {
    /// Decode a type tag, returning `None` for unknown tags
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(VarType::Invalid),
            1 => Some(VarType::Void),
            2 => Some(VarType::Double),
            3 => Some(VarType::Int),
            4 => Some(VarType::String),
            _ => None,
        }
    }

    /// Lower-case type name as used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            VarType::Invalid => "invalid",
            VarType::Void => "void",
            VarType::Double => "double",
            VarType::Int => "int",
            VarType::String => "string",
        }
    }

    /// Whether a cell of this type can exist on the stack
    pub fn is_value_type(self) -> bool {
        matches!(self, VarType::Double | VarType::Int | VarType::String)
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One typed value on the operand stack or in a variable slot.
///
/// Strings are shared, NUL-terminated buffers so that constant-pool entries
/// can be pushed without copying and handed to native code as pointers.
///
/// # Examples
///
/// ```
/// use core_types::Cell;
///
/// let s = Cell::string("hello").unwrap();
/// assert_eq!(s.as_str().map(|s| s.to_bytes()), Some(&b"hello"[..]));
/// assert_eq!(Cell::Double(2.5).as_int(), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Double(f64),
    /// Shared string reference
    Str(Arc<CStr>),
}

impl Cell {
    /// Build a string cell, rejecting interior NUL bytes
    pub fn string(s: impl Into<Vec<u8>>) -> VmResult<Self> {
        let owned = CString::new(s).map_err(|e| {
            VmError::new(
                ErrorKind::Decode,
                format!("string contains interior NUL at byte {}", e.nul_position()),
            )
        })?;
        Ok(Cell::Str(Arc::from(owned)))
    }

    /// The empty string
    pub fn empty_string() -> Self {
        Cell::Str(Arc::from(CString::default()))
    }

    /// Type tag of this cell
    pub fn var_type(&self) -> VarType {
        match self {
            Cell::Int(_) => VarType::Int,
            Cell::Double(_) => VarType::Double,
            Cell::Str(_) => VarType::String,
        }
    }

    /// Integer payload, if this is an integer cell
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Cell::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Float payload, if this is a double cell
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Cell::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// String payload, if this is a string cell
    pub fn as_str(&self) -> Option<&Arc<CStr>> {
        match self {
            Cell::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Zero value of a value type: `0`, `0.0` or the empty string
    pub fn zero_of(ty: VarType) -> Option<Self> {
        match ty {
            VarType::Int => Some(Cell::Int(0)),
            VarType::Double => Some(Cell::Double(0.0)),
            VarType::String => Some(Cell::empty_string()),
            VarType::Void | VarType::Invalid => None,
        }
    }
}

/// External text form written by the print instructions.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Int(n) => write!(f, "{}", n),
            Cell::Double(d) => f.write_str(&format_double(*d)),
            Cell::Str(s) => f.write_str(&s.to_string_lossy()),
        }
    }
}

const SIGNIFICANT_DIGITS: i32 = 6;

/// Format a double the way a default C++ output stream does (`%g`, six
/// significant digits, trailing zeros removed).
///
/// ```
/// use core_types::format_double;
///
/// assert_eq!(format_double(1.5), "1.5");
/// assert_eq!(format_double(3.0), "3");
/// assert_eq!(format_double(1e20), "1e+20");
/// assert_eq!(format_double(0.0001), "0.0001");
/// assert_eq!(format_double(0.00001), "1e-05");
/// ```
pub fn format_double(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Exponent after rounding to the significant digits, not before.
    let scientific = format!("{:.*e}", (SIGNIFICANT_DIGITS - 1) as usize, value);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= SIGNIFICANT_DIGITS {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            strip_trailing_zeros(mantissa),
            sign,
            exponent.abs()
        )
    } else {
        let decimals = (SIGNIFICANT_DIGITS - 1 - exponent) as usize;
        let fixed = format!("{:.*}", decimals, value);
        strip_trailing_zeros(&fixed).to_string()
    }
}

fn strip_trailing_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
