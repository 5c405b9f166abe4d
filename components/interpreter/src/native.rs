//! Native interop bridge
//!
//! Arguments are popped from the operand stack walking the declared
//! parameters from last to first, and each popped value is appended to the
//! integer bank (ints, and strings as pointers) or the float bank. Both
//! banks hold six values. The binding is then called through one of three
//! trampolines selected by its return type, with all twelve argument
//! registers populated; unused slots are zero.
//!
//! Whether the code behind a binding really has the declared shape is the
//! registrant's obligation (see [`NativeCode::from_raw`]); nothing here can
//! check it.
//!
//! [`NativeCode::from_raw`]: bytecode_system::NativeCode::from_raw

use std::ffi::{c_char, CStr};
use std::sync::Arc;

use arrayvec::ArrayVec;
use bytecode_system::NativeBinding;
use core_types::{Cell, ErrorKind, VarType, VmError, VmResult};

use crate::stack::OperandStack;

/// Register slots per bank
pub const BANK_SIZE: usize = 6;

/// Marshalled arguments of one native call
#[derive(Debug, Default)]
pub struct RegisterBanks {
    ints: ArrayVec<i64, BANK_SIZE>,
    floats: ArrayVec<f64, BANK_SIZE>,
    /// Strings whose pointers sit in `ints`; kept alive until the call ends
    pinned: Vec<Arc<CStr>>,
}

impl RegisterBanks {
    /// Integer bank contents, in fill order
    pub fn ints(&self) -> &[i64] {
        &self.ints
    }

    /// Float bank contents, in fill order
    pub fn floats(&self) -> &[f64] {
        &self.floats
    }

    fn push_int(&mut self, value: i64, name: &str) -> VmResult<()> {
        self.ints
            .try_push(value)
            .map_err(|_| bank_overflow(name, "integer"))
    }

    fn push_float(&mut self, value: f64, name: &str) -> VmResult<()> {
        self.floats
            .try_push(value)
            .map_err(|_| bank_overflow(name, "float"))
    }

    fn int_registers(&self) -> [i64; BANK_SIZE] {
        let mut regs = [0i64; BANK_SIZE];
        regs[..self.ints.len()].copy_from_slice(&self.ints);
        regs
    }

    fn float_registers(&self) -> [f64; BANK_SIZE] {
        let mut regs = [0f64; BANK_SIZE];
        regs[..self.floats.len()].copy_from_slice(&self.floats);
        regs
    }
}

fn bank_overflow(name: &str, bank: &str) -> VmError {
    VmError::new(
        ErrorKind::NativeSignature,
        format!(
            "native '{}' needs more than {} {} arguments",
            name, BANK_SIZE, bank
        ),
    )
}

/// Pop the arguments of `binding` off `stack` into register banks
pub fn marshal(stack: &mut OperandStack, binding: &NativeBinding) -> VmResult<RegisterBanks> {
    let mut banks = RegisterBanks::default();
    for (index, param) in binding.signature.params.iter().enumerate().rev() {
        match param {
            VarType::Int => {
                let value = stack.pop_int()?;
                banks.push_int(value, &binding.name)?;
            }
            VarType::String => {
                let value = stack.pop_str()?;
                banks.push_int(value.as_ptr() as i64, &binding.name)?;
                banks.pinned.push(value);
            }
            VarType::Double => {
                let value = stack.pop_double()?;
                banks.push_float(value, &binding.name)?;
            }
            VarType::Void | VarType::Invalid => {
                return Err(VmError::new(
                    ErrorKind::NativeSignature,
                    format!(
                        "native '{}' parameter {} has unsupported type {}",
                        binding.name, index, param
                    ),
                ));
            }
        }
    }
    Ok(banks)
}

/// Call `binding` with arguments from `stack` and push its typed result
pub fn call_native(stack: &mut OperandStack, binding: &NativeBinding) -> VmResult<()> {
    let code = binding.code.ok_or_else(|| {
        VmError::new(
            ErrorKind::UnsupportedNative,
            format!("native '{}' is not available on this host", binding.name),
        )
    })?;
    if !matches!(
        binding.signature.return_type,
        VarType::Void | VarType::Int | VarType::Double | VarType::String
    ) {
        return Err(VmError::new(
            ErrorKind::NativeSignature,
            format!(
                "native '{}' has unsupported return type {}",
                binding.name, binding.signature.return_type
            ),
        ));
    }

    let banks = marshal(stack, binding)?;
    tracing::debug!(
        native = %binding.name,
        ints = ?banks.ints(),
        floats = ?banks.floats(),
        "native call"
    );

    // SAFETY: the binding's registrant vouched that `code` follows the
    // bridge convention for this signature; string arguments stay pinned
    // in `banks` until the call returns.
    let result = unsafe { trampoline::invoke(code.as_ptr(), &banks, binding.signature.return_type) }
        .map_err(|reason| {
            VmError::new(
                ErrorKind::UnsupportedNative,
                format!("cannot call native '{}': {}", binding.name, reason),
            )
        })?;
    drop(banks);

    match result {
        Some(cell) => stack.push(cell),
        None => Ok(()),
    }
}

#[cfg(all(
    any(target_arch = "x86_64", target_arch = "aarch64"),
    not(target_os = "windows")
))]
mod trampoline {
    use super::*;
    use std::ffi::c_void;

    type IntFn = unsafe extern "C" fn(i64, i64, i64, i64, i64, i64, f64, f64, f64, f64, f64, f64) -> i64;
    type FloatFn = unsafe extern "C" fn(i64, i64, i64, i64, i64, i64, f64, f64, f64, f64, f64, f64) -> f64;
    type StrFn =
        unsafe extern "C" fn(i64, i64, i64, i64, i64, i64, f64, f64, f64, f64, f64, f64) -> *const c_char;

    /// # Safety
    ///
    /// `code` must follow the bridge convention for a function returning
    /// `ret`.
    pub(super) unsafe fn invoke(
        code: *const c_void,
        banks: &RegisterBanks,
        ret: VarType,
    ) -> Result<Option<Cell>, &'static str> {
        let [i0, i1, i2, i3, i4, i5] = banks.int_registers();
        let [f0, f1, f2, f3, f4, f5] = banks.float_registers();
        match ret {
            VarType::Double => {
                let f: FloatFn = std::mem::transmute(code);
                Ok(Some(Cell::Double(f(i0, i1, i2, i3, i4, i5, f0, f1, f2, f3, f4, f5))))
            }
            VarType::String => {
                let f: StrFn = std::mem::transmute(code);
                let ptr = f(i0, i1, i2, i3, i4, i5, f0, f1, f2, f3, f4, f5);
                if ptr.is_null() {
                    return Ok(Some(Cell::empty_string()));
                }
                let owned = CStr::from_ptr(ptr).to_owned();
                Ok(Some(Cell::Str(Arc::from(owned))))
            }
            VarType::Int | VarType::Void => {
                let f: IntFn = std::mem::transmute(code);
                let value = f(i0, i1, i2, i3, i4, i5, f0, f1, f2, f3, f4, f5);
                Ok((ret == VarType::Int).then_some(Cell::Int(value)))
            }
            VarType::Invalid => Err("invalid return type"),
        }
    }
}

#[cfg(not(all(
    any(target_arch = "x86_64", target_arch = "aarch64"),
    not(target_os = "windows")
)))]
mod trampoline {
    use super::*;
    use std::ffi::c_void;

    pub(super) unsafe fn invoke(
        _code: *const c_void,
        _banks: &RegisterBanks,
        _ret: VarType,
    ) -> Result<Option<Cell>, &'static str> {
        Err("native calls are not supported on this target")
    }
}
