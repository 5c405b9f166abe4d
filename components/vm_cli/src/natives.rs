//! Native functions the CLI host provides to programs
//!
//! Bindings in an image are resolved by name, and only when the declared
//! signature matches the host function's. Anything else loads unresolved
//! and fails when called.
//!
//! Arguments arrive in bridge order: the last declared parameter is in the
//! first register, so multi-parameter host functions take them reversed.

use std::ffi::{c_char, c_void, CStr};

use bytecode_system::{NativeCode, NativeResolver, Signature};
use core_types::VarType;
use tracing::debug;

extern "C" fn host_sqrt(x: f64) -> f64 {
    x.sqrt()
}

extern "C" fn host_sin(x: f64) -> f64 {
    x.sin()
}

extern "C" fn host_cos(x: f64) -> f64 {
    x.cos()
}

extern "C" fn host_exp(x: f64) -> f64 {
    x.exp()
}

extern "C" fn host_log(x: f64) -> f64 {
    x.ln()
}

extern "C" fn host_fabs(x: f64) -> f64 {
    x.abs()
}

extern "C" fn host_floor(x: f64) -> f64 {
    x.floor()
}

// declared as pow(x, y)
extern "C" fn host_pow(y: f64, x: f64) -> f64 {
    x.powf(y)
}

extern "C" fn host_labs(n: i64) -> i64 {
    n.wrapping_abs()
}

extern "C" fn host_strlen(s: *const c_char) -> i64 {
    if s.is_null() {
        return 0;
    }
    // SAFETY: the bridge passes pointers to live NUL-terminated strings.
    unsafe { CStr::from_ptr(s) }.to_bytes().len() as i64
}

struct HostFn {
    name: &'static str,
    ret: VarType,
    params: &'static [VarType],
    code: *const c_void,
}

fn table() -> [HostFn; 10] {
    use VarType::{Double as D, Int as I, String as S};
    [
        HostFn { name: "sqrt", ret: D, params: &[D], code: host_sqrt as *const c_void },
        HostFn { name: "sin", ret: D, params: &[D], code: host_sin as *const c_void },
        HostFn { name: "cos", ret: D, params: &[D], code: host_cos as *const c_void },
        HostFn { name: "exp", ret: D, params: &[D], code: host_exp as *const c_void },
        HostFn { name: "log", ret: D, params: &[D], code: host_log as *const c_void },
        HostFn { name: "fabs", ret: D, params: &[D], code: host_fabs as *const c_void },
        HostFn { name: "floor", ret: D, params: &[D], code: host_floor as *const c_void },
        HostFn { name: "pow", ret: D, params: &[D, D], code: host_pow as *const c_void },
        HostFn { name: "labs", ret: I, params: &[I], code: host_labs as *const c_void },
        HostFn { name: "strlen", ret: I, params: &[S], code: host_strlen as *const c_void },
    ]
}

/// Resolver for the host's built-in native library
#[derive(Debug, Default, Clone, Copy)]
pub struct HostNatives;

impl HostNatives {
    /// Names of all host natives
    pub fn names() -> Vec<&'static str> {
        table().iter().map(|f| f.name).collect()
    }
}

impl NativeResolver for HostNatives {
    fn resolve(&self, name: &str, signature: &Signature) -> Option<NativeCode> {
        let table = table();
        let Some(f) = table.iter().find(|f| f.name == name) else {
            debug!(native = name, "no host native with this name");
            return None;
        };
        if signature.return_type != f.ret || signature.params != f.params {
            debug!(native = name, ?signature, "host native signature mismatch");
            return None;
        }
        // SAFETY: every table entry is an `extern "C"` function whose
        // parameter and return types are exactly those listed beside it.
        Some(unsafe { NativeCode::from_raw(f.code) })
    }
}
