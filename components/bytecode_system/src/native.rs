//! Native function bindings
//!
//! A binding pairs a display name and a declared signature with the
//! address of natively compiled code. The address is opaque here; the
//! interpreter's native bridge is the only place that calls through it.

use std::ffi::c_void;
use std::fmt;

use crate::function::Signature;

/// Native binding identifier; also its index in the native registry
pub type NativeId = u16;

/// Address of a native function
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct NativeCode(*const c_void);

// The address is only ever read and called through; it is never
// dereferenced as data, and native code is expected to be reentrant.
unsafe impl Send for NativeCode {}
unsafe impl Sync for NativeCode {}

impl NativeCode {
    /// Wrap a native code address.
    ///
    /// # Safety
    ///
    /// `ptr` must be the entry point of a function that follows the VM's
    /// native calling convention for the signature it is registered
    /// with: integer and string parameters in the integer argument
    /// registers, doubles in the float argument registers, each in
    /// declaration order, returning an `i64`, an `f64` or a
    /// `*const c_char` according to the declared return type. Any string
    /// it returns must stay readable until the call returns.
    pub unsafe fn from_raw(ptr: *const c_void) -> Self {
        Self(ptr)
    }

    /// The raw address
    pub fn as_ptr(self) -> *const c_void {
        self.0
    }
}

impl fmt::Debug for NativeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeCode({:p})", self.0)
    }
}

/// A registered native function
#[derive(Debug, Clone, PartialEq)]
pub struct NativeBinding {
    /// Display name, also the lookup key for resolvers
    pub name: String,
    /// Declared signature
    pub signature: Signature,
    /// Code address; `None` when the name could not be resolved
    pub code: Option<NativeCode>,
}

impl NativeBinding {
    /// Create a resolved binding
    pub fn new(name: impl Into<String>, signature: Signature, code: NativeCode) -> Self {
        Self {
            name: name.into(),
            signature,
            code: Some(code),
        }
    }

    /// Create a binding whose code is not available on this host
    pub fn unresolved(name: impl Into<String>, signature: Signature) -> Self {
        Self {
            name: name.into(),
            signature,
            code: None,
        }
    }
}

/// Maps native names to code addresses when a program image is loaded
pub trait NativeResolver {
    /// Resolve `name` declared with `signature`; `None` if unknown
    fn resolve(&self, name: &str, signature: &Signature) -> Option<NativeCode>;
}

/// Resolver that knows no natives; every binding loads unresolved
#[derive(Debug, Default, Clone, Copy)]
pub struct NoNatives;

impl NativeResolver for NoNatives {
    fn resolve(&self, _name: &str, _signature: &Signature) -> Option<NativeCode> {
        None
    }
}

impl<F> NativeResolver for F
where
    F: Fn(&str, &Signature) -> Option<NativeCode>,
{
    fn resolve(&self, name: &str, signature: &Signature) -> Option<NativeCode> {
        self(name, signature)
    }
}
