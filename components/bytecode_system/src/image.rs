//! Binary program images
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! magic "SVMP" | version u8
//! entry u16
//! constants: count u32 | { len u32 | bytes }*
//! natives:   count u16 | { name | signature }*
//! functions: count u16 | { name | signature | locals u16 | len u32 | code }*
//!
//! name      = len u16 | utf-8 bytes
//! signature = return type u8 | param count u8 | param type u8*
//! ```
//!
//! Native code addresses are not part of the image; they are looked up by
//! name through a [`NativeResolver`] when the image is loaded.

use std::ffi::CString;
use std::sync::Arc;

use core_types::{VarType, VmError, VmResult};

use crate::bytecode::Bytecode;
use crate::function::{Function, Signature};
use crate::native::{NativeBinding, NativeResolver};
use crate::program::Program;

const MAGIC: &[u8; 4] = b"SVMP";
const VERSION: u8 = 1;

impl Program {
    /// Serialize the program to its binary image
    ///
    /// # Errors
    /// `Bounds` if a count or length does not fit its image field
    pub fn to_bytes(&self) -> VmResult<Vec<u8>> {
        let mut bytes = Vec::new();

        bytes.extend_from_slice(MAGIC);
        bytes.push(VERSION);
        bytes.extend_from_slice(&self.entry().to_le_bytes());

        let count: u32 = field_width(self.constants().len(), "constant count")?;
        bytes.extend_from_slice(&count.to_le_bytes());
        for constant in self.constants() {
            let raw = constant.to_bytes();
            let len: u32 = field_width(raw.len(), "string constant length")?;
            bytes.extend_from_slice(&len.to_le_bytes());
            bytes.extend_from_slice(raw);
        }

        let count: u16 = field_width(self.natives().len(), "native count")?;
        bytes.extend_from_slice(&count.to_le_bytes());
        for native in self.natives() {
            write_name(&mut bytes, &native.name)?;
            write_signature(&mut bytes, &native.signature)?;
        }

        let count: u16 = field_width(self.functions().len(), "function count")?;
        bytes.extend_from_slice(&count.to_le_bytes());
        for function in self.functions() {
            write_name(&mut bytes, &function.name)?;
            write_signature(&mut bytes, &function.signature)?;
            bytes.extend_from_slice(&function.locals.to_le_bytes());
            let code = function.bytecode.as_bytes();
            let len: u32 = field_width(code.len(), "bytecode length")?;
            bytes.extend_from_slice(&len.to_le_bytes());
            bytes.extend_from_slice(code);
        }

        Ok(bytes)
    }

    /// Load a program from its binary image, resolving natives by name
    pub fn from_bytes(bytes: &[u8], resolver: &dyn NativeResolver) -> VmResult<Self> {
        let mut r = ImageReader { bytes, offset: 0 };

        if r.take(4)? != MAGIC {
            return Err(VmError::decode("not a program image (bad magic)"));
        }
        let version = r.u8()?;
        if version != VERSION {
            return Err(VmError::decode(format!(
                "unsupported image version {}",
                version
            )));
        }
        let entry = r.u16()?;

        let constant_count = r.u32()? as usize;
        let mut constants = Vec::with_capacity(constant_count.min(1024));
        for idx in 0..constant_count {
            let len = r.u32()? as usize;
            let raw = r.take(len)?;
            let c = CString::new(raw)
                .map_err(|_| VmError::decode(format!("string constant {} contains NUL", idx)))?;
            constants.push(Arc::from(c));
        }

        let native_count = r.u16()?;
        let mut natives = Vec::with_capacity(usize::from(native_count));
        for _ in 0..native_count {
            let name = r.name()?;
            let signature = r.signature()?;
            let binding = match resolver.resolve(&name, &signature) {
                Some(code) => NativeBinding::new(name, signature, code),
                None => NativeBinding::unresolved(name, signature),
            };
            natives.push(binding);
        }

        let function_count = r.u16()?;
        let mut functions = Vec::with_capacity(usize::from(function_count));
        for id in 0..function_count {
            let name = r.name()?;
            let signature = r.signature()?;
            let locals = r.u16()?;
            let len = r.u32()? as usize;
            let code = r.take(len)?;
            functions.push(Function::new(
                id,
                name,
                signature,
                locals,
                Bytecode::new(code.to_vec()),
            ));
        }

        if r.offset != bytes.len() {
            return Err(VmError::decode(format!(
                "{} trailing bytes after image",
                bytes.len() - r.offset
            )));
        }

        Program::new(functions, constants, natives, entry)
    }
}

fn field_width<T: TryFrom<usize>>(value: usize, what: &str) -> VmResult<T> {
    T::try_from(value).map_err(|_| {
        VmError::bounds(format!(
            "{} {} does not fit its {}-byte image field",
            what,
            value,
            std::mem::size_of::<T>()
        ))
    })
}

fn write_name(bytes: &mut Vec<u8>, name: &str) -> VmResult<()> {
    let raw = name.as_bytes();
    let len: u16 = field_width(raw.len(), "name length")?;
    bytes.extend_from_slice(&len.to_le_bytes());
    bytes.extend_from_slice(raw);
    Ok(())
}

fn write_signature(bytes: &mut Vec<u8>, signature: &Signature) -> VmResult<()> {
    bytes.push(signature.return_type as u8);
    bytes.push(field_width(signature.params.len(), "parameter count")?);
    for param in &signature.params {
        bytes.push(*param as u8);
    }
    Ok(())
}

/// Bounds-checked cursor over an image
struct ImageReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ImageReader<'a> {
    fn take(&mut self, n: usize) -> VmResult<&'a [u8]> {
        let end = self
            .offset
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                VmError::decode(format!(
                    "image truncated: need {} bytes at offset {}",
                    n, self.offset
                ))
            })?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> VmResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> VmResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> VmResult<u16> {
        self.array().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> VmResult<u32> {
        self.array().map(u32::from_le_bytes)
    }

    fn var_type(&mut self) -> VmResult<VarType> {
        let tag = self.u8()?;
        VarType::from_u8(tag).ok_or_else(|| VmError::decode(format!("unknown type tag {}", tag)))
    }

    fn name(&mut self) -> VmResult<String> {
        let len = usize::from(self.u16()?);
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|e| VmError::decode(format!("invalid UTF-8 name: {}", e)))
    }

    fn signature(&mut self) -> VmResult<Signature> {
        let return_type = self.var_type()?;
        let count = self.u8()?;
        let params = (0..count)
            .map(|_| self.var_type())
            .collect::<VmResult<Vec<_>>>()?;
        Ok(Signature::new(return_type, params))
    }
}
