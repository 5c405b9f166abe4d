//! Fully resolved program: functions, string constants and natives
//!
//! A [`Program`] is immutable once built. Interpreters only borrow it, so
//! one program can back any number of independent runs.

use std::ffi::{CStr, CString};
use std::sync::Arc;

use core_types::{VmError, VmResult};

use crate::bytecode::Bytecode;
use crate::function::{Function, FunctionId, Signature};
use crate::native::{NativeBinding, NativeCode, NativeId};

/// Immutable unit of execution
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    functions: Vec<Function>,
    constants: Vec<Arc<CStr>>,
    natives: Vec<NativeBinding>,
    entry: FunctionId,
}

impl Program {
    /// Assemble a program from its parts.
    ///
    /// Function ids must equal their table positions, both tables must fit
    /// the 16-bit id space and the entry id must resolve; anything else is
    /// a bounds error.
    pub fn new(
        functions: Vec<Function>,
        constants: Vec<Arc<CStr>>,
        natives: Vec<NativeBinding>,
        entry: FunctionId,
    ) -> VmResult<Self> {
        if functions.len() > usize::from(u16::MAX) + 1 {
            return Err(VmError::bounds(format!(
                "{} functions exceed the 16-bit id space",
                functions.len()
            )));
        }
        if natives.len() > usize::from(u16::MAX) + 1 {
            return Err(VmError::bounds(format!(
                "{} natives exceed the 16-bit id space",
                natives.len()
            )));
        }
        if let Some((pos, f)) = functions
            .iter()
            .enumerate()
            .find(|(pos, f)| usize::from(f.id) != *pos)
        {
            return Err(VmError::bounds(format!(
                "function '{}' has id {} but sits at index {}",
                f.name, f.id, pos
            )));
        }
        if usize::from(entry) >= functions.len() {
            return Err(VmError::bounds(format!(
                "entry function {} not defined ({} functions)",
                entry,
                functions.len()
            )));
        }
        Ok(Self {
            functions,
            constants,
            natives,
            entry,
        })
    }

    /// Id of the designated entry function
    pub fn entry(&self) -> FunctionId {
        self.entry
    }

    /// The entry function
    pub fn entry_function(&self) -> &Function {
        &self.functions[usize::from(self.entry)]
    }

    /// Look up a function by id
    pub fn function(&self, id: FunctionId) -> VmResult<&Function> {
        self.functions
            .get(usize::from(id))
            .ok_or_else(|| VmError::bounds(format!("function id {} not defined", id)))
    }

    /// Look up a string constant by id
    pub fn constant(&self, id: u16) -> VmResult<&Arc<CStr>> {
        self.constants
            .get(usize::from(id))
            .ok_or_else(|| VmError::bounds(format!("string constant {} not defined", id)))
    }

    /// Look up a native binding by id
    pub fn native(&self, id: NativeId) -> VmResult<&NativeBinding> {
        self.natives
            .get(usize::from(id))
            .ok_or_else(|| VmError::bounds(format!("native id {} not registered", id)))
    }

    /// All functions, by id
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// All string constants, by id
    pub fn constants(&self) -> &[Arc<CStr>] {
        &self.constants
    }

    /// All native bindings, by id
    pub fn natives(&self) -> &[NativeBinding] {
        &self.natives
    }
}

/// Incremental [`Program`] construction, assigning ids in order
///
/// # Example
///
/// ```
/// use bytecode_system::{BytecodeBuilder, Opcode, ProgramBuilder, Signature};
/// use core_types::VarType;
///
/// let mut code = BytecodeBuilder::new();
/// code.iload(2).iload(3).emit(Opcode::IAdd).emit(Opcode::IPrint);
///
/// let mut builder = ProgramBuilder::new();
/// let main = builder.add_function(
///     "<top>",
///     Signature::new(VarType::Void, vec![]),
///     0,
///     code.finish().unwrap(),
/// );
/// let program = builder.build(main).unwrap();
/// assert_eq!(program.entry(), main);
/// ```
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    functions: Vec<Function>,
    constants: Vec<Arc<CStr>>,
    natives: Vec<NativeBinding>,
}

impl ProgramBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string constant and return its id; identical strings share an id
    pub fn add_constant(&mut self, value: &str) -> VmResult<u16> {
        let c = CString::new(value)
            .map_err(|_| VmError::decode(format!("string constant {:?} contains NUL", value)))?;
        if let Some(pos) = self.constants.iter().position(|k| **k == *c) {
            return Ok(pos as u16);
        }
        let id = u16::try_from(self.constants.len())
            .map_err(|_| VmError::bounds("string constant pool is full"))?;
        self.constants.push(Arc::from(c));
        Ok(id)
    }

    /// Add a function and return its id
    ///
    /// As with natives, a table larger than the 16-bit id space fails in
    /// [`build`](ProgramBuilder::build).
    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        signature: Signature,
        locals: u16,
        bytecode: Bytecode,
    ) -> FunctionId {
        let id = self.functions.len() as FunctionId;
        self.functions
            .push(Function::new(id, name, signature, locals, bytecode));
        id
    }

    /// Reserve an id for a function whose body is defined later, so that
    /// mutually recursive functions can refer to each other
    pub fn declare_function(&mut self, name: impl Into<String>, signature: Signature) -> FunctionId {
        self.add_function(name, signature, 0, Bytecode::default())
    }

    /// Define the body of a function reserved with [`declare_function`]
    ///
    /// [`declare_function`]: ProgramBuilder::declare_function
    pub fn define_function(&mut self, id: FunctionId, locals: u16, bytecode: Bytecode) -> VmResult<()> {
        let f = self
            .functions
            .get_mut(usize::from(id))
            .ok_or_else(|| VmError::bounds(format!("function id {} not declared", id)))?;
        f.locals = locals;
        f.bytecode = bytecode;
        Ok(())
    }

    /// Register a native function and return its id
    pub fn add_native(&mut self, name: impl Into<String>, signature: Signature, code: NativeCode) -> NativeId {
        self.push_native(NativeBinding::new(name, signature, code))
    }

    /// Register an already constructed binding (resolved or not)
    ///
    /// Ids past the 16-bit space are not usable; [`build`] rejects such a
    /// table.
    ///
    /// [`build`]: ProgramBuilder::build
    pub fn push_native(&mut self, binding: NativeBinding) -> NativeId {
        let id = self.natives.len() as NativeId;
        self.natives.push(binding);
        id
    }

    /// Finish with `entry` as the program entry point
    pub fn build(self, entry: FunctionId) -> VmResult<Program> {
        Program::new(self.functions, self.constants, self.natives, entry)
    }
}
