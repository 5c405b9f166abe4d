//! Variable context manager
//!
//! One [`Frame`] per active invocation, kept on a [`ContextStack`]. Each
//! frame stores its locals in three typed banks (ints, doubles, strings),
//! all sized to the function's local count, so slot `n` can hold one value
//! of each type at once. Unwritten slots read as the zero of their type.
//!
//! Frames are addressed either as the top frame or through a context id.
//! A context id is a function id and resolves to the innermost active
//! frame of that function. Under recursion only the innermost of several
//! active invocations is reachable this way.

use std::ffi::CStr;
use std::sync::Arc;

use bytecode_system::FunctionId;
use core_types::{Cell, VarType, VmError, VmResult};

/// Number of slots per type reachable through the cached accessors
pub const CACHED_SLOTS: u16 = 4;

/// Which frame a variable access targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The frame of the executing invocation
    Top,
    /// The innermost active frame of the given function
    Context(FunctionId),
}

/// Local variable storage of one active invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    function: FunctionId,
    instance: u64,
    ints: Box<[i64]>,
    doubles: Box<[f64]>,
    strings: Box<[Option<Arc<CStr>>]>,
}

impl Frame {
    /// Create a frame with `locals` slots of each type
    pub fn new(function: FunctionId, instance: u64, locals: u16) -> Self {
        let n = usize::from(locals);
        Self {
            function,
            instance,
            ints: vec![0; n].into_boxed_slice(),
            doubles: vec![0.0; n].into_boxed_slice(),
            strings: vec![None; n].into_boxed_slice(),
        }
    }

    /// Function this frame belongs to
    pub fn function(&self) -> FunctionId {
        self.function
    }

    /// Unique id of this invocation within one run
    pub fn instance(&self) -> u64 {
        self.instance
    }

    /// Number of slots per type
    pub fn locals(&self) -> usize {
        self.ints.len()
    }

    fn check(&self, slot: u16) -> VmResult<usize> {
        let idx = usize::from(slot);
        if idx < self.locals() {
            Ok(idx)
        } else {
            Err(VmError::bounds(format!(
                "slot {} out of range for function {} ({} locals)",
                slot,
                self.function,
                self.locals()
            )))
        }
    }

    /// Read an integer slot
    pub fn get_int(&self, slot: u16) -> VmResult<i64> {
        Ok(self.ints[self.check(slot)?])
    }

    /// Write an integer slot
    pub fn set_int(&mut self, slot: u16, value: i64) -> VmResult<()> {
        let idx = self.check(slot)?;
        self.ints[idx] = value;
        Ok(())
    }

    /// Read a double slot
    pub fn get_double(&self, slot: u16) -> VmResult<f64> {
        Ok(self.doubles[self.check(slot)?])
    }

    /// Write a double slot
    pub fn set_double(&mut self, slot: u16, value: f64) -> VmResult<()> {
        let idx = self.check(slot)?;
        self.doubles[idx] = value;
        Ok(())
    }

    /// Read a string slot; an unwritten slot holds the empty string
    pub fn get_str(&self, slot: u16) -> VmResult<Arc<CStr>> {
        match &self.strings[self.check(slot)?] {
            Some(s) => Ok(Arc::clone(s)),
            None => Ok(Arc::from(<&CStr>::default())),
        }
    }

    /// Write a string slot
    pub fn set_str(&mut self, slot: u16, value: Arc<CStr>) -> VmResult<()> {
        let idx = self.check(slot)?;
        self.strings[idx] = Some(value);
        Ok(())
    }

    /// Read slot `slot` of the bank for `ty` as a cell
    pub fn load(&self, ty: VarType, slot: u16) -> VmResult<Cell> {
        match ty {
            VarType::Int => self.get_int(slot).map(Cell::Int),
            VarType::Double => self.get_double(slot).map(Cell::Double),
            VarType::String => self.get_str(slot).map(Cell::Str),
            VarType::Void | VarType::Invalid => Err(VmError::stack_discipline(format!(
                "no variable bank for type {}",
                ty
            ))),
        }
    }

    /// Write `cell` into slot `slot` of the bank matching its type
    pub fn store(&mut self, slot: u16, cell: Cell) -> VmResult<()> {
        match cell {
            Cell::Int(n) => self.set_int(slot, n),
            Cell::Double(d) => self.set_double(slot, d),
            Cell::Str(s) => self.set_str(slot, s),
        }
    }
}

/// Stack of active frames, innermost last
#[derive(Debug, Clone, Default)]
pub struct ContextStack {
    frames: Vec<Frame>,
    next_instance: u64,
}

impl ContextStack {
    /// Create an empty context stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active frames
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Push a frame for a new invocation of `function`; returns its
    /// instance id
    pub fn push_scope(&mut self, function: FunctionId, locals: u16) -> u64 {
        let instance = self.next_instance;
        self.next_instance += 1;
        self.frames.push(Frame::new(function, instance, locals));
        tracing::debug!(function, instance, locals, depth = self.frames.len(), "push frame");
        instance
    }

    /// Discard the top frame
    pub fn pop_scope(&mut self) -> VmResult<Frame> {
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| VmError::stack_discipline("pop from empty context stack"))?;
        tracing::debug!(
            function = frame.function,
            instance = frame.instance,
            depth = self.frames.len(),
            "pop frame"
        );
        Ok(frame)
    }

    /// The top frame
    pub fn top(&self) -> VmResult<&Frame> {
        self.frames
            .last()
            .ok_or_else(|| VmError::bounds("no active frame"))
    }

    fn top_mut(&mut self) -> VmResult<&mut Frame> {
        self.frames
            .last_mut()
            .ok_or_else(|| VmError::bounds("no active frame"))
    }

    fn position_of(&self, context: FunctionId) -> VmResult<usize> {
        self.frames
            .iter()
            .rposition(|f| f.function == context)
            .ok_or_else(|| {
                VmError::bounds(format!("context {} has no active frame", context))
            })
    }

    /// Resolve a scope to its frame
    pub fn frame(&self, scope: Scope) -> VmResult<&Frame> {
        match scope {
            Scope::Top => self.top(),
            Scope::Context(id) => Ok(&self.frames[self.position_of(id)?]),
        }
    }

    /// Resolve a scope to its frame, mutably
    pub fn frame_mut(&mut self, scope: Scope) -> VmResult<&mut Frame> {
        match scope {
            Scope::Top => self.top_mut(),
            Scope::Context(id) => {
                let pos = self.position_of(id)?;
                Ok(&mut self.frames[pos])
            }
        }
    }

    /// Typed read from the frame `scope` resolves to
    pub fn load(&self, scope: Scope, ty: VarType, slot: u16) -> VmResult<Cell> {
        self.frame(scope)?.load(ty, slot)
    }

    /// Typed write into the frame `scope` resolves to
    pub fn store(&mut self, scope: Scope, slot: u16, cell: Cell) -> VmResult<()> {
        self.frame_mut(scope)?.store(slot, cell)
    }

    /// Read integer slot `slot` of the top frame
    pub fn get_int(&self, slot: u16) -> VmResult<i64> {
        self.top()?.get_int(slot)
    }

    /// Write integer slot `slot` of the top frame
    pub fn set_int(&mut self, slot: u16, value: i64) -> VmResult<()> {
        self.top_mut()?.set_int(slot, value)
    }

    /// Read double slot `slot` of the top frame
    pub fn get_double(&self, slot: u16) -> VmResult<f64> {
        self.top()?.get_double(slot)
    }

    /// Write double slot `slot` of the top frame
    pub fn set_double(&mut self, slot: u16, value: f64) -> VmResult<()> {
        self.top_mut()?.set_double(slot, value)
    }

    /// Read string slot `slot` of the top frame
    pub fn get_str(&self, slot: u16) -> VmResult<Arc<CStr>> {
        self.top()?.get_str(slot)
    }

    /// Write string slot `slot` of the top frame
    pub fn set_str(&mut self, slot: u16, value: Arc<CStr>) -> VmResult<()> {
        self.top_mut()?.set_str(slot, value)
    }

    /// Read integer slot `slot` of the innermost frame of `context`
    pub fn get_int_in(&self, context: FunctionId, slot: u16) -> VmResult<i64> {
        self.frame(Scope::Context(context))?.get_int(slot)
    }

    /// Write integer slot `slot` of the innermost frame of `context`
    pub fn set_int_in(&mut self, context: FunctionId, slot: u16, value: i64) -> VmResult<()> {
        self.frame_mut(Scope::Context(context))?.set_int(slot, value)
    }

    /// Read double slot `slot` of the innermost frame of `context`
    pub fn get_double_in(&self, context: FunctionId, slot: u16) -> VmResult<f64> {
        self.frame(Scope::Context(context))?.get_double(slot)
    }

    /// Write double slot `slot` of the innermost frame of `context`
    pub fn set_double_in(&mut self, context: FunctionId, slot: u16, value: f64) -> VmResult<()> {
        self.frame_mut(Scope::Context(context))?.set_double(slot, value)
    }

    /// Read string slot `slot` of the innermost frame of `context`
    pub fn get_str_in(&self, context: FunctionId, slot: u16) -> VmResult<Arc<CStr>> {
        self.frame(Scope::Context(context))?.get_str(slot)
    }

    /// Write string slot `slot` of the innermost frame of `context`
    pub fn set_str_in(
        &mut self,
        context: FunctionId,
        slot: u16,
        value: Arc<CStr>,
    ) -> VmResult<()> {
        self.frame_mut(Scope::Context(context))?.set_str(slot, value)
    }

    /// Cached read of slot `index` (0..4) of the top frame.
    ///
    /// Same storage as [`load`](Self::load) with `Scope::Top`.
    pub fn load_cached(&self, ty: VarType, index: u16) -> VmResult<Cell> {
        debug_assert!(index < CACHED_SLOTS);
        self.load(Scope::Top, ty, index)
    }

    /// Cached write of slot `index` (0..4) of the top frame
    pub fn store_cached(&mut self, index: u16, cell: Cell) -> VmResult<()> {
        debug_assert!(index < CACHED_SLOTS);
        self.store(Scope::Top, index, cell)
    }
}
