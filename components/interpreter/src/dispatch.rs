//! Dispatch loop for bytecode execution
//!
//! Handles individual opcode execution. Calls never recurse on the host
//! stack: `CALL` pushes a [`Continuation`] onto an explicit work list and
//! switches the loop to the callee, and running off the end of a function
//! pops the frame and resumes the continuation.

use std::io::Write;

use bytecode_system::{Bytecode, Function, FunctionId, Opcode, Program};
use core_types::{format_double, Cell, ErrorKind, VarType, VmError, VmResult};

use crate::call_frame::Continuation;
use crate::config::VmConfig;
use crate::context::{ContextStack, Scope};
use crate::native;
use crate::stack::OperandStack;

/// Two doubles closer than this compare equal
pub const DOUBLE_EPSILON: f64 = 1e-11;

/// What the loop does after an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Continue with the next instruction
    Next,
    /// Enter the given function
    Call(FunctionId),
    /// Stop the whole program
    Stop,
}

/// Reads inline operands, advancing past exactly the bytes consumed
struct Operands<'a> {
    code: &'a Bytecode,
    pos: usize,
}

impl<'a> Operands<'a> {
    fn truncated(&self, width: usize) -> VmError {
        VmError::decode(format!(
            "truncated {}-byte operand at offset {} (bytecode length {})",
            width,
            self.pos,
            self.code.len()
        ))
    }

    fn u16(&mut self) -> VmResult<u16> {
        let v = self.code.read_u16(self.pos).ok_or_else(|| self.truncated(2))?;
        self.pos += 2;
        Ok(v)
    }

    fn i16(&mut self) -> VmResult<i16> {
        let v = self.code.read_i16(self.pos).ok_or_else(|| self.truncated(2))?;
        self.pos += 2;
        Ok(v)
    }

    fn i64(&mut self) -> VmResult<i64> {
        let v = self.code.read_i64(self.pos).ok_or_else(|| self.truncated(8))?;
        self.pos += 8;
        Ok(v)
    }

    fn f64(&mut self) -> VmResult<f64> {
        let v = self.code.read_f64(self.pos).ok_or_else(|| self.truncated(8))?;
        self.pos += 8;
        Ok(v)
    }

    /// Apply a jump offset relative to the current position
    fn jump(&mut self, offset: i16) -> VmResult<()> {
        let target = self.pos as i64 + i64::from(offset);
        if target < 0 || target > self.code.len() as i64 {
            return Err(VmError::decode(format!(
                "jump target {} outside bytecode (length {})",
                target,
                self.code.len()
            )));
        }
        self.pos = target as usize;
        Ok(())
    }
}

/// Execution state of one run: operand stack, frames and continuations
#[derive(Debug)]
pub struct Dispatcher {
    stack: OperandStack,
    contexts: ContextStack,
    continuations: Vec<Continuation>,
    config: VmConfig,
    executed: u64,
}

impl Dispatcher {
    /// Create a dispatcher with the limits of `config`
    pub fn new(config: VmConfig) -> Self {
        Self {
            stack: OperandStack::new(config.max_stack_depth),
            contexts: ContextStack::new(),
            continuations: Vec::new(),
            config,
            executed: 0,
        }
    }

    /// The operand stack
    pub fn stack(&self) -> &OperandStack {
        &self.stack
    }

    /// The active frames
    pub fn contexts(&self) -> &ContextStack {
        &self.contexts
    }

    /// Number of pending continuations
    pub fn call_depth(&self) -> usize {
        self.continuations.len()
    }

    /// Instructions dispatched so far
    pub fn instructions_executed(&self) -> u64 {
        self.executed
    }

    /// Run `program` from its entry function to completion.
    ///
    /// `args` are stored into slots `0..args.len()` of the entry frame.
    /// Returns the top of the operand stack when the program ends.
    ///
    /// # Arguments
    ///
    /// * `program` - The program to run
    /// * `args` - Top-level arguments
    /// * `out` - Sink for print instructions
    pub fn run(
        &mut self,
        program: &Program,
        args: &[Cell],
        out: &mut dyn Write,
    ) -> VmResult<Option<Cell>> {
        let mut function = program.entry_function();
        self.contexts.push_scope(function.id, function.locals);
        for (slot, arg) in args.iter().enumerate() {
            let slot = u16::try_from(slot)
                .map_err(|_| VmError::bounds(format!("{} top-level arguments", args.len())))?;
            self.contexts.store(Scope::Top, slot, arg.clone())?;
        }

        let mut cursor = 0usize;
        loop {
            if cursor >= function.bytecode.len() {
                self.contexts.pop_scope()?;
                match self.continuations.pop() {
                    Some(k) => {
                        tracing::debug!(from = function.id, to = k.caller, cursor = k.return_cursor, "return");
                        function = program.function(k.caller)?;
                        cursor = k.return_cursor;
                        continue;
                    }
                    None => break,
                }
            }

            if let Some(budget) = self.config.instruction_budget {
                if self.executed >= budget {
                    return Err(VmError::new(
                        ErrorKind::InstructionBudget,
                        format!("instruction budget of {} exhausted", budget),
                    )
                    .at(function.id, cursor));
                }
            }
            self.executed += 1;

            let at = cursor;
            let flow = self
                .step(program, function, &mut cursor, out)
                .map_err(|e| e.at(function.id, at))?;
            match flow {
                Flow::Next => {}
                Flow::Call(callee_id) => {
                    let callee = program.function(callee_id).map_err(|e| e.at(function.id, at))?;
                    if self.continuations.len() >= self.config.max_call_depth {
                        return Err(VmError::new(
                            ErrorKind::StackOverflow,
                            format!("call depth exceeds {}", self.config.max_call_depth),
                        )
                        .at(function.id, at));
                    }
                    tracing::debug!(caller = function.id, callee = callee.id, name = %callee.name, "call");
                    self.continuations.push(Continuation::new(cursor, function.id));
                    self.contexts.push_scope(callee.id, callee.locals);
                    function = callee;
                    cursor = 0;
                }
                Flow::Stop => break,
            }
        }

        Ok(self.stack.peek().cloned())
    }

    /// Execute the instruction at `cursor`, leaving `cursor` on the next one
    fn step(
        &mut self,
        program: &Program,
        function: &Function,
        cursor: &mut usize,
        out: &mut dyn Write,
    ) -> VmResult<Flow> {
        let code = &function.bytecode;
        let tag = code
            .tag_at(*cursor)
            .ok_or_else(|| VmError::decode("cursor past end of bytecode"))?;
        let op = Opcode::from_u8(tag)
            .ok_or_else(|| VmError::decode(format!("unrecognized opcode {}", tag)))?;
        tracing::trace!(function = function.id, offset = *cursor, op = %op, depth = self.stack.depth(), "dispatch");

        let mut operands = Operands {
            code,
            pos: *cursor + 1,
        };
        let flow = self.execute_op(op, &mut operands, program, function, out)?;
        *cursor = operands.pos;
        Ok(flow)
    }

    fn execute_op(
        &mut self,
        op: Opcode,
        operands: &mut Operands<'_>,
        program: &Program,
        function: &Function,
        out: &mut dyn Write,
    ) -> VmResult<Flow> {
        use Opcode::*;

        match op {
            Invalid => return Err(VmError::decode("INVALID instruction")),

            DLoad => {
                let v = operands.f64()?;
                self.stack.push_double(v)?;
            }
            ILoad => {
                let v = operands.i64()?;
                self.stack.push_int(v)?;
            }
            SLoad => {
                let id = operands.u16()?;
                let s = program.constant(id)?;
                self.stack.push_str(s.clone())?;
            }
            DLoad0 => self.stack.push_double(0.0)?,
            ILoad0 => self.stack.push_int(0)?,
            SLoad0 => self.stack.push(Cell::empty_string())?,
            DLoad1 => self.stack.push_double(1.0)?,
            ILoad1 => self.stack.push_int(1)?,
            DLoadM1 => self.stack.push_double(-1.0)?,
            ILoadM1 => self.stack.push_int(-1)?,

            DAdd => self.double_binary(|l, u| l + u)?,
            DSub => self.double_binary(|l, u| l - u)?,
            DMul => self.double_binary(|l, u| l * u)?,
            DDiv => self.double_binary(|l, u| l / u)?,
            IAdd => self.int_binary(|l, u| Ok(l.wrapping_add(u)))?,
            ISub => self.int_binary(|l, u| Ok(l.wrapping_sub(u)))?,
            IMul => self.int_binary(|l, u| Ok(l.wrapping_mul(u)))?,
            IDiv => self.int_binary(|l, u| {
                if u == 0 {
                    return Err(division_by_zero("division"));
                }
                Ok(l.wrapping_div(u))
            })?,
            IMod => self.int_binary(|l, u| {
                if u == 0 {
                    return Err(division_by_zero("modulo"));
                }
                Ok(l.wrapping_rem(u))
            })?,
            IAOr => self.int_binary(|l, u| Ok(l | u))?,
            IAAnd => self.int_binary(|l, u| Ok(l & u))?,
            IAXor => self.int_binary(|l, u| Ok(l ^ u))?,
            DNeg => {
                let v = self.stack.pop_double()?;
                self.stack.push_double(-v)?;
            }
            INeg => {
                let v = self.stack.pop_int()?;
                self.stack.push_int(v.wrapping_neg())?;
            }

            IPrint => {
                let v = self.stack.pop_int()?;
                write!(out, "{}", v).map_err(output_error)?;
            }
            DPrint => {
                let v = self.stack.pop_double()?;
                out.write_all(format_double(v).as_bytes())
                    .map_err(output_error)?;
            }
            SPrint => {
                let s = self.stack.pop_str()?;
                out.write_all(s.to_bytes()).map_err(output_error)?;
            }

            I2D => {
                let v = self.stack.pop_int()?;
                self.stack.push_double(v as f64)?;
            }
            D2I => {
                // saturating, NaN becomes 0
                let v = self.stack.pop_double()?;
                self.stack.push_int(v as i64)?;
            }
            S2I => {
                let s = self.stack.pop_str()?;
                self.stack.push_int(i64::from(!s.to_bytes().is_empty()))?;
            }

            Swap => self.stack.swap()?,
            Pop => {
                self.stack.pop()?;
            }

            LoadDVar0 | LoadDVar1 | LoadDVar2 | LoadDVar3 => {
                self.load_cached(VarType::Double, op.tag() - LoadDVar0.tag())?
            }
            LoadIVar0 | LoadIVar1 | LoadIVar2 | LoadIVar3 => {
                self.load_cached(VarType::Int, op.tag() - LoadIVar0.tag())?
            }
            LoadSVar0 | LoadSVar1 | LoadSVar2 | LoadSVar3 => {
                self.load_cached(VarType::String, op.tag() - LoadSVar0.tag())?
            }
            StoreDVar0 | StoreDVar1 | StoreDVar2 | StoreDVar3 => {
                self.store_cached(VarType::Double, op.tag() - StoreDVar0.tag())?
            }
            StoreIVar0 | StoreIVar1 | StoreIVar2 | StoreIVar3 => {
                self.store_cached(VarType::Int, op.tag() - StoreIVar0.tag())?
            }
            StoreSVar0 | StoreSVar1 | StoreSVar2 | StoreSVar3 => {
                self.store_cached(VarType::String, op.tag() - StoreSVar0.tag())?
            }

            LoadDVar => self.load_var(Scope::Top, VarType::Double, operands.u16()?)?,
            LoadIVar => self.load_var(Scope::Top, VarType::Int, operands.u16()?)?,
            LoadSVar => self.load_var(Scope::Top, VarType::String, operands.u16()?)?,
            StoreDVar => self.store_var(Scope::Top, VarType::Double, operands.u16()?)?,
            StoreIVar => self.store_var(Scope::Top, VarType::Int, operands.u16()?)?,
            StoreSVar => self.store_var(Scope::Top, VarType::String, operands.u16()?)?,

            LoadCtxDVar | LoadCtxIVar | LoadCtxSVar | StoreCtxDVar | StoreCtxIVar
            | StoreCtxSVar => {
                let context = operands.u16()?;
                let slot = operands.u16()?;
                let scope = Scope::Context(context);
                match op {
                    LoadCtxDVar => self.load_var(scope, VarType::Double, slot)?,
                    LoadCtxIVar => self.load_var(scope, VarType::Int, slot)?,
                    LoadCtxSVar => self.load_var(scope, VarType::String, slot)?,
                    StoreCtxDVar => self.store_var(scope, VarType::Double, slot)?,
                    StoreCtxIVar => self.store_var(scope, VarType::Int, slot)?,
                    _ => self.store_var(scope, VarType::String, slot)?,
                }
            }

            DCmp => {
                let upper = self.stack.pop_double()?;
                let lower = self.stack.pop_double()?;
                self.stack.push_double(lower)?;
                self.stack.push_double(upper)?;
                self.stack.push_int(compare_doubles(lower, upper))?;
            }
            ICmp => {
                let upper = self.stack.pop_int()?;
                let lower = self.stack.pop_int()?;
                self.stack.push_int(lower)?;
                self.stack.push_int(upper)?;
                self.stack.push_int(lower.cmp(&upper) as i64)?;
            }

            Ja => {
                let offset = operands.i16()?;
                operands.jump(offset)?;
            }
            IfICmpNe | IfICmpE | IfICmpG | IfICmpGe | IfICmpL | IfICmpLe => {
                let offset = operands.i16()?;
                let upper = self.stack.pop_int()?;
                let lower = self.stack.pop_int()?;
                self.stack.push_int(lower)?;
                self.stack.push_int(upper)?;
                let taken = match op {
                    IfICmpNe => lower != upper,
                    IfICmpE => lower == upper,
                    IfICmpG => lower > upper,
                    IfICmpGe => lower >= upper,
                    IfICmpL => lower < upper,
                    _ => lower <= upper,
                };
                if taken {
                    operands.jump(offset)?;
                }
            }

            Dump => match self.stack.peek() {
                Some(cell) => tracing::debug!(top = %cell, ty = %cell.var_type(), "dump"),
                None => tracing::debug!("dump: operand stack empty"),
            },
            Break => tracing::debug!(function = function.id, offset = operands.pos - 1, "break"),

            Stop => return Ok(Flow::Stop),
            Call => {
                let id = operands.u16()?;
                return Ok(Flow::Call(id));
            }
            CallNative => {
                let id = operands.u16()?;
                let binding = program.native(id)?;
                native::call_native(&mut self.stack, binding)?;
            }
            Return => operands.pos = operands.code.len(),
        }

        Ok(Flow::Next)
    }

    fn int_binary(&mut self, f: impl FnOnce(i64, i64) -> VmResult<i64>) -> VmResult<()> {
        let upper = self.stack.pop_int()?;
        let lower = self.stack.pop_int()?;
        let result = f(lower, upper)?;
        self.stack.push_int(result)
    }

    fn double_binary(&mut self, f: impl FnOnce(f64, f64) -> f64) -> VmResult<()> {
        let upper = self.stack.pop_double()?;
        let lower = self.stack.pop_double()?;
        self.stack.push_double(f(lower, upper))
    }

    fn load_cached(&mut self, ty: VarType, index: u8) -> VmResult<()> {
        let cell = self.contexts.load_cached(ty, u16::from(index))?;
        self.stack.push(cell)
    }

    fn store_cached(&mut self, ty: VarType, index: u8) -> VmResult<()> {
        let cell = self.stack.pop_typed(ty)?;
        self.contexts.store_cached(u16::from(index), cell)
    }

    fn load_var(&mut self, scope: Scope, ty: VarType, slot: u16) -> VmResult<()> {
        let cell = self.contexts.load(scope, ty, slot)?;
        self.stack.push(cell)
    }

    fn store_var(&mut self, scope: Scope, ty: VarType, slot: u16) -> VmResult<()> {
        let cell = self.stack.pop_typed(ty)?;
        self.contexts.store(scope, slot, cell)
    }
}

/// Tri-state double comparison: `0` within [`DOUBLE_EPSILON`], otherwise
/// the sign of `lower - upper` (`1` when that is NaN)
pub fn compare_doubles(lower: f64, upper: f64) -> i64 {
    let diff = lower - upper;
    if diff.abs() < DOUBLE_EPSILON {
        0
    } else if diff < 0.0 {
        -1
    } else {
        1
    }
}

fn division_by_zero(what: &str) -> VmError {
    VmError::new(ErrorKind::Arithmetic, format!("integer {} by zero", what))
}

fn output_error(e: std::io::Error) -> VmError {
    VmError::new(ErrorKind::Output, format!("print failed: {}", e))
}
