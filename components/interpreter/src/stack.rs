//! Operand stack
//!
//! A single evaluation stack shared by every active invocation. Cells keep
//! their tag, so a pop through the wrong accessor is detected and reported
//! instead of reinterpreting bits.

use std::ffi::CStr;
use std::sync::Arc;

use core_types::{Cell, ErrorKind, VarType, VmError, VmResult};

/// Bounded stack of typed cells
#[derive(Debug, Clone)]
pub struct OperandStack {
    cells: Vec<Cell>,
    limit: usize,
}

impl OperandStack {
    /// Create an empty stack that holds at most `limit` cells
    pub fn new(limit: usize) -> Self {
        Self {
            cells: Vec::with_capacity(limit.min(256)),
            limit,
        }
    }

    /// Number of cells currently on the stack
    pub fn depth(&self) -> usize {
        self.cells.len()
    }

    /// Whether the stack holds no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Push a cell of any kind
    pub fn push(&mut self, cell: Cell) -> VmResult<()> {
        if self.cells.len() >= self.limit {
            return Err(VmError::new(
                ErrorKind::StackOverflow,
                format!("operand stack exceeds {} cells", self.limit),
            ));
        }
        self.cells.push(cell);
        Ok(())
    }

    /// Push an integer
    pub fn push_int(&mut self, value: i64) -> VmResult<()> {
        self.push(Cell::Int(value))
    }

    /// Push a double
    pub fn push_double(&mut self, value: f64) -> VmResult<()> {
        self.push(Cell::Double(value))
    }

    /// Push a string reference
    pub fn push_str(&mut self, value: Arc<CStr>) -> VmResult<()> {
        self.push(Cell::Str(value))
    }

    /// Pop the top cell regardless of kind
    pub fn pop(&mut self) -> VmResult<Cell> {
        self.cells
            .pop()
            .ok_or_else(|| VmError::stack_discipline("pop from empty operand stack"))
    }

    /// Pop the top cell, which must have type `ty`
    pub fn pop_typed(&mut self, ty: VarType) -> VmResult<Cell> {
        match self.cells.last() {
            Some(cell) if cell.var_type() == ty => self.pop(),
            Some(cell) => Err(VmError::stack_discipline(format!(
                "expected {} on top of stack, found {}",
                ty,
                cell.var_type()
            ))),
            None => Err(VmError::stack_discipline(format!(
                "pop {} from empty operand stack",
                ty
            ))),
        }
    }

    /// Pop an integer
    pub fn pop_int(&mut self) -> VmResult<i64> {
        match self.pop_typed(VarType::Int)? {
            Cell::Int(n) => Ok(n),
            other => Err(mismatch(VarType::Int, &other)),
        }
    }

    /// Pop a double
    pub fn pop_double(&mut self) -> VmResult<f64> {
        match self.pop_typed(VarType::Double)? {
            Cell::Double(d) => Ok(d),
            other => Err(mismatch(VarType::Double, &other)),
        }
    }

    /// Pop a string reference
    pub fn pop_str(&mut self) -> VmResult<Arc<CStr>> {
        match self.pop_typed(VarType::String)? {
            Cell::Str(s) => Ok(s),
            other => Err(mismatch(VarType::String, &other)),
        }
    }

    /// The top cell, without removing it
    pub fn peek(&self) -> Option<&Cell> {
        self.cells.last()
    }

    /// Exchange the two topmost cells, whatever their kinds
    pub fn swap(&mut self) -> VmResult<()> {
        let len = self.cells.len();
        if len < 2 {
            return Err(VmError::stack_discipline(format!(
                "swap needs two cells, stack holds {}",
                len
            )));
        }
        self.cells.swap(len - 1, len - 2);
        Ok(())
    }
}

fn mismatch(expected: VarType, found: &Cell) -> VmError {
    VmError::stack_discipline(format!(
        "expected {} on top of stack, found {}",
        expected,
        found.var_type()
    ))
}
