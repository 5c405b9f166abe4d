//! Bytecode functions and signatures

use core_types::VarType;

use crate::bytecode::Bytecode;

/// Function identifier; also its index in the program's function table
pub type FunctionId = u16;

/// Declared return and parameter types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Return type (`Void` when nothing is returned)
    pub return_type: VarType,
    /// Parameter types in declaration order
    pub params: Vec<VarType>,
}

impl Signature {
    /// Create a signature
    pub fn new(return_type: VarType, params: impl Into<Vec<VarType>>) -> Self {
        Self {
            return_type,
            params: params.into(),
        }
    }
}

/// One translated function
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Unique id, equal to the position in the function table
    pub id: FunctionId,
    /// Source-level name, used in diagnostics
    pub name: String,
    /// Declared types
    pub signature: Signature,
    /// Number of local variable slots a frame of this function needs
    pub locals: u16,
    /// Function body
    pub bytecode: Bytecode,
}

impl Function {
    /// Create a function
    pub fn new(
        id: FunctionId,
        name: impl Into<String>,
        signature: Signature,
        locals: u16,
        bytecode: Bytecode,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            signature,
            locals,
            bytecode,
        }
    }
}
