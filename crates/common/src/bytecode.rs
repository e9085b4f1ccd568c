//! Compiled output handed from the compiler to the VM.

use crate::instruction::Instructions;
use crate::value::Value;

/// A compiled unit: the instruction stream plus the constant pool it
/// indexes into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bytecode {
    /// The instruction stream.
    pub instructions: Instructions,
    /// Constant pool, indexed by `OpConstant` operands.
    pub constants: Vec<Value>,
}

impl Bytecode {
    /// Create bytecode from instructions and constants.
    pub fn new(instructions: Instructions, constants: Vec<Value>) -> Self {
        Self {
            instructions,
            constants,
        }
    }

    /// Returns true if there are no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
