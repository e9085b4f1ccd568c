//! Compile errors for the Kestrel compiler.
//!
//! Any error aborts the compilation unit. Bytecode accumulated before the
//! error must not be executed.

use kestrel_common::EncodeError;
use thiserror::Error;

/// Errors that occur while compiling a syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Prefix or infix operator the instruction set has no opcode for.
    #[error("unknown operator {0}")]
    UnknownOperator(String),

    /// Identifier referenced before any `let` bound it.
    #[error("undefined variable {0}")]
    UndefinedVariable(String),

    /// Syntax the bytecode compiler does not support.
    #[error("unsupported node: {0}")]
    UnsupportedNode(&'static str),

    /// More constants than an `OpConstant` operand can address.
    #[error("constant pool overflow: index {0} exceeds 65535")]
    ConstantPoolOverflow(usize),

    /// More globals than an `OpSetGlobal` operand can address.
    #[error("too many globals: slot {0} exceeds 65535")]
    TooManyGlobals(usize),

    /// An instruction could not be encoded, e.g. a jump past 65535.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}
