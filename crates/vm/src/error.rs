//! Runtime errors for the Kestrel VM.
//!
//! Every error carries the byte offset (`at`) of the instruction that
//! failed. An error stops the run loop immediately; the stack is left as it
//! was at the point of failure.

use kestrel_common::{DecodeError, Opcode};
use thiserror::Error;

/// Errors that occur during execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Push with the stack already at capacity.
    #[error("stack overflow at offset {at}")]
    StackOverflow { at: usize },

    /// Pop from an empty stack. Well-formed compiler output never does this.
    #[error("stack underflow at offset {at}")]
    StackUnderflow { at: usize },

    /// The instruction at `at` could not be decoded.
    #[error("cannot decode instruction at offset {at}: {source}")]
    Decode {
        at: usize,
        #[source]
        source: DecodeError,
    },

    /// `OpConstant` index past the end of the constant pool.
    #[error("constant {index} out of range at offset {at}")]
    UnknownConstant { at: usize, index: usize },

    /// `OpGetGlobal` on a slot that was never written.
    #[error("global {index} is undefined at offset {at}")]
    UndefinedGlobal { at: usize, index: usize },

    /// Binary operator applied to operand types it does not support.
    #[error("unsupported types for {op}: {left} {right} at offset {at}")]
    UnsupportedBinaryOperands {
        at: usize,
        op: Opcode,
        left: &'static str,
        right: &'static str,
    },

    /// `OpMinus` on a non-integer.
    #[error("unsupported type for negation: {operand} at offset {at}")]
    UnsupportedNegation { at: usize, operand: &'static str },

    /// Integer division by zero.
    #[error("division by zero at offset {at}")]
    DivisionByZero { at: usize },
}
