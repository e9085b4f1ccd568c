//! Encode and decode errors for Kestrel instruction streams.

use thiserror::Error;

use crate::opcode::Opcode;

/// Errors that occur while decoding a byte stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The byte does not name any opcode.
    #[error("opcode {0} undefined")]
    UndefinedOpcode(u8),

    /// The stream ends before all operands of an instruction were read.
    #[error("{opcode} needs {needed} operand bytes, only {available} available")]
    Truncated {
        opcode: &'static str,
        needed: usize,
        available: usize,
    },
}

/// Errors that occur while encoding an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Wrong number of operands for the opcode.
    #[error("{opcode} expects {expected} operand(s), got {got}")]
    OperandCount {
        opcode: Opcode,
        expected: usize,
        got: usize,
    },

    /// Operand does not fit in its encoded width.
    #[error("operand {operand} does not fit in {width} byte(s) for {opcode}")]
    OperandOutOfRange {
        opcode: Opcode,
        operand: usize,
        width: usize,
    },

    /// Patch target does not hold an instruction with the same layout.
    #[error("cannot patch instruction at offset {at}")]
    BadPatch { at: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_undefined_opcode() {
        assert_eq!(
            DecodeError::UndefinedOpcode(42).to_string(),
            "opcode 42 undefined"
        );
    }

    #[test]
    fn display_truncated() {
        let e = DecodeError::Truncated {
            opcode: "OpConstant",
            needed: 2,
            available: 1,
        };
        assert_eq!(
            e.to_string(),
            "OpConstant needs 2 operand bytes, only 1 available"
        );
    }

    #[test]
    fn display_operand_count() {
        let e = EncodeError::OperandCount {
            opcode: Opcode::Add,
            expected: 0,
            got: 1,
        };
        assert_eq!(e.to_string(), "OpAdd expects 0 operand(s), got 1");
    }

    #[test]
    fn display_operand_out_of_range() {
        let e = EncodeError::OperandOutOfRange {
            opcode: Opcode::Constant,
            operand: 70000,
            width: 2,
        };
        assert_eq!(
            e.to_string(),
            "operand 70000 does not fit in 2 byte(s) for OpConstant"
        );
    }

    #[test]
    fn display_bad_patch() {
        assert_eq!(
            EncodeError::BadPatch { at: 7 }.to_string(),
            "cannot patch instruction at offset 7"
        );
    }
}
