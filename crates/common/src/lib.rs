//! Kestrel common types and instruction encoding.
//!
//! This crate provides the data structures shared by the compiler and the
//! VM:
//!
//! - [`Opcode`] and [`Definition`]: the instruction set and operand widths
//! - [`encode`] / [`decode_operands`]: big-endian operand encoding
//! - [`Instructions`]: a byte-addressed instruction stream
//! - [`disassemble`]: `"0000 OpConstant 1"` style listings
//! - [`Value`]: runtime values
//! - [`Bytecode`]: instructions plus constant pool
//! - [`ast`]: the syntax tree the compiler consumes

pub mod ast;
pub mod bytecode;
pub mod disassembler;
pub mod error;
pub mod instruction;
pub mod opcode;
pub mod value;

// Re-export commonly used types at the crate root.
pub use bytecode::Bytecode;
pub use disassembler::disassemble;
pub use error::{DecodeError, EncodeError};
pub use instruction::{decode_operands, encode, encode_raw, read_u16, Instructions};
pub use opcode::{lookup, Definition, Opcode};
pub use value::Value;

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy that generates a random valid Opcode.
    fn arb_opcode() -> impl Strategy<Value = Opcode> {
        prop::sample::select(&opcode::ALL_OPCODES[..])
    }

    /// Strategy that generates an opcode with operands that fit its widths.
    fn arb_instruction() -> impl Strategy<Value = (Opcode, Vec<usize>)> {
        arb_opcode().prop_flat_map(|op| {
            let operands: Vec<_> = op
                .definition()
                .operand_widths
                .iter()
                .map(|&w| 0..(1usize << (8 * w)))
                .collect();
            (Just(op), operands)
        })
    }

    proptest! {
        /// For all valid operands, decode(encode(op, operands)) == operands.
        #[test]
        fn encode_decode_roundtrip((op, operands) in arb_instruction()) {
            let bytes = encode(op, &operands).unwrap();
            let def = lookup(bytes[0]).unwrap();
            let (decoded, read) = decode_operands(def, &bytes[1..]).unwrap();
            prop_assert_eq!(decoded, operands);
            prop_assert_eq!(read, def.operand_len());
            prop_assert_eq!(bytes.len(), 1 + read);
        }

        /// Disassembling a concatenation of valid instructions yields one
        /// line per instruction and never an error.
        #[test]
        fn disassembly_has_one_line_per_instruction(
            instrs in prop::collection::vec(arb_instruction(), 0..50)
        ) {
            let ins: Instructions = instrs
                .iter()
                .map(|(op, operands)| encode(*op, operands).unwrap())
                .collect();
            let text = disassemble(&ins);
            prop_assert_eq!(text.lines().count(), instrs.len());
            prop_assert!(!text.contains("ERROR"));
        }

        /// For any byte stream, disassembly terminates.
        #[test]
        fn random_bytes_disassemble(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            let text = disassemble(&bytes);
            prop_assert!(text.lines().count() <= bytes.len());
        }
    }
}
