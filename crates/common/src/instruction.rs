//! Instruction encoding and decoding for the Kestrel instruction set.
//!
//! An instruction is one opcode byte followed by its operands, each written
//! big-endian in the fixed width given by the opcode's [`Definition`]:
//! ```text
//! OpConstant 65534  =>  [0x00, 0xFF, 0xFE]
//! OpAdd             =>  [0x01]
//! ```
//! Instructions are addressed by byte offset. Jump targets are byte offsets.

use std::fmt;
use std::ops::Deref;

use crate::disassembler;
use crate::error::{DecodeError, EncodeError};
use crate::opcode::{Definition, Opcode};

/// Encode an opcode and its operands.
///
/// The operand count must match the opcode's definition and every operand
/// must fit in its width.
pub fn encode(op: Opcode, operands: &[usize]) -> Result<Vec<u8>, EncodeError> {
    let def = op.definition();
    if operands.len() != def.operand_widths.len() {
        return Err(EncodeError::OperandCount {
            opcode: op,
            expected: def.operand_widths.len(),
            got: operands.len(),
        });
    }

    let mut bytes = Vec::with_capacity(1 + def.operand_len());
    bytes.push(op as u8);
    for (&operand, &width) in operands.iter().zip(def.operand_widths) {
        if !fits(operand, width) {
            return Err(EncodeError::OperandOutOfRange {
                opcode: op,
                operand,
                width,
            });
        }
        for shift in (0..width).rev() {
            bytes.push((operand >> (8 * shift)) as u8);
        }
    }
    Ok(bytes)
}

/// Encode from a raw opcode byte. An undefined byte encodes to nothing.
pub fn encode_raw(byte: u8, operands: &[usize]) -> Result<Vec<u8>, EncodeError> {
    match Opcode::try_from(byte) {
        Ok(op) => encode(op, operands),
        Err(_) => Ok(Vec::new()),
    }
}

/// Decode the operands of one instruction.
///
/// `bytes` starts immediately after the opcode byte. Returns the operand
/// values and the number of bytes consumed.
pub fn decode_operands(def: &Definition, bytes: &[u8]) -> Result<(Vec<usize>, usize), DecodeError> {
    let needed = def.operand_len();
    if bytes.len() < needed {
        return Err(DecodeError::Truncated {
            opcode: def.name,
            needed,
            available: bytes.len(),
        });
    }

    let mut operands = Vec::with_capacity(def.operand_widths.len());
    let mut offset = 0;
    for &width in def.operand_widths {
        let value = bytes[offset..offset + width]
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | b as usize);
        operands.push(value);
        offset += width;
    }
    Ok((operands, offset))
}

/// Read a big-endian `u16` operand from the start of `bytes`.
///
/// The caller guarantees at least two bytes are present.
pub fn read_u16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

fn fits(operand: usize, width: usize) -> bool {
    width >= std::mem::size_of::<usize>() || operand >> (8 * width) == 0
}

/// A flat, byte-addressed instruction stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instructions(Vec<u8>);

impl Instructions {
    /// Create an empty instruction stream.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append encoded bytes, returning the offset they start at.
    pub fn push(&mut self, encoded: &[u8]) -> usize {
        let pos = self.0.len();
        self.0.extend_from_slice(encoded);
        pos
    }

    /// Drop every byte from `pos` onward.
    pub fn truncate(&mut self, pos: usize) {
        self.0.truncate(pos);
    }

    /// Rewrite the single operand of the instruction starting at `pos`.
    ///
    /// The instruction keeps its size; nothing after it moves. `pos` must
    /// start an instruction that carries an operand.
    pub fn patch_operand(&mut self, pos: usize, operand: usize) -> Result<(), EncodeError> {
        let op = self
            .0
            .get(pos)
            .and_then(|&b| Opcode::try_from(b).ok())
            .filter(|op| !op.definition().operand_widths.is_empty())
            .ok_or(EncodeError::BadPatch { at: pos })?;

        let patched = encode(op, &[operand])?;
        let end = pos + patched.len();
        if end > self.0.len() {
            return Err(EncodeError::BadPatch { at: pos });
        }
        self.0[pos..end].copy_from_slice(&patched);
        Ok(())
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into the raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for Instructions {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Instructions {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl FromIterator<Vec<u8>> for Instructions {
    fn from_iter<I: IntoIterator<Item = Vec<u8>>>(iter: I) -> Self {
        Self(iter.into_iter().flatten().collect())
    }
}

impl fmt::Display for Instructions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&disassembler::disassemble(&self.0))
    }
}
