//! Opcode definitions for the Kestrel instruction set.
//!
//! Every instruction starts with one opcode byte. The [`Definition`] for an
//! opcode lists the byte width of each operand that follows it.

use std::fmt;

use crate::error::DecodeError;

/// Identifies the operation to perform.
///
/// The `#[repr(u8)]` attribute gives each variant a stable byte value.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Push `constants[arg]`.
    Constant = 0,
    /// Pop right, pop left, push `left + right`.
    Add = 1,
    /// Discard top of stack.
    Pop = 2,
    /// Pop right, pop left, push `left - right`.
    Sub = 3,
    /// Pop right, pop left, push `left * right`.
    Mul = 4,
    /// Pop right, pop left, push `left / right`.
    Div = 5,
    /// Push `true`.
    True = 6,
    /// Push `false`.
    False = 7,
    /// Pop two, push whether they are equal.
    Equal = 8,
    /// Pop two, push whether they differ.
    NotEqual = 9,
    /// Pop right, pop left, push `left > right`. Also covers `<` with
    /// swapped operands.
    GreaterThan = 10,
    /// Arithmetic negation.
    Minus = 11,
    /// Logical negation.
    Bang = 12,
    /// Pop condition, jump to the absolute offset `arg` if it is falsy.
    JumpNotTruthy = 13,
    /// Jump to the absolute offset `arg`.
    Jump = 14,
    /// Push `null`.
    Null = 15,
    /// Push the global stored in slot `arg`.
    GetGlobal = 16,
    /// Pop into global slot `arg`.
    SetGlobal = 17,
}

/// All opcodes, in byte order. Useful for exhaustive testing.
pub const ALL_OPCODES: [Opcode; 18] = [
    Opcode::Constant,
    Opcode::Add,
    Opcode::Pop,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Div,
    Opcode::True,
    Opcode::False,
    Opcode::Equal,
    Opcode::NotEqual,
    Opcode::GreaterThan,
    Opcode::Minus,
    Opcode::Bang,
    Opcode::JumpNotTruthy,
    Opcode::Jump,
    Opcode::Null,
    Opcode::GetGlobal,
    Opcode::SetGlobal,
];

/// Static metadata for one opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Definition {
    /// Name used in disassembly, e.g. `OpConstant`.
    pub name: &'static str,
    /// Byte width of each operand, in order.
    pub operand_widths: &'static [usize],
}

impl Definition {
    /// Total number of operand bytes following the opcode byte.
    pub fn operand_len(&self) -> usize {
        self.operand_widths.iter().sum()
    }
}

const NO_OPERANDS: &[usize] = &[];
const ONE_U16: &[usize] = &[2];

impl Opcode {
    /// Returns the definition for this opcode.
    pub fn definition(&self) -> &'static Definition {
        const fn def(name: &'static str, operand_widths: &'static [usize]) -> Definition {
            Definition {
                name,
                operand_widths,
            }
        }

        static CONSTANT: Definition = def("OpConstant", ONE_U16);
        static ADD: Definition = def("OpAdd", NO_OPERANDS);
        static POP: Definition = def("OpPop", NO_OPERANDS);
        static SUB: Definition = def("OpSub", NO_OPERANDS);
        static MUL: Definition = def("OpMul", NO_OPERANDS);
        static DIV: Definition = def("OpDiv", NO_OPERANDS);
        static TRUE: Definition = def("OpTrue", NO_OPERANDS);
        static FALSE: Definition = def("OpFalse", NO_OPERANDS);
        static EQUAL: Definition = def("OpEqual", NO_OPERANDS);
        static NOT_EQUAL: Definition = def("OpNotEqual", NO_OPERANDS);
        static GREATER_THAN: Definition = def("OpGreaterThan", NO_OPERANDS);
        static MINUS: Definition = def("OpMinus", NO_OPERANDS);
        static BANG: Definition = def("OpBang", NO_OPERANDS);
        static JUMP_NOT_TRUTHY: Definition = def("OpJumpNotTruthy", ONE_U16);
        static JUMP: Definition = def("OpJump", ONE_U16);
        static NULL: Definition = def("OpNull", NO_OPERANDS);
        static GET_GLOBAL: Definition = def("OpGetGlobal", ONE_U16);
        static SET_GLOBAL: Definition = def("OpSetGlobal", ONE_U16);

        match self {
            Opcode::Constant => &CONSTANT,
            Opcode::Add => &ADD,
            Opcode::Pop => &POP,
            Opcode::Sub => &SUB,
            Opcode::Mul => &MUL,
            Opcode::Div => &DIV,
            Opcode::True => &TRUE,
            Opcode::False => &FALSE,
            Opcode::Equal => &EQUAL,
            Opcode::NotEqual => &NOT_EQUAL,
            Opcode::GreaterThan => &GREATER_THAN,
            Opcode::Minus => &MINUS,
            Opcode::Bang => &BANG,
            Opcode::JumpNotTruthy => &JUMP_NOT_TRUTHY,
            Opcode::Jump => &JUMP,
            Opcode::Null => &NULL,
            Opcode::GetGlobal => &GET_GLOBAL,
            Opcode::SetGlobal => &SET_GLOBAL,
        }
    }

    /// Returns the disassembly name for this opcode.
    pub fn name(&self) -> &'static str {
        self.definition().name
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for Opcode {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ALL_OPCODES
            .get(value as usize)
            .copied()
            .ok_or(DecodeError::UndefinedOpcode(value))
    }
}

/// Look up the definition of the opcode named by `byte`.
pub fn lookup(byte: u8) -> Result<&'static Definition, DecodeError> {
    Opcode::try_from(byte).map(|op| op.definition())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_opcodes_are_in_byte_order() {
        for (i, &opcode) in ALL_OPCODES.iter().enumerate() {
            assert_eq!(opcode as u8 as usize, i, "{opcode:?} out of order");
        }
    }

    #[test]
    fn roundtrip_all_valid_opcodes() {
        for &opcode in &ALL_OPCODES {
            let byte = opcode as u8;
            assert_eq!(Opcode::try_from(byte), Ok(opcode));
        }
    }

    #[test]
    fn undefined_opcodes_rejected() {
        for byte in ALL_OPCODES.len() as u8..=255 {
            assert_eq!(
                Opcode::try_from(byte),
                Err(DecodeError::UndefinedOpcode(byte)),
                "byte {byte:#04x} should be undefined"
            );
        }
    }

    #[test]
    fn lookup_dispatches_on_its_argument() {
        assert_eq!(lookup(Opcode::Add as u8).unwrap().name, "OpAdd");
        assert_eq!(lookup(Opcode::Jump as u8).unwrap().name, "OpJump");
        assert_eq!(lookup(Opcode::Constant as u8).unwrap().name, "OpConstant");
        assert_eq!(lookup(200), Err(DecodeError::UndefinedOpcode(200)));
    }

    #[test]
    fn operand_widths() {
        assert_eq!(Opcode::Constant.definition().operand_widths, &[2]);
        assert_eq!(Opcode::Jump.definition().operand_len(), 2);
        assert_eq!(Opcode::Pop.definition().operand_len(), 0);
        assert!(Opcode::Add.definition().operand_widths.is_empty());
    }

    #[test]
    fn names_are_prefixed() {
        for &opcode in &ALL_OPCODES {
            assert!(opcode.name().starts_with("Op"), "{opcode:?}");
        }
    }
}
