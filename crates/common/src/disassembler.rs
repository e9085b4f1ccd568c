//! Disassembler: instruction bytes → human-readable text.
//!
//! One line per instruction, `"{offset:04} {name} {operands...}"`. An
//! undecodable instruction produces a single `ERROR:` line and ends the walk,
//! since the start of the next instruction is unknown.

use crate::instruction::decode_operands;
use crate::opcode::{lookup, Definition};

/// Disassemble an instruction stream.
pub fn disassemble(bytes: &[u8]) -> String {
    let mut lines = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let decoded = lookup(bytes[i]).and_then(|def| {
            decode_operands(def, &bytes[i + 1..]).map(|(operands, read)| (def, operands, read))
        });

        match decoded {
            Ok((def, operands, read)) => {
                lines.push(format!("{:04} {}", i, format_instruction(def, &operands)));
                i += 1 + read;
            }
            Err(e) => {
                lines.push(format!("ERROR: {e}"));
                break;
            }
        }
    }

    lines.into_iter().map(|line| line + "\n").collect()
}

fn format_instruction(def: &Definition, operands: &[usize]) -> String {
    let mut line = def.name.to_string();
    for operand in operands {
        line.push(' ');
        line.push_str(&operand.to_string());
    }
    line
}
