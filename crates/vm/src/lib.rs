//! Kestrel virtual machine: executes compiled bytecode.
//!
//! The VM is a stack machine with:
//! - A fixed-capacity operand stack
//! - A growable global store indexed by `let` slots
//! - A read-only constant pool
//!
//! # Usage
//!
//! ```
//! use kestrel_common::{encode, Bytecode, Instructions, Opcode, Value};
//! use kestrel_vm::run;
//!
//! let instructions: Instructions = vec![
//!     encode(Opcode::Constant, &[0]).unwrap(),
//!     encode(Opcode::Constant, &[1]).unwrap(),
//!     encode(Opcode::Add, &[]).unwrap(),
//!     encode(Opcode::Pop, &[]).unwrap(),
//! ]
//! .into_iter()
//! .collect();
//! let bytecode = Bytecode::new(instructions, vec![Value::Integer(1), Value::Integer(2)]);
//!
//! assert_eq!(run(bytecode).unwrap(), Value::Integer(3));
//! ```

pub mod error;
pub mod execute;
pub mod machine;

pub use error::RuntimeError;
pub use machine::{Vm, STACK_SIZE};

use kestrel_common::{Bytecode, Value};

/// Execute bytecode and return the value of the last expression statement.
///
/// Returns `Null` if the program has no expression statement.
///
/// # Errors
///
/// Returns [`RuntimeError`] on stack overflow, type errors, division by zero,
/// or an undecodable instruction.
pub fn run(bytecode: Bytecode) -> Result<Value, RuntimeError> {
    let mut vm = Vm::new(bytecode);
    vm.run()?;
    Ok(vm.last_popped().cloned().unwrap_or_default())
}
