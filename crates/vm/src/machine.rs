//! VM state management: stack, globals, constant pool.

use crate::error::RuntimeError;
use kestrel_common::{decode_operands, Bytecode, Instructions, Opcode, Value};

/// Default operand stack capacity.
pub const STACK_SIZE: usize = 2048;

/// The Kestrel virtual machine.
///
/// `sp` always points at the next free stack slot; the top of the stack is
/// `stack[sp - 1]`. The value discarded by the most recent `OpPop`, which is
/// the value of the last expression statement, is kept in
/// [`Vm::last_popped`].
#[derive(Debug)]
pub struct Vm {
    /// Constant pool, read-only during execution.
    pub(crate) constants: Vec<Value>,
    /// The instruction stream, read-only during execution.
    pub(crate) instructions: Instructions,
    /// Fixed-capacity operand stack.
    pub(crate) stack: Vec<Value>,
    /// Next free stack slot.
    pub(crate) sp: usize,
    /// Global store, indexed by symbol table slots.
    pub(crate) globals: Vec<Value>,
    /// Offset of the instruction being executed, for error reporting.
    pub(crate) ip: usize,
    /// Value removed by the most recent `OpPop`.
    pub(crate) last_popped: Option<Value>,
}

impl Vm {
    /// Create a VM with the default stack capacity and empty globals.
    pub fn new(bytecode: Bytecode) -> Self {
        Self::with_stack_size(bytecode, STACK_SIZE)
    }

    /// Create a VM with a custom stack capacity.
    pub fn with_stack_size(bytecode: Bytecode, stack_size: usize) -> Self {
        Self {
            constants: bytecode.constants,
            instructions: bytecode.instructions,
            stack: vec![Value::Null; stack_size],
            sp: 0,
            globals: Vec::new(),
            ip: 0,
            last_popped: None,
        }
    }

    /// Create a VM that continues with the globals of an earlier run.
    pub fn with_globals(bytecode: Bytecode, globals: Vec<Value>) -> Self {
        let mut vm = Self::new(bytecode);
        vm.globals = globals;
        vm
    }

    /// Give back the global store for a later [`Vm::with_globals`].
    pub fn into_globals(self) -> Vec<Value> {
        self.globals
    }

    /// The value on top of the stack, if any.
    pub fn stack_top(&self) -> Option<&Value> {
        self.sp.checked_sub(1).map(|top| &self.stack[top])
    }

    /// The value most recently discarded by `OpPop`, if any.
    ///
    /// Values consumed by other opcodes (`OpSetGlobal`, jumps, operators)
    /// do not count.
    pub fn last_popped(&self) -> Option<&Value> {
        self.last_popped.as_ref()
    }

    /// Current stack pointer.
    pub fn sp(&self) -> usize {
        self.sp
    }

    pub fn globals(&self) -> &[Value] {
        &self.globals
    }

    /// Push a value onto the stack, checking for overflow.
    pub(crate) fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        if self.sp >= self.stack.len() {
            return Err(RuntimeError::StackOverflow { at: self.ip });
        }
        self.stack[self.sp] = value;
        self.sp += 1;
        Ok(())
    }

    /// Pop a value from the stack.
    pub(crate) fn pop(&mut self) -> Result<Value, RuntimeError> {
        if self.sp == 0 {
            return Err(RuntimeError::StackUnderflow { at: self.ip });
        }
        self.sp -= 1;
        Ok(self.stack[self.sp].clone())
    }

    /// Decode the instruction at `ip`.
    ///
    /// Returns the opcode, its operands as laid out by the opcode's
    /// [`Definition`](kestrel_common::Definition), and the number of operand
    /// bytes read. The operand count always matches the definition.
    pub(crate) fn fetch(&self, ip: usize) -> Result<(Opcode, Vec<usize>, usize), RuntimeError> {
        let decode_error = |source| RuntimeError::Decode { at: ip, source };
        let op = Opcode::try_from(self.instructions[ip]).map_err(decode_error)?;
        let (operands, read) =
            decode_operands(op.definition(), &self.instructions[ip + 1..]).map_err(decode_error)?;
        Ok((op, operands, read))
    }

    pub(crate) fn set_global(&mut self, index: usize, value: Value) {
        if index >= self.globals.len() {
            self.globals.resize(index + 1, Value::Null);
        }
        self.globals[index] = value;
    }

    pub(crate) fn get_global(&self, index: usize) -> Result<Value, RuntimeError> {
        self.globals
            .get(index)
            .cloned()
            .ok_or(RuntimeError::UndefinedGlobal { at: self.ip, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_common::{encode, DecodeError};

    fn empty_vm(stack_size: usize) -> Vm {
        Vm::with_stack_size(Bytecode::default(), stack_size)
    }

    #[test]
    fn push_pop() {
        let mut vm = empty_vm(4);
        vm.push(Value::Integer(1)).unwrap();
        vm.push(Value::Integer(2)).unwrap();
        assert_eq!(vm.sp(), 2);
        assert_eq!(vm.stack_top(), Some(&Value::Integer(2)));
        assert_eq!(vm.pop().unwrap(), Value::Integer(2));
        assert_eq!(vm.last_popped(), None);
        assert_eq!(vm.stack_top(), Some(&Value::Integer(1)));
    }

    #[test]
    fn overflow_leaves_sp_at_capacity() {
        let mut vm = empty_vm(2);
        vm.push(Value::Null).unwrap();
        vm.push(Value::Null).unwrap();
        assert_eq!(
            vm.push(Value::Integer(3)),
            Err(RuntimeError::StackOverflow { at: 0 })
        );
        assert_eq!(vm.sp(), 2);
    }

    #[test]
    fn underflow_is_an_error() {
        let mut vm = empty_vm(2);
        assert_eq!(vm.pop(), Err(RuntimeError::StackUnderflow { at: 0 }));
        assert_eq!(vm.stack_top(), None);
    }

    #[test]
    fn fetch_reads_operands_from_definition() {
        let instructions: Instructions = [
            encode(Opcode::Constant, &[65534]).unwrap(),
            encode(Opcode::Add, &[]).unwrap(),
        ]
        .into_iter()
        .collect();
        let vm = Vm::new(Bytecode::new(instructions, vec![]));

        assert_eq!(vm.fetch(0), Ok((Opcode::Constant, vec![65534], 2)));
        assert_eq!(vm.fetch(3), Ok((Opcode::Add, vec![], 0)));
    }

    #[test]
    fn fetch_reports_truncated_operand() {
        let instructions = Instructions::from(vec![Opcode::Jump as u8, 0x00]);
        let vm = Vm::new(Bytecode::new(instructions, vec![]));

        assert_eq!(
            vm.fetch(0),
            Err(RuntimeError::Decode {
                at: 0,
                source: DecodeError::Truncated {
                    opcode: "OpJump",
                    needed: 2,
                    available: 1,
                },
            })
        );
    }

    #[test]
    fn globals_grow_on_write() {
        let mut vm = empty_vm(1);
        vm.set_global(3, Value::Boolean(true));
        assert_eq!(vm.globals().len(), 4);
        assert_eq!(vm.get_global(3), Ok(Value::Boolean(true)));
        assert_eq!(vm.get_global(0), Ok(Value::Null));
        assert_eq!(
            vm.get_global(4),
            Err(RuntimeError::UndefinedGlobal { at: 0, index: 4 })
        );
    }

    #[test]
    fn with_globals_carries_store() {
        let vm = Vm::with_globals(Bytecode::default(), vec![Value::Integer(9)]);
        assert_eq!(vm.into_globals(), vec![Value::Integer(9)]);
    }
}
