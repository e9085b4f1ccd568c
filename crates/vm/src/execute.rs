//! Main execution loop and opcode dispatch for the Kestrel VM.

use crate::error::RuntimeError;
use crate::machine::Vm;
use kestrel_common::{Opcode, Value};
use log::{debug, trace};

impl Vm {
    /// Run the instruction stream to completion.
    ///
    /// Stops at the first error, leaving the stack as it was at that point.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        debug!(
            "running {} bytes with {} constant(s)",
            self.instructions.len(),
            self.constants.len()
        );

        let mut ip = 0;
        while ip < self.instructions.len() {
            self.ip = ip;
            let (op, operands, read) = self.fetch(ip)?;
            ip += 1 + read;
            trace!("{:04} {} {:?} sp={}", self.ip, op, operands, self.sp);

            match op {
                Opcode::Constant => {
                    let value = self
                        .constants
                        .get(operands[0])
                        .cloned()
                        .ok_or(RuntimeError::UnknownConstant {
                            at: self.ip,
                            index: operands[0],
                        })?;
                    self.push(value)?;
                }
                Opcode::Pop => {
                    let value = self.pop()?;
                    self.last_popped = Some(value);
                }

                // Arithmetic
                Opcode::Add => self.exec_binary_arith(op, i64::wrapping_add)?,
                Opcode::Sub => self.exec_binary_arith(op, i64::wrapping_sub)?,
                Opcode::Mul => self.exec_binary_arith(op, i64::wrapping_mul)?,
                Opcode::Div => self.exec_div()?,
                Opcode::Minus => self.exec_minus()?,

                // Comparison
                Opcode::Equal => self.exec_equality(|a, b| a == b)?,
                Opcode::NotEqual => self.exec_equality(|a, b| a != b)?,
                Opcode::GreaterThan => self.exec_greater_than()?,
                Opcode::Bang => self.exec_bang()?,

                // Literals
                Opcode::True => self.push(Value::Boolean(true))?,
                Opcode::False => self.push(Value::Boolean(false))?,
                Opcode::Null => self.push(Value::Null)?,

                // Control flow
                Opcode::Jump => ip = operands[0],
                Opcode::JumpNotTruthy => {
                    let condition = self.pop()?;
                    if !condition.is_truthy() {
                        ip = operands[0];
                    }
                }

                // Globals
                Opcode::SetGlobal => {
                    let value = self.pop()?;
                    self.set_global(operands[0], value);
                }
                Opcode::GetGlobal => {
                    let value = self.get_global(operands[0])?;
                    self.push(value)?;
                }
            }
        }

        debug!("finished with sp={}", self.sp);
        Ok(())
    }

    /// Pop right, pop left, push `f(left, right)`. Integers only.
    fn exec_binary_arith(&mut self, op: Opcode, f: fn(i64, i64) -> i64) -> Result<(), RuntimeError> {
        let (left, right) = self.pop_integers(op)?;
        self.push(Value::Integer(f(left, right)))
    }

    fn exec_div(&mut self) -> Result<(), RuntimeError> {
        let (left, right) = self.pop_integers(Opcode::Div)?;
        if right == 0 {
            return Err(RuntimeError::DivisionByZero { at: self.ip });
        }
        self.push(Value::Integer(left.wrapping_div(right)))
    }

    fn exec_greater_than(&mut self) -> Result<(), RuntimeError> {
        let (left, right) = self.pop_integers(Opcode::GreaterThan)?;
        self.push(Value::Boolean(left > right))
    }

    /// Structural comparison; values of different types are never equal.
    fn exec_equality(&mut self, cmp: fn(&Value, &Value) -> bool) -> Result<(), RuntimeError> {
        let right = self.pop()?;
        let left = self.pop()?;
        self.push(Value::Boolean(cmp(&left, &right)))
    }

    fn exec_bang(&mut self) -> Result<(), RuntimeError> {
        let operand = self.pop()?;
        let result = match operand {
            Value::Boolean(b) => !b,
            Value::Null => true,
            Value::Integer(_) => false,
        };
        self.push(Value::Boolean(result))
    }

    fn exec_minus(&mut self) -> Result<(), RuntimeError> {
        match self.pop()? {
            Value::Integer(n) => self.push(Value::Integer(n.wrapping_neg())),
            other => Err(RuntimeError::UnsupportedNegation {
                at: self.ip,
                operand: other.type_name(),
            }),
        }
    }

    /// Pop right then left; both must be integers.
    fn pop_integers(&mut self, op: Opcode) -> Result<(i64, i64), RuntimeError> {
        let right = self.pop()?;
        let left = self.pop()?;
        match (&left, &right) {
            (Value::Integer(l), Value::Integer(r)) => Ok((*l, *r)),
            _ => Err(RuntimeError::UnsupportedBinaryOperands {
                at: self.ip,
                op,
                left: left.type_name(),
                right: right.type_name(),
            }),
        }
    }
}
