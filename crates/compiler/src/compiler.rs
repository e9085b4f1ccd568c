//! Single-pass translation of a syntax tree into [`Bytecode`].

use kestrel_common::ast::{BlockStatement, Expression, Program, Statement};
use kestrel_common::{encode, Bytecode, Instructions, Opcode, Value};
use log::{debug, trace};

use crate::error::CompileError;
use crate::symbol_table::SymbolTable;

/// Operand written into a jump before its target is known.
pub const JUMP_PLACEHOLDER: usize = 9999;

/// Largest index a 2-byte operand can carry.
const MAX_OPERAND: usize = u16::MAX as usize;

/// Opcode and start offset of an emitted instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmittedInstruction {
    pub opcode: Opcode,
    pub position: usize,
}

/// Compiles one unit at a time.
///
/// The symbol table and constant pool can be carried into a new compiler
/// with [`Compiler::with_state`] so later units see earlier bindings.
#[derive(Debug, Default)]
pub struct Compiler {
    instructions: Instructions,
    constants: Vec<Value>,
    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
    symbol_table: SymbolTable,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume with the symbols and constants of an earlier compilation.
    pub fn with_state(symbol_table: SymbolTable, constants: Vec<Value>) -> Self {
        Self {
            symbol_table,
            constants,
            ..Self::default()
        }
    }

    /// Give back the symbols and constants for a later [`Compiler::with_state`].
    pub fn into_state(self) -> (SymbolTable, Vec<Value>) {
        (self.symbol_table, self.constants)
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbol_table
    }

    /// Snapshot of everything compiled so far.
    pub fn bytecode(&self) -> Bytecode {
        Bytecode::new(self.instructions.clone(), self.constants.clone())
    }

    /// Compile a program, appending to this compiler's instructions.
    pub fn compile(&mut self, program: &Program) -> Result<(), CompileError> {
        debug!(
            "compiling {} statement(s) starting at offset {}",
            program.statements.len(),
            self.instructions.len()
        );
        for statement in &program.statements {
            self.compile_statement(statement)?;
        }
        debug!(
            "compiled {} bytes, {} constant(s)",
            self.instructions.len(),
            self.constants.len()
        );
        Ok(())
    }

    fn compile_block(&mut self, block: &BlockStatement) -> Result<(), CompileError> {
        for statement in &block.statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    fn compile_statement(&mut self, statement: &Statement) -> Result<(), CompileError> {
        match statement {
            Statement::Expression(expr) => {
                self.compile_expression(expr)?;
                self.emit(Opcode::Pop, &[])?;
            }
            Statement::Block(block) => self.compile_block(block)?,
            Statement::Let { name, value } => {
                self.compile_expression(value)?;
                // Check before defining so a failed `let` leaves no binding.
                let slot = self.symbol_table.num_definitions();
                if slot > MAX_OPERAND {
                    return Err(CompileError::TooManyGlobals(slot));
                }
                let symbol = self.symbol_table.define(name);
                self.emit(Opcode::SetGlobal, &[symbol.index])?;
            }
            Statement::Return(_) => return Err(CompileError::UnsupportedNode("return statement")),
        }
        Ok(())
    }

    fn compile_expression(&mut self, expr: &Expression) -> Result<(), CompileError> {
        match expr {
            Expression::IntegerLiteral(n) => {
                let index = self.add_constant(Value::Integer(*n))?;
                self.emit(Opcode::Constant, &[index])?;
            }
            Expression::Boolean(true) => {
                self.emit(Opcode::True, &[])?;
            }
            Expression::Boolean(false) => {
                self.emit(Opcode::False, &[])?;
            }
            Expression::Identifier(name) => {
                let index = self
                    .symbol_table
                    .resolve(name)
                    .map(|symbol| symbol.index)
                    .ok_or_else(|| CompileError::UndefinedVariable(name.clone()))?;
                self.emit(Opcode::GetGlobal, &[index])?;
            }
            Expression::Prefix { operator, right } => {
                self.compile_expression(right)?;
                let op = match operator.as_str() {
                    "!" => Opcode::Bang,
                    "-" => Opcode::Minus,
                    other => return Err(CompileError::UnknownOperator(other.to_string())),
                };
                self.emit(op, &[])?;
            }
            Expression::Infix {
                left,
                operator,
                right,
            } => self.compile_infix(left, operator, right)?,
            Expression::If {
                condition,
                consequence,
                alternative,
            } => self.compile_if(condition, consequence, alternative.as_ref())?,
            Expression::StringLiteral(_) => {
                return Err(CompileError::UnsupportedNode("string literal"))
            }
            Expression::FunctionLiteral { .. } => {
                return Err(CompileError::UnsupportedNode("function literal"))
            }
            Expression::Call { .. } => return Err(CompileError::UnsupportedNode("call expression")),
        }
        Ok(())
    }

    fn compile_infix(
        &mut self,
        left: &Expression,
        operator: &str,
        right: &Expression,
    ) -> Result<(), CompileError> {
        // `a < b` is compiled as `b > a`.
        if operator == "<" {
            self.compile_expression(right)?;
            self.compile_expression(left)?;
            self.emit(Opcode::GreaterThan, &[])?;
            return Ok(());
        }

        self.compile_expression(left)?;
        self.compile_expression(right)?;

        let op = match operator {
            "+" => Opcode::Add,
            "-" => Opcode::Sub,
            "*" => Opcode::Mul,
            "/" => Opcode::Div,
            ">" => Opcode::GreaterThan,
            "==" => Opcode::Equal,
            "!=" => Opcode::NotEqual,
            other => return Err(CompileError::UnknownOperator(other.to_string())),
        };
        self.emit(op, &[])?;
        Ok(())
    }

    /// Layout:
    /// ```text
    ///     <condition>
    ///     OpJumpNotTruthy ELSE
    ///     <consequence>
    ///     OpJump END
    /// ELSE:
    ///     <alternative> | OpNull
    /// END:
    /// ```
    fn compile_if(
        &mut self,
        condition: &Expression,
        consequence: &BlockStatement,
        alternative: Option<&BlockStatement>,
    ) -> Result<(), CompileError> {
        self.compile_expression(condition)?;
        let jump_not_truthy = self.emit(Opcode::JumpNotTruthy, &[JUMP_PLACEHOLDER])?;

        self.compile_branch(consequence)?;
        let jump = self.emit(Opcode::Jump, &[JUMP_PLACEHOLDER])?;

        let after_consequence = self.instructions.len();
        self.change_operand(jump_not_truthy, after_consequence)?;

        match alternative {
            Some(alternative) => self.compile_branch(alternative)?,
            None => {
                self.emit(Opcode::Null, &[])?;
            }
        }

        let after_alternative = self.instructions.len();
        self.change_operand(jump, after_alternative)?;
        Ok(())
    }

    /// Compile one arm of an `if` so that it leaves exactly one value.
    fn compile_branch(&mut self, block: &BlockStatement) -> Result<(), CompileError> {
        self.compile_block(block)?;
        if self.last_instruction_is(Opcode::Pop) {
            self.remove_last_pop();
        } else {
            // Empty arm, or one ending in `let`.
            self.emit(Opcode::Null, &[])?;
        }
        Ok(())
    }

    fn add_constant(&mut self, value: Value) -> Result<usize, CompileError> {
        let index = self.constants.len();
        if index > MAX_OPERAND {
            return Err(CompileError::ConstantPoolOverflow(index));
        }
        self.constants.push(value);
        Ok(index)
    }

    /// Encode and append one instruction, returning its offset.
    fn emit(&mut self, op: Opcode, operands: &[usize]) -> Result<usize, CompileError> {
        let encoded = encode(op, operands)?;
        let position = self.instructions.push(&encoded);
        trace!("emit {position:04} {op} {operands:?}");
        self.set_last_instruction(op, position);
        Ok(position)
    }

    fn set_last_instruction(&mut self, opcode: Opcode, position: usize) {
        self.previous_instruction = self.last_instruction;
        self.last_instruction = Some(EmittedInstruction { opcode, position });
    }

    fn last_instruction_is(&self, op: Opcode) -> bool {
        self.last_instruction.is_some_and(|last| last.opcode == op)
    }

    /// Undo the most recent emission. Only one level of undo is tracked.
    fn remove_last_pop(&mut self) {
        if let Some(last) = self.last_instruction {
            trace!("retract {:04} {}", last.position, last.opcode);
            self.instructions.truncate(last.position);
            self.last_instruction = self.previous_instruction.take();
        }
    }

    fn change_operand(&mut self, position: usize, operand: usize) -> Result<(), CompileError> {
        trace!("patch {position:04} -> {operand}");
        self.instructions.patch_operand(position, operand)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_tracks_last_two_instructions() {
        let mut compiler = Compiler::new();
        compiler.emit(Opcode::True, &[]).unwrap();
        compiler.emit(Opcode::Constant, &[7]).unwrap();
        compiler.emit(Opcode::Pop, &[]).unwrap();

        assert_eq!(
            compiler.previous_instruction,
            Some(EmittedInstruction {
                opcode: Opcode::Constant,
                position: 1
            })
        );
        assert_eq!(
            compiler.last_instruction,
            Some(EmittedInstruction {
                opcode: Opcode::Pop,
                position: 4
            })
        );
    }

    #[test]
    fn remove_last_pop_truncates_and_restores() {
        let mut compiler = Compiler::new();
        compiler.emit(Opcode::Constant, &[0]).unwrap();
        compiler.emit(Opcode::Pop, &[]).unwrap();
        assert!(compiler.last_instruction_is(Opcode::Pop));

        compiler.remove_last_pop();

        assert_eq!(compiler.instructions.len(), 3);
        assert!(compiler.last_instruction_is(Opcode::Constant));
        assert_eq!(compiler.previous_instruction, None);
    }

    #[test]
    fn change_operand_rewrites_in_place() {
        let mut compiler = Compiler::new();
        let pos = compiler
            .emit(Opcode::JumpNotTruthy, &[JUMP_PLACEHOLDER])
            .unwrap();
        compiler.emit(Opcode::Null, &[]).unwrap();
        compiler.change_operand(pos, 4).unwrap();

        assert_eq!(
            compiler.instructions.to_string(),
            "0000 OpJumpNotTruthy 4\n0003 OpNull\n"
        );
    }

    #[test]
    fn jump_target_beyond_operand_range() {
        let mut compiler = Compiler::new();
        let pos = compiler.emit(Opcode::Jump, &[JUMP_PLACEHOLDER]).unwrap();
        assert!(matches!(
            compiler.change_operand(pos, 70000),
            Err(CompileError::Encode(_))
        ));
    }

    #[test]
    fn with_state_keeps_symbols_and_constants() {
        let mut table = SymbolTable::new();
        table.define("a");
        let compiler = Compiler::with_state(table, vec![Value::Integer(1)]);
        assert!(compiler.bytecode().instructions.is_empty());
        assert_eq!(compiler.bytecode().constants, vec![Value::Integer(1)]);
        assert_eq!(compiler.symbol_table().resolve("a").map(|s| s.index), Some(0));
    }
}
