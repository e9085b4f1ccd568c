//! Kestrel compiler: syntax tree to bytecode.
//!
//! Walks the tree depth-first, emitting instructions into a flat byte
//! buffer. Integer literals go to the constant pool, `let` bindings get
//! global slots, and `if` expressions are laid out with forward jumps that
//! are back-patched once their targets are known.
//!
//! # Usage
//!
//! ```
//! use kestrel_common::ast::{Expression, Program};
//! use kestrel_common::Value;
//! use kestrel_compiler::compile;
//!
//! let program = Program::new(vec![Expression::infix(
//!     Expression::IntegerLiteral(1),
//!     "+",
//!     Expression::IntegerLiteral(2),
//! )
//! .stmt()]);
//!
//! let bytecode = compile(&program).unwrap();
//! assert_eq!(bytecode.constants, vec![Value::Integer(1), Value::Integer(2)]);
//! assert_eq!(
//!     bytecode.instructions.to_string(),
//!     "0000 OpConstant 0\n0003 OpConstant 1\n0006 OpAdd\n0007 OpPop\n"
//! );
//! ```

pub mod compiler;
pub mod error;
pub mod symbol_table;

pub use compiler::Compiler;
pub use error::CompileError;
pub use symbol_table::{Symbol, SymbolTable};

use kestrel_common::ast::Program;
use kestrel_common::Bytecode;

/// Compile a program with a fresh compiler.
///
/// # Errors
///
/// Returns [`CompileError`] on an unknown operator, an undefined variable,
/// or unsupported syntax.
pub fn compile(program: &Program) -> Result<Bytecode, CompileError> {
    let mut compiler = Compiler::new();
    compiler.compile(program)?;
    Ok(compiler.bytecode())
}
