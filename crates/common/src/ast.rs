//! Syntax tree consumed by the compiler.
//!
//! Trees are produced by an external parser. Operators are kept as the
//! source text so the compiler can reject ones it does not know.

use std::fmt;

/// A whole compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// A braced sequence of statements, e.g. the arms of an `if`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `let <name> = <value>;`
    Let { name: String, value: Expression },
    /// `return <value>;`
    Return(Expression),
    /// An expression evaluated for its effect; its value is discarded.
    Expression(Expression),
    /// A nested block.
    Block(BlockStatement),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Identifier(String),
    IntegerLiteral(i64),
    Boolean(bool),
    StringLiteral(String),
    Prefix {
        operator: String,
        right: Box<Expression>,
    },
    Infix {
        left: Box<Expression>,
        operator: String,
        right: Box<Expression>,
    },
    If {
        condition: Box<Expression>,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
    },
    FunctionLiteral {
        parameters: Vec<String>,
        body: BlockStatement,
    },
    Call {
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

impl BlockStatement {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

impl Expression {
    pub fn ident(name: &str) -> Self {
        Expression::Identifier(name.to_string())
    }

    pub fn prefix(operator: &str, right: Expression) -> Self {
        Expression::Prefix {
            operator: operator.to_string(),
            right: Box::new(right),
        }
    }

    pub fn infix(left: Expression, operator: &str, right: Expression) -> Self {
        Expression::Infix {
            left: Box::new(left),
            operator: operator.to_string(),
            right: Box::new(right),
        }
    }

    pub fn if_else(
        condition: Expression,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
    ) -> Self {
        Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        }
    }

    /// Wrap in an expression statement.
    pub fn stmt(self) -> Statement {
        Statement::Expression(self)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            write!(f, "{statement}")?;
        }
        Ok(())
    }
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{ ")?;
        for statement in &self.statements {
            write!(f, "{statement}")?;
        }
        f.write_str(" }")
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let { name, value } => write!(f, "let {name} = {value};"),
            Statement::Return(value) => write!(f, "return {value};"),
            Statement::Expression(expr) => write!(f, "{expr}"),
            Statement::Block(block) => write!(f, "{block}"),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(name) => f.write_str(name),
            Expression::IntegerLiteral(n) => write!(f, "{n}"),
            Expression::Boolean(b) => write!(f, "{b}"),
            Expression::StringLiteral(s) => write!(f, "{s:?}"),
            Expression::Prefix { operator, right } => write!(f, "({operator}{right})"),
            Expression::Infix {
                left,
                operator,
                right,
            } => write!(f, "({left} {operator} {right})"),
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if {condition} {consequence}")?;
                if let Some(alt) = alternative {
                    write!(f, " else {alt}")?;
                }
                Ok(())
            }
            Expression::FunctionLiteral { parameters, body } => {
                write!(f, "fn({}) {body}", parameters.join(", "))
            }
            Expression::Call {
                function,
                arguments,
            } => {
                let args: Vec<String> = arguments.iter().map(ToString::to_string).collect();
                write!(f, "{function}({})", args.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_let_and_infix() {
        let program = Program::new(vec![
            Statement::Let {
                name: "x".to_string(),
                value: Expression::infix(
                    Expression::IntegerLiteral(1),
                    "+",
                    Expression::prefix("-", Expression::IntegerLiteral(2)),
                ),
            },
            Expression::ident("x").stmt(),
        ]);
        assert_eq!(program.to_string(), "let x = (1 + (-2));x");
    }

    #[test]
    fn display_if_else() {
        let expr = Expression::if_else(
            Expression::Boolean(true),
            BlockStatement::new(vec![Expression::IntegerLiteral(10).stmt()]),
            Some(BlockStatement::new(vec![Expression::IntegerLiteral(20).stmt()])),
        );
        assert_eq!(expr.to_string(), "if true { 10 } else { 20 }");
    }

    #[test]
    fn display_call() {
        let expr = Expression::Call {
            function: Box::new(Expression::ident("add")),
            arguments: vec![Expression::IntegerLiteral(1), Expression::ident("y")],
        };
        assert_eq!(expr.to_string(), "add(1, y)");
    }
}
