//! Runtime value representation for the Kestrel VM.
//!
//! Values live in the constant pool, on the stack, and in the global store.

use std::fmt;

/// Runtime value representation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    /// Signed 64-bit integer.
    Integer(i64),
    /// Boolean value.
    Boolean(bool),
    /// The absence of a value, e.g. an `if` without an `else` whose
    /// condition was falsy.
    #[default]
    Null,
}

impl Value {
    /// Name of this value's type, as shown in runtime errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Boolean(_) => "BOOLEAN",
            Value::Null => "NULL",
        }
    }

    /// `false` and `null` are falsy. Everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Null => false,
            Value::Integer(_) => true,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Null => f.write_str("null"),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}
