//! Compiler error types

use modelres_core::condition::ConditionError;
use thiserror::Error;

/// Compiler error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// A placeholder has no entry in the parameter map
    #[error("Unknown parameter '{placeholder}' referenced in conditions")]
    UnknownParameter { placeholder: String },

    /// A field path does not resolve against the schema
    #[error("Cannot resolve keyword '{field}' into field")]
    UnknownField { field: String },

    /// A literal could not be coerced to its field's type
    #[error("Invalid value '{value}' for field '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// Condition or parameter text failed to parse
    #[error(transparent)]
    Condition(#[from] ConditionError),
}

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, CompileError>;
