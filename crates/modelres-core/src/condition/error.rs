//! Errors raised while decoding parameters and parsing conditions

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConditionError {
    /// The condition text does not match the grammar
    #[error("Condition syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    /// A parameter segment is not of the form `key=value`
    #[error("Malformed parameters: segment '{segment}' must have the form key=value")]
    MalformedParameters { segment: String },
}

impl ConditionError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        ConditionError::Syntax {
            position,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConditionError>;
