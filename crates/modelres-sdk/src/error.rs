//! Resource error types
//!
//! Every error a client can correct maps to a bad-request or not-found
//! status with a `{message, errors?}` body. Projection, store and
//! configuration failures are fatal.

use modelres_compiler::CompileError;
use modelres_core::condition::ConditionError;
use modelres_repository::StoreError;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Field name to message
pub type FieldErrors = BTreeMap<String, String>;

/// Resource error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResourceError {
    #[error("Malformed parameters: segment '{segment}' must have the form key=value")]
    MalformedParameters { segment: String },

    #[error("Condition syntax error at position {position}: {message}")]
    ConditionSyntax { position: usize, message: String },

    #[error("Unknown parameter '{placeholder}' referenced in conditions")]
    UnknownParameter { placeholder: String },

    #[error("Cannot resolve keyword '{field}' into field")]
    UnknownField { field: String },

    #[error("This model cannot be ordered by related objects. Please remove all ocurrences of '__' from your ordering parameters.")]
    UnsupportedOrdering,

    #[error("This model cannot be ordered by more than {limit} parameter(s). You tried to order by {count} parameters.")]
    TooManyOrderingKeys { limit: usize, count: usize },

    #[error("Requests may not specify more than {limit} records to return (asked for {count}).")]
    TooManyKeys { limit: usize, count: usize },

    #[error("Invalid {parameter} '{value}': expected a non-negative integer")]
    InvalidPagination { parameter: String, value: String },

    /// The store rejected a lookup
    #[error("{0}")]
    InvalidFilter(String),

    /// The payload failed form validation or a store constraint
    #[error("{message}")]
    Validation { message: String, errors: FieldErrors },

    #[error("{0}")]
    NotFound(String),

    /// Wrong number of `pk` arguments
    #[error("{0}")]
    MissingKey(String),

    #[error("Failed to expose attribute '{attribute}': {message}")]
    Projection { attribute: String, message: String },

    #[error("Endpoint '{endpoint}' failed: {message}")]
    Endpoint { endpoint: String, message: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for resource operations
pub type Result<T> = std::result::Result<T, ResourceError>;

/// Status category of an error response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    BadRequest,
    NotFound,
    /// Not client-correctable
    Fatal,
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: FieldErrors,
}

impl ResourceError {
    /// A validation error with a plain message and no field errors
    pub fn validation(message: impl Into<String>) -> Self {
        ResourceError::Validation {
            message: message.into(),
            errors: FieldErrors::new(),
        }
    }

    /// The request body was not a JSON object
    pub fn malformed_body() -> Self {
        Self::validation("The data sent in the request was malformed")
    }

    pub fn status(&self) -> StatusCategory {
        match self {
            ResourceError::NotFound(_) => StatusCategory::NotFound,
            ResourceError::Projection { .. }
            | ResourceError::Endpoint { .. }
            | ResourceError::Store(_)
            | ResourceError::Config(_) => StatusCategory::Fatal,
            _ => StatusCategory::BadRequest,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.status() == StatusCategory::Fatal
    }

    pub fn body(&self) -> ErrorBody {
        let errors = match self {
            ResourceError::Validation { errors, .. } => errors.clone(),
            _ => FieldErrors::new(),
        };
        ErrorBody {
            message: self.to_string(),
            errors,
        }
    }
}

impl From<ConditionError> for ResourceError {
    fn from(err: ConditionError) -> Self {
        match err {
            ConditionError::Syntax { position, message } => {
                ResourceError::ConditionSyntax { position, message }
            }
            ConditionError::MalformedParameters { segment } => {
                ResourceError::MalformedParameters { segment }
            }
        }
    }
}

impl From<CompileError> for ResourceError {
    fn from(err: CompileError) -> Self {
        match err {
            CompileError::UnknownParameter { placeholder } => {
                ResourceError::UnknownParameter { placeholder }
            }
            CompileError::UnknownField { field } => ResourceError::UnknownField { field },
            err @ CompileError::InvalidValue { .. } => ResourceError::InvalidFilter(err.to_string()),
            CompileError::Condition(err) => err.into(),
        }
    }
}

impl From<StoreError> for ResourceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownField { .. } | StoreError::InvalidValue { .. } => {
                ResourceError::InvalidFilter(err.to_string())
            }
            StoreError::Integrity(message) => ResourceError::validation(message),
            other => ResourceError::Store(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_messages() {
        assert_eq!(
            ResourceError::TooManyOrderingKeys { limit: 1, count: 2 }.to_string(),
            "This model cannot be ordered by more than 1 parameter(s). You tried to order by 2 parameters."
        );
        assert!(ResourceError::UnsupportedOrdering
            .to_string()
            .starts_with("This model cannot be ordered by related objects."));
    }

    #[test]
    fn test_status_categories() {
        assert_eq!(
            ResourceError::MissingKey("x".into()).status(),
            StatusCategory::BadRequest
        );
        assert_eq!(
            ResourceError::NotFound("x".into()).status(),
            StatusCategory::NotFound
        );
        assert!(ResourceError::Store("db down".into()).is_fatal());
        assert!(ResourceError::Projection {
            attribute: "score".into(),
            message: "boom".into()
        }
        .is_fatal());
    }

    #[test]
    fn test_body_carries_field_errors() {
        let mut errors = FieldErrors::new();
        errors.insert("ip".into(), "This field is required.".into());
        let err = ResourceError::Validation {
            message: "The submitted data contained 1 errors.".into(),
            errors,
        };

        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body["message"], "The submitted data contained 1 errors.");
        assert_eq!(body["errors"]["ip"], "This field is required.");

        let body = serde_json::to_value(ResourceError::malformed_body().body()).unwrap();
        assert!(body.get("errors").is_none());
    }

    #[test]
    fn test_conversions() {
        let err: ResourceError = CompileError::UnknownField {
            field: "nope".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Cannot resolve keyword 'nope' into field");

        let err: ResourceError = StoreError::Integrity("Host with this ip already exists.".into()).into();
        assert!(matches!(err, ResourceError::Validation { .. }));

        let err: ResourceError = StoreError::Backend("lost connection".into()).into();
        assert!(err.is_fatal());

        let err: ResourceError = ConditionError::MalformedParameters {
            segment: "x".into(),
        }
        .into();
        assert!(matches!(err, ResourceError::MalformedParameters { .. }));
    }
}
