//! Form validation of attribute mappings against schemas

use super::record::Attributes;
use super::schema::Schema;
use super::value::Value;
use thiserror::Error;

/// Validation error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required field missing
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    /// Value could not be coerced to the field's type
    #[error("Invalid value for field '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Unknown field
    #[error("Unknown field: {field}")]
    UnknownField { field: String },
}

impl ValidationError {
    /// The field the error belongs to
    pub fn field(&self) -> &str {
        match self {
            ValidationError::RequiredFieldMissing { field }
            | ValidationError::InvalidValue { field, .. }
            | ValidationError::UnknownField { field } => field,
        }
    }

    /// Message shown to clients next to the field name
    pub fn message(&self) -> String {
        match self {
            ValidationError::RequiredFieldMissing { .. } => "This field is required.".to_string(),
            ValidationError::InvalidValue { message, .. } => message.clone(),
            ValidationError::UnknownField { .. } => "Unknown field.".to_string(),
        }
    }
}

/// Validator for attribute mappings against a schema's form fields
pub struct Validator {
    /// Whether to allow unknown fields
    allow_unknown_fields: bool,
    /// Whether absent fields take their schema default
    apply_defaults: bool,
}

impl Validator {
    /// Create a new validator with default settings
    pub fn new() -> Self {
        Self {
            allow_unknown_fields: false,
            apply_defaults: true,
        }
    }

    /// Allow unknown fields in validation
    pub fn allow_unknown_fields(mut self, allow: bool) -> Self {
        self.allow_unknown_fields = allow;
        self
    }

    /// Fill absent fields from schema defaults
    pub fn apply_defaults(mut self, apply: bool) -> Self {
        self.apply_defaults = apply;
        self
    }

    /// Validate `data` against the schema's form and return the cleaned
    /// mapping: every form field in schema order, values coerced to their
    /// field types. All errors are collected before returning.
    pub fn clean(&self, data: &Attributes, schema: &Schema) -> Result<Attributes, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut cleaned = Attributes::new();

        for field in schema.form_fields() {
            let supplied = data.get(&field.name).filter(|v| !is_blank(v));

            let value = match (supplied, &field.default) {
                (Some(value), _) => value.clone(),
                (None, Some(default)) if self.apply_defaults => default.clone(),
                (None, _) if field.required => {
                    errors.push(ValidationError::RequiredFieldMissing {
                        field: field.name.clone(),
                    });
                    continue;
                }
                (None, _) => Value::Null,
            };

            match field.field_type.coerce(&value) {
                Ok(coerced) => {
                    cleaned.insert(field.name.clone(), coerced);
                }
                Err(message) => errors.push(ValidationError::InvalidValue {
                    field: field.name.clone(),
                    message,
                }),
            }
        }

        if !self.allow_unknown_fields {
            for key in data.keys() {
                if !schema.form_fields().any(|f| f.name == key) {
                    errors.push(ValidationError::UnknownField {
                        field: key.to_string(),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(cleaned)
        } else {
            Err(errors)
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
