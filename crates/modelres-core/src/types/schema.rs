//! Schema definitions for record types
//!
//! A schema lists the fields of a record type in declaration order and names
//! the primary-key field. It doubles as the resource's form: field-name
//! validation, literal coercion and create/update validation all read it.

use super::value::Value;
use crate::error::{CoreError, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Name that always refers to a schema's primary-key field.
pub const PK_ALIAS: &str = "pk";

/// Separator between segments of a relationship-traversal path.
pub const PATH_SEPARATOR: &str = "__";

fn default_primary_key() -> String {
    "id".to_string()
}

fn default_true() -> bool {
    true
}

/// A schema defines the structure and types of a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema name
    pub name: String,

    /// Schema description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Name of the primary-key field
    #[serde(default = "default_primary_key")]
    pub primary_key: String,

    /// Whether the store assigns primary keys on insert
    #[serde(default = "default_true")]
    pub auto_primary_key: bool,

    /// Fields in declaration order
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

/// A field in a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Field name
    pub name: String,

    /// Field type
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Whether this field is required
    #[serde(default)]
    pub required: bool,

    /// Whether values must be unique across records
    #[serde(default)]
    pub unique: bool,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Default applied on create when the field is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Field type enumeration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Boolean type
    Boolean,

    /// Number type (int or float)
    Number,

    /// String type
    String,

    /// Calendar date, `YYYY-MM-DD`
    Date,

    /// RFC 3339 timestamp
    DateTime,

    /// Array type
    Array {
        /// Type of array elements
        item_type: Box<FieldType>,
    },

    /// Object type, a related record
    Object {
        /// Schema for the object (optional)
        #[serde(default)]
        schema: Option<Box<Schema>>,
    },

    /// Any type (no validation)
    Any,
}

impl Schema {
    /// Create a new schema with an auto-assigned `id` primary key
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            primary_key: default_primary_key(),
            auto_primary_key: true,
            fields: Vec::new(),
        }
    }

    /// Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the primary-key field and whether the store assigns it
    pub fn with_primary_key(mut self, name: impl Into<String>, auto: bool) -> Self {
        self.primary_key = name.into();
        self.auto_primary_key = auto;
        self
    }

    /// Add a field, replacing an existing field of the same name in place
    pub fn add_field(mut self, field: SchemaField) -> Self {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    /// Get a field by name
    pub fn get_field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Check if a field is required
    pub fn is_required(&self, name: &str) -> bool {
        self.get_field(name).map(|f| f.required).unwrap_or(false)
    }

    /// The primary-key field definition
    pub fn primary_key_field(&self) -> Option<&SchemaField> {
        self.get_field(&self.primary_key)
    }

    /// Fields that take part in create/update forms.
    ///
    /// A store-assigned primary key is never part of the form.
    pub fn form_fields(&self) -> impl Iterator<Item = &SchemaField> {
        self.fields
            .iter()
            .filter(move |f| !(self.auto_primary_key && f.name == self.primary_key))
    }

    /// Check the schema definition itself
    pub fn validate(&self) -> Result<()> {
        if self.primary_key_field().is_none() {
            return Err(CoreError::InvalidSchema(format!(
                "schema '{}' declares primary key '{}' but has no such field",
                self.name, self.primary_key
            )));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(CoreError::InvalidSchema(format!(
                    "schema '{}' has a field with an empty name",
                    self.name
                )));
            }
            if field.name.contains(PATH_SEPARATOR) {
                return Err(CoreError::InvalidSchema(format!(
                    "field '{}' may not contain '{}'",
                    field.name, PATH_SEPARATOR
                )));
            }
            if field.name == PK_ALIAS && self.primary_key != PK_ALIAS {
                return Err(CoreError::InvalidSchema(format!(
                    "field name '{}' is reserved for the primary key",
                    PK_ALIAS
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(CoreError::InvalidSchema(format!(
                    "duplicate field '{}' in schema '{}'",
                    field.name, self.name
                )));
            }
            if let Some(default) = &field.default {
                field.coerce(default)?;
            }
        }

        Ok(())
    }
}

impl SchemaField {
    /// Create a new field
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            unique: false,
            description: None,
            default: None,
        }
    }

    /// Mark field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark field as unique
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set default value
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Coerce a raw request string to this field's type
    pub fn coerce_str(&self, raw: &str) -> Result<Value> {
        self.field_type
            .coerce_str(raw)
            .map_err(|message| self.invalid(message))
    }

    /// Coerce a decoded body value to this field's type
    pub fn coerce(&self, value: &Value) -> Result<Value> {
        self.field_type
            .coerce(value)
            .map_err(|message| self.invalid(message))
    }

    fn invalid(&self, message: String) -> CoreError {
        CoreError::InvalidValue {
            field: self.name.clone(),
            message,
        }
    }
}

impl FieldType {
    /// Create an array type
    pub fn array(item_type: FieldType) -> Self {
        FieldType::Array {
            item_type: Box::new(item_type),
        }
    }

    /// Create an object type
    pub fn object() -> Self {
        FieldType::Object { schema: None }
    }

    /// Create an object type with schema
    pub fn object_with_schema(schema: Schema) -> Self {
        FieldType::Object {
            schema: Some(Box::new(schema)),
        }
    }

    /// Get type name as string
    pub fn type_name(&self) -> &str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Number => "number",
            FieldType::String => "string",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Array { .. } => "array",
            FieldType::Object { .. } => "object",
            FieldType::Any => "any",
        }
    }

    /// Coerce a raw string (a filter parameter or primary key) to this type.
    ///
    /// Array fields coerce to their item type: equality against an array
    /// matches any element.
    pub fn coerce_str(&self, raw: &str) -> std::result::Result<Value, String> {
        match self {
            FieldType::Boolean => parse_bool(raw).map(Value::Bool),
            FieldType::Number => parse_number(raw).map(Value::Number),
            FieldType::Date => parse_date(raw).map(Value::String),
            FieldType::DateTime => parse_datetime(raw).map(Value::String),
            FieldType::Array { item_type } => item_type.coerce_str(raw),
            FieldType::String | FieldType::Object { .. } | FieldType::Any => {
                Ok(Value::String(raw.to_string()))
            }
        }
    }

    /// Coerce a decoded value to this type. Null passes through unchanged.
    pub fn coerce(&self, value: &Value) -> std::result::Result<Value, String> {
        match (self, value) {
            (_, Value::Null) | (FieldType::Any, _) => Ok(value.clone()),
            (FieldType::Boolean, Value::Bool(_)) => Ok(value.clone()),
            (FieldType::Boolean, Value::String(s)) => parse_bool(s).map(Value::Bool),
            (FieldType::Boolean, Value::Number(n)) if *n == 0.0 || *n == 1.0 => {
                Ok(Value::Bool(*n == 1.0))
            }
            (FieldType::Number, Value::Number(_)) => Ok(value.clone()),
            (FieldType::Number, Value::String(s)) => parse_number(s).map(Value::Number),
            (FieldType::String, Value::String(_)) => Ok(value.clone()),
            (FieldType::String, Value::Number(_) | Value::Bool(_)) => {
                Ok(Value::String(value.to_string()))
            }
            (FieldType::Date, Value::String(s)) => parse_date(s).map(Value::String),
            (FieldType::DateTime, Value::String(s)) => parse_datetime(s).map(Value::String),
            (FieldType::Array { item_type }, Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    item_type
                        .coerce(item)
                        .map_err(|message| format!("item {}: {}", index, message))
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Value::Array),
            (FieldType::Object { schema }, Value::Object(map)) => {
                let Some(schema) = schema else {
                    return Ok(value.clone());
                };
                let mut out = map.clone();
                for (key, nested) in map {
                    if let Some(field) = schema.get_field(key) {
                        let coerced = field
                            .field_type
                            .coerce(nested)
                            .map_err(|message| format!("{}: {}", key, message))?;
                        out.insert(key.clone(), coerced);
                    }
                }
                Ok(Value::Object(out))
            }
            _ => Err(format!(
                "expected {}, got {}",
                self.type_name(),
                value.type_name()
            )),
        }
    }
}

fn parse_bool(raw: &str) -> std::result::Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Ok(true),
        "false" | "f" | "0" => Ok(false),
        _ => Err(format!("'{}' is not a valid boolean", raw)),
    }
}

fn parse_number(raw: &str) -> std::result::Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| format!("'{}' is not a valid number", raw))
}

fn parse_date(raw: &str) -> std::result::Result<String, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| format!("'{}' is not a valid date (expected YYYY-MM-DD)", raw))
}

// Datetimes are normalized to UTC so equal instants compare equal.
fn parse_datetime(raw: &str) -> std::result::Result<String, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| {
            dt.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::AutoSi, true)
        })
        .map_err(|_| format!("'{}' is not a valid RFC 3339 datetime", raw))
}
