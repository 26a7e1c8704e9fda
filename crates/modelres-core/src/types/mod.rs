//! Type system for modelres
//!
//! This module contains the record type system including:
//! - Value types
//! - Schema definitions
//! - Records and ordered attribute mappings
//! - Form validation

pub mod record;
pub mod schema;
pub mod validator;
pub mod value;

pub use record::{Attributes, Record};
pub use schema::{FieldType, Schema, SchemaField, PATH_SEPARATOR, PK_ALIAS};
pub use validator::{ValidationError, Validator};
pub use value::Value;
