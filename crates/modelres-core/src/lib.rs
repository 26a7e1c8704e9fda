//! modelres Core - Core types and definitions for modelres resources
//!
//! This crate provides the fundamental types used across the modelres workspace:
//! - Value, schema and record types
//! - The condition language (parameter maps, lexer, parser, AST)
//! - IR (compiled predicates and ordering keys) handed to record stores
//! - Error types

pub mod condition;
pub mod error;
pub mod ir;
pub mod types;

// Re-export commonly used types
pub use error::CoreError;
pub use types::{Attributes, Record, Value};
