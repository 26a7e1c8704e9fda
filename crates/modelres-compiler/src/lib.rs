//! modelres Compiler - condition to predicate compiler
//!
//! This crate resolves field paths against a record schema and compiles
//! parsed conditions and flat lookups into store-facing predicates.

pub mod error;
pub mod resolver;
pub mod translator;

// Re-export main types
pub use error::{CompileError, Result};
pub use resolver::{FieldResolver, ResolvedField};
pub use translator::{PredicateTranslator, TranslatorOptions};
