//! Intermediate Representation (IR) for modelres queries
//!
//! The IR is what the compiler produces and record stores consume:
//! resolved field paths, equality predicates and ordering keys.

pub mod ordering;
pub mod predicate;

pub use ordering::{Direction, OrderKey, DESCENDING_PREFIX};
pub use predicate::{Equality, FieldPath, Predicate};
