//! Ordering keys

use super::predicate::FieldPath;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix marking a descending ordering key
pub const DESCENDING_PREFIX: char = '-';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Ascending,
    Descending,
}

/// One validated ordering key. Keys apply in sequence, each breaking ties
/// left by the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderKey {
    pub field: FieldPath,
    pub direction: Direction,
}

impl OrderKey {
    pub fn asc(field: FieldPath) -> Self {
        Self {
            field,
            direction: Direction::Ascending,
        }
    }

    pub fn desc(field: FieldPath) -> Self {
        Self {
            field,
            direction: Direction::Descending,
        }
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Ascending => write!(f, "{}", self.field),
            Direction::Descending => write!(f, "{}{}", DESCENDING_PREFIX, self.field),
        }
    }
}
