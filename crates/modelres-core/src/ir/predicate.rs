//! Compiled filter predicates
//!
//! A predicate is the store-facing form of a condition: field paths have been
//! checked against the schema and placeholders replaced by typed literals.

use crate::types::schema::PATH_SEPARATOR;
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A field reference, possibly traversing related objects (`owner__name`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Path to a field on the record itself
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            segments: vec![name.into()],
        }
    }

    pub fn from_segments(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// Split a `a__b__c` path into segments
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path.split(PATH_SEPARATOR).map(str::to_string).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The field on the record itself
    pub fn root(&self) -> &str {
        self.segments.first().map(String::as_str).unwrap_or("")
    }

    /// Whether the path walks into related objects
    pub fn is_traversal(&self) -> bool {
        self.segments.len() > 1
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join(PATH_SEPARATOR))
    }
}

/// `field == value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equality {
    pub field: FieldPath,
    pub value: Value,
}

impl Equality {
    pub fn new(field: FieldPath, value: impl Into<Value>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// Boolean combination of equality filters.
///
/// `And` is intersection and `Or` is union of the matched sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Equality(Equality),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    pub fn equals(field: FieldPath, value: impl Into<Value>) -> Self {
        Predicate::Equality(Equality::new(field, value))
    }

    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    /// Left-fold a list of equalities with AND. `None` for an empty list.
    pub fn all(equalities: impl IntoIterator<Item = Equality>) -> Option<Self> {
        equalities
            .into_iter()
            .map(Predicate::Equality)
            .reduce(Predicate::and)
    }

    /// Every equality in the tree, left to right
    pub fn equalities(&self) -> Vec<&Equality> {
        match self {
            Predicate::Equality(eq) => vec![eq],
            Predicate::And(left, right) | Predicate::Or(left, right) => {
                let mut out = left.equalities();
                out.extend(right.equalities());
                out
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Equality(eq) => write!(f, "{}={:?}", eq.field, eq.value.to_string()),
            Predicate::And(left, right) => write!(f, "({} AND {})", left, right),
            Predicate::Or(left, right) => write!(f, "({} OR {})", left, right),
        }
    }
}
