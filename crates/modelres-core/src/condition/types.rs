//! Condition AST types

use std::fmt;

/// Logical operator joining two condition terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    /// Parse an operator keyword. Only the uppercase forms are operators.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "AND" => Some(LogicalOp::And),
            "OR" => Some(LogicalOp::Or),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => write!(f, "AND"),
            LogicalOp::Or => write!(f, "OR"),
        }
    }
}

/// A single `field=placeholder` term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub field: String,
    pub placeholder: String,
}

impl Term {
    pub fn new(field: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            placeholder: placeholder.into(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field, self.placeholder)
    }
}

/// Parsed condition.
///
/// Chains are left-nested: `a AND b OR c` is `(a AND b) OR c`. There is no
/// precedence between AND and OR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionAst {
    Term(Term),
    BinaryOp {
        op: LogicalOp,
        left: Box<ConditionAst>,
        right: Box<ConditionAst>,
    },
}

impl ConditionAst {
    pub fn term(field: impl Into<String>, placeholder: impl Into<String>) -> Self {
        ConditionAst::Term(Term::new(field, placeholder))
    }

    pub fn binary(op: LogicalOp, left: ConditionAst, right: ConditionAst) -> Self {
        ConditionAst::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Terms in source order
    pub fn terms(&self) -> Vec<&Term> {
        match self {
            ConditionAst::Term(term) => vec![term],
            ConditionAst::BinaryOp { left, right, .. } => {
                let mut terms = left.terms();
                terms.extend(right.terms());
                terms
            }
        }
    }
}

// Left-nested chains print as the original flat text. Right-nested operands
// are never produced by the parser and print parenthesized.
impl fmt::Display for ConditionAst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionAst::Term(term) => write!(f, "{}", term),
            ConditionAst::BinaryOp { op, left, right } => match right.as_ref() {
                ConditionAst::Term(_) => write!(f, "{} {} {}", left, op, right),
                _ => write!(f, "{} {} ({})", left, op, right),
            },
        }
    }
}
