//! Condition Language
//!
//! Clients filter resources with a small boolean language whose right-hand
//! sides are placeholders, never literals. Values travel separately in a
//! parameter string, so the condition text itself carries no user data.
//!
//! # Syntax
//!
//! ```text
//! conditions = ip=p1 AND user=p2 OR owner__name={p3}
//! parameters = p1=192.168.1.1,p2=frank,p3=ops,
//! ```
//!
//! - `Expr := Term (("AND" | "OR") Term)*`
//! - `Term := FieldName "=" Placeholder`, placeholder optionally braced
//! - Operators are uppercase keywords.
//! - A chain holds at most [`DEFAULT_MAX_TERMS`] terms unless the parser is
//!   configured otherwise.
//! - Chains combine strictly left to right: `a AND b OR c` is `(a AND b) OR c`
//!   and `a OR b AND c` is `(a OR b) AND c`.

mod error;
mod lexer;
mod params;
mod parser;
mod types;

pub use error::{ConditionError, Result};
pub use lexer::{tokenize, Token, TokenKind};
pub use params::ParameterMap;
pub use parser::{ConditionParser, DEFAULT_MAX_TERMS};
pub use types::{ConditionAst, LogicalOp, Term};
