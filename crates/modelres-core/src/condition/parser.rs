//! Condition string parser
//!
//! Parses condition strings like:
//! - `ip=p1`
//! - `ip=p1 AND user=p2`
//! - `owner__name={p1} OR id=p2`

use super::error::{ConditionError, Result};
use super::lexer::{tokenize, Token, TokenKind};
use super::types::{ConditionAst, LogicalOp};

/// Default cap on the number of terms in one condition
pub const DEFAULT_MAX_TERMS: usize = 256;

/// Condition parser; holds only its limits, so one instance can be shared freely.
#[derive(Debug, Clone, Copy)]
pub struct ConditionParser {
    max_terms: usize,
}

impl Default for ConditionParser {
    fn default() -> Self {
        Self {
            max_terms: DEFAULT_MAX_TERMS,
        }
    }
}

impl ConditionParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject chains longer than `max` terms
    pub fn with_max_terms(mut self, max: usize) -> Self {
        self.max_terms = max.max(1);
        self
    }

    pub fn max_terms(&self) -> usize {
        self.max_terms
    }

    /// Parse a condition into a left-nested AST.
    ///
    /// Empty text is a syntax error here; callers treat absent conditions as
    /// "no filter" before reaching the parser.
    pub fn parse(&self, text: &str) -> Result<ConditionAst> {
        let tokens = tokenize(text)?;
        log::trace!("condition tokens: {:?}", tokens);

        let mut cursor = Cursor {
            tokens: &tokens,
            index: 0,
            end: text.chars().count(),
        };

        if tokens.is_empty() {
            return Err(ConditionError::syntax(0, "empty condition"));
        }

        let mut ast = cursor.term()?;
        let mut terms = 1;

        while let Some(token) = cursor.advance() {
            let op = match &token.kind {
                TokenKind::Ident(word) => LogicalOp::from_keyword(word).ok_or_else(|| {
                    ConditionError::syntax(token.position, format!("unknown operator '{}'", word))
                })?,
                other => {
                    return Err(ConditionError::syntax(
                        token.position,
                        format!("expected AND or OR, found {}", describe(other)),
                    ))
                }
            };

            let next = cursor.peek().ok_or_else(|| {
                ConditionError::syntax(cursor.end, format!("expected a term after '{}'", op))
            })?;
            if terms == self.max_terms {
                return Err(ConditionError::syntax(
                    next.position,
                    format!("conditions may not contain more than {} terms", self.max_terms),
                ));
            }
            terms += 1;

            let right = cursor.term()?;
            ast = ConditionAst::binary(op, ast, right);
        }

        log::debug!("parsed condition: {}", ast);
        Ok(ast)
    }
}

struct Cursor<'a> {
    tokens: &'a [Token],
    index: usize,
    /// Position reported for errors at end of input
    end: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.index)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.index);
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    /// `Term := FieldName "=" Placeholder`, where the placeholder may be braced
    fn term(&mut self) -> Result<ConditionAst> {
        let field = self.identifier("field name")?;

        match self.advance() {
            Some(Token {
                kind: TokenKind::Equals,
                ..
            }) => {}
            Some(token) => {
                return Err(ConditionError::syntax(
                    token.position,
                    format!(
                        "expected '=' after field '{}', found {}",
                        field,
                        describe(&token.kind)
                    ),
                ))
            }
            None => {
                return Err(ConditionError::syntax(
                    self.end,
                    format!("expected '=' after field '{}'", field),
                ))
            }
        }

        let braced = matches!(
            self.peek(),
            Some(Token {
                kind: TokenKind::LBrace,
                ..
            })
        );
        if braced {
            self.advance();
        }

        let placeholder = self.identifier("placeholder")?;

        if braced {
            match self.advance() {
                Some(Token {
                    kind: TokenKind::RBrace,
                    ..
                }) => {}
                Some(token) => {
                    return Err(ConditionError::syntax(
                        token.position,
                        format!("expected '}}', found {}", describe(&token.kind)),
                    ))
                }
                None => return Err(ConditionError::syntax(self.end, "expected '}'")),
            }
        }

        Ok(ConditionAst::term(field, placeholder))
    }

    fn identifier(&mut self, what: &str) -> Result<String> {
        match self.advance() {
            Some(Token {
                kind: TokenKind::Ident(word),
                position,
            }) => {
                if LogicalOp::from_keyword(word).is_some() {
                    Err(ConditionError::syntax(
                        *position,
                        format!("expected {}, found operator '{}'", what, word),
                    ))
                } else {
                    Ok(word.clone())
                }
            }
            Some(token) => Err(ConditionError::syntax(
                token.position,
                format!("expected {}, found {}", what, describe(&token.kind)),
            )),
            None => Err(ConditionError::syntax(
                self.end,
                format!("expected {}", what),
            )),
        }
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(word) => format!("'{}'", word),
        TokenKind::Equals => "'='".to_string(),
        TokenKind::LBrace => "'{'".to_string(),
        TokenKind::RBrace => "'}'".to_string(),
    }
}
