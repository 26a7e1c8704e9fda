//! Tokenizer for condition text

use super::error::{ConditionError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Letters, digits and underscores. Operators are identifiers too;
    /// the parser decides by position.
    Ident(String),
    Equals,
    LBrace,
    RBrace,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Zero-based character offset of the token's first character
    pub position: usize,
}

pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Split condition text into tokens
pub fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().enumerate().peekable();

    while let Some((position, c)) = chars.next() {
        let kind = match c {
            c if c.is_whitespace() => continue,
            '=' => TokenKind::Equals,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            c if is_ident_char(c) => {
                let mut ident = String::from(c);
                while let Some((_, next)) = chars.peek() {
                    if !is_ident_char(*next) {
                        break;
                    }
                    ident.push(*next);
                    chars.next();
                }
                TokenKind::Ident(ident)
            }
            other => {
                return Err(ConditionError::syntax(
                    position,
                    format!("unexpected character '{}'", other),
                ))
            }
        };
        tokens.push(Token { kind, position });
    }

    Ok(tokens)
}
