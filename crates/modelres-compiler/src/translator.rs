//! Predicate translation
//!
//! Turns a parsed condition plus its parameter map into a compiled
//! predicate: placeholders become typed literals and field names are
//! resolved against the schema. The tree keeps the parser's left-nested
//! shape, so `a OR b AND c` still means `(a OR b) AND c`.

use crate::error::{CompileError, Result};
use crate::resolver::{FieldResolver, ResolvedField};
use modelres_core::condition::{ConditionAst, ConditionParser, LogicalOp, ParameterMap, Term};
use modelres_core::ir::{Equality, Predicate};
use modelres_core::types::{Schema, Value};

/// Translator options
#[derive(Debug, Clone)]
pub struct TranslatorOptions {
    /// Accept `a__b` relationship traversal in field names
    pub allow_traversal: bool,
}

impl Default for TranslatorOptions {
    fn default() -> Self {
        Self {
            allow_traversal: true,
        }
    }
}

/// Compiles conditions and flat lookups for one schema
#[derive(Debug, Clone, Copy)]
pub struct PredicateTranslator<'s> {
    resolver: FieldResolver<'s>,
}

impl<'s> PredicateTranslator<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self::with_options(schema, TranslatorOptions::default())
    }

    pub fn with_options(schema: &'s Schema, options: TranslatorOptions) -> Self {
        Self {
            resolver: FieldResolver::new(schema).allow_traversal(options.allow_traversal),
        }
    }

    pub fn resolver(&self) -> &FieldResolver<'s> {
        &self.resolver
    }

    /// Parse and translate condition text with its parameter string
    pub fn compile(&self, conditions: &str, parameters: &str) -> Result<Predicate> {
        let params = ParameterMap::decode(parameters)?;
        let ast = ConditionParser::new().parse(conditions)?;
        self.translate(&ast, &params)
    }

    /// Translate an AST, resolving each placeholder before its field
    pub fn translate(&self, ast: &ConditionAst, params: &ParameterMap) -> Result<Predicate> {
        match ast {
            ConditionAst::Term(term) => self.term(term, params).map(Predicate::Equality),
            ConditionAst::BinaryOp { op, left, right } => {
                let left = self.translate(left, params)?;
                let right = self.translate(right, params)?;
                Ok(match op {
                    LogicalOp::And => left.and(right),
                    LogicalOp::Or => left.or(right),
                })
            }
        }
    }

    /// AND together flat `field=value` lookups, in the order given.
    /// Returns `None` when there are no lookups.
    pub fn lookups<'a, I>(&self, lookups: I) -> Result<Option<Predicate>>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let equalities = lookups
            .into_iter()
            .map(|(field, raw)| self.equality(field, raw))
            .collect::<Result<Vec<_>>>()?;
        Ok(Predicate::all(equalities))
    }

    /// Coerce a raw primary-key string to the key field's type
    pub fn primary_key(&self, raw: &str) -> Result<Value> {
        let schema = self.resolver.schema();
        let resolved = self.resolver.resolve(&schema.primary_key)?;
        coerce(&resolved, raw)
    }

    fn term(&self, term: &Term, params: &ParameterMap) -> Result<Equality> {
        let raw = params
            .get(&term.placeholder)
            .ok_or_else(|| CompileError::UnknownParameter {
                placeholder: term.placeholder.clone(),
            })?;
        self.equality(&term.field, raw)
    }

    fn equality(&self, field: &str, raw: &str) -> Result<Equality> {
        let resolved = self.resolver.resolve(field)?;
        let value = coerce(&resolved, raw)?;
        Ok(Equality::new(resolved.path, value))
    }
}

fn coerce(resolved: &ResolvedField, raw: &str) -> Result<Value> {
    resolved
        .field_type
        .coerce_str(raw)
        .map_err(|message| CompileError::InvalidValue {
            field: resolved.path.to_string(),
            value: raw.to_string(),
            message,
        })
}
