//! Ordering and pagination policy
//!
//! Ordering keys are checked in a fixed sequence: related-object markers
//! first, then the key count, then each field against the schema. Too many
//! ordering keys is an error, while a limit above `max_objects` is quietly
//! capped.

use crate::config::ResourceConfig;
use crate::error::{ResourceError, Result};
use modelres_compiler::FieldResolver;
use modelres_core::ir::{OrderKey, DESCENDING_PREFIX};
use modelres_core::types::{Schema, PATH_SEPARATOR};

/// Validate a raw ordering spec into ordering keys, in request order.
/// A missing or blank spec means natural order.
pub fn validate_ordering(
    raw: Option<&str>,
    config: &ResourceConfig,
    schema: &Schema,
) -> Result<Vec<OrderKey>> {
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        return Ok(Vec::new());
    };

    if !config.allow_related_ordering && raw.contains(PATH_SEPARATOR) {
        return Err(ResourceError::UnsupportedOrdering);
    }

    let keys: Vec<&str> = raw.split(',').collect();
    if keys.len() > config.max_orderings {
        return Err(ResourceError::TooManyOrderingKeys {
            limit: config.max_orderings,
            count: keys.len(),
        });
    }

    let resolver = FieldResolver::new(schema).allow_traversal(config.allow_related_ordering);
    keys.into_iter()
        .map(|key| {
            let key = key.trim();
            let (name, descending) = match key.strip_prefix(DESCENDING_PREFIX) {
                Some(name) => (name.trim(), true),
                None => (key, false),
            };
            if name.is_empty() {
                return Err(ResourceError::UnknownField {
                    field: key.to_string(),
                });
            }

            let path = resolver.resolve(name)?.path;
            Ok(if descending {
                OrderKey::desc(path)
            } else {
                OrderKey::asc(path)
            })
        })
        .collect()
}

/// Resolved slice of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub offset: usize,
    pub limit: usize,
}

impl Pagination {
    /// `offset` defaults to 0; `limit` defaults to and is capped at
    /// `max_objects`
    pub fn resolve(offset: Option<&str>, limit: Option<&str>, max_objects: usize) -> Result<Self> {
        let offset = parse_count("offset", offset)?.unwrap_or(0);
        let limit = parse_count("limit", limit)?
            .unwrap_or(max_objects)
            .min(max_objects);
        Ok(Self { offset, limit })
    }
}

fn parse_count(parameter: &str, raw: Option<&str>) -> Result<Option<usize>> {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ResourceError::InvalidPagination {
                parameter: parameter.to_string(),
                value: raw.to_string(),
            }),
    }
}
