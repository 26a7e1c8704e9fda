//! Resource configuration

use crate::error::{ResourceError, Result};
use modelres_core::condition::DEFAULT_MAX_TERMS;
use modelres_core::types::Schema;
use serde::{Deserialize, Serialize};

/// Per-resource policy, fixed when the resource is built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Maximum number of ordering keys per request
    pub max_orderings: usize,

    /// Maximum number of records returned by one request
    pub max_objects: usize,

    /// Maximum number of terms in one condition
    pub max_condition_terms: usize,

    /// Accept `a__b` ordering keys
    pub allow_related_ordering: bool,

    /// Accept `a__b` paths in conditions and flat lookups
    pub allow_related_filtering: bool,

    /// Fields exposed when serializing records; empty means all fields
    pub field_allow_list: Vec<String>,

    /// Computed attributes added after projection, in this order
    pub exposed_attribute_names: Vec<String>,
}

impl ResourceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_orderings(mut self, max: usize) -> Self {
        self.max_orderings = max;
        self
    }

    pub fn with_max_objects(mut self, max: usize) -> Self {
        self.max_objects = max;
        self
    }

    pub fn with_max_condition_terms(mut self, max: usize) -> Self {
        self.max_condition_terms = max;
        self
    }

    pub fn allow_related_ordering(mut self, allow: bool) -> Self {
        self.allow_related_ordering = allow;
        self
    }

    pub fn allow_related_filtering(mut self, allow: bool) -> Self {
        self.allow_related_filtering = allow;
        self
    }

    /// Restrict serialized records to these fields
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_allow_list = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Add a computed attribute name
    pub fn expose(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.exposed_attribute_names.contains(&name) {
            self.exposed_attribute_names.push(name);
        }
        self
    }

    /// Check limits and that every allow-listed field exists
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        if self.max_orderings < 1 {
            return Err(ResourceError::Config(
                "max_orderings must be at least 1".to_string(),
            ));
        }
        if self.max_objects < 1 {
            return Err(ResourceError::Config(
                "max_objects must be at least 1".to_string(),
            ));
        }
        if self.max_condition_terms < 1 {
            return Err(ResourceError::Config(
                "max_condition_terms must be at least 1".to_string(),
            ));
        }
        if let Some(field) = self
            .field_allow_list
            .iter()
            .find(|name| schema.get_field(name).is_none())
        {
            return Err(ResourceError::Config(format!(
                "allow-listed field '{}' does not exist on {}",
                field, schema.name
            )));
        }
        Ok(())
    }
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            max_orderings: 1,
            max_objects: 500,
            max_condition_terms: DEFAULT_MAX_TERMS,
            allow_related_ordering: false,
            allow_related_filtering: true,
            field_allow_list: Vec::new(),
            exposed_attribute_names: Vec::new(),
        }
    }
}
