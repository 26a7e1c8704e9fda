//! Record projection
//!
//! A record becomes an ordered attribute mapping restricted to the
//! resource's allow-list, then computed attributes are added on top. Only
//! accessors registered by name in [`ExposedAttributes`] are ever called.

use crate::config::ResourceConfig;
use crate::error::{ResourceError, Result};
use modelres_core::types::{Attributes, Record, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A named, zero-argument computed value of a record
pub trait ExposedAttribute: Send + Sync {
    fn compute(&self, record: &Record) -> std::result::Result<Value, String>;
}

impl<F> ExposedAttribute for F
where
    F: Fn(&Record) -> std::result::Result<Value, String> + Send + Sync,
{
    fn compute(&self, record: &Record) -> std::result::Result<Value, String> {
        self(record)
    }
}

/// Registry of computed attribute accessors by name
#[derive(Clone, Default)]
pub struct ExposedAttributes {
    accessors: HashMap<String, Arc<dyn ExposedAttribute>>,
}

impl ExposedAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an accessor, replacing any previous one with the same name
    pub fn register(
        mut self,
        name: impl Into<String>,
        accessor: impl ExposedAttribute + 'static,
    ) -> Self {
        self.accessors.insert(name.into(), Arc::new(accessor));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ExposedAttribute>> {
        self.accessors.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.accessors.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }
}

impl fmt::Debug for ExposedAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.accessors.keys().collect();
        names.sort();
        f.debug_struct("ExposedAttributes")
            .field("names", &names)
            .finish()
    }
}

/// Turns records into client-facing attribute mappings
#[derive(Clone)]
pub struct Projector {
    fields: Vec<String>,
    exposed: Vec<(String, Arc<dyn ExposedAttribute>)>,
}

impl Projector {
    /// Bind the configured exposed names to their accessors. A name with
    /// no registered accessor is a configuration error.
    pub fn new(config: &ResourceConfig, registry: &ExposedAttributes) -> Result<Self> {
        let exposed = config
            .exposed_attribute_names
            .iter()
            .map(|name| {
                registry
                    .get(name)
                    .map(|accessor| (name.clone(), accessor))
                    .ok_or_else(|| {
                        ResourceError::Config(format!(
                            "no accessor registered for exposed attribute '{}'",
                            name
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            fields: config.field_allow_list.clone(),
            exposed,
        })
    }

    /// Project one record
    pub fn project(&self, record: &Record) -> Result<Attributes> {
        let mut attributes = if self.fields.is_empty() {
            record.attributes.clone()
        } else {
            self.fields
                .iter()
                .filter_map(|name| {
                    record
                        .attributes
                        .get(name)
                        .map(|value| (name.clone(), value.clone()))
                })
                .collect()
        };

        for (name, accessor) in &self.exposed {
            let value = accessor
                .compute(record)
                .map_err(|message| ResourceError::Projection {
                    attribute: name.clone(),
                    message,
                })?;
            attributes.insert(name.clone(), value);
        }
        Ok(attributes)
    }

    /// Project records, keeping their order
    pub fn project_all(&self, records: &[Record]) -> Result<Vec<Attributes>> {
        records.iter().map(|record| self.project(record)).collect()
    }
}

impl fmt::Debug for Projector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projector")
            .field("fields", &self.fields)
            .field(
                "exposed",
                &self.exposed.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
