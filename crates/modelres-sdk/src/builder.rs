//! Builder pattern for Resource

use crate::config::ResourceConfig;
use crate::endpoints::{ClassEndpoint, ClassEndpoints};
use crate::error::{ResourceError, Result};
use crate::projection::{ExposedAttribute, ExposedAttributes, Projector};
use crate::resource::Resource;
use modelres_repository::RecordStore;
use std::sync::Arc;

/// Builder for Resource
///
/// # Example
///
/// ```rust,ignore
/// use modelres_sdk::ResourceBuilder;
///
/// let hosts = ResourceBuilder::new("hosts", store)
///     .max_orderings(2)
///     .with_fields(["ip", "user"])
///     .expose("label", |record: &Record| Ok(Value::from(format!("host {}", record.pk))))
///     .build()?;
/// ```
pub struct ResourceBuilder {
    name: String,
    store: Arc<dyn RecordStore>,
    config: ResourceConfig,
    exposed: ExposedAttributes,
    endpoints: ClassEndpoints,
}

impl ResourceBuilder {
    /// Create a builder serving `store` under `name`
    pub fn new(name: impl Into<String>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            name: name.into(),
            store,
            config: ResourceConfig::default(),
            exposed: ExposedAttributes::new(),
            endpoints: ClassEndpoints::new(),
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: ResourceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_orderings(mut self, max: usize) -> Self {
        self.config.max_orderings = max;
        self
    }

    pub fn max_objects(mut self, max: usize) -> Self {
        self.config.max_objects = max;
        self
    }

    pub fn allow_related_ordering(mut self, allow: bool) -> Self {
        self.config.allow_related_ordering = allow;
        self
    }

    pub fn allow_related_filtering(mut self, allow: bool) -> Self {
        self.config.allow_related_filtering = allow;
        self
    }

    /// Restrict serialized records and the form to these fields
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config = self.config.with_fields(fields);
        self
    }

    /// Register an accessor and expose it under `name`
    pub fn expose(mut self, name: impl Into<String>, accessor: impl ExposedAttribute + 'static) -> Self {
        let name = name.into();
        self.exposed = self.exposed.register(name.clone(), accessor);
        self.config = self.config.expose(name);
        self
    }

    /// Provide accessors for names listed in the configuration
    pub fn with_exposed_attributes(mut self, registry: ExposedAttributes) -> Self {
        self.exposed = registry;
        self
    }

    /// Register a class-level endpoint under `name`
    pub fn endpoint(mut self, name: impl Into<String>, endpoint: impl ClassEndpoint + 'static) -> Self {
        self.endpoints = self.endpoints.register(name, endpoint);
        self
    }

    pub fn with_class_endpoints(mut self, endpoints: ClassEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Build the resource
    ///
    /// Fails when the schema is invalid, a limit is zero, an allow-listed
    /// field does not exist, or an exposed name has no accessor.
    pub fn build(self) -> Result<Resource> {
        let schema = self.store.schema();
        schema
            .validate()
            .map_err(|err| ResourceError::Config(err.to_string()))?;
        self.config.validate(schema)?;

        let projector = Projector::new(&self.config, &self.exposed)?;
        tracing::debug!(
            resource = %self.name,
            schema = %schema.name,
            max_objects = self.config.max_objects,
            endpoints = self.endpoints.len(),
            "resource built"
        );

        Ok(Resource::new(
            self.name,
            self.config,
            self.store,
            projector,
            self.endpoints,
        ))
    }
}
