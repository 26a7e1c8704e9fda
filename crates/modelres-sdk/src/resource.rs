//! Resource dispatcher
//!
//! A [`Resource`] serves one record type: filtered listing and counting,
//! multi-get, create, single and bulk update, and delete. Operations share
//! no state between calls apart from the immutable configuration.

use crate::config::ResourceConfig;
use crate::endpoints::ClassEndpoints;
use crate::error::{FieldErrors, ResourceError, Result};
use crate::form::FormDescription;
use crate::ordering::{validate_ordering, Pagination};
use crate::projection::Projector;
use crate::request::QueryRequest;
use modelres_compiler::{PredicateTranslator, TranslatorOptions};
use modelres_core::condition::{ConditionParser, ParameterMap};
use modelres_core::ir::Predicate;
use modelres_core::types::{Attributes, Record, Schema, ValidationError, Validator, Value, PK_ALIAS};
use modelres_repository::{QueryBuilder, RecordStore, StoreError};
use std::sync::Arc;
use tracing::debug;

const MISSING_PK: &str = "The request must specify a pk argument";
const MISSING_SINGLE_PK: &str = "The request must specify a single pk argument";

/// Successful operation with no response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoContent;

/// Generic CRUD-plus-query facade over one record store
pub struct Resource {
    name: String,
    config: ResourceConfig,
    store: Arc<dyn RecordStore>,
    /// Schema restricted to the allow-listed fields
    form: Schema,
    projector: Projector,
    endpoints: ClassEndpoints,
}

impl Resource {
    pub(crate) fn new(
        name: String,
        config: ResourceConfig,
        store: Arc<dyn RecordStore>,
        projector: Projector,
        endpoints: ClassEndpoints,
    ) -> Self {
        let mut form = store.schema().clone();
        if !config.field_allow_list.is_empty() {
            form.fields
                .retain(|field| config.field_allow_list.contains(&field.name));
        }
        Self {
            name,
            config,
            store,
            form,
            projector,
            endpoints,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    pub fn schema(&self) -> &Schema {
        self.store.schema()
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Number of records matching the request's filter
    pub async fn length(&self, request: &QueryRequest) -> Result<usize> {
        debug!(resource = %self.name, operation = "length", "dispatching");
        let query = self.filtered(request)?.build();
        Ok(self.store.count(&query).await?)
    }

    /// Filtered, ordered slice of records
    ///
    /// With condition text the condition pipeline is used exclusively and
    /// flat lookups in the same request are ignored.
    pub async fn list(&self, request: &QueryRequest) -> Result<Vec<Attributes>> {
        debug!(resource = %self.name, operation = "list", "dispatching");

        let ordering = validate_ordering(request.ordering.as_deref(), &self.config, self.schema())?;
        let page = Pagination::resolve(
            request.offset.as_deref(),
            request.limit.as_deref(),
            self.config.max_objects,
        )?;

        let query = self
            .filtered(request)?
            .order_by(ordering)
            .slice(page.offset, page.limit)
            .build();
        let records = self.store.fetch(&query).await?;
        self.projector.project_all(&records)
    }

    /// Multi-get by primary key
    pub async fn show(&self, request: &QueryRequest) -> Result<Vec<Attributes>> {
        debug!(resource = %self.name, operation = "show", "dispatching");

        if request.pks.len() > self.config.max_objects {
            return Err(ResourceError::TooManyKeys {
                limit: self.config.max_objects,
                count: request.pks.len(),
            });
        }
        let pks = self.keys(request)?;
        let records = self.store.get_by_primary_keys(&pks).await?;
        self.projector.project_all(&records)
    }

    /// Validate a body against the form and store it
    pub async fn create(&self, body: &Value) -> Result<Attributes> {
        debug!(resource = %self.name, operation = "create", "dispatching");

        let data = body_attributes(body)?;
        let cleaned = Validator::new()
            .allow_unknown_fields(true)
            .clean(&data, &self.form)
            .map_err(form_errors)?;

        let record = self.store.insert(cleaned).await.map_err(write_error)?;
        self.projector.project(&record)
    }

    /// Partially update exactly one record
    pub async fn update(&self, request: &QueryRequest, body: &Value) -> Result<Attributes> {
        debug!(resource = %self.name, operation = "update", "dispatching");

        let (raw, pk) = self.single_key(request)?;
        let data = body_attributes(body)?;
        let current = self.fetch_one(&raw, &pk).await?;

        let mut merged = current.attributes.clone();
        merged.merge(&data);
        merged.insert(self.schema().primary_key.clone(), current.pk.clone());

        let cleaned = Validator::new()
            .allow_unknown_fields(true)
            .apply_defaults(false)
            .clean(&merged, &self.form)
            .map_err(form_errors)?;

        let updated = self
            .store
            .update(&[current.pk.clone()], &cleaned)
            .await
            .map_err(write_error)?;
        let record = updated
            .into_iter()
            .next()
            .ok_or_else(|| not_found(&raw))?;
        self.projector.project(&record)
    }

    /// Apply one attribute mapping to every record with a given key, best
    /// effort. The primary key is stripped from the mapping first.
    pub async fn bulk_update(&self, request: &QueryRequest, body: &Value) -> Result<Vec<Attributes>> {
        debug!(resource = %self.name, operation = "bulk_update", "dispatching");

        let pks = self.keys(request)?;
        let mut data = body_attributes(body)?;
        data.remove(&self.schema().primary_key);
        data.remove(PK_ALIAS);

        let mut changes = Attributes::new();
        for (name, value) in data.iter() {
            let field = self.schema().get_field(name).ok_or_else(|| {
                ResourceError::validation(format!(
                    "Request specified a non-existent field to update: {}",
                    name
                ))
            })?;
            let value = field.coerce(value).map_err(|err| {
                ResourceError::validation(format!(
                    "Request specified inappropriate data for a field: {}",
                    err
                ))
            })?;
            changes.insert(name, value);
        }

        let updated = self.store.update(&pks, &changes).await?;
        debug!(resource = %self.name, requested = pks.len(), updated = updated.len(), "bulk update applied");
        self.projector.project_all(&updated)
    }

    /// Delete every record with a given key
    pub async fn destroy(&self, request: &QueryRequest) -> Result<NoContent> {
        debug!(resource = %self.name, operation = "destroy", "dispatching");

        let pks = self.keys(request)?;
        let removed = self.store.delete(&pks).await?;
        debug!(resource = %self.name, removed, "records deleted");
        Ok(NoContent)
    }

    /// Delete exactly one existing record
    pub async fn destroy_one(&self, request: &QueryRequest) -> Result<NoContent> {
        debug!(resource = %self.name, operation = "destroy_one", "dispatching");

        let (raw, pk) = self.single_key(request)?;
        let record = self.fetch_one(&raw, &pk).await?;
        self.store.delete(&[record.pk]).await?;
        Ok(NoContent)
    }

    /// Describe the form used by create and update
    pub fn meta(&self) -> FormDescription {
        debug!(resource = %self.name, operation = "meta", "dispatching");
        FormDescription::from_schema(&self.form)
    }

    /// Run a registered class-level endpoint
    pub async fn call(&self, endpoint: &str) -> Result<Value> {
        debug!(resource = %self.name, operation = "call", endpoint, "dispatching");

        let handler = self.endpoints.get(endpoint).ok_or_else(|| {
            ResourceError::NotFound(format!(
                "No endpoint named '{}' on resource '{}'",
                endpoint, self.name
            ))
        })?;
        handler
            .call(self.store.as_ref())
            .await
            .map_err(|message| ResourceError::Endpoint {
                endpoint: endpoint.to_string(),
                message,
            })
    }

    pub fn endpoint_names(&self) -> impl Iterator<Item = &str> {
        self.endpoints.names()
    }

    fn translator(&self) -> PredicateTranslator<'_> {
        PredicateTranslator::with_options(
            self.schema(),
            TranslatorOptions {
                allow_traversal: self.config.allow_related_filtering,
            },
        )
    }

    /// Query builder carrying the request's filter
    fn filtered(&self, request: &QueryRequest) -> Result<QueryBuilder> {
        let builder = QueryBuilder::new();
        Ok(match self.predicate(request)? {
            Some(predicate) => builder.filter_by_predicate(predicate),
            None => builder,
        })
    }

    fn predicate(&self, request: &QueryRequest) -> Result<Option<Predicate>> {
        let translator = self.translator();

        let Some(text) = request.condition_text() else {
            let lookups = request
                .lookups
                .iter()
                .map(|(field, value)| (field.as_str(), value.as_str()));
            return translator
                .lookups(lookups)
                .map_err(|err| ResourceError::InvalidFilter(err.to_string()));
        };

        let conditions = decode_conditions(text)?;
        if conditions.trim().is_empty() {
            return Ok(None);
        }
        let parameters = ParameterMap::decode(request.parameters.as_deref().unwrap_or(""))?;
        let ast = ConditionParser::new()
            .with_max_terms(self.config.max_condition_terms)
            .parse(&conditions)?;
        debug!(resource = %self.name, conditions = %ast, "parsed conditions");

        Ok(Some(translator.translate(&ast, &parameters)?))
    }

    /// At least one key, coerced to the key field's type
    fn keys(&self, request: &QueryRequest) -> Result<Vec<Value>> {
        if request.pks.is_empty() {
            return Err(ResourceError::MissingKey(MISSING_PK.to_string()));
        }
        request.pks.iter().map(|raw| self.coerce_key(raw)).collect()
    }

    fn single_key(&self, request: &QueryRequest) -> Result<(String, Value)> {
        match request.pks.as_slice() {
            [raw] => Ok((raw.clone(), self.coerce_key(raw)?)),
            _ => Err(ResourceError::MissingKey(MISSING_SINGLE_PK.to_string())),
        }
    }

    fn coerce_key(&self, raw: &str) -> Result<Value> {
        self.translator()
            .primary_key(raw)
            .map_err(|err| ResourceError::InvalidFilter(err.to_string()))
    }

    async fn fetch_one(&self, raw: &str, pk: &Value) -> Result<Record> {
        self.store
            .get_by_primary_keys(std::slice::from_ref(pk))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| not_found(raw))
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("schema", &self.schema().name)
            .finish()
    }
}

/// Undo form encoding of condition text: `+` is a space, then
/// percent-escapes are decoded
fn decode_conditions(text: &str) -> Result<String> {
    let spaced = text.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ResourceError::ConditionSyntax {
            position: 0,
            message: "condition text is not valid UTF-8 once decoded".to_string(),
        })
}

fn body_attributes(body: &Value) -> Result<Attributes> {
    match body {
        Value::Object(map) => Ok(map
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()),
        _ => Err(ResourceError::malformed_body()),
    }
}

fn form_errors(errors: Vec<ValidationError>) -> ResourceError {
    let mut fields = FieldErrors::new();
    for error in &errors {
        fields
            .entry(error.field().to_string())
            .or_insert_with(|| error.message());
    }
    ResourceError::Validation {
        message: format!("The submitted data contained {} errors.", fields.len()),
        errors: fields,
    }
}

/// Write failures caused by the payload are validation errors
fn write_error(err: StoreError) -> ResourceError {
    match err {
        StoreError::InvalidValue { field, message } => {
            let mut errors = FieldErrors::new();
            errors.insert(field, message);
            ResourceError::Validation {
                message: "The submitted data contained 1 errors.".to_string(),
                errors,
            }
        }
        other => other.into(),
    }
}

fn not_found(raw: &str) -> ResourceError {
    ResourceError::NotFound(format!(
        "No object with the given pk exists (asked for pk {}).",
        raw
    ))
}
