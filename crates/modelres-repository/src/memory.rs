//! In-memory record store
//!
//! Rows live in primary-key order behind a `tokio::sync::RwLock` that is only
//! held inside each method. Used for tests, fixtures and small deployments.

use async_trait::async_trait;
use modelres_core::types::{Attributes, Record, Schema, Value};
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::eval::{compare, matches, values_equal};
use crate::loader::load_fixture;
use crate::query::Query;
use crate::traits::RecordStore;

struct State {
    /// Sorted by primary key
    rows: Vec<Record>,
    /// Next key handed out for store-assigned primary keys
    next_id: i64,
}

/// Record store keeping every row in memory
pub struct MemoryStore {
    schema: Schema,
    state: RwLock<State>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            state: RwLock::new(State {
                rows: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Create a store seeded with rows, inserted in order
    pub async fn with_rows(schema: Schema, rows: Vec<Attributes>) -> StoreResult<Self> {
        let store = Self::new(schema);
        for row in rows {
            store.insert(row).await?;
        }
        Ok(store)
    }

    /// Create a store seeded from a JSON or YAML fixture file
    pub async fn from_fixture(schema: Schema, path: impl AsRef<Path>) -> StoreResult<Self> {
        let rows = load_fixture(path.as_ref()).await?;
        let rows = rows
            .into_iter()
            .map(|row| row.into_attributes(&schema.primary_key))
            .collect();
        let store = Self::with_rows(schema, rows).await?;
        let seeded = store.len().await;
        debug!(schema = %store.schema.name, rows = seeded, "seeded memory store from fixture");
        Ok(store)
    }

    /// Number of stored rows
    pub async fn len(&self) -> usize {
        self.state.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Lay attributes out in schema order with values coerced to field
    /// types. Absent fields become null.
    fn prepare(&self, attributes: &Attributes) -> StoreResult<Attributes> {
        self.check_known(attributes)?;

        let mut prepared = Attributes::new();
        for field in &self.schema.fields {
            let value = match attributes.get(&field.name) {
                Some(value) => field.coerce(value)?,
                None => Value::Null,
            };
            prepared.insert(field.name.clone(), value);
        }
        Ok(prepared)
    }

    /// Coerce a change set, dropping the primary key
    fn prepare_changes(&self, changes: &Attributes) -> StoreResult<Attributes> {
        self.check_known(changes)?;

        let mut prepared = Attributes::new();
        for (name, value) in changes.iter() {
            if name == self.schema.primary_key {
                continue;
            }
            if let Some(field) = self.schema.get_field(name) {
                prepared.insert(name, field.coerce(value)?);
            }
        }
        Ok(prepared)
    }

    fn check_known(&self, attributes: &Attributes) -> StoreResult<()> {
        match attributes
            .keys()
            .find(|name| self.schema.get_field(name).is_none())
        {
            Some(name) => Err(StoreError::UnknownField {
                field: name.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn check_query(&self, query: &Query) -> StoreResult<()> {
        match query
            .referenced_fields()
            .into_iter()
            .find(|name| self.schema.get_field(name).is_none())
        {
            Some(name) => Err(StoreError::UnknownField {
                field: name.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Reject `candidate` if a unique field collides with another row
    fn check_unique(&self, rows: &[Record], candidate: &Attributes, own_pk: &Value) -> StoreResult<()> {
        for field in self.schema.fields.iter().filter(|f| f.unique) {
            let Some(value) = candidate.get(&field.name).filter(|v| !v.is_null()) else {
                continue;
            };
            let clash = rows
                .iter()
                .filter(|row| row.pk != *own_pk)
                .any(|row| row.get(&field.name) == Some(value));
            if clash {
                return Err(StoreError::Integrity(format!(
                    "{} with this {} already exists.",
                    self.schema.name, field.name
                )));
            }
        }
        Ok(())
    }

    fn assign_key(&self, state: &State) -> StoreResult<Value> {
        let id = state.next_id;
        let key = match self.schema.primary_key_field() {
            Some(field) => field.coerce(&Value::from(id))?,
            None => Value::from(id),
        };
        Ok(key)
    }
}

fn position(rows: &[Record], pk: &Value) -> Result<usize, usize> {
    rows.binary_search_by(|row| row.pk.total_cmp(pk))
}

fn is_selected(pks: &[Value], pk: &Value) -> bool {
    pks.iter().any(|key| values_equal(pk, key))
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    async fn fetch(&self, query: &Query) -> StoreResult<Vec<Record>> {
        self.check_query(query)?;
        let predicate = query.predicate();

        let state = self.state.read().await;
        let mut selected: Vec<&Record> = state
            .rows
            .iter()
            .filter(|row| predicate.as_ref().map_or(true, |p| matches(row, p)))
            .collect();

        // Stable sort: ties keep primary-key order.
        if !query.ordering.is_empty() {
            selected.sort_by(|a, b| compare(a, b, &query.ordering));
        }

        let rows: Vec<Record> = selected
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        debug!(schema = %self.schema.name, rows = rows.len(), "fetched records");
        Ok(rows)
    }

    async fn count(&self, query: &Query) -> StoreResult<usize> {
        self.check_query(query)?;
        let predicate = query.predicate();

        let state = self.state.read().await;
        let count = match predicate {
            Some(p) => state.rows.iter().filter(|row| matches(row, &p)).count(),
            None => state.rows.len(),
        };
        Ok(count)
    }

    async fn get_by_primary_keys(&self, pks: &[Value]) -> StoreResult<Vec<Record>> {
        let state = self.state.read().await;
        Ok(state
            .rows
            .iter()
            .filter(|row| is_selected(pks, &row.pk))
            .cloned()
            .collect())
    }

    async fn insert(&self, attributes: Attributes) -> StoreResult<Record> {
        let mut prepared = self.prepare(&attributes)?;
        let key_name = self.schema.primary_key.clone();

        let mut state = self.state.write().await;

        let pk = match prepared.get(&key_name) {
            Some(pk) if !pk.is_null() => pk.clone(),
            _ if self.schema.auto_primary_key => self.assign_key(&state)?,
            _ => {
                return Err(StoreError::InvalidValue {
                    field: key_name,
                    message: "This field is required.".to_string(),
                })
            }
        };
        prepared.insert(key_name.clone(), pk.clone());

        let index = match position(&state.rows, &pk) {
            Ok(_) => {
                return Err(StoreError::Integrity(format!(
                    "{} with this {} already exists.",
                    self.schema.name, key_name
                )))
            }
            Err(index) => index,
        };
        self.check_unique(&state.rows, &prepared, &pk)?;

        if let Some(n) = pk.as_i64() {
            state.next_id = state.next_id.max(n.saturating_add(1));
        } else if let Some(n) = pk.as_str().and_then(|s| s.parse::<i64>().ok()) {
            state.next_id = state.next_id.max(n.saturating_add(1));
        }

        let record = Record::new(pk, prepared);
        state.rows.insert(index, record.clone());

        debug!(schema = %self.schema.name, pk = %record.pk, "inserted record");
        Ok(record)
    }

    async fn update(&self, pks: &[Value], changes: &Attributes) -> StoreResult<Vec<Record>> {
        let changes = self.prepare_changes(changes)?;

        let mut state = self.state.write().await;
        let indices: Vec<usize> = state
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| is_selected(pks, &row.pk))
            .map(|(index, _)| index)
            .collect();

        let mut updated = Vec::new();
        let mut first_failure = None;

        for index in indices {
            let mut candidate = state.rows[index].attributes.clone();
            candidate.merge(&changes);

            let pk = state.rows[index].pk.clone();
            if let Err(err) = self.check_unique(&state.rows, &candidate, &pk) {
                warn!(schema = %self.schema.name, pk = %pk, error = %err, "skipping record in update");
                first_failure.get_or_insert(err);
                continue;
            }

            state.rows[index].attributes = candidate;
            updated.push(state.rows[index].clone());
        }

        match first_failure {
            Some(err) if updated.is_empty() => Err(err),
            _ => {
                debug!(schema = %self.schema.name, rows = updated.len(), "updated records");
                Ok(updated)
            }
        }
    }

    async fn delete(&self, pks: &[Value]) -> StoreResult<usize> {
        let mut state = self.state.write().await;
        let before = state.rows.len();
        state.rows.retain(|row| !is_selected(pks, &row.pk));
        let removed = before - state.rows.len();

        debug!(schema = %self.schema.name, rows = removed, "deleted records");
        Ok(removed)
    }
}
