//! PostgreSQL record store
//!
//! One table per record type, one column per schema field. Scalar fields map
//! to native columns; arrays, objects and untyped fields are JSONB.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use modelres_core::types::{Attributes, FieldType, Record, Schema, Value};
use sqlx::postgres::{PgArguments, PgPool, PgRow, Postgres};
use sqlx::query::Query as SqlxQuery;
use sqlx::Row;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::query::Query;
use crate::sql::{SqlRenderer, SqlStatement};
use crate::traits::RecordStore;

const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed record store
pub struct PostgresStore {
    /// Database connection pool
    pool: PgPool,
    schema: Schema,
    table: String,
}

impl PostgresStore {
    /// Connect to `database_url` and serve `schema` from `table`
    ///
    /// # Example
    /// ```no_run
    /// use modelres_core::types::{FieldType, Schema, SchemaField};
    /// use modelres_repository::PostgresStore;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let schema = Schema::new("Host")
    ///         .add_field(SchemaField::new("id", FieldType::Number))
    ///         .add_field(SchemaField::new("ip", FieldType::String));
    ///     let store = PostgresStore::new("postgresql://localhost/inventory", schema, "hosts").await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(
        database_url: &str,
        schema: Schema,
        table: impl Into<String>,
    ) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::with_pool(pool, schema, table))
    }

    /// Create a store over an existing pool
    pub fn with_pool(pool: PgPool, schema: Schema, table: impl Into<String>) -> Self {
        Self {
            pool,
            schema,
            table: table.into(),
        }
    }

    fn renderer(&self) -> SqlRenderer<'_> {
        SqlRenderer::new(&self.schema, self.table.clone())
    }

    /// Coerce every attribute to its field type
    fn coerce(&self, attributes: &Attributes) -> StoreResult<Attributes> {
        let mut coerced = Attributes::new();
        for (name, value) in attributes.iter() {
            let field = self
                .schema
                .get_field(name)
                .ok_or_else(|| StoreError::UnknownField {
                    field: name.to_string(),
                })?;
            coerced.insert(name, field.coerce(value)?);
        }
        Ok(coerced)
    }

    async fn fetch_rows(&self, statement: &SqlStatement) -> StoreResult<Vec<Record>> {
        debug!(sql = %statement.sql, "executing query");
        let rows = bind(sqlx::query(&statement.sql), &statement.params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|row| self.decode(row)).collect()
    }

    fn decode(&self, row: &PgRow) -> StoreResult<Record> {
        let mut attributes = Attributes::new();
        for field in &self.schema.fields {
            let name = field.name.as_str();
            let value = match &field.field_type {
                FieldType::Boolean => row.try_get::<Option<bool>, _>(name)?.map(Value::Bool),
                FieldType::Number => row.try_get::<Option<f64>, _>(name)?.map(Value::Number),
                FieldType::String => row.try_get::<Option<String>, _>(name)?.map(Value::String),
                FieldType::Date => row
                    .try_get::<Option<NaiveDate>, _>(name)?
                    .map(|date| Value::String(date.format("%Y-%m-%d").to_string())),
                FieldType::DateTime => row
                    .try_get::<Option<DateTime<Utc>>, _>(name)?
                    .map(|at| Value::String(at.to_rfc3339_opts(SecondsFormat::AutoSi, true))),
                FieldType::Array { .. } | FieldType::Object { .. } | FieldType::Any => row
                    .try_get::<Option<serde_json::Value>, _>(name)?
                    .map(Value::from),
            };
            attributes.insert(name, value.unwrap_or(Value::Null));
        }
        Ok(Record::from_attributes(&self.schema.primary_key, attributes))
    }
}

/// Bind values in `$n` order. Integral numbers go over the wire as `int8`,
/// the statement's casts take care of the column type.
fn bind<'q>(
    mut query: SqlxQuery<'q, Postgres, PgArguments>,
    params: &'q [Value],
) -> SqlxQuery<'q, Postgres, PgArguments> {
    for value in params {
        query = match value {
            Value::Null => query.bind(Option::<String>::None),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match value.as_i64() {
                Some(i) => query.bind(i),
                None => query.bind(*n),
            },
            Value::String(s) => query.bind(s.as_str()),
            Value::Array(_) | Value::Object(_) => query.bind(value.to_string()),
        };
    }
    query
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map_or(false, |code| code == UNIQUE_VIOLATION)
}

/// Constraint violations become integrity errors
fn write_error(err: sqlx::Error) -> StoreError {
    match err.as_database_error() {
        Some(db) if is_unique_violation(&err) => StoreError::Integrity(db.message().to_string()),
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    async fn fetch(&self, query: &Query) -> StoreResult<Vec<Record>> {
        let statement = self.renderer().select(query)?;
        self.fetch_rows(&statement).await
    }

    async fn count(&self, query: &Query) -> StoreResult<usize> {
        let statement = self.renderer().count(query)?;
        let row = bind(sqlx::query(&statement.sql), &statement.params)
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get(0)?;
        Ok(count.max(0) as usize)
    }

    async fn get_by_primary_keys(&self, pks: &[Value]) -> StoreResult<Vec<Record>> {
        if pks.is_empty() {
            return Ok(Vec::new());
        }
        let statement = self.renderer().select_by_keys(pks)?;
        self.fetch_rows(&statement).await
    }

    async fn insert(&self, attributes: Attributes) -> StoreResult<Record> {
        let attributes = self.coerce(&attributes)?;
        let statement = self.renderer().insert(&attributes)?;

        let row = bind(sqlx::query(&statement.sql), &statement.params)
            .fetch_one(&self.pool)
            .await
            .map_err(write_error)?;
        let record = self.decode(&row)?;

        debug!(table = %self.table, pk = %record.pk, "inserted record");
        Ok(record)
    }

    async fn update(&self, pks: &[Value], changes: &Attributes) -> StoreResult<Vec<Record>> {
        let changes = self.coerce(changes)?;
        let renderer = self.renderer();

        let mut updated = Vec::new();
        let mut first_failure = None;

        for pk in pks {
            let statement = renderer.update_one(pk, &changes)?;
            let result = bind(sqlx::query(&statement.sql), &statement.params)
                .fetch_optional(&self.pool)
                .await;

            match result {
                Ok(Some(row)) => updated.push(self.decode(&row)?),
                Ok(None) => {}
                Err(err) if is_unique_violation(&err) => {
                    let err = write_error(err);
                    warn!(table = %self.table, pk = %pk, error = %err, "skipping record in update");
                    first_failure.get_or_insert(err);
                }
                Err(err) => return Err(err.into()),
            }
        }

        match first_failure {
            Some(err) if updated.is_empty() => Err(err),
            _ => {
                updated.sort_by(|a, b| a.pk.total_cmp(&b.pk));
                debug!(table = %self.table, rows = updated.len(), "updated records");
                Ok(updated)
            }
        }
    }

    async fn delete(&self, pks: &[Value]) -> StoreResult<usize> {
        if pks.is_empty() {
            return Ok(0);
        }
        let statement = self.renderer().delete(pks)?;
        let result = bind(sqlx::query(&statement.sql), &statement.params)
            .execute(&self.pool)
            .await?;

        debug!(table = %self.table, rows = result.rows_affected(), "deleted records");
        Ok(result.rows_affected() as usize)
    }
}
