//! PostgreSQL statement rendering
//!
//! Renders queries and writes as parameterized statements. Identifiers are
//! double-quoted, values always travel as `$n` parameters, and traversal
//! paths into JSONB columns use `->` / `->>`. A path through an array column
//! matches when any element matches.

use crate::error::{StoreError, StoreResult};
use crate::query::Query;
use modelres_core::ir::{Direction, Equality, FieldPath, OrderKey, Predicate};
use modelres_core::types::{Attributes, FieldType, Schema, SchemaField, Value};

/// A rendered statement and its parameters, in `$n` order
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Renders statements against one table whose columns match a schema
#[derive(Debug, Clone)]
pub struct SqlRenderer<'s> {
    schema: &'s Schema,
    table: String,
}

/// Quote an identifier, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal, doubling embedded quotes
fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

impl<'s> SqlRenderer<'s> {
    pub fn new(schema: &'s Schema, table: impl Into<String>) -> Self {
        Self {
            schema,
            table: table.into(),
        }
    }

    /// `SELECT ... WHERE ... ORDER BY ... LIMIT ... OFFSET ...`
    pub fn select(&self, query: &Query) -> StoreResult<SqlStatement> {
        let mut params = Vec::new();
        let mut sql = format!("SELECT {} FROM {}", self.columns(), quote_ident(&self.table));

        if let Some(predicate) = query.predicate() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.predicate(&predicate, &mut params)?);
        }

        sql.push_str(" ORDER BY ");
        sql.push_str(&self.ordering(&query.ordering)?);

        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if query.offset > 0 {
            sql.push_str(&format!(" OFFSET {}", query.offset));
        }

        Ok(SqlStatement { sql, params })
    }

    /// `SELECT COUNT(*) ... WHERE ...`
    pub fn count(&self, query: &Query) -> StoreResult<SqlStatement> {
        let mut params = Vec::new();
        let mut sql = format!("SELECT COUNT(*) FROM {}", quote_ident(&self.table));

        if let Some(predicate) = query.predicate() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.predicate(&predicate, &mut params)?);
        }

        Ok(SqlStatement { sql, params })
    }

    /// Select rows by primary key in natural order
    pub fn select_by_keys(&self, pks: &[Value]) -> StoreResult<SqlStatement> {
        let mut params = Vec::new();
        let keys = self.key_list(pks, &mut params)?;
        let pk = quote_ident(&self.schema.primary_key);
        let sql = format!(
            "SELECT {} FROM {} WHERE {} IN ({}) ORDER BY {} ASC",
            self.columns(),
            quote_ident(&self.table),
            pk,
            keys,
            pk
        );
        Ok(SqlStatement { sql, params })
    }

    /// `INSERT ... RETURNING ...`; a null store-assigned key is left to the
    /// column default
    pub fn insert(&self, attributes: &Attributes) -> StoreResult<SqlStatement> {
        let mut params = Vec::new();
        let mut columns = Vec::new();
        let mut placeholders = Vec::new();

        for (name, value) in attributes.iter() {
            let field = self.field(name)?;
            if name == self.schema.primary_key && self.schema.auto_primary_key && value.is_null() {
                continue;
            }
            columns.push(quote_ident(name));
            placeholders.push(placeholder(field, &mut params, value.clone()));
        }

        let sql = if columns.is_empty() {
            format!(
                "INSERT INTO {} DEFAULT VALUES RETURNING {}",
                quote_ident(&self.table),
                self.columns()
            )
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
                quote_ident(&self.table),
                columns.join(", "),
                placeholders.join(", "),
                self.columns()
            )
        };
        Ok(SqlStatement { sql, params })
    }

    /// Update one row by key, `RETURNING` the new row. The key column is
    /// never assigned.
    pub fn update_one(&self, pk: &Value, changes: &Attributes) -> StoreResult<SqlStatement> {
        let mut params = Vec::new();
        let mut assignments = Vec::new();

        for (name, value) in changes.iter() {
            let field = self.field(name)?;
            if name == self.schema.primary_key {
                continue;
            }
            let slot = placeholder(field, &mut params, value.clone());
            assignments.push(format!("{} = {}", quote_ident(name), slot));
        }

        let key_field = self.key_field()?;
        let pk_column = quote_ident(&self.schema.primary_key);

        // Nothing to change still returns the row so callers see it.
        let sql = if assignments.is_empty() {
            let key = placeholder(key_field, &mut params, pk.clone());
            format!(
                "SELECT {} FROM {} WHERE {} = {}",
                self.columns(),
                quote_ident(&self.table),
                pk_column,
                key
            )
        } else {
            let key = placeholder(key_field, &mut params, pk.clone());
            format!(
                "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
                quote_ident(&self.table),
                assignments.join(", "),
                pk_column,
                key,
                self.columns()
            )
        };
        Ok(SqlStatement { sql, params })
    }

    /// `DELETE ... WHERE pk IN (...)`
    pub fn delete(&self, pks: &[Value]) -> StoreResult<SqlStatement> {
        let mut params = Vec::new();
        let keys = self.key_list(pks, &mut params)?;
        let sql = format!(
            "DELETE FROM {} WHERE {} IN ({})",
            quote_ident(&self.table),
            quote_ident(&self.schema.primary_key),
            keys
        );
        Ok(SqlStatement { sql, params })
    }

    /// Select list; numbers are read back as double precision
    fn columns(&self) -> String {
        self.schema
            .fields
            .iter()
            .map(|field| match field.field_type {
                FieldType::Number => format!(
                    "{}::double precision AS {}",
                    quote_ident(&field.name),
                    quote_ident(&field.name)
                ),
                _ => quote_ident(&field.name),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn field(&self, name: &str) -> StoreResult<&'s SchemaField> {
        self.schema
            .get_field(name)
            .ok_or_else(|| StoreError::UnknownField {
                field: name.to_string(),
            })
    }

    fn key_field(&self) -> StoreResult<&'s SchemaField> {
        self.field(&self.schema.primary_key)
    }

    fn key_list(&self, pks: &[Value], params: &mut Vec<Value>) -> StoreResult<String> {
        let field = self.key_field()?;
        if pks.is_empty() {
            return Ok("NULL".to_string());
        }
        Ok(pks
            .iter()
            .map(|pk| placeholder(field, params, pk.clone()))
            .collect::<Vec<_>>()
            .join(", "))
    }

    fn predicate(&self, predicate: &Predicate, params: &mut Vec<Value>) -> StoreResult<String> {
        match predicate {
            Predicate::Equality(eq) => self.equality(eq, params),
            Predicate::And(left, right) => Ok(format!(
                "({} AND {})",
                self.predicate(left, params)?,
                self.predicate(right, params)?
            )),
            Predicate::Or(left, right) => Ok(format!(
                "({} OR {})",
                self.predicate(left, params)?,
                self.predicate(right, params)?
            )),
        }
    }

    fn equality(&self, eq: &Equality, params: &mut Vec<Value>) -> StoreResult<String> {
        let field = self.field(eq.field.root())?;
        let column = quote_ident(&field.name);
        let rest = &eq.field.segments()[1..];

        if let FieldType::Array { .. } = field.field_type {
            // Any element of a JSONB array column
            params.push(text_param(&eq.value));
            let element = if rest.is_empty() {
                "e #>> '{}'".to_string()
            } else {
                json_text_path("e", rest)
            };
            return Ok(format!(
                "EXISTS (SELECT 1 FROM jsonb_array_elements({}) AS e WHERE {} = ${})",
                column,
                element,
                params.len()
            ));
        }

        if rest.is_empty() {
            let slot = placeholder(field, params, eq.value.clone());
            return Ok(format!("{} = {}", column, slot));
        }

        params.push(text_param(&eq.value));
        Ok(format!("{} = ${}", json_text_path(&column, rest), params.len()))
    }

    fn ordering(&self, keys: &[OrderKey]) -> StoreResult<String> {
        let mut parts = Vec::new();
        for key in keys {
            parts.push(format!("{} {}", self.order_expr(&key.field)?, direction(key.direction)));
        }
        // Primary key last, so ties keep natural order.
        parts.push(format!("{} ASC", quote_ident(&self.schema.primary_key)));
        Ok(parts.join(", "))
    }

    fn order_expr(&self, path: &FieldPath) -> StoreResult<String> {
        let field = self.field(path.root())?;
        let column = quote_ident(&field.name);
        let rest = &path.segments()[1..];

        Ok(match (&field.field_type, rest.is_empty()) {
            (_, true) => column,
            (FieldType::Array { .. }, false) => json_text_path(&format!("({}->0)", column), rest),
            _ => json_text_path(&column, rest),
        })
    }
}

fn direction(direction: Direction) -> &'static str {
    match direction {
        Direction::Ascending => "ASC NULLS FIRST",
        Direction::Descending => "DESC NULLS LAST",
    }
}

/// `base->'a'->>'b'`
fn json_text_path(base: &str, segments: &[String]) -> String {
    let mut expr = base.to_string();
    for (index, segment) in segments.iter().enumerate() {
        let arrow = if index + 1 == segments.len() { "->>" } else { "->" };
        expr.push_str(arrow);
        expr.push_str(&quote_literal(segment));
    }
    expr
}

/// Push a parameter and return its placeholder, cast to the column type.
/// JSONB slots carry their value as JSON text.
fn placeholder(field: &SchemaField, params: &mut Vec<Value>, value: Value) -> String {
    let cast = match field.field_type {
        FieldType::Boolean => "boolean",
        FieldType::Number => "double precision",
        FieldType::String => "text",
        FieldType::Date => "date",
        FieldType::DateTime => "timestamptz",
        FieldType::Array { .. } | FieldType::Object { .. } | FieldType::Any => {
            let json = match value {
                Value::Null => Value::Null,
                other => Value::String(json_text(&other)),
            };
            params.push(json);
            return format!("${}::jsonb", params.len());
        }
    };
    params.push(value);
    format!("${}::{}", params.len(), cast)
}

fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => serde_json::Value::String(s.clone()).to_string(),
        other => other.to_string(),
    }
}

/// JSONB text extraction compares as text
fn text_param(value: &Value) -> Value {
    match value {
        Value::String(_) => value.clone(),
        other => Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryBuilder;

    fn schema() -> Schema {
        Schema::new("Host")
            .add_field(SchemaField::new("id", FieldType::Number))
            .add_field(SchemaField::new("ip", FieldType::String))
            .add_field(SchemaField::new("seen", FieldType::Date))
            .add_field(SchemaField::new("owner", FieldType::object()))
            .add_field(SchemaField::new(
                "tags",
                FieldType::array(FieldType::String),
            ))
    }

    #[test]
    fn test_select_with_predicate_and_slice() {
        let schema = schema();
        let renderer = SqlRenderer::new(&schema, "hosts");
        let query = QueryBuilder::new()
            .filter_by_predicate(
                Predicate::equals(FieldPath::field("ip"), "10.0.0.1")
                    .or(Predicate::equals(FieldPath::parse("owner__name"), "frank")),
            )
            .order_by(vec![OrderKey::desc(FieldPath::field("seen"))])
            .slice(20, 10)
            .build();

        let stmt = renderer.select(&query).unwrap();

        assert_eq!(
            stmt.sql,
            "SELECT \"id\"::double precision AS \"id\", \"ip\", \"seen\", \"owner\", \"tags\" \
             FROM \"hosts\" WHERE (\"ip\" = $1::text OR \"owner\"->>'name' = $2) \
             ORDER BY \"seen\" DESC NULLS LAST, \"id\" ASC LIMIT 10 OFFSET 20"
        );
        assert_eq!(stmt.params, vec![Value::from("10.0.0.1"), Value::from("frank")]);
    }

    #[test]
    fn test_array_membership_and_casts() {
        let schema = schema();
        let renderer = SqlRenderer::new(&schema, "hosts");
        let query = QueryBuilder::new()
            .filter_by_equality(FieldPath::field("tags"), Value::from("db"))
            .filter_by_equality(FieldPath::field("seen"), Value::from("2024-01-01"))
            .build();

        let stmt = renderer.count(&query).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT COUNT(*) FROM \"hosts\" WHERE \
             (EXISTS (SELECT 1 FROM jsonb_array_elements(\"tags\") AS e WHERE e #>> '{}' = $1) \
             AND \"seen\" = $2::date)"
        );
    }

    #[test]
    fn test_traversal_segments_are_escaped() {
        let schema = schema();
        let renderer = SqlRenderer::new(&schema, "hosts");
        let query = QueryBuilder::new()
            .filter_by_equality(FieldPath::parse("owner__x'y__z"), Value::Number(3.0))
            .build();

        let stmt = renderer.count(&query).unwrap();
        assert!(stmt.sql.ends_with("\"owner\"->'x''y'->>'z' = $1"));
        assert_eq!(stmt.params, vec![Value::from("3")]);
    }

    #[test]
    fn test_writes() {
        let schema = schema();
        let renderer = SqlRenderer::new(&schema, "hosts");

        let insert = renderer
            .insert(&Attributes::new().with("id", Value::Null).with("ip", "10.0.0.1"))
            .unwrap();
        assert!(insert
            .sql
            .starts_with("INSERT INTO \"hosts\" (\"ip\") VALUES ($1::text) RETURNING"));

        let update = renderer
            .update_one(
                &Value::Number(4.0),
                &Attributes::new().with("id", 9.0).with("ip", "10.0.0.9"),
            )
            .unwrap();
        assert!(update
            .sql
            .starts_with("UPDATE \"hosts\" SET \"ip\" = $1::text WHERE \"id\" = $2::double precision RETURNING"));
        assert_eq!(update.params, vec![Value::from("10.0.0.9"), Value::Number(4.0)]);

        let delete = renderer
            .delete(&[Value::Number(1.0), Value::Number(2.0)])
            .unwrap();
        assert_eq!(delete.sql, "DELETE FROM \"hosts\" WHERE \"id\" IN ($1::double precision, $2::double precision)");
    }

    #[test]
    fn test_unknown_column() {
        let schema = schema();
        let renderer = SqlRenderer::new(&schema, "hosts");
        let query = QueryBuilder::new()
            .filter_by_equality(FieldPath::field("nope"), Value::Null)
            .build();
        assert!(matches!(
            renderer.select(&query),
            Err(StoreError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
