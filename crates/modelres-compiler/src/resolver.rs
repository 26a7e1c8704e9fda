//! Field-path resolution against a schema
//!
//! Used for condition terms, flat lookups and ordering keys alike.

use crate::error::{CompileError, Result};
use modelres_core::ir::FieldPath;
use modelres_core::types::{FieldType, Schema, PATH_SEPARATOR, PK_ALIAS};

/// A field path checked against a schema, with the type of its last segment
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub path: FieldPath,
    pub field_type: FieldType,
}

/// Resolves field names, `pk` aliases and `a__b` traversal paths
#[derive(Debug, Clone, Copy)]
pub struct FieldResolver<'s> {
    schema: &'s Schema,
    allow_traversal: bool,
}

#[derive(Clone, Copy)]
enum Level<'s> {
    Typed(&'s Schema),
    /// Inside an object field without a nested schema: anything goes
    Untyped,
}

impl<'s> FieldResolver<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            allow_traversal: true,
        }
    }

    /// Whether `a__b` paths into related objects are accepted
    pub fn allow_traversal(mut self, allow: bool) -> Self {
        self.allow_traversal = allow;
        self
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    pub fn resolve(&self, name: &str) -> Result<ResolvedField> {
        let unknown = || CompileError::UnknownField {
            field: name.to_string(),
        };

        let mut segments: Vec<String> = name.split(PATH_SEPARATOR).map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(unknown());
        }
        if segments.len() > 1 && !self.allow_traversal {
            return Err(unknown());
        }
        if segments[0] == PK_ALIAS {
            segments[0] = self.schema.primary_key.clone();
        }

        let mut level = Level::Typed(self.schema);
        let mut field_type = FieldType::Any;

        for (index, segment) in segments.iter().enumerate() {
            let schema = match level {
                Level::Typed(schema) => schema,
                Level::Untyped => break,
            };
            let field = schema.get_field(segment).ok_or_else(unknown)?;
            field_type = field.field_type.clone();

            if index + 1 < segments.len() {
                level = match related_schema(&field.field_type) {
                    Some(Some(nested)) => Level::Typed(nested),
                    Some(None) => {
                        field_type = FieldType::Any;
                        Level::Untyped
                    }
                    None => return Err(unknown()),
                };
            }
        }

        Ok(ResolvedField {
            path: FieldPath::from_segments(segments),
            field_type,
        })
    }
}

/// For object fields (and arrays of them), the nested schema if declared.
/// `None` for scalar fields, which cannot be traversed.
fn related_schema(field_type: &FieldType) -> Option<Option<&Schema>> {
    match field_type {
        FieldType::Object { schema } => Some(schema.as_deref()),
        FieldType::Array { item_type } => related_schema(item_type),
        FieldType::Any => Some(None),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelres_core::types::SchemaField;

    fn schema() -> Schema {
        let team = Schema::new("Team")
            .add_field(SchemaField::new("id", FieldType::Number))
            .add_field(SchemaField::new("name", FieldType::String));
        let owner = Schema::new("Owner")
            .add_field(SchemaField::new("id", FieldType::Number))
            .add_field(SchemaField::new("name", FieldType::String))
            .add_field(SchemaField::new("team", FieldType::object_with_schema(team)));

        Schema::new("Host")
            .add_field(SchemaField::new("id", FieldType::Number))
            .add_field(SchemaField::new("ip", FieldType::String))
            .add_field(SchemaField::new("owner", FieldType::object_with_schema(owner)))
            .add_field(SchemaField::new("extra", FieldType::object()))
            .add_field(SchemaField::new(
                "tags",
                FieldType::array(FieldType::String),
            ))
    }

    #[test]
    fn test_plain_field() {
        let schema = schema();
        let resolved = FieldResolver::new(&schema).resolve("ip").unwrap();
        assert_eq!(resolved.path, FieldPath::field("ip"));
        assert_eq!(resolved.field_type, FieldType::String);
    }

    #[test]
    fn test_pk_alias() {
        let schema = schema();
        let resolved = FieldResolver::new(&schema).resolve("pk").unwrap();
        assert_eq!(resolved.path, FieldPath::field("id"));
        assert_eq!(resolved.field_type, FieldType::Number);
    }

    #[test]
    fn test_nested_traversal() {
        let schema = schema();
        let resolved = FieldResolver::new(&schema)
            .resolve("owner__team__name")
            .unwrap();
        assert_eq!(resolved.path.segments(), ["owner", "team", "name"]);
        assert_eq!(resolved.field_type, FieldType::String);
    }

    #[test]
    fn test_untyped_object_accepts_any_suffix() {
        let schema = schema();
        let resolved = FieldResolver::new(&schema).resolve("extra__a__b").unwrap();
        assert_eq!(resolved.field_type, FieldType::Any);
    }

    #[test]
    fn test_unknown_paths() {
        let schema = schema();
        let resolver = FieldResolver::new(&schema);

        for name in ["nope", "ip__x", "owner__nope", "owner____name", "", "tags__x"] {
            assert_eq!(
                resolver.resolve(name),
                Err(CompileError::UnknownField {
                    field: name.to_string()
                }),
                "{:?} should not resolve",
                name
            );
        }
    }

    #[test]
    fn test_traversal_can_be_disabled() {
        let schema = schema();
        let resolver = FieldResolver::new(&schema).allow_traversal(false);
        assert!(resolver.resolve("owner__name").is_err());
        assert!(resolver.resolve("owner").is_ok());
    }
}
