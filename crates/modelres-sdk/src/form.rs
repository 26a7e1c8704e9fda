//! Form description returned by the `meta` operation

use modelres_core::types::{FieldType, Schema, SchemaField, Value};
use serde::Serialize;

/// Description of a resource's form for client introspection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormDescription {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub primary_key: String,
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    /// Item type of an array field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    pub required: bool,
    pub unique: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FormDescription {
    /// Describe the form fields of `form`
    pub fn from_schema(form: &Schema) -> Self {
        Self {
            name: form.name.clone(),
            description: form.description.clone(),
            primary_key: form.primary_key.clone(),
            fields: form.form_fields().map(FormField::from).collect(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|field| field.name == name)
    }
}

impl From<&SchemaField> for FormField {
    fn from(field: &SchemaField) -> Self {
        let item_type = match &field.field_type {
            FieldType::Array { item_type } => Some(item_type.type_name().to_string()),
            _ => None,
        };
        Self {
            name: field.name.clone(),
            field_type: field.field_type.type_name().to_string(),
            item_type,
            required: field.required,
            unique: field.unique,
            description: field.description.clone(),
            default: field.default.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_key_is_not_a_form_field() {
        let schema = Schema::new("Host")
            .with_description("Inventory hosts")
            .add_field(SchemaField::new("id", FieldType::Number))
            .add_field(SchemaField::new("ip", FieldType::String).required())
            .add_field(SchemaField::new("tags", FieldType::array(FieldType::String)))
            .add_field(SchemaField::new("port", FieldType::Number).with_default(22.0));

        let form = FormDescription::from_schema(&schema);
        let names: Vec<&str> = form.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["ip", "tags", "port"]);
        assert!(form.field("ip").unwrap().required);
        assert_eq!(form.field("tags").unwrap().item_type.as_deref(), Some("string"));

        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["fields"][0]["type"], "string");
        assert_eq!(json["fields"][2]["default"], 22);
    }
}
