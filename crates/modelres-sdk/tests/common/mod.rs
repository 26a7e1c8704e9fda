//! Common test utilities for SDK integration tests

#![allow(dead_code)]

use modelres_sdk::{
    Attributes, ExposedAttributes, FieldType, MemoryStore, RecordStore, Resource, ResourceBuilder,
    ResourceConfig, Schema, SchemaField, Value,
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub fn host_schema() -> Schema {
    let owner = Schema::new("Owner")
        .add_field(SchemaField::new("id", FieldType::Number))
        .add_field(SchemaField::new("name", FieldType::String));

    Schema::new("Host")
        .add_field(SchemaField::new("id", FieldType::Number))
        .add_field(SchemaField::new("ip", FieldType::String).required().unique())
        .add_field(SchemaField::new("user", FieldType::String))
        .add_field(SchemaField::new("port", FieldType::Number).with_default(22.0))
        .add_field(SchemaField::new("active", FieldType::Boolean))
        .add_field(SchemaField::new("owner", FieldType::object_with_schema(owner)))
}

fn owner(name: &str) -> Value {
    let mut map = BTreeMap::new();
    map.insert("name".to_string(), Value::from(name));
    Value::Object(map)
}

/// Six hosts with ids 1..=6
pub fn host_rows() -> Vec<Attributes> {
    [
        ("10.0.0.1", "frank", 22.0, true, "ops"),
        ("10.0.0.2", "anna", 80.0, true, "dev"),
        ("10.0.0.3", "frank", 80.0, false, "dev"),
        ("10.0.0.4", "zoe", 443.0, true, "ops"),
        ("10.0.0.5", "anna", 22.0, false, "sec"),
        ("10.0.0.6", "zoe", 80.0, false, "ops"),
    ]
    .into_iter()
    .map(|(ip, user, port, active, team)| {
        Attributes::new()
            .with("ip", ip)
            .with("user", user)
            .with("port", port)
            .with("active", active)
            .with("owner", owner(team))
    })
    .collect()
}

pub async fn host_store() -> Arc<dyn RecordStore> {
    Arc::new(
        MemoryStore::with_rows(host_schema(), host_rows())
            .await
            .expect("fixture rows are valid"),
    )
}

pub async fn host_resource(config: ResourceConfig) -> Resource {
    host_resource_with(config, ExposedAttributes::new()).await
}

pub async fn host_resource_with(config: ResourceConfig, exposed: ExposedAttributes) -> Resource {
    ResourceBuilder::new("hosts", host_store().await)
        .with_config(config)
        .with_exposed_attributes(exposed)
        .build()
        .expect("resource builds")
}

/// Primary keys of projected rows, in order
pub fn ids(rows: &[Attributes]) -> Vec<i64> {
    rows.iter()
        .filter_map(|row| row.get("id").and_then(Value::as_i64))
        .collect()
}
