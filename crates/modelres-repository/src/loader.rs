//! Fixture loading
//!
//! Seed rows for a store come from a JSON or YAML file holding a list of
//! rows. A row is either a flat field mapping or a `{pk, fields}` entry as
//! produced by model dump tools.

use crate::error::{StoreError, StoreResult};
use modelres_core::types::{Attributes, Value};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

/// One fixture row
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FixtureRow {
    /// `{model?, pk, fields: {...}}`
    Dumped {
        pk: Value,
        fields: Attributes,
        #[serde(default)]
        model: Option<String>,
    },
    /// `{field: value, ...}` including the primary key if known
    Flat(Attributes),
}

impl FixtureRow {
    /// Flatten into attributes, storing a dumped key under `primary_key`
    pub fn into_attributes(self, primary_key: &str) -> Attributes {
        match self {
            FixtureRow::Dumped { pk, fields, .. } => {
                let mut attrs = Attributes::new();
                attrs.insert(primary_key, pk);
                attrs.merge(&fields);
                attrs
            }
            FixtureRow::Flat(attrs) => attrs,
        }
    }
}

/// Read fixture rows from a `.json`, `.yaml` or `.yml` file
pub async fn load_fixture(path: impl AsRef<Path>) -> StoreResult<Vec<FixtureRow>> {
    let path = path.as_ref();

    let rows = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&fs::read_to_string(path).await?)?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&fs::read_to_string(path).await?)?,
        _ => {
            return Err(StoreError::UnsupportedFixture {
                path: path.to_path_buf(),
            })
        }
    };

    tracing::debug!(path = %path.display(), "loaded fixture");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_shapes() {
        let rows: Vec<FixtureRow> = serde_json::from_str(
            r#"[
                {"model": "inventory.host", "pk": 4, "fields": {"ip": "10.0.0.4"}},
                {"id": 5, "ip": "10.0.0.5"}
            ]"#,
        )
        .unwrap();

        assert!(matches!(rows[0], FixtureRow::Dumped { .. }));
        assert_eq!(
            rows[0].clone().into_attributes("id"),
            Attributes::new().with("id", 4.0).with("ip", "10.0.0.4")
        );
        assert_eq!(
            rows[1].clone().into_attributes("id"),
            Attributes::new().with("id", 5.0).with("ip", "10.0.0.5")
        );
    }
}
