//! Resource registry and store loading

use crate::config::{ResourceEntry, ServerConfig, StoreConfig};
use crate::error::ServerError;
use anyhow::Result;
use modelres_repository::{MemoryStore, RecordStore};
use modelres_sdk::{Resource, ResourceBuilder};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Resources by name
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    resources: BTreeMap<String, Arc<Resource>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource under its own name
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.insert(resource);
        self
    }

    pub fn insert(&mut self, resource: Resource) {
        let name = resource.name().to_string();
        if self.resources.insert(name.clone(), Arc::new(resource)).is_some() {
            warn!(resource = %name, "replaced existing resource");
        }
    }

    pub fn get(&self, name: &str) -> Result<Arc<Resource>, ServerError> {
        self.resources
            .get(name)
            .cloned()
            .ok_or_else(|| ServerError::UnknownResource(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Build every configured resource
    pub async fn from_config(config: &ServerConfig) -> Result<Self> {
        config.validate()?;

        let mut registry = Self::new();
        for entry in &config.resources {
            let store = load_store(entry).await?;
            let resource = ResourceBuilder::new(entry.name.clone(), store)
                .with_config(entry.config.clone())
                .build()
                .map_err(|e| anyhow::anyhow!("Failed to build resource '{}': {}", entry.name, e))?;
            registry.insert(resource);
        }
        Ok(registry)
    }
}

/// Create the store backing one resource
pub async fn load_store(entry: &ResourceEntry) -> Result<Arc<dyn RecordStore>> {
    let schema = entry.schema.clone();
    let store: Arc<dyn RecordStore> = match &entry.store {
        StoreConfig::Memory { fixture: Some(path) } => {
            info!(resource = %entry.name, fixture = ?path, "loading memory store from fixture");
            Arc::new(MemoryStore::from_fixture(schema, path).await.map_err(|e| {
                anyhow::anyhow!("Failed to load fixture {:?} for '{}': {}", path, entry.name, e)
            })?)
        }
        StoreConfig::Memory { fixture: None } => {
            info!(resource = %entry.name, "using empty memory store");
            Arc::new(MemoryStore::new(schema))
        }
        StoreConfig::Postgres { url, table } => {
            #[cfg(feature = "postgres")]
            {
                use modelres_repository::PostgresStore;
                info!(resource = %entry.name, table = %table, "connecting to PostgreSQL");
                Arc::new(PostgresStore::new(url, schema, table.clone()).await.map_err(|e| {
                    anyhow::anyhow!("Failed to connect store for '{}': {}", entry.name, e)
                })?)
            }
            #[cfg(not(feature = "postgres"))]
            {
                let _ = (url, table, schema);
                warn!(resource = %entry.name, "PostgreSQL store feature not enabled");
                return Err(anyhow::anyhow!(
                    "Enable the 'postgres' feature to serve '{}' from PostgreSQL",
                    entry.name
                ));
            }
        }
    };
    Ok(store)
}
