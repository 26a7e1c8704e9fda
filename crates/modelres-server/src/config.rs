//! Server configuration

use modelres_core::types::Schema;
use modelres_sdk::ResourceConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Backing store for one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// In-memory store, optionally seeded from a JSON or YAML fixture
    Memory {
        #[serde(default)]
        fixture: Option<PathBuf>,
    },
    /// PostgreSQL table whose columns match the schema
    Postgres {
        /// Database connection URL
        url: String,
        /// Table name
        table: String,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Memory { fixture: None }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// One resource served under `/resources/{name}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEntry {
    /// Path segment the resource is served under
    pub name: String,

    /// Record schema
    pub schema: Schema,

    /// Ordering, pagination and projection policy
    #[serde(default)]
    pub config: ResourceConfig,

    #[serde(default)]
    pub store: StoreConfig,

    /// Reject create, update and delete requests
    #[serde(default)]
    pub read_only: bool,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,

    /// Server port (HTTP)
    pub port: u16,

    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,

    pub log_format: LogFormat,

    /// Served resources
    pub resources: Vec<ResourceEntry>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            resources: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and config file
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if exists
        dotenvy::dotenv().ok();
        Self::load_from("config/server")
    }

    /// Load configuration from `path` (extension optional) and `MODELRES_`
    /// environment variables
    pub fn load_from(path: &str) -> anyhow::Result<Self> {
        let config_result = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("MODELRES").try_parsing(true))
            .build();

        match config_result {
            Ok(cfg) => cfg
                .try_deserialize()
                .map_err(|e| anyhow::anyhow!("Failed to deserialize config: {}", e)),
            Err(e) => {
                tracing::info!("No usable config file ({}), using default configuration", e);
                Ok(Self::default())
            }
        }
    }

    /// Listen address, `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check that resource names are unique and usable as path segments
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut seen = std::collections::HashSet::new();
        for entry in &self.resources {
            if entry.name.is_empty() || entry.name.contains('/') {
                anyhow::bail!("Invalid resource name '{}'", entry.name);
            }
            if !seen.insert(entry.name.as_str()) {
                anyhow::bail!("Resource '{}' is configured twice", entry.name);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.resources.is_empty());
        assert_eq!(config.address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_store_config_default() {
        assert_eq!(StoreConfig::default(), StoreConfig::Memory { fixture: None });
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let entry = ResourceEntry {
            name: "hosts".to_string(),
            schema: Schema::new("Host"),
            config: ResourceConfig::default(),
            store: StoreConfig::default(),
            read_only: false,
        };
        let mut config = ServerConfig {
            resources: vec![entry.clone(), entry.clone()],
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());

        config.resources.pop();
        assert!(config.validate().is_ok());

        config.resources[0].name = "a/b".to_string();
        assert!(config.validate().is_err());
    }
}
