//! Class-level endpoints
//!
//! Named computations over a whole resource rather than one record, each
//! served as its own read-only route. Only endpoints registered here can be
//! reached by name.

use async_trait::async_trait;
use modelres_core::types::{Record, Value};
use modelres_repository::{Query, RecordStore};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A named computation over a resource's store
#[async_trait]
pub trait ClassEndpoint: Send + Sync {
    async fn call(&self, store: &dyn RecordStore) -> Result<Value, String>;
}

/// Plain functions receive every stored record in key order
#[async_trait]
impl<F> ClassEndpoint for F
where
    F: Fn(&[Record]) -> Result<Value, String> + Send + Sync,
{
    async fn call(&self, store: &dyn RecordStore) -> Result<Value, String> {
        let records = store
            .fetch(&Query::all())
            .await
            .map_err(|err| err.to_string())?;
        self(&records)
    }
}

/// Registry of class-level endpoints by name
#[derive(Clone, Default)]
pub struct ClassEndpoints {
    endpoints: BTreeMap<String, Arc<dyn ClassEndpoint>>,
}

impl ClassEndpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint, replacing any previous one with the same name
    pub fn register(
        mut self,
        name: impl Into<String>,
        endpoint: impl ClassEndpoint + 'static,
    ) -> Self {
        self.endpoints.insert(name.into(), Arc::new(endpoint));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ClassEndpoint>> {
        self.endpoints.get(name).cloned()
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl fmt::Debug for ClassEndpoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassEndpoints")
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
