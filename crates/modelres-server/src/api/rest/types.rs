//! REST API type definitions

use crate::interceptors::InterceptorPipeline;
use crate::registry::ResourceRegistry;
use serde::Serialize;
use std::sync::Arc;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ResourceRegistry>,
    pub interceptors: Arc<InterceptorPipeline>,
}

impl AppState {
    pub fn new(registry: ResourceRegistry, interceptors: InterceptorPipeline) -> Self {
        Self {
            registry: Arc::new(registry),
            interceptors: Arc::new(interceptors),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Names of the served resources
    pub resources: Vec<String>,
}
