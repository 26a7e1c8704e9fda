//! modelres HTTP server library
//!
//! REST adapter over [`modelres_sdk::Resource`], exposed for tests and reuse.

pub mod api;
pub mod config;
pub mod error;
pub mod interceptors;
pub mod registry;

pub use api::rest::AppState;
pub use api::create_router;
pub use config::{LogFormat, ResourceEntry, ServerConfig, StoreConfig};
pub use error::ServerError;
pub use interceptors::{Interceptor, InterceptorPipeline, Operation, ReadOnly, RequestContext, RequestLogger};
pub use registry::ResourceRegistry;

/// Interceptors every server runs: request logging, then the read-only
/// guard for resources configured as read-only
pub fn default_interceptors(config: &ServerConfig) -> InterceptorPipeline {
    let read_only = config
        .resources
        .iter()
        .filter(|entry| entry.read_only)
        .map(|entry| entry.name.clone());
    InterceptorPipeline::new()
        .with(RequestLogger)
        .with(ReadOnly::new(read_only))
}
