//! REST API implementation
//!
//! - types: application state and response types
//! - extractors: query and JSON body extractors
//! - handlers: one handler per resource operation
//! - router: route table and layers

mod extractors;
mod handlers;
mod router;
pub mod types;

// Re-export public API
pub use extractors::{JsonExtractor, ResourceQuery, FORMAT};
pub use router::create_router;
pub use types::{AppState, HealthResponse};
