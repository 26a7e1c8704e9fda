//! modelres SDK
//!
//! A generic model resource over a [`RecordStore`]: condition-language
//! filtering, flat lookups, ordering and pagination policy, projection with
//! computed attributes, class-level endpoints, and create/update/delete
//! dispatch.

pub mod builder;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod form;
pub mod ordering;
pub mod projection;
pub mod request;
pub mod resource;

// Re-export main types
pub use builder::ResourceBuilder;
pub use config::ResourceConfig;
pub use endpoints::{ClassEndpoint, ClassEndpoints};
pub use error::{ErrorBody, FieldErrors, ResourceError, Result, StatusCategory};
pub use form::{FormDescription, FormField};
pub use ordering::{validate_ordering, Pagination};
pub use projection::{ExposedAttribute, ExposedAttributes, Projector};
pub use request::QueryRequest;
pub use resource::{NoContent, Resource};

// Re-export commonly used types from dependencies
pub use modelres_core::types::{Attributes, FieldType, Record, Schema, SchemaField, Value};
pub use modelres_repository::{MemoryStore, RecordStore};
