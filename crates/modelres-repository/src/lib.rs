//! Record storage for modelres resources
//!
//! A resource reads and writes records through the [`RecordStore`] trait.
//! Queries arrive as [`Query`] values: filter predicates, ordering keys and
//! an offset/limit slice.
//!
//! # Features
//!
//! - **Memory store**: rows held in process, seeded from JSON or YAML fixtures
//! - **PostgreSQL store**: one table per record type (`postgres` feature)
//! - **SQL rendering**: parameterized statements with JSONB traversal
//!
//! # Quick Start
//!
//! ```no_run
//! use modelres_core::types::{FieldType, Schema, SchemaField};
//! use modelres_repository::{MemoryStore, Query, RecordStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schema = Schema::new("Host")
//!         .add_field(SchemaField::new("id", FieldType::Number))
//!         .add_field(SchemaField::new("ip", FieldType::String));
//!
//!     let store = MemoryStore::from_fixture(schema, "fixtures/hosts.yaml").await?;
//!     let hosts = store.fetch(&Query::all()).await?;
//!     println!("{} hosts", hosts.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod eval;
pub mod loader;
pub mod memory;
pub mod query;
pub mod sql;
pub mod traits;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use error::{StoreError, StoreResult};
pub use loader::{load_fixture, FixtureRow};
pub use memory::MemoryStore;
pub use query::{Query, QueryBuilder};
pub use sql::{quote_ident, SqlRenderer, SqlStatement};
pub use traits::RecordStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
