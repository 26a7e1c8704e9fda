//! Core trait definition for record stores
//!
//! Resources read and write records only through [`RecordStore`]. The
//! reference implementations are [`MemoryStore`](crate::MemoryStore) and,
//! with the `postgres` feature, `PostgresStore`.

use async_trait::async_trait;
use modelres_core::types::{Attributes, Record, Schema, Value};

use crate::query::Query;
use crate::StoreResult;

/// Storage backend for one record type
///
/// # Implementation Notes
///
/// - Natural order (no ordering keys) is primary key ascending.
/// - `update` is best effort across the matched records: a record whose
///   write fails is skipped and left out of the result.
/// - Implementations must not hold locks across calls.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` for use across async tasks.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// The record type stored here
    fn schema(&self) -> &Schema;

    /// Records matching the query's filters, ordered and sliced
    async fn fetch(&self, query: &Query) -> StoreResult<Vec<Record>>;

    /// Number of records matching the query's filters; ordering and slice
    /// are ignored
    async fn count(&self, query: &Query) -> StoreResult<usize>;

    /// Records with any of the given keys, in natural order
    async fn get_by_primary_keys(&self, pks: &[Value]) -> StoreResult<Vec<Record>>;

    /// Store a new record and return it with its primary key set
    async fn insert(&self, attributes: Attributes) -> StoreResult<Record>;

    /// Apply `changes` to every record with one of the given keys and return
    /// the records actually updated. The primary key is never changed.
    async fn update(&self, pks: &[Value], changes: &Attributes) -> StoreResult<Vec<Record>>;

    /// Delete every record with one of the given keys, returning how many
    /// were removed
    async fn delete(&self, pks: &[Value]) -> StoreResult<usize>;
}
