//! Query building
//!
//! A [`QueryBuilder`] collects filter, ordering and slice intents. Nothing
//! touches the store until the built [`Query`] is handed to a
//! [`RecordStore`](crate::RecordStore), which evaluates it once.

use modelres_core::ir::{Equality, FieldPath, OrderKey, Predicate};
use modelres_core::Value;

/// An immutable, fully specified query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Filters, combined with AND
    pub filters: Vec<Predicate>,
    /// Ordering keys applied in sequence; empty means natural (pk) order
    pub ordering: Vec<OrderKey>,
    /// Rows skipped before the first returned row
    pub offset: usize,
    /// Maximum rows returned; `None` means no limit
    pub limit: Option<usize>,
}

impl Query {
    /// A query matching every record in natural order
    pub fn all() -> Self {
        Self::default()
    }

    /// The combined filter, left-folding the filters with AND
    pub fn predicate(&self) -> Option<Predicate> {
        self.filters.iter().cloned().reduce(Predicate::and)
    }

    /// Root fields referenced by filters and ordering, in first-use order
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        let filter_paths = self
            .filters
            .iter()
            .flat_map(|p| p.equalities())
            .map(|eq| &eq.field);
        let order_paths = self.ordering.iter().map(|key| &key.field);

        for path in filter_paths.chain(order_paths) {
            if !fields.contains(&path.root()) {
                fields.push(path.root());
            }
        }
        fields
    }
}

/// Builder accumulating query intents
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep records whose `field` equals `value`
    pub fn filter_by_equality(mut self, field: FieldPath, value: Value) -> Self {
        self.query
            .filters
            .push(Predicate::Equality(Equality::new(field, value)));
        self
    }

    /// Keep records matching a compiled predicate
    pub fn filter_by_predicate(mut self, predicate: Predicate) -> Self {
        self.query.filters.push(predicate);
        self
    }

    /// Replace the ordering
    pub fn order_by(mut self, keys: Vec<OrderKey>) -> Self {
        self.query.ordering = keys;
        self
    }

    /// Return at most `limit` rows starting at `offset`
    pub fn slice(mut self, offset: usize, limit: usize) -> Self {
        self.query.offset = offset;
        self.query.limit = Some(limit);
        self
    }

    pub fn build(self) -> Query {
        self.query
    }
}
