//! Interceptor pipeline
//!
//! Interceptors run in registration order before every resource operation.
//! The first one to return an error stops the request.

use crate::error::ServerError;
use async_trait::async_trait;
use modelres_sdk::QueryRequest;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Resource operation a request is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Length,
    List,
    Meta,
    Show,
    Create,
    Update,
    BulkUpdate,
    Destroy,
    DestroyOne,
    Call,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Length => "length",
            Operation::List => "list",
            Operation::Meta => "meta",
            Operation::Show => "show",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::BulkUpdate => "bulk_update",
            Operation::Destroy => "destroy",
            Operation::DestroyOne => "destroy_one",
            Operation::Call => "call",
        }
    }

    /// Whether the operation writes to the store
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Operation::Create
                | Operation::Update
                | Operation::BulkUpdate
                | Operation::Destroy
                | Operation::DestroyOne
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an interceptor sees of a request
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub resource: &'a str,
    pub operation: Operation,
    pub query: &'a QueryRequest,
}

/// A check or side effect run before a resource operation
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Inspect the request; an error rejects it
    async fn before(&self, ctx: &RequestContext<'_>) -> Result<(), ServerError>;
}

/// Ordered list of interceptors
#[derive(Clone, Default)]
pub struct InterceptorPipeline {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor; it runs after the ones already added
    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Run every interceptor in order, stopping at the first rejection
    pub async fn run(&self, ctx: &RequestContext<'_>) -> Result<(), ServerError> {
        for interceptor in &self.interceptors {
            if let Err(err) = interceptor.before(ctx).await {
                info!(
                    interceptor = interceptor.name(),
                    resource = ctx.resource,
                    operation = %ctx.operation,
                    error = %err,
                    "request rejected"
                );
                return Err(err);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for InterceptorPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.interceptors.iter().map(|i| i.name()))
            .finish()
    }
}

/// Logs every dispatched operation
pub struct RequestLogger;

#[async_trait]
impl Interceptor for RequestLogger {
    fn name(&self) -> &str {
        "request_logger"
    }

    async fn before(&self, ctx: &RequestContext<'_>) -> Result<(), ServerError> {
        info!(
            resource = ctx.resource,
            operation = %ctx.operation,
            pks = ctx.query.pks.len(),
            lookups = ctx.query.lookups.len(),
            conditions = ctx.query.condition_text().is_some(),
            "dispatching request"
        );
        Ok(())
    }
}

/// Rejects mutations on the named resources
pub struct ReadOnly {
    resources: HashSet<String>,
}

impl ReadOnly {
    pub fn new<I, S>(resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            resources: resources.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl Interceptor for ReadOnly {
    fn name(&self) -> &str {
        "read_only"
    }

    async fn before(&self, ctx: &RequestContext<'_>) -> Result<(), ServerError> {
        if ctx.operation.is_mutation() && self.resources.contains(ctx.resource) {
            return Err(ServerError::Forbidden(format!(
                "Resource '{}' is read-only ({} not allowed)",
                ctx.resource, ctx.operation
            )));
        }
        Ok(())
    }
}
