//! API endpoint handlers
//!
//! Every resource handler resolves the resource by name, runs the
//! interceptor pipeline and then calls exactly one resource operation.

use super::extractors::{JsonExtractor, ResourceQuery};
use super::types::*;
use crate::error::ServerError;
use crate::interceptors::{Operation, RequestContext};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use modelres_sdk::{Attributes, FormDescription, QueryRequest, Resource, Value};
use std::sync::Arc;

type ApiResult<T> = Result<T, ServerError>;

/// Health check endpoint
pub(super) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        resources: state.registry.names().map(str::to_string).collect(),
    })
}

/// Look up the resource and run the interceptors
async fn prepare(
    state: &AppState,
    name: &str,
    operation: Operation,
    query: &QueryRequest,
) -> ApiResult<Arc<Resource>> {
    let resource = state.registry.get(name)?;
    state
        .interceptors
        .run(&RequestContext {
            resource: name,
            operation,
            query,
        })
        .await?;
    Ok(resource)
}

pub(super) async fn length(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ResourceQuery(query): ResourceQuery,
) -> ApiResult<Json<usize>> {
    let resource = prepare(&state, &name, Operation::Length, &query).await?;
    Ok(Json(resource.length(&query).await?))
}

pub(super) async fn list(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ResourceQuery(query): ResourceQuery,
) -> ApiResult<Json<Vec<Attributes>>> {
    let resource = prepare(&state, &name, Operation::List, &query).await?;
    Ok(Json(resource.list(&query).await?))
}

pub(super) async fn meta(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ResourceQuery(query): ResourceQuery,
) -> ApiResult<Json<FormDescription>> {
    let resource = prepare(&state, &name, Operation::Meta, &query).await?;
    Ok(Json(resource.meta()))
}

pub(super) async fn show(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ResourceQuery(query): ResourceQuery,
) -> ApiResult<Json<Vec<Attributes>>> {
    let resource = prepare(&state, &name, Operation::Show, &query).await?;
    Ok(Json(resource.show(&query).await?))
}

pub(super) async fn create(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ResourceQuery(query): ResourceQuery,
    JsonExtractor(body): JsonExtractor<serde_json::Value>,
) -> ApiResult<Json<Attributes>> {
    let resource = prepare(&state, &name, Operation::Create, &query).await?;
    Ok(Json(resource.create(&Value::from(body)).await?))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ResourceQuery(query): ResourceQuery,
    JsonExtractor(body): JsonExtractor<serde_json::Value>,
) -> ApiResult<Json<Attributes>> {
    let resource = prepare(&state, &name, Operation::Update, &query).await?;
    Ok(Json(resource.update(&query, &Value::from(body)).await?))
}

pub(super) async fn bulk_update(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ResourceQuery(query): ResourceQuery,
    JsonExtractor(body): JsonExtractor<serde_json::Value>,
) -> ApiResult<Json<Vec<Attributes>>> {
    let resource = prepare(&state, &name, Operation::BulkUpdate, &query).await?;
    Ok(Json(resource.bulk_update(&query, &Value::from(body)).await?))
}

pub(super) async fn call(
    State(state): State<AppState>,
    Path((name, endpoint)): Path<(String, String)>,
    ResourceQuery(query): ResourceQuery,
) -> ApiResult<Json<Value>> {
    let resource = prepare(&state, &name, Operation::Call, &query).await?;
    Ok(Json(resource.call(&endpoint).await?))
}

pub(super) async fn destroy(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ResourceQuery(query): ResourceQuery,
) -> ApiResult<StatusCode> {
    let resource = prepare(&state, &name, Operation::Destroy, &query).await?;
    resource.destroy(&query).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn destroy_one(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ResourceQuery(query): ResourceQuery,
) -> ApiResult<StatusCode> {
    let resource = prepare(&state, &name, Operation::DestroyOne, &query).await?;
    resource.destroy_one(&query).await?;
    Ok(StatusCode::NO_CONTENT)
}
