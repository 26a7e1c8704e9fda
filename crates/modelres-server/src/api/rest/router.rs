//! Router creation and configuration

use super::handlers::*;
use super::types::AppState;
use axum::{
    routing::{get, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create REST API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/resources/:name",
            get(show).post(create).put(update).delete(destroy),
        )
        .route("/resources/:name/length", get(length))
        .route("/resources/:name/list", get(list))
        .route("/resources/:name/form", get(meta))
        .route("/resources/:name/bulk", put(bulk_update))
        .route("/resources/:name/object", axum::routing::delete(destroy_one))
        .route("/resources/:name/call/:endpoint", get(call))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
