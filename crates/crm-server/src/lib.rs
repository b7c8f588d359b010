//! HTTP surface of the CRM activity log.
//!
//! Exposes the account activity feed, the legacy unpaginated log, and the
//! list of registered event kinds over axum, backed by the shared SQLite pool.

pub mod api;
pub mod api_activity;
pub mod config;

use axum::{routing::get, Extension, Json, Router};
use crm_db::DbPool;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/accounts/{id}/activity",
            get(api_activity::get_account_activity_handler),
        )
        .route(
            "/api/accounts/{id}/activity-log",
            get(api_activity::get_account_activity_log_handler),
        )
        .route(
            "/api/activity/kinds",
            get(api_activity::get_activity_kinds_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
