//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for the rule catalog and the ledger
//! - The pre-authenticated caller identity extractor
//! - Response types

pub mod middleware;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use valcoin_db::{RuleCache, ViewCache};

/// Application state shared across handlers.
///
/// The cache handles are constructed once at process start and injected
/// here; repositories clone them per request.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Rule catalog cache.
    pub rule_cache: RuleCache,
    /// View snapshot cache.
    pub view_cache: ViewCache,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .merge(routes::health::routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
