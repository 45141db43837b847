//! Settings routes (admin only).

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::error;

use crate::AppState;
use crate::middleware::Caller;
use valcoin_db::repositories::{SettingsError, SettingsRepository};

/// Creates the settings routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/settings", put(update_settings))
}

/// GET `/settings` - Every setting as a key → value map.
async fn get_settings(State(state): State<AppState>, caller: Caller) -> impl IntoResponse {
    if let Err(forbidden) = caller.require_admin() {
        return forbidden.into_response();
    }

    let repo = SettingsRepository::new((*state.db).clone(), state.view_cache.clone());

    match repo.get_all().await {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(e) => settings_error_response(e),
    }
}

/// PUT `/settings` - Upsert a batch of settings transactionally.
async fn update_settings(
    State(state): State<AppState>,
    caller: Caller,
    Json(entries): Json<HashMap<String, Value>>,
) -> impl IntoResponse {
    if let Err(forbidden) = caller.require_admin() {
        return forbidden.into_response();
    }

    let repo = SettingsRepository::new((*state.db).clone(), state.view_cache.clone());

    match repo.upsert_many(entries.clone()).await {
        Ok(()) => (StatusCode::OK, Json(entries)).into_response(),
        Err(e) => settings_error_response(e),
    }
}

fn settings_error_response(error: SettingsError) -> axum::response::Response {
    let SettingsError::Database(e) = error;
    error!(error = %e, "settings operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "INTERNAL_ERROR",
            "message": "An error occurred"
        })),
    )
        .into_response()
}
