//! Dashboard routes serving cached read-side snapshots.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::AppState;
use crate::middleware::Caller;
use valcoin_db::repositories::DashboardRepository;
use valcoin_db::repositories::dashboard::DashboardError;

/// Creates the dashboard routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/summary", get(global_summary))
        .route("/dashboard/{user_id}", get(user_snapshot))
}

/// GET `/dashboard/summary` - Global ledger summary (admin only).
async fn global_summary(State(state): State<AppState>, caller: Caller) -> impl IntoResponse {
    if let Err(forbidden) = caller.require_admin() {
        return forbidden.into_response();
    }

    let repo = DashboardRepository::new((*state.db).clone(), state.view_cache.clone());

    match repo.global_summary().await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => dashboard_error_response(e),
    }
}

/// GET `/dashboard/{user_id}` - Per-user snapshot.
async fn user_snapshot(
    State(state): State<AppState>,
    _caller: Caller,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = DashboardRepository::new((*state.db).clone(), state.view_cache.clone());

    match repo.user_snapshot(user_id).await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => dashboard_error_response(e),
    }
}

fn dashboard_error_response(error: DashboardError) -> axum::response::Response {
    match error {
        DashboardError::UserNotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "USER_NOT_FOUND",
                "message": format!("User not found: {id}")
            })),
        )
            .into_response(),
        DashboardError::Database(e) => {
            error!(error = %e, "dashboard query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "INTERNAL_ERROR",
                    "message": "An error occurred"
                })),
            )
                .into_response()
        }
        DashboardError::Serialization(e) => {
            error!(error = %e, "snapshot serialization failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "INTERNAL_ERROR",
                    "message": "An error occurred"
                })),
            )
                .into_response()
        }
    }
}
