//! User listing routes.
//!
//! Read-only: user accounts are managed by the identity subsystem; the
//! ledger only exposes the cached balance listing.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde_json::json;
use tracing::error;

use crate::AppState;
use crate::middleware::Caller;
use valcoin_db::repositories::{UserError, UserRepository};

/// Creates the user routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/users", get(list_users))
}

/// GET `/users` - Active users with balances, cache-backed (admin only).
async fn list_users(State(state): State<AppState>, caller: Caller) -> impl IntoResponse {
    if let Err(forbidden) = caller.require_admin() {
        return forbidden.into_response();
    }

    let repo = UserRepository::new((*state.db).clone(), state.view_cache.clone());

    match repo.list_active().await {
        Ok(users) => (StatusCode::OK, Json(json!({ "users": users }))).into_response(),
        Err(e) => {
            let message = match &e {
                UserError::Database(inner) => {
                    error!(error = %inner, "failed to list users");
                    "An error occurred"
                }
                UserError::Serialization(inner) => {
                    error!(error = %inner, "failed to serialize user listing");
                    "An error occurred"
                }
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "INTERNAL_ERROR",
                    "message": message
                })),
            )
                .into_response()
        }
    }
}
