//! API route definitions.

use axum::{Json, Router, http::StatusCode, response::IntoResponse, response::Response};
use serde_json::json;
use tracing::error;

use crate::AppState;
use valcoin_db::repositories::{RuleError, TransactionError};

pub mod dashboard;
pub mod health;
pub mod legados;
pub mod rules;
pub mod settings;
pub mod transactions;
pub mod users;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(rules::routes())
        .merge(transactions::routes())
        .merge(dashboard::routes())
        .merge(settings::routes())
        .merge(legados::routes())
        .merge(users::routes())
}

/// Maps a ledger error to an HTTP response.
pub(crate) fn transaction_error_response(error: TransactionError) -> Response {
    match error {
        TransactionError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "TRANSACTION_NOT_FOUND",
                "message": format!("Transaction not found: {id}")
            })),
        )
            .into_response(),
        TransactionError::RuleNotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "RULE_NOT_FOUND",
                "message": format!("Transaction rule not found: {id}")
            })),
        )
            .into_response(),
        TransactionError::NotApplicable(violation) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": violation.error_code(),
                "message": violation.to_string()
            })),
        )
            .into_response(),
        TransactionError::State(state) => (
            StatusCode::from_u16(state.http_status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(json!({
                "error": state.error_code(),
                "message": state.to_string()
            })),
        )
            .into_response(),
        TransactionError::Validation(message) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "VALIDATION_ERROR",
                "message": message
            })),
        )
            .into_response(),
        TransactionError::Database(e) => {
            error!(error = %e, "database error");
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

/// Maps a rule catalog error to an HTTP response.
pub(crate) fn rule_error_response(error: RuleError) -> Response {
    match error {
        RuleError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "RULE_NOT_FOUND",
                "message": format!("Transaction rule not found: {id}")
            })),
        )
            .into_response(),
        RuleError::OriginNotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "ORIGIN_NOT_FOUND",
                "message": format!("Origin user not found: {id}")
            })),
        )
            .into_response(),
        RuleError::Database(e) => {
            error!(error = %e, "database error");
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
