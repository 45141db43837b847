//! Legacy audit listing routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::AppState;
use crate::middleware::Caller;
use valcoin_db::entities::legados;
use valcoin_db::repositories::LegadoRepository;

/// Creates the legado routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/legados/{student_id}", get(list_for_student))
}

/// Response for one audit record.
#[derive(Debug, Serialize)]
pub struct LegadoResponse {
    /// Record identifier.
    pub id: Uuid,
    /// The student the legacy was granted to.
    pub student_id: Uuid,
    /// The user who granted it.
    pub grantor_id: Uuid,
    /// The rule that triggered the grant.
    pub rule_id: Option<Uuid>,
    /// Description carried from the transfer.
    pub description: String,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

impl LegadoResponse {
    fn from_model(model: &legados::Model) -> Self {
        Self {
            id: model.id,
            student_id: model.student_id,
            grantor_id: model.grantor_id,
            rule_id: model.rule_id,
            description: model.description.clone(),
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// GET `/legados/{student_id}` - A student's audit records, newest first.
async fn list_for_student(
    State(state): State<AppState>,
    _caller: Caller,
    Path(student_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = LegadoRepository::new((*state.db).clone());

    match repo.list_for_student(student_id).await {
        Ok(rows) => {
            let items: Vec<LegadoResponse> = rows.iter().map(LegadoResponse::from_model).collect();
            (StatusCode::OK, Json(json!({ "legados": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "failed to list legados");
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
