//! Transaction routes: listing, manual creation, editing, and the
//! approve/reject workflow.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::AppState;
use crate::middleware::Caller;
use crate::routes::transaction_error_response;
use valcoin_db::entities::sea_orm_active_enums::{OriginKind, TransactionDirection, TransactionStatus};
use valcoin_db::entities::transactions;
use valcoin_db::repositories::transaction::{
    ManualTransactionInput, TimeFilter, TransactionFilter, UpdateTransactionInput,
};
use valcoin_db::repositories::TransactionRepository;
use valcoin_shared::types::parse_amount;

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions))
        .route("/transactions", post(create_transaction))
        .route("/transactions/{id}", get(get_transaction))
        .route("/transactions/{id}", put(update_transaction))
        .route("/transactions/{id}", delete(delete_transaction))
        .route("/transactions/{id}/approve", post(approve_transaction))
        .route("/transactions/{id}/reject", post(reject_transaction))
        .route("/transactions/group/{group_id}", get(get_group))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing transactions.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Named shortcut: today | week | month.
    pub filter: Option<String>,
    /// Explicit range start (RFC 3339).
    pub from: Option<DateTime<Utc>>,
    /// Explicit range end (RFC 3339).
    pub to: Option<DateTime<Utc>>,
}

/// Request body for a manual transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Origin user.
    pub origin_id: Uuid,
    /// Destination user.
    pub destination_id: Uuid,
    /// Transfer amount as a form string.
    pub amount: String,
    /// Free-text description.
    pub description: String,
    /// VAT rate reference.
    pub vat_ref: Option<String>,
    /// Create already approved instead of pending.
    #[serde(default)]
    pub approve: bool,
}

/// Request body for editing a pending transaction.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateTransactionRequest {
    /// Transfer amount as a form string.
    pub amount: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// VAT rate reference.
    pub vat_ref: Option<String>,
}

/// Request body for rejecting a transaction.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    /// Reason recorded on the row.
    pub reason: String,
}

/// Response for a raw transaction row.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Row identifier.
    pub id: Uuid,
    /// Group correlating companions.
    pub group_id: Uuid,
    /// Origin user.
    pub origin_id: Uuid,
    /// Destination user.
    pub destination_id: Uuid,
    /// Transfer amount.
    pub amount: String,
    /// Direction wire value.
    pub direction: String,
    /// Status wire value.
    pub status: String,
    /// Provenance wire value.
    pub origin_kind: String,
    /// Free-text description.
    pub description: String,
    /// Rejection reason, when rejected.
    pub rejection_reason: Option<String>,
    /// VAT rate reference.
    pub vat_ref: String,
    /// Originating rule.
    pub rule_id: Option<Uuid>,
    /// Discipline scope.
    pub discipline_id: Option<Uuid>,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

impl TransactionResponse {
    /// Maps an entity row to the wire representation.
    pub(crate) fn from_model(model: &transactions::Model) -> Self {
        Self {
            id: model.id,
            group_id: model.group_id,
            origin_id: model.origin_id,
            destination_id: model.destination_id,
            amount: model.amount.to_string(),
            direction: direction_to_string(&model.direction),
            status: status_to_string(&model.status),
            origin_kind: kind_to_string(&model.origin_kind),
            description: model.description.clone(),
            rejection_reason: model.rejection_reason.clone(),
            vat_ref: model.vat_ref.clone(),
            rule_id: model.rule_id,
            discipline_id: model.discipline_id,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

fn direction_to_string(direction: &TransactionDirection) -> String {
    match direction {
        TransactionDirection::Debito => "DEBITO",
        TransactionDirection::Credito => "CREDITO",
    }
    .to_string()
}

fn status_to_string(status: &TransactionStatus) -> String {
    match status {
        TransactionStatus::Pendente => "PENDENTE",
        TransactionStatus::Aprovada => "APROVADA",
        TransactionStatus::Rejeitada => "REJEITADA",
    }
    .to_string()
}

fn kind_to_string(kind: &OriginKind) -> String {
    match kind {
        OriginKind::User => "USER",
        OriginKind::VatSettlement => "VAT_SETTLEMENT",
        OriginKind::Counterparty => "COUNTERPARTY",
    }
    .to_string()
}

fn parse_time_filter(value: &str) -> Option<TimeFilter> {
    match value {
        "today" => Some(TimeFilter::Today),
        "week" => Some(TimeFilter::ThisWeek),
        "month" => Some(TimeFilter::ThisMonth),
        _ => None,
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/transactions` - Enriched listing, system companion rows excluded.
async fn list_transactions(
    State(state): State<AppState>,
    _caller: Caller,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let time = match query.filter.as_deref() {
        Some(value) => match parse_time_filter(value) {
            Some(filter) => Some(filter),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "VALIDATION_ERROR",
                        "message": "filter must be one of today, week, month"
                    })),
                )
                    .into_response();
            }
        },
        None => None,
    };

    let repo = TransactionRepository::new((*state.db).clone(), state.view_cache.clone());
    let filter = TransactionFilter {
        time,
        from: query.from,
        to: query.to,
        include_system: false,
    };

    match repo.list(filter).await {
        Ok(rows) => (StatusCode::OK, Json(json!({ "transactions": rows }))).into_response(),
        Err(e) => transaction_error_response(e),
    }
}

/// GET `/transactions/{id}` - One enriched row.
async fn get_transaction(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = TransactionRepository::new((*state.db).clone(), state.view_cache.clone());

    match repo.get(id).await {
        Ok(row) => (StatusCode::OK, Json(row)).into_response(),
        Err(e) => transaction_error_response(e),
    }
}

/// GET `/transactions/group/{group_id}` - Reconciliation view of one group,
/// system companions included.
async fn get_group(
    State(state): State<AppState>,
    _caller: Caller,
    Path(group_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = TransactionRepository::new((*state.db).clone(), state.view_cache.clone());

    match repo.list_by_group(group_id).await {
        Ok(rows) => (StatusCode::OK, Json(json!({ "transactions": rows }))).into_response(),
        Err(e) => transaction_error_response(e),
    }
}

/// POST `/transactions` - Manual transaction, pending unless `approve` set.
async fn create_transaction(
    State(state): State<AppState>,
    _caller: Caller,
    Json(request): Json<CreateTransactionRequest>,
) -> impl IntoResponse {
    let repo = TransactionRepository::new((*state.db).clone(), state.view_cache.clone());

    let input = ManualTransactionInput {
        origin_id: request.origin_id,
        destination_id: request.destination_id,
        amount: parse_amount(&request.amount),
        description: request.description,
        vat_ref: request.vat_ref,
        approve: request.approve,
    };

    match repo.create_manual(input).await {
        Ok(outcome) => {
            let body = json!({
                "transaction": TransactionResponse::from_model(&outcome.primary),
                "companions": outcome
                    .companions
                    .iter()
                    .map(TransactionResponse::from_model)
                    .collect::<Vec<_>>(),
            });
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(e) => transaction_error_response(e),
    }
}

/// PUT `/transactions/{id}` - Edit a pending, user-originated row.
async fn update_transaction(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTransactionRequest>,
) -> impl IntoResponse {
    let repo = TransactionRepository::new((*state.db).clone(), state.view_cache.clone());

    let input = UpdateTransactionInput {
        amount: request.amount.as_deref().map(parse_amount),
        description: request.description,
        vat_ref: request.vat_ref,
    };

    match repo.update_manual(id, input).await {
        Ok(updated) => {
            (StatusCode::OK, Json(TransactionResponse::from_model(&updated))).into_response()
        }
        Err(e) => transaction_error_response(e),
    }
}

/// DELETE `/transactions/{id}` - Delete a pending, user-originated row.
async fn delete_transaction(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = TransactionRepository::new((*state.db).clone(), state.view_cache.clone());

    match repo.delete_manual(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => transaction_error_response(e),
    }
}

/// POST `/transactions/{id}/approve` - Apply balances exactly once.
async fn approve_transaction(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = TransactionRepository::new((*state.db).clone(), state.view_cache.clone());

    match repo.approve(id).await {
        Ok(outcome) => {
            let body = json!({
                "transaction": TransactionResponse::from_model(&outcome.primary),
                "companions": outcome
                    .companions
                    .iter()
                    .map(TransactionResponse::from_model)
                    .collect::<Vec<_>>(),
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => transaction_error_response(e),
    }
}

/// POST `/transactions/{id}/reject` - Terminal rejection with a reason.
async fn reject_transaction(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectRequest>,
) -> impl IntoResponse {
    let repo = TransactionRepository::new((*state.db).clone(), state.view_cache.clone());

    match repo.reject(id, request.reason).await {
        Ok(rejected) => {
            (StatusCode::OK, Json(TransactionResponse::from_model(&rejected))).into_response()
        }
        Err(e) => transaction_error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_filter() {
        assert_eq!(parse_time_filter("today"), Some(TimeFilter::Today));
        assert_eq!(parse_time_filter("week"), Some(TimeFilter::ThisWeek));
        assert_eq!(parse_time_filter("month"), Some(TimeFilter::ThisMonth));
        assert_eq!(parse_time_filter("year"), None);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(status_to_string(&TransactionStatus::Pendente), "PENDENTE");
        assert_eq!(
            kind_to_string(&OriginKind::VatSettlement),
            "VAT_SETTLEMENT"
        );
        assert_eq!(direction_to_string(&TransactionDirection::Debito), "DEBITO");
    }
}
