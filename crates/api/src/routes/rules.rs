//! Rule catalog routes: listing, CRUD, applicability check, and application.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::middleware::Caller;
use crate::routes::{rule_error_response, transaction_error_response};
use crate::AppState;
use valcoin_core::rules::applicability::LimitStatus;
use valcoin_core::rules::types::{LimitPeriod, TransactionDirection, UserRole};
use valcoin_db::repositories::transaction::{ApplyRuleInput, CheckApplicabilityInput};
use valcoin_db::repositories::{CreateRuleInput, RuleRepository, TransactionRepository, UpdateRuleInput};
use valcoin_shared::AppError;
use valcoin_shared::types::parse_amount;

use super::transactions::TransactionResponse;

/// Creates the rule catalog routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rules", get(list_rules))
        .route("/rules", post(create_rule))
        .route("/rules/applicable", get(list_applicable))
        .route("/rules/{id}", put(update_rule))
        .route("/rules/{id}", delete(delete_rule))
        .route("/rules/check", post(check_applicability))
        .route("/rules/apply", post(apply_rule))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a rule.
///
/// Amounts arrive as form strings; anything non-numeric coerces to zero.
#[derive(Debug, Deserialize)]
pub struct CreateRuleRequest {
    /// Display name.
    pub name: String,
    /// Fixed transfer amount.
    pub amount: Option<String>,
    /// Direction: "DEBITO" or "CREDITO".
    pub direction: String,
    /// Allowed origin role.
    pub origin_role: String,
    /// Allowed destination role.
    pub destination_role: String,
    /// Usage ceiling per window.
    pub limit_amount: Option<String>,
    /// Window unit: nenhum/diario/semanal/mensal/anual.
    pub limit_period: Option<String>,
    /// Whether the limit is tracked per discipline.
    #[serde(default)]
    pub per_discipline: bool,
    /// Category tag.
    #[serde(default)]
    pub category: String,
    /// VAT rate reference.
    pub vat_ref: Option<String>,
    /// Minimum school year of the destination.
    pub min_year: Option<i16>,
    /// Maximum school year of the destination.
    pub max_year: Option<i16>,
    /// Icon hint for clients.
    pub icon: Option<String>,
}

/// Request body for updating a rule; omitted fields keep their value.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateRuleRequest {
    /// Display name.
    pub name: Option<String>,
    /// Fixed transfer amount.
    pub amount: Option<String>,
    /// Direction: "DEBITO" or "CREDITO".
    pub direction: Option<String>,
    /// Allowed origin role.
    pub origin_role: Option<String>,
    /// Allowed destination role.
    pub destination_role: Option<String>,
    /// Usage ceiling per window.
    pub limit_amount: Option<String>,
    /// Window unit.
    pub limit_period: Option<String>,
    /// Whether the limit is tracked per discipline.
    pub per_discipline: Option<bool>,
    /// Category tag.
    pub category: Option<String>,
    /// VAT rate reference.
    pub vat_ref: Option<String>,
    /// Minimum school year of the destination.
    pub min_year: Option<i16>,
    /// Maximum school year of the destination.
    pub max_year: Option<i16>,
    /// Icon hint for clients.
    pub icon: Option<String>,
    /// Active flag.
    pub is_active: Option<bool>,
}

/// Query parameters for the applicable-rules listing.
#[derive(Debug, Deserialize)]
pub struct ApplicableQuery {
    /// Origin user.
    pub origin_id: Uuid,
    /// Restrict to rules targeting this destination role.
    pub destination_role: Option<String>,
    /// Destination user, used for limit headroom.
    pub destination_id: Option<Uuid>,
    /// Discipline scope, used for limit headroom.
    pub discipline_id: Option<Uuid>,
}

/// Request body for the dry-run applicability check.
#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    /// The rule to check.
    pub rule_id: Uuid,
    /// Origin user.
    pub origin_id: Uuid,
    /// Destination user, when already chosen.
    pub destination_id: Option<Uuid>,
    /// Discipline scope, when any.
    pub discipline_id: Option<Uuid>,
}

/// Response body for the dry-run applicability check.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    /// True iff no hard violation was raised.
    pub can_apply: bool,
    /// Every violation found, in check order.
    pub errors: Vec<String>,
    /// Soft signals.
    pub warnings: Vec<String>,
    /// Limit headroom.
    pub limits: LimitStatus,
}

/// Request body for applying a rule.
#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    /// The rule to apply.
    pub rule_id: Uuid,
    /// Origin user.
    pub origin_id: Uuid,
    /// Destination user.
    pub destination_id: Uuid,
    /// Discipline scope, when the rule requires one.
    pub discipline_id: Option<Uuid>,
    /// Free-text description.
    pub description: String,
    /// VAT rate reference override.
    pub vat_ref: Option<String>,
}

/// Response body for a committed rule application.
#[derive(Debug, Serialize)]
pub struct ApplyResponse {
    /// The user-intent row.
    pub transaction: TransactionResponse,
    /// Generated companion rows.
    pub companions: Vec<TransactionResponse>,
}

// ============================================================================
// Parse helpers
// ============================================================================

fn parse_direction(value: &str) -> Option<TransactionDirection> {
    match value.to_uppercase().as_str() {
        "DEBITO" => Some(TransactionDirection::Debito),
        "CREDITO" => Some(TransactionDirection::Credito),
        _ => None,
    }
}

fn parse_period(value: &str) -> Option<LimitPeriod> {
    match value.to_lowercase().as_str() {
        "nenhum" => Some(LimitPeriod::Nenhum),
        "diario" => Some(LimitPeriod::Diario),
        "semanal" => Some(LimitPeriod::Semanal),
        "mensal" => Some(LimitPeriod::Mensal),
        "anual" => Some(LimitPeriod::Anual),
        _ => None,
    }
}

fn bad_request(message: &str) -> axum::response::Response {
    let error = AppError::Validation(message.to_string());
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": error.error_code(),
            "message": message
        })),
    )
        .into_response()
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/rules` - List active rules, name-sorted, cache-backed.
async fn list_rules(State(state): State<AppState>, _caller: Caller) -> impl IntoResponse {
    let repo = RuleRepository::new(
        (*state.db).clone(),
        state.rule_cache.clone(),
        state.view_cache.clone(),
    );

    match repo.list_active().await {
        Ok(rules) => (StatusCode::OK, Json(json!({ "rules": rules }))).into_response(),
        Err(e) => {
            error!(error = %e, "failed to list rules");
            rule_error_response(e)
        }
    }
}

/// GET `/rules/applicable` - Rules an origin could apply, with limit headroom.
async fn list_applicable(
    State(state): State<AppState>,
    _caller: Caller,
    Query(query): Query<ApplicableQuery>,
) -> impl IntoResponse {
    let destination_role = match query.destination_role.as_deref() {
        Some(value) => match UserRole::parse(value) {
            Some(role) => Some(role),
            None => return bad_request("Invalid destination_role"),
        },
        None => None,
    };

    let repo = RuleRepository::new(
        (*state.db).clone(),
        state.rule_cache.clone(),
        state.view_cache.clone(),
    );

    match repo
        .list_applicable(
            query.origin_id,
            destination_role,
            query.destination_id,
            query.discipline_id,
        )
        .await
    {
        Ok(rules) => (StatusCode::OK, Json(json!({ "rules": rules }))).into_response(),
        Err(e) => rule_error_response(e),
    }
}

/// POST `/rules` - Create a rule (admin only).
async fn create_rule(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateRuleRequest>,
) -> impl IntoResponse {
    if let Err(forbidden) = caller.require_admin() {
        return forbidden.into_response();
    }

    let Some(direction) = parse_direction(&request.direction) else {
        return bad_request("Invalid direction");
    };
    let Some(origin_role) = UserRole::parse(&request.origin_role) else {
        return bad_request("Invalid origin_role");
    };
    let Some(destination_role) = UserRole::parse(&request.destination_role) else {
        return bad_request("Invalid destination_role");
    };
    let limit_period = match request.limit_period.as_deref() {
        Some(value) => match parse_period(value) {
            Some(period) => period,
            None => return bad_request("Invalid limit_period"),
        },
        None => LimitPeriod::Nenhum,
    };

    let repo = RuleRepository::new(
        (*state.db).clone(),
        state.rule_cache.clone(),
        state.view_cache.clone(),
    );

    let input = CreateRuleInput {
        name: request.name,
        amount: parse_amount(request.amount.as_deref().unwrap_or_default()),
        direction,
        origin_role,
        destination_role,
        limit_amount: parse_amount(request.limit_amount.as_deref().unwrap_or_default()),
        limit_period,
        per_discipline: request.per_discipline,
        category: request.category,
        vat_ref: request.vat_ref.unwrap_or_else(|| "isento".to_string()),
        min_year: request.min_year,
        max_year: request.max_year,
        icon: request.icon,
    };

    match repo.create(input).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => rule_error_response(e),
    }
}

/// PUT `/rules/{id}` - Update a rule (admin only), preserving unset fields.
async fn update_rule(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRuleRequest>,
) -> impl IntoResponse {
    if let Err(forbidden) = caller.require_admin() {
        return forbidden.into_response();
    }

    let direction = match request.direction.as_deref() {
        Some(value) => match parse_direction(value) {
            Some(direction) => Some(direction),
            None => return bad_request("Invalid direction"),
        },
        None => None,
    };
    let origin_role = match request.origin_role.as_deref() {
        Some(value) => match UserRole::parse(value) {
            Some(role) => Some(role),
            None => return bad_request("Invalid origin_role"),
        },
        None => None,
    };
    let destination_role = match request.destination_role.as_deref() {
        Some(value) => match UserRole::parse(value) {
            Some(role) => Some(role),
            None => return bad_request("Invalid destination_role"),
        },
        None => None,
    };
    let limit_period = match request.limit_period.as_deref() {
        Some(value) => match parse_period(value) {
            Some(period) => Some(period),
            None => return bad_request("Invalid limit_period"),
        },
        None => None,
    };

    let repo = RuleRepository::new(
        (*state.db).clone(),
        state.rule_cache.clone(),
        state.view_cache.clone(),
    );

    let input = UpdateRuleInput {
        name: request.name,
        amount: request.amount.as_deref().map(parse_amount),
        direction,
        origin_role,
        destination_role,
        limit_amount: request.limit_amount.as_deref().map(parse_amount),
        limit_period,
        per_discipline: request.per_discipline,
        category: request.category,
        vat_ref: request.vat_ref,
        min_year: request.min_year,
        max_year: request.max_year,
        icon: request.icon,
        is_active: request.is_active,
    };

    match repo.update(id, input).await {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(e) => rule_error_response(e),
    }
}

/// DELETE `/rules/{id}` - Delete a rule (admin only).
async fn delete_rule(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(forbidden) = caller.require_admin() {
        return forbidden.into_response();
    }

    let repo = RuleRepository::new(
        (*state.db).clone(),
        state.rule_cache.clone(),
        state.view_cache.clone(),
    );

    match repo.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => rule_error_response(e),
    }
}

/// POST `/rules/check` - Dry-run applicability report; never mutates.
async fn check_applicability(
    State(state): State<AppState>,
    _caller: Caller,
    Json(request): Json<CheckRequest>,
) -> impl IntoResponse {
    let repo = TransactionRepository::new((*state.db).clone(), state.view_cache.clone());

    let input = CheckApplicabilityInput {
        rule_id: request.rule_id,
        origin_id: request.origin_id,
        destination_id: request.destination_id,
        discipline_id: request.discipline_id,
    };

    match repo.check_applicability(input).await {
        Ok(report) => {
            let response = CheckResponse {
                can_apply: report.can_apply,
                errors: report.errors.iter().map(ToString::to_string).collect(),
                warnings: report.warnings.iter().map(ToString::to_string).collect(),
                limits: report.limits,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => transaction_error_response(e),
    }
}

/// POST `/rules/apply` - Apply a rule atomically.
async fn apply_rule(
    State(state): State<AppState>,
    _caller: Caller,
    Json(request): Json<ApplyRequest>,
) -> impl IntoResponse {
    let repo = TransactionRepository::new((*state.db).clone(), state.view_cache.clone());

    let input = ApplyRuleInput {
        rule_id: request.rule_id,
        origin_id: request.origin_id,
        destination_id: request.destination_id,
        discipline_id: request.discipline_id,
        description: request.description,
        vat_ref: request.vat_ref,
    };

    match repo.apply_rule(input).await {
        Ok(outcome) => {
            let response = ApplyResponse {
                transaction: TransactionResponse::from_model(&outcome.primary),
                companions: outcome
                    .companions
                    .iter()
                    .map(TransactionResponse::from_model)
                    .collect(),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => transaction_error_response(e),
    }
}
