//! Rule catalog repository.
//!
//! Serves `TransactionRule` definitions with a TTL'd cache in front of the
//! table; every mutation persists first, then unconditionally invalidates
//! the rule cache and the global view snapshots.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder,
};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;
use valcoin_core::rules::applicability::LimitStatus;
use valcoin_core::rules::types::{LimitPeriod, TransactionDirection, TransactionRule, UserRole};

use super::{convert, usage};
use crate::cache::{RuleCache, ViewCache};
use crate::entities::{transaction_rules, users};

/// Error types for rule catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Rule not found.
    #[error("Transaction rule not found: {0}")]
    NotFound(Uuid),

    /// Origin user not found.
    #[error("Origin user not found: {0}")]
    OriginNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a rule.
#[derive(Debug, Clone)]
pub struct CreateRuleInput {
    /// Display name.
    pub name: String,
    /// Fixed transfer amount.
    pub amount: Decimal,
    /// Transfer direction.
    pub direction: TransactionDirection,
    /// Allowed origin role.
    pub origin_role: UserRole,
    /// Allowed destination role.
    pub destination_role: UserRole,
    /// Usage ceiling per window; `0` disables the limit.
    pub limit_amount: Decimal,
    /// Window unit for the ceiling.
    pub limit_period: LimitPeriod,
    /// Whether the limit is tracked per discipline.
    pub per_discipline: bool,
    /// Category tag.
    pub category: String,
    /// VAT rate reference.
    pub vat_ref: String,
    /// Minimum school year of the destination.
    pub min_year: Option<i16>,
    /// Maximum school year of the destination.
    pub max_year: Option<i16>,
    /// Icon hint for clients.
    pub icon: Option<String>,
}

/// Input for updating a rule; unset fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct UpdateRuleInput {
    /// Display name.
    pub name: Option<String>,
    /// Fixed transfer amount.
    pub amount: Option<Decimal>,
    /// Transfer direction.
    pub direction: Option<TransactionDirection>,
    /// Allowed origin role.
    pub origin_role: Option<UserRole>,
    /// Allowed destination role.
    pub destination_role: Option<UserRole>,
    /// Usage ceiling per window.
    pub limit_amount: Option<Decimal>,
    /// Window unit for the ceiling.
    pub limit_period: Option<LimitPeriod>,
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

/// A rule annotated with its current limit headroom for an origin.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicableRule {
    /// The rule definition.
    pub rule: TransactionRule,
    /// Whether the limit alone would still admit one application.
    pub can_apply: bool,
    /// Current limit headroom.
    pub limits: LimitStatus,
}

/// Rule catalog repository.
#[derive(Clone)]
pub struct RuleRepository {
    db: DatabaseConnection,
    rules: RuleCache,
    views: ViewCache,
}

impl RuleRepository {
    /// Creates a new rule repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, rules: RuleCache, views: ViewCache) -> Self {
        Self { db, rules, views }
    }

    /// Lists active rules ordered by name, served from cache when present.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails on a cache miss.
    pub async fn list_active(&self) -> Result<Vec<TransactionRule>, RuleError> {
        if let Some(cached) = self.rules.get() {
            debug!("serving transaction rules from cache");
            return Ok(cached.as_ref().clone());
        }

        debug!("rule cache miss, loading from database");
        let rows = transaction_rules::Entity::find()
            .filter(transaction_rules::Column::IsActive.eq(true))
            .order_by_asc(transaction_rules::Column::Name)
            .all(&self.db)
            .await?;

        let rules: Vec<TransactionRule> = rows.iter().map(convert::rule_to_core).collect();
        self.rules.set(rules.clone());

        Ok(rules)
    }

    /// Fetches a rule by id.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::NotFound`] for an unknown id.
    pub async fn get(&self, id: Uuid) -> Result<TransactionRule, RuleError> {
        let model = self.get_model(id).await?;
        Ok(convert::rule_to_core(&model))
    }

    async fn get_model(&self, id: Uuid) -> Result<transaction_rules::Model, RuleError> {
        transaction_rules::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(RuleError::NotFound(id))
    }

    /// Creates a rule, then invalidates the caches.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, input: CreateRuleInput) -> Result<TransactionRule, RuleError> {
        let now = Utc::now().into();
        let model = transaction_rules::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(input.name),
            amount: Set(input.amount),
            direction: Set(convert::direction_from_core(input.direction)),
            origin_role: Set(convert::role_from_core(input.origin_role)),
            destination_role: Set(convert::role_from_core(input.destination_role)),
            limit_amount: Set(input.limit_amount),
            limit_period: Set(convert::period_from_core(input.limit_period)),
            per_discipline: Set(input.per_discipline),
            category: Set(input.category),
            vat_ref: Set(input.vat_ref),
            min_year: Set(input.min_year),
            max_year: Set(input.max_year),
            icon: Set(input.icon),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(&self.db).await?;
        info!(rule_id = %created.id, name = %created.name, "transaction rule created");
        self.invalidate_caches();

        Ok(convert::rule_to_core(&created))
    }

    /// Updates a rule, preserving unset optional fields, then invalidates
    /// the caches.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::NotFound`] for an unknown id.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateRuleInput,
    ) -> Result<TransactionRule, RuleError> {
        let existing = self.get_model(id).await?;

        let mut active: transaction_rules::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(direction) = input.direction {
            active.direction = Set(convert::direction_from_core(direction));
        }
        if let Some(role) = input.origin_role {
            active.origin_role = Set(convert::role_from_core(role));
        }
        if let Some(role) = input.destination_role {
            active.destination_role = Set(convert::role_from_core(role));
        }
        if let Some(limit) = input.limit_amount {
            active.limit_amount = Set(limit);
        }
        if let Some(period) = input.limit_period {
            active.limit_period = Set(convert::period_from_core(period));
        }
        if let Some(per_discipline) = input.per_discipline {
            active.per_discipline = Set(per_discipline);
        }
        if let Some(category) = input.category {
            active.category = Set(category);
        }
        if let Some(vat_ref) = input.vat_ref {
            active.vat_ref = Set(vat_ref);
        }
        if let Some(min_year) = input.min_year {
            active.min_year = Set(Some(min_year));
        }
        if let Some(max_year) = input.max_year {
            active.max_year = Set(Some(max_year));
        }
        if let Some(icon) = input.icon {
            active.icon = Set(Some(icon));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&self.db).await?;
        info!(rule_id = %updated.id, "transaction rule updated");
        self.invalidate_caches();

        Ok(convert::rule_to_core(&updated))
    }

    /// Deletes a rule, then invalidates the caches.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::NotFound`] for an unknown id.
    pub async fn delete(&self, id: Uuid) -> Result<(), RuleError> {
        let result = transaction_rules::Entity::delete_by_id(id)
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(RuleError::NotFound(id));
        }

        info!(rule_id = %id, "transaction rule deleted");
        self.invalidate_caches();
        Ok(())
    }

    /// Lists the rules an origin user could currently apply, each annotated
    /// with its limit headroom.
    ///
    /// Only the origin role and the period limit are evaluated here; the
    /// full check (destination role, balance, discipline) runs when a
    /// concrete application is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::OriginNotFound`] for an unknown origin.
    pub async fn list_applicable(
        &self,
        origin_id: Uuid,
        destination_role: Option<UserRole>,
        destination_id: Option<Uuid>,
        discipline_id: Option<Uuid>,
    ) -> Result<Vec<ApplicableRule>, RuleError> {
        let origin = users::Entity::find_by_id(origin_id)
            .one(&self.db)
            .await?
            .ok_or(RuleError::OriginNotFound(origin_id))?;
        let origin_role = convert::role_to_core(&origin.role);

        let mut query = transaction_rules::Entity::find()
            .filter(transaction_rules::Column::IsActive.eq(true))
            .filter(transaction_rules::Column::OriginRole.eq(convert::role_from_core(origin_role)));

        if let Some(role) = destination_role {
            query = query.filter(
                transaction_rules::Column::DestinationRole.eq(convert::role_from_core(role)),
            );
        }

        let rows = query
            .order_by_asc(transaction_rules::Column::Name)
            .all(&self.db)
            .await?;

        let now = Utc::now();
        let mut annotated = Vec::with_capacity(rows.len());
        for row in &rows {
            let rule = convert::rule_to_core(row);

            let used = match usage::key_for(&rule, origin_id, destination_id, discipline_id, now) {
                Some(key) => usage::window_usage(&self.db, &key).await?,
                None => Decimal::ZERO,
            };

            let (remaining, can_apply) = if rule.has_limit() {
                let remaining = rule.limit_amount - used;
                (remaining, remaining >= rule.amount)
            } else {
                (rule.limit_amount, true)
            };

            annotated.push(ApplicableRule {
                can_apply,
                limits: LimitStatus {
                    remaining,
                    total: rule.limit_amount,
                    period: rule.limit_period,
                },
                rule,
            });
        }

        Ok(annotated)
    }

    fn invalidate_caches(&self) {
        self.rules.invalidate();
        self.views.invalidate_for_transfer(None, None);
    }
}
