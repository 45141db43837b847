//! Ledger writer and transaction query repository.
//!
//! Every mutating operation runs inside one database transaction: the
//! applicability gate re-runs against current data, the rows are inserted,
//! balances move via arithmetic column updates, and the whole unit commits
//! or rolls back together. Cache invalidation happens after a successful
//! commit and never reverses a committed change.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use valcoin_core::ledger::enrich::{EnrichedTransaction, enrich};
use valcoin_core::ledger::{LedgerError, StatusMachine, VAT_EXEMPT_REF, rate_for, split_gross};
use valcoin_core::rules::applicability::{ApplicabilityReport, RuleContext, evaluate};
use valcoin_core::rules::error::RuleViolation;
use valcoin_core::rules::hooks::{PostCommitHook, hook_for_category};
use valcoin_core::rules::types::{LimitPeriod, TransactionRule};
use valcoin_core::rules::window_start;
use valcoin_shared::types::UserId;

use super::{convert, discipline, legado, settings, usage, user};
use crate::cache::ViewCache;
use crate::entities::sea_orm_active_enums::{OriginKind, TransactionDirection, TransactionStatus};
use crate::entities::{transaction_rules, transactions};

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    NotFound(Uuid),

    /// Rule not found.
    #[error("Transaction rule not found: {0}")]
    RuleNotFound(Uuid),

    /// The applicability gate rejected the request.
    #[error(transparent)]
    NotApplicable(#[from] RuleViolation),

    /// Status machine or integrity violation.
    #[error(transparent)]
    State(#[from] LedgerError),

    /// Manual transaction input failed validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for applying a rule.
#[derive(Debug, Clone)]
pub struct ApplyRuleInput {
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
    /// VAT rate reference override; defaults to the rule's reference.
    pub vat_ref: Option<String>,
}

/// Input for the dry-run applicability check.
#[derive(Debug, Clone)]
pub struct CheckApplicabilityInput {
    /// The rule to check.
    pub rule_id: Uuid,
    /// Origin user.
    pub origin_id: Uuid,
    /// Destination user, when already chosen.
    pub destination_id: Option<Uuid>,
    /// Discipline scope, when any.
    pub discipline_id: Option<Uuid>,
}

/// Input for a manual (rule-less) transaction.
#[derive(Debug, Clone)]
pub struct ManualTransactionInput {
    /// Origin user.
    pub origin_id: Uuid,
    /// Destination user.
    pub destination_id: Uuid,
    /// Transfer amount.
    pub amount: Decimal,
    /// Free-text description.
    pub description: String,
    /// VAT rate reference; defaults to exempt.
    pub vat_ref: Option<String>,
    /// Create as `APROVADA` (balances applied immediately) instead of
    /// `PENDENTE` awaiting approval.
    pub approve: bool,
}

/// Editable fields of a pending manual transaction.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    /// Transfer amount.
    pub amount: Option<Decimal>,
    /// Free-text description.
    pub description: Option<String>,
    /// VAT rate reference.
    pub vat_ref: Option<String>,
}

/// Named time-range shortcuts for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFilter {
    /// Since local midnight.
    Today,
    /// Since Monday of the current ISO week.
    ThisWeek,
    /// Since the first of the current month.
    ThisMonth,
}

impl TimeFilter {
    fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let period = match self {
            Self::Today => LimitPeriod::Diario,
            Self::ThisWeek => LimitPeriod::Semanal,
            Self::ThisMonth => LimitPeriod::Mensal,
        };
        window_start(period, now)
    }
}

/// Filter options for listing transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Named shortcut; ignored when an explicit range is given.
    pub time: Option<TimeFilter>,
    /// Explicit range start.
    pub from: Option<DateTime<Utc>>,
    /// Explicit range end.
    pub to: Option<DateTime<Utc>>,
    /// Include system-generated companion rows (excluded by default).
    pub include_system: bool,
}

/// A committed transfer: the primary row plus any generated companions.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    /// The user-intent row.
    pub primary: transactions::Model,
    /// Generated companion rows (VAT settlement).
    pub companions: Vec<transactions::Model>,
}

/// Ledger writer and transaction query repository.
#[derive(Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
    views: ViewCache,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, views: ViewCache) -> Self {
        Self { db, views }
    }

    // ========================================================================
    // Applicability
    // ========================================================================

    /// Dry-run applicability check: full diagnostics, no mutation.
    ///
    /// Runs the identical checker the committing path runs, against a
    /// context gathered outside any transaction (usage counter read without
    /// a lock).
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::RuleNotFound`] for an unknown rule; an
    /// inapplicable rule is a successful check with `can_apply == false`.
    pub async fn check_applicability(
        &self,
        input: CheckApplicabilityInput,
    ) -> Result<ApplicabilityReport, TransactionError> {
        let rule_model = transaction_rules::Entity::find_by_id(input.rule_id)
            .one(&self.db)
            .await?
            .ok_or(TransactionError::RuleNotFound(input.rule_id))?;
        let rule = convert::rule_to_core(&rule_model);
        let now = Utc::now();

        let used = match usage::key_for(
            &rule,
            input.origin_id,
            input.destination_id,
            input.discipline_id,
            now,
        ) {
            Some(key) => usage::window_usage(&self.db, &key).await?,
            None => Decimal::ZERO,
        };

        let ctx = gather_context(
            &self.db,
            rule,
            input.origin_id,
            input.destination_id,
            input.discipline_id,
            used,
            now,
        )
        .await?;

        Ok(evaluate(&ctx))
    }

    // ========================================================================
    // Ledger writes
    // ========================================================================

    /// Applies a rule as one atomic operation.
    ///
    /// Inside a single database transaction: the usage counter row is locked,
    /// the applicability gate re-runs against current data, the primary row
    /// is inserted `APROVADA`, balances move, the VAT companion is generated
    /// when a nonzero rate applies, category hooks run, and the counter is
    /// incremented. Any failure rolls the whole unit back.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::NotApplicable`] with the first violation
    /// when the gate rejects the request.
    pub async fn apply_rule(
        &self,
        input: ApplyRuleInput,
    ) -> Result<TransferOutcome, TransactionError> {
        if input.description.trim().is_empty() {
            return Err(TransactionError::Validation(
                "Descrição é obrigatória".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let rule_model = transaction_rules::Entity::find_by_id(input.rule_id)
            .one(&txn)
            .await?
            .ok_or(TransactionError::RuleNotFound(input.rule_id))?;
        let rule = convert::rule_to_core(&rule_model);
        let now = Utc::now();

        // Lock the window counter before checking, closing the gap between
        // "sum historical usage" and "insert new usage".
        let key = usage::key_for(
            &rule,
            input.origin_id,
            Some(input.destination_id),
            input.discipline_id,
            now,
        );
        let used = match &key {
            Some(key) => usage::lock_window_usage(&txn, key).await?,
            None => Decimal::ZERO,
        };

        let ctx = gather_context(
            &txn,
            rule.clone(),
            input.origin_id,
            Some(input.destination_id),
            input.discipline_id,
            used,
            now,
        )
        .await?;
        evaluate(&ctx).into_result()?;

        let stamp = now.into();
        let primary = transactions::ActiveModel {
            id: Set(Uuid::now_v7()),
            group_id: Set(Uuid::now_v7()),
            origin_id: Set(input.origin_id),
            destination_id: Set(input.destination_id),
            amount: Set(rule.amount),
            direction: Set(convert::direction_from_core(rule.direction)),
            status: Set(TransactionStatus::Aprovada),
            origin_kind: Set(OriginKind::User),
            description: Set(input.description),
            rejection_reason: Set(None),
            vat_ref: Set(input
                .vat_ref
                .unwrap_or_else(|| rule.vat_ref.clone())),
            rule_id: Set(Some(input.rule_id)),
            discipline_id: Set(input.discipline_id),
            created_at: Set(stamp),
            updated_at: Set(stamp),
        }
        .insert(&txn)
        .await?;

        let companion = self.settle_approved(&txn, &primary).await?;

        match hook_for_category(&rule.category) {
            Some(PostCommitHook::LegacyAudit) => {
                legado::insert_legado(
                    &txn,
                    input.destination_id,
                    input.origin_id,
                    Some(input.rule_id),
                    primary.description.clone(),
                )
                .await?;
            }
            None => {}
        }

        if let Some(key) = &key {
            usage::record_usage(&txn, key, rule.amount).await?;
        }

        txn.commit().await?;
        info!(
            transaction_id = %primary.id,
            rule_id = %input.rule_id,
            amount = %primary.amount,
            "rule applied"
        );

        self.views
            .invalidate_for_transfer(Some(primary.origin_id), Some(primary.destination_id));

        Ok(TransferOutcome {
            companions: companion.into_iter().collect(),
            primary,
        })
    }

    /// Creates a manual (rule-less) transaction.
    ///
    /// Created `PENDENTE` by default; with `approve` set, the row is created
    /// `APROVADA` and balances settle in the same database transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::Validation`] listing every input problem.
    pub async fn create_manual(
        &self,
        input: ManualTransactionInput,
    ) -> Result<TransferOutcome, TransactionError> {
        let txn = self.db.begin().await?;

        let origin = user::load_snapshot(&txn, input.origin_id).await?;
        let destination = user::load_snapshot(&txn, input.destination_id).await?;

        let mut errors = Vec::new();
        if input.amount <= Decimal::ZERO {
            errors.push("Montante é obrigatório e deve ser um número positivo".to_string());
        }
        if input.description.trim().is_empty() {
            errors.push("Descrição é obrigatória".to_string());
        }
        if input.origin_id == input.destination_id {
            errors.push("Utilizador destino deve ser diferente do utilizador origem".to_string());
        }
        match &origin {
            None => errors.push("Utilizador origem não encontrado".to_string()),
            Some(origin) if !origin.is_active => {
                errors.push("Utilizador origem não está ativo".to_string());
            }
            Some(origin) => {
                if input.approve && origin.balance < input.amount {
                    errors.push("Saldo insuficiente no utilizador origem".to_string());
                }
            }
        }
        match &destination {
            None => errors.push("Utilizador destino não encontrado".to_string()),
            Some(destination) if !destination.is_active => {
                errors.push("Utilizador destino não está ativo".to_string());
            }
            Some(_) => {}
        }
        if !errors.is_empty() {
            return Err(TransactionError::Validation(errors.join(", ")));
        }

        let status = if input.approve {
            TransactionStatus::Aprovada
        } else {
            TransactionStatus::Pendente
        };
        let stamp = Utc::now().into();

        let primary = transactions::ActiveModel {
            id: Set(Uuid::now_v7()),
            group_id: Set(Uuid::now_v7()),
            origin_id: Set(input.origin_id),
            destination_id: Set(input.destination_id),
            amount: Set(input.amount),
            direction: Set(TransactionDirection::Debito),
            status: Set(status),
            origin_kind: Set(OriginKind::User),
            description: Set(input.description),
            rejection_reason: Set(None),
            vat_ref: Set(input.vat_ref.unwrap_or_else(|| VAT_EXEMPT_REF.to_string())),
            rule_id: Set(None),
            discipline_id: Set(None),
            created_at: Set(stamp),
            updated_at: Set(stamp),
        }
        .insert(&txn)
        .await?;

        let companion = if primary.status == TransactionStatus::Aprovada {
            self.settle_approved(&txn, &primary).await?
        } else {
            None
        };

        txn.commit().await?;
        info!(transaction_id = %primary.id, status = ?primary.status, "manual transaction created");

        self.views
            .invalidate_for_transfer(Some(primary.origin_id), Some(primary.destination_id));

        Ok(TransferOutcome {
            companions: companion.into_iter().collect(),
            primary,
        })
    }

    /// Approves a pending transaction; balance effects apply exactly once
    /// at this transition.
    ///
    /// # Errors
    ///
    /// Returns a state error for terminal or system-generated rows.
    pub async fn approve(&self, id: Uuid) -> Result<TransferOutcome, TransactionError> {
        let txn = self.db.begin().await?;

        let row = transactions::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(TransactionError::NotFound(id))?;

        let next = StatusMachine::approve(
            convert::status_to_core(&row.status),
            convert::kind_to_core(&row.origin_kind),
        )?;

        let mut active: transactions::ActiveModel = row.into();
        active.status = Set(convert::status_from_core(next));
        active.updated_at = Set(Utc::now().into());
        let approved = active.update(&txn).await?;

        let companion = self.settle_approved(&txn, &approved).await?;

        txn.commit().await?;
        info!(transaction_id = %approved.id, "transaction approved");

        self.views
            .invalidate_for_transfer(Some(approved.origin_id), Some(approved.destination_id));

        Ok(TransferOutcome {
            companions: companion.into_iter().collect(),
            primary: approved,
        })
    }

    /// Rejects a pending transaction; terminal, no balance effect.
    ///
    /// # Errors
    ///
    /// Returns a state error for terminal or system-generated rows, or when
    /// the reason is empty.
    pub async fn reject(
        &self,
        id: Uuid,
        reason: String,
    ) -> Result<transactions::Model, TransactionError> {
        let txn = self.db.begin().await?;

        let row = transactions::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(TransactionError::NotFound(id))?;

        let next = StatusMachine::reject(
            convert::status_to_core(&row.status),
            convert::kind_to_core(&row.origin_kind),
            &reason,
        )?;

        let mut active: transactions::ActiveModel = row.into();
        active.status = Set(convert::status_from_core(next));
        active.rejection_reason = Set(Some(reason));
        active.updated_at = Set(Utc::now().into());
        let rejected = active.update(&txn).await?;

        txn.commit().await?;
        info!(transaction_id = %rejected.id, "transaction rejected");

        self.views
            .invalidate_for_transfer(Some(rejected.origin_id), Some(rejected.destination_id));

        Ok(rejected)
    }

    /// Edits a pending, user-originated transaction.
    ///
    /// # Errors
    ///
    /// Returns a state error for terminal or system-generated rows.
    pub async fn update_manual(
        &self,
        id: Uuid,
        input: UpdateTransactionInput,
    ) -> Result<transactions::Model, TransactionError> {
        let txn = self.db.begin().await?;

        let row = transactions::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(TransactionError::NotFound(id))?;

        StatusMachine::ensure_mutable(
            convert::status_to_core(&row.status),
            convert::kind_to_core(&row.origin_kind),
        )?;

        if let Some(amount) = input.amount
            && amount <= Decimal::ZERO
        {
            return Err(TransactionError::Validation(
                "Montante deve ser um número positivo".to_string(),
            ));
        }

        let mut active: transactions::ActiveModel = row.into();
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(vat_ref) = input.vat_ref {
            active.vat_ref = Set(vat_ref);
        }
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        txn.commit().await?;

        self.views
            .invalidate_for_transfer(Some(updated.origin_id), Some(updated.destination_id));

        Ok(updated)
    }

    /// Deletes a pending, user-originated transaction.
    ///
    /// # Errors
    ///
    /// Returns a state error for terminal or system-generated rows.
    pub async fn delete_manual(&self, id: Uuid) -> Result<(), TransactionError> {
        let row = transactions::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(TransactionError::NotFound(id))?;

        StatusMachine::ensure_mutable(
            convert::status_to_core(&row.status),
            convert::kind_to_core(&row.origin_kind),
        )?;

        transactions::Entity::delete_by_id(id).exec(&self.db).await?;

        self.views
            .invalidate_for_transfer(Some(row.origin_id), Some(row.destination_id));

        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Fetches one transaction, enriched for display.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::NotFound`] for an unknown id.
    pub async fn get(&self, id: Uuid) -> Result<EnrichedTransaction, TransactionError> {
        let row = transactions::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(TransactionError::NotFound(id))?;

        let mut enriched = self.enrich_models(&[row]).await?;
        Ok(enriched.remove(0))
    }

    /// Lists transactions newest first, excluding system-generated companion
    /// rows unless the filter asks for them.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        filter: TransactionFilter,
    ) -> Result<Vec<EnrichedTransaction>, TransactionError> {
        let mut query = transactions::Entity::find();

        if !filter.include_system {
            query = query.filter(transactions::Column::OriginKind.eq(OriginKind::User));
        }

        if filter.from.is_some() || filter.to.is_some() {
            if let Some(from) = filter.from {
                query = query.filter(transactions::Column::CreatedAt.gte(from));
            }
            if let Some(to) = filter.to {
                query = query.filter(transactions::Column::CreatedAt.lte(to));
            }
        } else if let Some(time) = filter.time
            && let Some(since) = time.since(Utc::now())
        {
            query = query.filter(transactions::Column::CreatedAt.gte(since));
        }

        let rows = query
            .order_by_desc(transactions::Column::CreatedAt)
            .all(&self.db)
            .await?;

        self.enrich_models(&rows).await
    }

    /// Lists every row of a transaction group, system companions included.
    /// The reconciliation view.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::NotFound`] when the group has no rows.
    pub async fn list_by_group(
        &self,
        group_id: Uuid,
    ) -> Result<Vec<EnrichedTransaction>, TransactionError> {
        let rows = transactions::Entity::find()
            .filter(transactions::Column::GroupId.eq(group_id))
            .order_by_asc(transactions::Column::CreatedAt)
            .all(&self.db)
            .await?;

        if rows.is_empty() {
            return Err(TransactionError::NotFound(group_id));
        }

        self.enrich_models(&rows).await
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Applies the balance effects of a freshly approved row and generates
    /// the VAT companion when a nonzero rate applies.
    ///
    /// System-generated rows never settle again: their balance effects were
    /// produced by the operation that created them.
    async fn settle_approved<C: ConnectionTrait>(
        &self,
        conn: &C,
        row: &transactions::Model,
    ) -> Result<Option<transactions::Model>, TransactionError> {
        if row.origin_kind != OriginKind::User {
            return Ok(None);
        }

        user::apply_balance_delta(conn, row.origin_id, -row.amount).await?;
        user::apply_balance_delta(conn, row.destination_id, row.amount).await?;

        let rates = settings::load_vat_rates(conn).await?;
        let rate = rate_for(&rates, &row.vat_ref);
        if rate.is_zero() {
            return Ok(None);
        }

        let sink = settings::load_vat_sink(conn)
            .await?
            .ok_or(LedgerError::VatSinkNotConfigured)?;

        let breakdown = split_gross(row.amount, rate);
        if breakdown.vat.is_zero() {
            return Ok(None);
        }

        user::apply_balance_delta(conn, row.destination_id, -breakdown.vat).await?;
        user::apply_balance_delta(conn, sink, breakdown.vat).await?;

        let stamp = Utc::now().into();
        let vat_row = transactions::ActiveModel {
            id: Set(Uuid::now_v7()),
            group_id: Set(row.group_id),
            origin_id: Set(row.destination_id),
            destination_id: Set(sink),
            amount: Set(breakdown.vat),
            direction: Set(TransactionDirection::Debito),
            status: Set(TransactionStatus::Aprovada),
            origin_kind: Set(OriginKind::VatSettlement),
            description: Set(format!("IVA {rate}%: {}", row.description)),
            rejection_reason: Set(None),
            vat_ref: Set(VAT_EXEMPT_REF.to_string()),
            rule_id: Set(None),
            discipline_id: Set(None),
            created_at: Set(stamp),
            updated_at: Set(stamp),
        }
        .insert(conn)
        .await?;

        Ok(Some(vat_row))
    }

    /// Resolves names and VAT percentages for a batch of rows.
    async fn enrich_models(
        &self,
        rows: &[transactions::Model],
    ) -> Result<Vec<EnrichedTransaction>, TransactionError> {
        let mut ids: Vec<Uuid> = rows
            .iter()
            .flat_map(|row| [row.origin_id, row.destination_id])
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let names = user::load_name_map(&self.db, &ids).await?;
        let rates = settings::load_vat_rates(&self.db).await?;

        let ledger_rows: Vec<_> = rows.iter().map(convert::transaction_to_row).collect();
        Ok(enrich(&ledger_rows, &names, &rates))
    }
}

/// Gathers the checker's context on any connection.
///
/// The dry-run path calls this on the pooled connection; the committing path
/// calls it inside its database transaction so the gate sees current data.
async fn gather_context<C: ConnectionTrait>(
    conn: &C,
    rule: TransactionRule,
    origin_id: Uuid,
    destination_id: Option<Uuid>,
    discipline_id: Option<Uuid>,
    used_in_window: Decimal,
    now: DateTime<Utc>,
) -> Result<RuleContext, DbErr> {
    let origin = user::load_snapshot(conn, origin_id).await?;

    let destination = match destination_id {
        Some(id) => user::load_snapshot(conn, id).await?,
        None => None,
    };

    let discipline_snapshot = match discipline_id {
        Some(id) => discipline::load_snapshot(conn, id).await?,
        None => None,
    };

    let destination_enrolled = match (destination_id, discipline_id, &discipline_snapshot) {
        (Some(student), Some(discipline_id), Some(_)) => {
            Some(discipline::is_enrolled(conn, student, discipline_id).await?)
        }
        _ => None,
    };

    Ok(RuleContext {
        rule,
        origin,
        origin_id: UserId::from_uuid(origin_id),
        destination,
        destination_id: destination_id.map(UserId::from_uuid),
        discipline_id: discipline_id.map(valcoin_shared::types::DisciplineId::from_uuid),
        discipline: discipline_snapshot,
        destination_enrolled,
        used_in_window,
        now,
    })
}
