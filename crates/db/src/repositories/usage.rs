//! Period-limit usage counters.
//!
//! One counter row exists per (rule, origin, destination, discipline,
//! window start). The committing path locks the row `FOR UPDATE` before the
//! limit is evaluated and increments it in the same transaction, so two
//! concurrent applications against one window serialize instead of both
//! passing the check against the pre-operation total. The dry-run path reads
//! the same counter without the lock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, ExprTrait, OnConflict};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect,
};
use uuid::Uuid;
use valcoin_core::rules::types::TransactionRule;
use valcoin_core::rules::window_start;

use crate::entities::rule_usage_windows;

/// Identifies one usage counter row.
///
/// `destination_id` and `discipline_id` fall back to the nil UUID when the
/// dimension does not apply, keeping the unique key total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UsageKey {
    pub rule_id: Uuid,
    pub origin_id: Uuid,
    pub destination_id: Uuid,
    pub discipline_id: Uuid,
    pub window_start: DateTime<Utc>,
}

/// Builds the counter key for a rule application, or `None` when the rule
/// carries no limit.
pub(crate) fn key_for(
    rule: &TransactionRule,
    origin_id: Uuid,
    destination_id: Option<Uuid>,
    discipline_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> Option<UsageKey> {
    if !rule.has_limit() {
        return None;
    }
    let window = window_start(rule.limit_period, now)?;

    Some(UsageKey {
        rule_id: rule.id.into_inner(),
        origin_id,
        destination_id: destination_id.unwrap_or(Uuid::nil()),
        discipline_id: if rule.per_discipline {
            discipline_id.unwrap_or(Uuid::nil())
        } else {
            Uuid::nil()
        },
        window_start: window,
    })
}

fn key_filter(
    query: sea_orm::Select<rule_usage_windows::Entity>,
    key: &UsageKey,
) -> sea_orm::Select<rule_usage_windows::Entity> {
    query
        .filter(rule_usage_windows::Column::RuleId.eq(key.rule_id))
        .filter(rule_usage_windows::Column::OriginId.eq(key.origin_id))
        .filter(rule_usage_windows::Column::DestinationId.eq(key.destination_id))
        .filter(rule_usage_windows::Column::DisciplineId.eq(key.discipline_id))
        .filter(rule_usage_windows::Column::WindowStart.eq(key.window_start))
}

/// Reads the amount used in the window without locking. Dry-run path.
pub(crate) async fn window_usage<C: ConnectionTrait>(
    conn: &C,
    key: &UsageKey,
) -> Result<Decimal, DbErr> {
    let row = key_filter(rule_usage_windows::Entity::find(), key)
        .one(conn)
        .await?;

    Ok(row.map_or(Decimal::ZERO, |r| r.used_amount))
}

/// Ensures the counter row exists and locks it `FOR UPDATE`, returning the
/// amount used. Committing path only; must run inside the ledger transaction.
pub(crate) async fn lock_window_usage<C: ConnectionTrait>(
    conn: &C,
    key: &UsageKey,
) -> Result<Decimal, DbErr> {
    let seed = rule_usage_windows::ActiveModel {
        id: Set(Uuid::now_v7()),
        rule_id: Set(key.rule_id),
        origin_id: Set(key.origin_id),
        destination_id: Set(key.destination_id),
        discipline_id: Set(key.discipline_id),
        window_start: Set(key.window_start.into()),
        used_amount: Set(Decimal::ZERO),
        updated_at: Set(Utc::now().into()),
    };

    let insert = rule_usage_windows::Entity::insert(seed)
        .on_conflict(
            OnConflict::columns([
                rule_usage_windows::Column::RuleId,
                rule_usage_windows::Column::OriginId,
                rule_usage_windows::Column::DestinationId,
                rule_usage_windows::Column::DisciplineId,
                rule_usage_windows::Column::WindowStart,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec(conn)
        .await;

    match insert {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e),
    }

    let row = key_filter(rule_usage_windows::Entity::find(), key)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::Custom("usage counter row vanished under lock".to_string()))?;

    Ok(row.used_amount)
}

/// Adds a committed application's amount to the locked counter.
pub(crate) async fn record_usage<C: ConnectionTrait>(
    conn: &C,
    key: &UsageKey,
    amount: Decimal,
) -> Result<(), DbErr> {
    rule_usage_windows::Entity::update_many()
        .col_expr(
            rule_usage_windows::Column::UsedAmount,
            Expr::col(rule_usage_windows::Column::UsedAmount).add(amount),
        )
        .col_expr(
            rule_usage_windows::Column::UpdatedAt,
            Expr::current_timestamp().into(),
        )
        .filter(rule_usage_windows::Column::RuleId.eq(key.rule_id))
        .filter(rule_usage_windows::Column::OriginId.eq(key.origin_id))
        .filter(rule_usage_windows::Column::DestinationId.eq(key.destination_id))
        .filter(rule_usage_windows::Column::DisciplineId.eq(key.discipline_id))
        .filter(rule_usage_windows::Column::WindowStart.eq(key.window_start))
        .exec(conn)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use valcoin_core::rules::types::{LimitPeriod, TransactionDirection, UserRole};
    use valcoin_shared::types::RuleId;

    fn rule_with_limit(limit: Decimal, period: LimitPeriod) -> TransactionRule {
        TransactionRule {
            id: RuleId::new(),
            name: "Regra".to_string(),
            amount: dec!(10),
            direction: TransactionDirection::Credito,
            origin_role: UserRole::Professor,
            destination_role: UserRole::Aluno,
            limit_amount: limit,
            limit_period: period,
            per_discipline: false,
            category: String::new(),
            vat_ref: "isento".to_string(),
            min_year: None,
            max_year: None,
            icon: None,
            is_active: true,
        }
    }

    #[test]
    fn test_no_key_without_limit() {
        let rule = rule_with_limit(Decimal::ZERO, LimitPeriod::Diario);
        assert!(key_for(&rule, Uuid::now_v7(), None, None, Utc::now()).is_none());

        let rule = rule_with_limit(dec!(20), LimitPeriod::Nenhum);
        assert!(key_for(&rule, Uuid::now_v7(), None, None, Utc::now()).is_none());
    }

    #[test]
    fn test_key_uses_nil_sentinels() {
        let rule = rule_with_limit(dec!(20), LimitPeriod::Diario);
        let key = key_for(&rule, Uuid::now_v7(), None, None, Utc::now()).unwrap();
        assert_eq!(key.destination_id, Uuid::nil());
        assert_eq!(key.discipline_id, Uuid::nil());
    }

    #[test]
    fn test_discipline_only_keyed_for_scoped_rules() {
        let mut rule = rule_with_limit(dec!(20), LimitPeriod::Mensal);
        let discipline = Uuid::now_v7();

        // Unscoped rule ignores the discipline dimension.
        let key = key_for(&rule, Uuid::now_v7(), None, Some(discipline), Utc::now()).unwrap();
        assert_eq!(key.discipline_id, Uuid::nil());

        rule.per_discipline = true;
        let key = key_for(&rule, Uuid::now_v7(), None, Some(discipline), Utc::now()).unwrap();
        assert_eq!(key.discipline_id, discipline);
    }

    #[test]
    fn test_same_window_same_key() {
        let rule = rule_with_limit(dec!(20), LimitPeriod::Diario);
        let origin = Uuid::now_v7();
        let destination = Uuid::now_v7();

        let morning = chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 8, 7, 8, 0, 0).unwrap();
        let evening = chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 8, 7, 22, 0, 0).unwrap();

        let a = key_for(&rule, origin, Some(destination), None, morning).unwrap();
        let b = key_for(&rule, origin, Some(destination), None, evening).unwrap();
        assert_eq!(a, b);

        let next_day = chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 8, 8, 8, 0, 0).unwrap();
        let c = key_for(&rule, origin, Some(destination), None, next_day).unwrap();
        assert_ne!(a, c);
    }
}
