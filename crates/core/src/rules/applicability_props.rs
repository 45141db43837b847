//! Property tests for the applicability checker.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use valcoin_shared::types::{RuleId, UserId};

use super::applicability::{RuleContext, evaluate};
use super::error::RuleViolation;
use super::types::{LimitPeriod, TransactionDirection, TransactionRule, UserRole, UserSnapshot};

/// Strategy for amounts between 0.00 and 10,000.00 at 2 dp.
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn limit_period_strategy() -> impl Strategy<Value = LimitPeriod> {
    prop_oneof![
        Just(LimitPeriod::Diario),
        Just(LimitPeriod::Semanal),
        Just(LimitPeriod::Mensal),
        Just(LimitPeriod::Anual),
    ]
}

fn make_context(
    amount: Decimal,
    balance: Decimal,
    limit: Decimal,
    period: LimitPeriod,
    used: Decimal,
) -> RuleContext {
    let origin = UserSnapshot {
        id: UserId::new(),
        name: "Professor".to_string(),
        role: UserRole::Professor,
        balance,
        is_active: true,
    };
    let destination = UserSnapshot {
        id: UserId::new(),
        name: "Aluno".to_string(),
        role: UserRole::Aluno,
        balance: Decimal::ZERO,
        is_active: true,
    };
    RuleContext {
        origin_id: origin.id,
        destination_id: Some(destination.id),
        rule: TransactionRule {
            id: RuleId::new(),
            name: "Regra".to_string(),
            amount,
            direction: TransactionDirection::Debito,
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
        },
        origin: Some(origin),
        destination: Some(destination),
        discipline_id: None,
        discipline: None,
        destination_enrolled: None,
        used_in_window: used,
        now: Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// `can_apply` is exactly "no violations".
    #[test]
    fn prop_can_apply_iff_no_errors(
        amount in amount_strategy(),
        balance in amount_strategy(),
        limit in amount_strategy(),
        period in limit_period_strategy(),
        used in amount_strategy(),
    ) {
        let report = evaluate(&make_context(amount, balance, limit, period, used));
        prop_assert_eq!(report.can_apply, report.errors.is_empty());
    }

    /// The balance gate and the limit gate fire independently of each other.
    #[test]
    fn prop_balance_and_limit_gates_are_independent(
        amount in amount_strategy(),
        balance in amount_strategy(),
        limit in amount_strategy(),
        period in limit_period_strategy(),
        used in amount_strategy(),
    ) {
        let ctx = make_context(amount, balance, limit, period, used);
        let report = evaluate(&ctx);

        let balance_violated = report
            .errors
            .iter()
            .any(|e| matches!(e, RuleViolation::InsufficientBalance { .. }));
        let limit_violated = report
            .errors
            .iter()
            .any(|e| matches!(e, RuleViolation::LimitExceeded { .. }));

        prop_assert_eq!(balance_violated, balance < amount);

        let limit_configured = limit > Decimal::ZERO;
        prop_assert_eq!(
            limit_violated,
            limit_configured && limit - used < amount
        );
    }

    /// Reported headroom is always `limit - used` when a limit is configured.
    #[test]
    fn prop_limit_status_arithmetic(
        amount in amount_strategy(),
        balance in amount_strategy(),
        limit in amount_strategy(),
        period in limit_period_strategy(),
        used in amount_strategy(),
    ) {
        prop_assume!(limit > Decimal::ZERO);
        let report = evaluate(&make_context(amount, balance, limit, period, used));
        prop_assert_eq!(report.limits.total, limit);
        prop_assert_eq!(report.limits.remaining, limit - used);
    }

    /// An evaluation never mutates anything: running it twice over the same
    /// context yields the same verdict and the same violation sequence.
    #[test]
    fn prop_evaluation_is_deterministic(
        amount in amount_strategy(),
        balance in amount_strategy(),
        limit in amount_strategy(),
        period in limit_period_strategy(),
        used in amount_strategy(),
    ) {
        let ctx = make_context(amount, balance, limit, period, used);
        let first = evaluate(&ctx);
        let second = evaluate(&ctx);
        prop_assert_eq!(first.can_apply, second.can_apply);
        prop_assert_eq!(first.errors, second.errors);
        prop_assert_eq!(first.limits, second.limits);
    }
}
