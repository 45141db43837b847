//! Integration tests for the ledger writer and rule catalog.
//!
//! These tests need a live Postgres; they skip silently when `DATABASE_URL`
//! is not set so the suite stays green on machines without one.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait};
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::OnceCell;
use uuid::Uuid;

use valcoin_core::rules::types::{LimitPeriod, TransactionDirection, UserRole};
use valcoin_db::entities::sea_orm_active_enums as db_enums;
use valcoin_db::entities::users;
use valcoin_db::migration::{Migrator, MigratorTrait};
use valcoin_db::repositories::transaction::{
    ApplyRuleInput, ManualTransactionInput, TransactionError,
};
use valcoin_db::repositories::{CreateRuleInput, SettingsRepository, VAT_SINK_KEY};
use valcoin_db::{RuleCache, RuleRepository, TransactionRepository, ViewCache};
use valcoin_shared::config::CacheConfig;

static MIGRATE: OnceCell<()> = OnceCell::const_new();

async fn test_db() -> Option<DatabaseConnection> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let db = valcoin_db::connect(&url).await.ok()?;

    MIGRATE
        .get_or_init(|| async {
            Migrator::up(&db, None).await.expect("migrations failed");
        })
        .await;

    Some(db)
}

fn caches() -> (RuleCache, ViewCache) {
    let config = CacheConfig::default();
    (RuleCache::new(&config), ViewCache::new(&config))
}

async fn seed_user(db: &DatabaseConnection, role: db_enums::UserRole, balance: Decimal) -> Uuid {
    let id = Uuid::now_v7();
    let now = chrono::Utc::now().into();
    users::ActiveModel {
        id: Set(id),
        name: Set(format!("user-{id}")),
        role: Set(role),
        balance: Set(balance),
        school_year: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed user");
    id
}

async fn balance_of(db: &DatabaseConnection, id: Uuid) -> Decimal {
    users::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("query user")
        .expect("user exists")
        .balance
}

fn debit_rule(limit: Decimal, period: LimitPeriod) -> CreateRuleInput {
    CreateRuleInput {
        name: format!("Regra {}", Uuid::now_v7()),
        amount: dec!(10),
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
    }
}

// ============================================================================
// Scenario A: daily limit vs balance independence
// ============================================================================

#[tokio::test]
async fn test_second_daily_apply_fails_on_limit() {
    let Some(db) = test_db().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let (rules, views) = caches();

    let professor = seed_user(&db, db_enums::UserRole::Professor, dec!(100)).await;
    let aluno = seed_user(&db, db_enums::UserRole::Aluno, dec!(0)).await;

    let rule_repo = RuleRepository::new(db.clone(), rules, views.clone());
    let rule = rule_repo
        .create(debit_rule(dec!(15), LimitPeriod::Diario))
        .await
        .expect("create rule");

    let tx_repo = TransactionRepository::new(db.clone(), views);
    let input = ApplyRuleInput {
        rule_id: rule.id.into_inner(),
        origin_id: professor,
        destination_id: aluno,
        discipline_id: None,
        description: "Primeira aplicação".to_string(),
        vat_ref: None,
    };

    let first = tx_repo.apply_rule(input.clone()).await.expect("first apply");
    assert_eq!(first.primary.amount, dec!(10));
    assert_eq!(balance_of(&db, professor).await, dec!(90));
    assert_eq!(balance_of(&db, aluno).await, dec!(10));

    // The balance would cover another debit of 10, but the daily window has
    // only 5 of headroom left, so the limit gate fires on its own.
    let second = tx_repo.apply_rule(input).await;
    assert!(matches!(
        second,
        Err(TransactionError::NotApplicable(
            valcoin_core::rules::RuleViolation::LimitExceeded { .. }
        ))
    ));

    // Failed attempt left no trace: balances unchanged.
    assert_eq!(balance_of(&db, professor).await, dec!(90));
    assert_eq!(balance_of(&db, aluno).await, dec!(10));
}

// ============================================================================
// Scenario B: VAT split with settlement companion row
// ============================================================================

#[tokio::test]
async fn test_vat_split_is_zero_sum() {
    let Some(db) = test_db().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let (_, views) = caches();

    let origin = seed_user(&db, db_enums::UserRole::Aluno, dec!(500)).await;
    let destination = seed_user(&db, db_enums::UserRole::Professor, dec!(0)).await;
    let sink = seed_user(&db, db_enums::UserRole::Admin, dec!(0)).await;

    let settings_repo = SettingsRepository::new(db.clone(), views.clone());
    let mut entries = HashMap::new();
    entries.insert(VAT_SINK_KEY.to_string(), json!(sink.to_string()));
    settings_repo.upsert_many(entries).await.expect("set sink");

    let tx_repo = TransactionRepository::new(db.clone(), views);
    let outcome = tx_repo
        .create_manual(ManualTransactionInput {
            origin_id: origin,
            destination_id: destination,
            amount: dec!(123),
            description: "Compra na loja".to_string(),
            vat_ref: Some("normal".to_string()),
            approve: true,
        })
        .await
        .expect("create approved manual transaction");

    // 23% on a gross of 123: net 100, vat 23.
    assert_eq!(outcome.companions.len(), 1);
    let vat_row = &outcome.companions[0];
    assert_eq!(vat_row.amount, dec!(23.00));
    assert_eq!(vat_row.origin_kind, db_enums::OriginKind::VatSettlement);
    assert_eq!(vat_row.vat_ref, "isento");
    assert_eq!(vat_row.group_id, outcome.primary.group_id);

    assert_eq!(balance_of(&db, origin).await, dec!(377));
    assert_eq!(balance_of(&db, destination).await, dec!(100.00));
    assert_eq!(balance_of(&db, sink).await, dec!(23.00));
}

// ============================================================================
// Exactly-once approval
// ============================================================================

#[tokio::test]
async fn test_approval_applies_balances_exactly_once() {
    let Some(db) = test_db().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let (_, views) = caches();

    let origin = seed_user(&db, db_enums::UserRole::Aluno, dec!(50)).await;
    let destination = seed_user(&db, db_enums::UserRole::Aluno, dec!(0)).await;

    let tx_repo = TransactionRepository::new(db.clone(), views);
    let outcome = tx_repo
        .create_manual(ManualTransactionInput {
            origin_id: origin,
            destination_id: destination,
            amount: dec!(20),
            description: "Pagamento pendente".to_string(),
            vat_ref: None,
            approve: false,
        })
        .await
        .expect("create pending transaction");

    // Pending rows have no balance effect.
    assert_eq!(balance_of(&db, origin).await, dec!(50));

    tx_repo.approve(outcome.primary.id).await.expect("approve");
    assert_eq!(balance_of(&db, origin).await, dec!(30));
    assert_eq!(balance_of(&db, destination).await, dec!(20));

    // Re-approving is rejected and moves no value.
    let again = tx_repo.approve(outcome.primary.id).await;
    assert!(matches!(
        again,
        Err(TransactionError::State(
            valcoin_core::ledger::LedgerError::AlreadyApproved
        ))
    ));
    assert_eq!(balance_of(&db, origin).await, dec!(30));
    assert_eq!(balance_of(&db, destination).await, dec!(20));
}

// ============================================================================
// Scenario C: rule deletion clears the rule cache
// ============================================================================

#[tokio::test]
async fn test_rule_delete_clears_cache() {
    let Some(db) = test_db().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let (rules, views) = caches();
    let rule_repo = RuleRepository::new(db.clone(), rules.clone(), views);

    let created = rule_repo
        .create(debit_rule(Decimal::ZERO, LimitPeriod::Nenhum))
        .await
        .expect("create rule");

    let listed = rule_repo.list_active().await.expect("list");
    assert!(listed.iter().any(|r| r.id == created.id));

    rule_repo
        .delete(created.id.into_inner())
        .await
        .expect("delete");
    rules.run_pending_tasks();

    // Next listing misses the cache and no longer carries the rule.
    let listed = rule_repo.list_active().await.expect("list after delete");
    assert!(!listed.iter().any(|r| r.id == created.id));
}

// ============================================================================
// Rule round trip and dry-run parity
// ============================================================================

#[tokio::test]
async fn test_rule_round_trip_preserves_amounts() {
    let Some(db) = test_db().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let (rules, views) = caches();
    let rule_repo = RuleRepository::new(db.clone(), rules, views);

    let mut input = debit_rule(dec!(20.25), LimitPeriod::Mensal);
    input.amount = dec!(10.50);
    let created = rule_repo.create(input.clone()).await.expect("create");

    let fetched = rule_repo.get(created.id.into_inner()).await.expect("get");
    assert_eq!(fetched.name, input.name);
    assert_eq!(fetched.amount, dec!(10.50));
    assert_eq!(fetched.limit_amount, dec!(20.25));
    assert_eq!(fetched.limit_period, LimitPeriod::Mensal);
    assert!(fetched.is_active);
}

#[tokio::test]
async fn test_dry_run_reports_full_diagnostics() {
    let Some(db) = test_db().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let (rules, views) = caches();

    // Origin with the wrong role AND an empty balance: the dry run must
    // report both problems, not stop at the first.
    let aluno_origin = seed_user(&db, db_enums::UserRole::Aluno, dec!(0)).await;
    let aluno_dest = seed_user(&db, db_enums::UserRole::Aluno, dec!(0)).await;

    let rule_repo = RuleRepository::new(db.clone(), rules, views.clone());
    let rule = rule_repo
        .create(debit_rule(Decimal::ZERO, LimitPeriod::Nenhum))
        .await
        .expect("create rule");

    let tx_repo = TransactionRepository::new(db.clone(), views);
    let report = tx_repo
        .check_applicability(valcoin_db::repositories::CheckApplicabilityInput {
            rule_id: rule.id.into_inner(),
            origin_id: aluno_origin,
            destination_id: Some(aluno_dest),
            discipline_id: None,
        })
        .await
        .expect("check");

    assert!(!report.can_apply);
    assert!(report.errors.len() >= 2, "expected role and balance errors");
}

// ============================================================================
// Scenario D: concurrent applications cannot jointly overshoot the limit
// ============================================================================

#[tokio::test]
async fn test_concurrent_applies_serialize_on_window_counter() {
    let Some(db) = test_db().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let (rules, views) = caches();

    let professor = seed_user(&db, db_enums::UserRole::Professor, dec!(100)).await;
    let aluno = seed_user(&db, db_enums::UserRole::Aluno, dec!(0)).await;

    let rule_repo = RuleRepository::new(db.clone(), rules, views.clone());
    // Limit admits exactly one application of 10 per day.
    let mut input = debit_rule(dec!(10), LimitPeriod::Diario);
    input.amount = dec!(10);
    let rule = rule_repo.create(input).await.expect("create rule");
    let rule_id = rule.id.into_inner();

    let tx_repo = TransactionRepository::new(db.clone(), views);
    let apply = |description: &str| {
        let repo = tx_repo.clone();
        let description = description.to_string();
        async move {
            repo.apply_rule(ApplyRuleInput {
                rule_id,
                origin_id: professor,
                destination_id: aluno,
                discipline_id: None,
                description,
                vat_ref: None,
            })
            .await
        }
    };

    let (a, b) = tokio::join!(apply("concorrente A"), apply("concorrente B"));

    let successes = usize::from(a.is_ok()) + usize::from(b.is_ok());
    assert_eq!(
        successes, 1,
        "exactly one of two concurrent applies may pass the locked window check"
    );

    // The winner moved 10; the loser moved nothing.
    assert_eq!(balance_of(&db, professor).await, dec!(90));
    assert_eq!(balance_of(&db, aluno).await, dec!(10));
}
