//! Database seeder for ValCoin development and testing.
//!
//! Seeds demo users, disciplines, enrollments, transaction rules, and VAT
//! settings for local development.
//!
//! Usage: cargo run --bin seeder

use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection};
use std::str::FromStr;
use uuid::Uuid;
use valcoin_db::entities::{
    discipline_enrollments, disciplines,
    sea_orm_active_enums::{LimitPeriod, TransactionDirection, UserRole},
    settings, transaction_rules, users,
};

/// Demo admin (also the VAT settlement sink).
const ADMIN_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Demo teacher.
const PROFESSOR_ID: &str = "00000000-0000-0000-0000-000000000002";
/// Demo students.
const ALUNO_A_ID: &str = "00000000-0000-0000-0000-000000000003";
const ALUNO_B_ID: &str = "00000000-0000-0000-0000-000000000004";
/// Demo discipline.
const DISCIPLINE_ID: &str = "00000000-0000-0000-0000-000000000010";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = valcoin_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding users...");
    seed_users(&db).await;

    println!("Seeding disciplines...");
    seed_disciplines(&db).await;

    println!("Seeding transaction rules...");
    seed_rules(&db).await;

    println!("Seeding settings...");
    seed_settings(&db).await;

    println!("Seeding complete!");
}

fn id(raw: &str) -> Uuid {
    Uuid::parse_str(raw).unwrap()
}

async fn seed_users(db: &DatabaseConnection) {
    let now = chrono::Utc::now().into();
    let rows = [
        (ADMIN_ID, "Administração", UserRole::Admin, "0"),
        (PROFESSOR_ID, "Professor Silva", UserRole::Professor, "500"),
        (ALUNO_A_ID, "Ana Martins", UserRole::Aluno, "50"),
        (ALUNO_B_ID, "Bruno Costa", UserRole::Aluno, "15"),
    ];

    for (raw_id, name, role, balance) in rows {
        let user = users::ActiveModel {
            id: Set(id(raw_id)),
            name: Set(name.to_string()),
            role: Set(role),
            balance: Set(Decimal::from_str(balance).unwrap()),
            school_year: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        if let Err(e) = user.insert(db).await {
            eprintln!("Failed to insert user {name}: {e}");
        }
    }
}

async fn seed_disciplines(db: &DatabaseConnection) {
    let now = chrono::Utc::now().into();

    let discipline = disciplines::ActiveModel {
        id: Set(id(DISCIPLINE_ID)),
        name: Set("Matemática".to_string()),
        is_active: Set(true),
        created_at: Set(now),
    };
    if let Err(e) = discipline.insert(db).await {
        eprintln!("Failed to insert discipline: {e}");
    }

    for student in [ALUNO_A_ID, ALUNO_B_ID] {
        let enrollment = discipline_enrollments::ActiveModel {
            id: Set(Uuid::now_v7()),
            student_id: Set(id(student)),
            discipline_id: Set(id(DISCIPLINE_ID)),
            is_active: Set(true),
            created_at: Set(now),
        };
        if let Err(e) = enrollment.insert(db).await {
            eprintln!("Failed to insert enrollment for {student}: {e}");
        }
    }
}

async fn seed_rules(db: &DatabaseConnection) {
    let now = chrono::Utc::now().into();

    let rules = [
        // (name, amount, direction, origin, destination, limit, period, per_discipline, category)
        (
            "Participação na aula",
            "5",
            TransactionDirection::Debito,
            UserRole::Professor,
            UserRole::Aluno,
            "20",
            LimitPeriod::Diario,
            true,
            "Mérito",
        ),
        (
            "Prémio de mérito",
            "25",
            TransactionDirection::Debito,
            UserRole::Professor,
            UserRole::Aluno,
            "100",
            LimitPeriod::Mensal,
            false,
            "Mérito",
        ),
        (
            "Legado da turma",
            "50",
            TransactionDirection::Debito,
            UserRole::Professor,
            UserRole::Aluno,
            "0",
            LimitPeriod::Nenhum,
            false,
            "Legado",
        ),
    ];

    let mut inserted = 0;
    for (name, amount, direction, origin, destination, limit, period, per_discipline, category) in
        rules
    {
        let rule = transaction_rules::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name.to_string()),
            amount: Set(Decimal::from_str(amount).unwrap()),
            direction: Set(direction),
            origin_role: Set(origin),
            destination_role: Set(destination),
            limit_amount: Set(Decimal::from_str(limit).unwrap()),
            limit_period: Set(period),
            per_discipline: Set(per_discipline),
            category: Set(category.to_string()),
            vat_ref: Set("isento".to_string()),
            min_year: Set(None),
            max_year: Set(None),
            icon: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        if let Err(e) = rule.insert(db).await {
            eprintln!("Failed to insert rule {name}: {e}");
        } else {
            inserted += 1;
        }
    }
    println!("  Inserted {inserted} transaction rules");
}

async fn seed_settings(db: &DatabaseConnection) {
    let sink = settings::ActiveModel {
        key: Set("vat_settlement_account".to_string()),
        value: Set(serde_json::json!(ADMIN_ID)),
    };
    if let Err(e) = sink.insert(db).await {
        eprintln!("Failed to insert VAT sink setting: {e}");
    }
}
