//! Initial database migration.
//!
//! Creates the enums, tables, indexes, and seed settings for the ValCoin
//! ledger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: USERS & DISCIPLINES
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(DISCIPLINES_SQL).await?;
        db.execute_unprepared(DISCIPLINE_ENROLLMENTS_SQL).await?;

        // ============================================================
        // PART 3: RULE CATALOG
        // ============================================================
        db.execute_unprepared(TRANSACTION_RULES_SQL).await?;

        // ============================================================
        // PART 4: LEDGER
        // ============================================================
        db.execute_unprepared(TRANSACTIONS_SQL).await?;
        db.execute_unprepared(RULE_USAGE_WINDOWS_SQL).await?;

        // ============================================================
        // PART 5: AUDIT & SETTINGS
        // ============================================================
        db.execute_unprepared(LEGADOS_SQL).await?;
        db.execute_unprepared(SETTINGS_SQL).await?;

        // ============================================================
        // PART 6: SEED DATA
        // ============================================================
        db.execute_unprepared(SEED_SETTINGS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Platform roles
CREATE TYPE user_role AS ENUM (
    'ALUNO',
    'PROFESSOR',
    'ADMIN'
);

-- Transfer direction relative to the origin user
CREATE TYPE transaction_direction AS ENUM ('DEBITO', 'CREDITO');

-- Transaction lifecycle
CREATE TYPE transaction_status AS ENUM (
    'PENDENTE',
    'APROVADA',
    'REJEITADA'
);

-- Row provenance: user-intent vs system-generated
CREATE TYPE origin_kind AS ENUM (
    'USER',
    'VAT_SETTLEMENT',
    'COUNTERPARTY'
);

-- Period unit for rule usage limits
CREATE TYPE limit_period AS ENUM (
    'nenhum',
    'diario',
    'semanal',
    'mensal',
    'anual'
);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    role user_role NOT NULL,
    balance NUMERIC(12, 2) NOT NULL DEFAULT 0,
    school_year SMALLINT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_users_role ON users (role) WHERE is_active;
";

const DISCIPLINES_SQL: &str = r"
CREATE TABLE disciplines (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const DISCIPLINE_ENROLLMENTS_SQL: &str = r"
CREATE TABLE discipline_enrollments (
    id UUID PRIMARY KEY,
    student_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    discipline_id UUID NOT NULL REFERENCES disciplines (id) ON DELETE CASCADE,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (student_id, discipline_id)
);
";

const TRANSACTION_RULES_SQL: &str = r"
CREATE TABLE transaction_rules (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    amount NUMERIC(12, 2) NOT NULL DEFAULT 0,
    direction transaction_direction NOT NULL,
    origin_role user_role NOT NULL,
    destination_role user_role NOT NULL,
    limit_amount NUMERIC(12, 2) NOT NULL DEFAULT 0,
    limit_period limit_period NOT NULL DEFAULT 'nenhum',
    per_discipline BOOLEAN NOT NULL DEFAULT FALSE,
    category TEXT NOT NULL DEFAULT '',
    vat_ref TEXT NOT NULL DEFAULT 'isento',
    min_year SMALLINT,
    max_year SMALLINT,
    icon TEXT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_transaction_rules_name ON transaction_rules (name) WHERE is_active;
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    group_id UUID NOT NULL,
    origin_id UUID NOT NULL REFERENCES users (id),
    destination_id UUID NOT NULL REFERENCES users (id),
    amount NUMERIC(12, 2) NOT NULL CHECK (amount > 0),
    direction transaction_direction NOT NULL,
    status transaction_status NOT NULL DEFAULT 'PENDENTE',
    origin_kind origin_kind NOT NULL DEFAULT 'USER',
    description TEXT NOT NULL,
    rejection_reason TEXT,
    vat_ref TEXT NOT NULL DEFAULT 'isento',
    rule_id UUID REFERENCES transaction_rules (id) ON DELETE SET NULL,
    discipline_id UUID REFERENCES disciplines (id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_transactions_group ON transactions (group_id);
CREATE INDEX idx_transactions_origin ON transactions (origin_id, created_at);
CREATE INDEX idx_transactions_destination ON transactions (destination_id, created_at);
CREATE INDEX idx_transactions_created ON transactions (created_at);
CREATE INDEX idx_transactions_rule ON transactions (rule_id) WHERE rule_id IS NOT NULL;
";

const RULE_USAGE_WINDOWS_SQL: &str = r"
-- Usage counters, one row per rule/origin/destination/discipline/window.
-- The committing path locks the row FOR UPDATE before checking the limit.
-- destination_id/discipline_id hold the nil UUID when the dimension does
-- not apply, so the unique index covers every key shape.
CREATE TABLE rule_usage_windows (
    id UUID PRIMARY KEY,
    rule_id UUID NOT NULL REFERENCES transaction_rules (id) ON DELETE CASCADE,
    origin_id UUID NOT NULL,
    destination_id UUID NOT NULL DEFAULT '00000000-0000-0000-0000-000000000000',
    discipline_id UUID NOT NULL DEFAULT '00000000-0000-0000-0000-000000000000',
    window_start TIMESTAMPTZ NOT NULL,
    used_amount NUMERIC(12, 2) NOT NULL DEFAULT 0,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (rule_id, origin_id, destination_id, discipline_id, window_start)
);
";

const LEGADOS_SQL: &str = r"
-- Append-only audit trail written by the 'Legado' category hook.
CREATE TABLE legados (
    id UUID PRIMARY KEY,
    student_id UUID NOT NULL REFERENCES users (id),
    grantor_id UUID NOT NULL REFERENCES users (id),
    rule_id UUID REFERENCES transaction_rules (id) ON DELETE SET NULL,
    description TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_legados_student ON legados (student_id, created_at);
";

const SETTINGS_SQL: &str = r"
CREATE TABLE settings (
    key TEXT PRIMARY KEY,
    value JSONB NOT NULL
);
";

const SEED_SETTINGS_SQL: &str = r#"
INSERT INTO settings (key, value) VALUES
    ('vat_rates', '{"normal": 23, "reduzida": 6, "isento": 0}')
ON CONFLICT (key) DO NOTHING;
"#;

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS settings CASCADE;
DROP TABLE IF EXISTS legados CASCADE;
DROP TABLE IF EXISTS rule_usage_windows CASCADE;
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS transaction_rules CASCADE;
DROP TABLE IF EXISTS discipline_enrollments CASCADE;
DROP TABLE IF EXISTS disciplines CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TYPE IF EXISTS limit_period;
DROP TYPE IF EXISTS origin_kind;
DROP TYPE IF EXISTS transaction_status;
DROP TYPE IF EXISTS transaction_direction;
DROP TYPE IF EXISTS user_role;
";
