//! `SeaORM` active enums mapping Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Platform user role.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
pub enum UserRole {
    /// Student.
    #[sea_orm(string_value = "ALUNO")]
    Aluno,
    /// Teacher.
    #[sea_orm(string_value = "PROFESSOR")]
    Professor,
    /// Administrator.
    #[sea_orm(string_value = "ADMIN")]
    Admin,
}

/// Transfer direction relative to the origin user.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_direction")]
pub enum TransactionDirection {
    /// Value leaves the origin balance.
    #[sea_orm(string_value = "DEBITO")]
    Debito,
    /// Value enters the origin balance.
    #[sea_orm(string_value = "CREDITO")]
    Credito,
}

/// Lifecycle status of a ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_status")]
pub enum TransactionStatus {
    /// Awaiting approval.
    #[sea_orm(string_value = "PENDENTE")]
    Pendente,
    /// Approved; terminal.
    #[sea_orm(string_value = "APROVADA")]
    Aprovada,
    /// Rejected; terminal.
    #[sea_orm(string_value = "REJEITADA")]
    Rejeitada,
}

/// Provenance of a ledger row.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "origin_kind")]
pub enum OriginKind {
    /// A transfer a user asked for.
    #[sea_orm(string_value = "USER")]
    User,
    /// Generated VAT counter-transaction.
    #[sea_orm(string_value = "VAT_SETTLEMENT")]
    VatSettlement,
    /// Generated counterpart row (store integrations).
    #[sea_orm(string_value = "COUNTERPARTY")]
    Counterparty,
}

/// Period unit for a rule's usage limit.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "limit_period")]
pub enum LimitPeriod {
    /// No period limit.
    #[sea_orm(string_value = "nenhum")]
    Nenhum,
    /// Resets every day.
    #[sea_orm(string_value = "diario")]
    Diario,
    /// Resets every ISO week.
    #[sea_orm(string_value = "semanal")]
    Semanal,
    /// Resets every calendar month.
    #[sea_orm(string_value = "mensal")]
    Mensal,
    /// Resets every calendar year.
    #[sea_orm(string_value = "anual")]
    Anual,
}
