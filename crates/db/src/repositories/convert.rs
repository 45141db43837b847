//! Conversions between `SeaORM` entity types and core domain types.

use valcoin_core::ledger::enrich::LedgerRow;
use valcoin_core::ledger::{OriginKind, TransactionStatus};
use valcoin_core::rules::types::{
    LimitPeriod, TransactionDirection, TransactionRule, UserRole, UserSnapshot,
};
use valcoin_shared::types::{
    DisciplineId, RuleId, TransactionGroupId, TransactionId, UserId,
};

use crate::entities::sea_orm_active_enums as db_enums;
use crate::entities::{transaction_rules, transactions, users};

pub(crate) fn role_to_core(role: &db_enums::UserRole) -> UserRole {
    match role {
        db_enums::UserRole::Aluno => UserRole::Aluno,
        db_enums::UserRole::Professor => UserRole::Professor,
        db_enums::UserRole::Admin => UserRole::Admin,
    }
}

pub(crate) fn role_from_core(role: UserRole) -> db_enums::UserRole {
    match role {
        UserRole::Aluno => db_enums::UserRole::Aluno,
        UserRole::Professor => db_enums::UserRole::Professor,
        UserRole::Admin => db_enums::UserRole::Admin,
    }
}

pub(crate) fn direction_to_core(direction: &db_enums::TransactionDirection) -> TransactionDirection {
    match direction {
        db_enums::TransactionDirection::Debito => TransactionDirection::Debito,
        db_enums::TransactionDirection::Credito => TransactionDirection::Credito,
    }
}

pub(crate) fn direction_from_core(direction: TransactionDirection) -> db_enums::TransactionDirection {
    match direction {
        TransactionDirection::Debito => db_enums::TransactionDirection::Debito,
        TransactionDirection::Credito => db_enums::TransactionDirection::Credito,
    }
}

pub(crate) fn status_to_core(status: &db_enums::TransactionStatus) -> TransactionStatus {
    match status {
        db_enums::TransactionStatus::Pendente => TransactionStatus::Pendente,
        db_enums::TransactionStatus::Aprovada => TransactionStatus::Aprovada,
        db_enums::TransactionStatus::Rejeitada => TransactionStatus::Rejeitada,
    }
}

pub(crate) fn status_from_core(status: TransactionStatus) -> db_enums::TransactionStatus {
    match status {
        TransactionStatus::Pendente => db_enums::TransactionStatus::Pendente,
        TransactionStatus::Aprovada => db_enums::TransactionStatus::Aprovada,
        TransactionStatus::Rejeitada => db_enums::TransactionStatus::Rejeitada,
    }
}

pub(crate) fn kind_to_core(kind: &db_enums::OriginKind) -> OriginKind {
    match kind {
        db_enums::OriginKind::User => OriginKind::User,
        db_enums::OriginKind::VatSettlement => OriginKind::VatSettlement,
        db_enums::OriginKind::Counterparty => OriginKind::Counterparty,
    }
}

pub(crate) fn period_to_core(period: &db_enums::LimitPeriod) -> LimitPeriod {
    match period {
        db_enums::LimitPeriod::Nenhum => LimitPeriod::Nenhum,
        db_enums::LimitPeriod::Diario => LimitPeriod::Diario,
        db_enums::LimitPeriod::Semanal => LimitPeriod::Semanal,
        db_enums::LimitPeriod::Mensal => LimitPeriod::Mensal,
        db_enums::LimitPeriod::Anual => LimitPeriod::Anual,
    }
}

pub(crate) fn period_from_core(period: LimitPeriod) -> db_enums::LimitPeriod {
    match period {
        LimitPeriod::Nenhum => db_enums::LimitPeriod::Nenhum,
        LimitPeriod::Diario => db_enums::LimitPeriod::Diario,
        LimitPeriod::Semanal => db_enums::LimitPeriod::Semanal,
        LimitPeriod::Mensal => db_enums::LimitPeriod::Mensal,
        LimitPeriod::Anual => db_enums::LimitPeriod::Anual,
    }
}

pub(crate) fn rule_to_core(model: &transaction_rules::Model) -> TransactionRule {
    TransactionRule {
        id: RuleId::from_uuid(model.id),
        name: model.name.clone(),
        amount: model.amount,
        direction: direction_to_core(&model.direction),
        origin_role: role_to_core(&model.origin_role),
        destination_role: role_to_core(&model.destination_role),
        limit_amount: model.limit_amount,
        limit_period: period_to_core(&model.limit_period),
        per_discipline: model.per_discipline,
        category: model.category.clone(),
        vat_ref: model.vat_ref.clone(),
        min_year: model.min_year,
        max_year: model.max_year,
        icon: model.icon.clone(),
        is_active: model.is_active,
    }
}

pub(crate) fn user_to_snapshot(model: &users::Model) -> UserSnapshot {
    UserSnapshot {
        id: UserId::from_uuid(model.id),
        name: model.name.clone(),
        role: role_to_core(&model.role),
        balance: model.balance,
        is_active: model.is_active,
    }
}

pub(crate) fn transaction_to_row(model: &transactions::Model) -> LedgerRow {
    LedgerRow {
        id: TransactionId::from_uuid(model.id),
        group_id: TransactionGroupId::from_uuid(model.group_id),
        origin_id: UserId::from_uuid(model.origin_id),
        destination_id: UserId::from_uuid(model.destination_id),
        amount: model.amount,
        direction: direction_to_core(&model.direction),
        status: status_to_core(&model.status),
        origin_kind: kind_to_core(&model.origin_kind),
        description: model.description.clone(),
        vat_ref: model.vat_ref.clone(),
        rule_id: model.rule_id.map(RuleId::from_uuid),
        discipline_id: model.discipline_id.map(DisciplineId::from_uuid),
        created_at: model.created_at.to_utc(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [UserRole::Aluno, UserRole::Professor, UserRole::Admin] {
            assert_eq!(role_to_core(&role_from_core(role)), role);
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            TransactionStatus::Pendente,
            TransactionStatus::Aprovada,
            TransactionStatus::Rejeitada,
        ] {
            assert_eq!(status_to_core(&status_from_core(status)), status);
        }
    }

    #[test]
    fn test_period_round_trip() {
        for period in [
            LimitPeriod::Nenhum,
            LimitPeriod::Diario,
            LimitPeriod::Semanal,
            LimitPeriod::Mensal,
            LimitPeriod::Anual,
        ] {
            assert_eq!(period_to_core(&period_from_core(period)), period);
        }
    }
}
