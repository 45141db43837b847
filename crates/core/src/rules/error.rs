//! Structured reasons why a rule cannot be applied.

use rust_decimal::Decimal;
use thiserror::Error;
use valcoin_shared::types::{DisciplineId, UserId};

use super::types::{LimitPeriod, UserRole};

/// Hard failures raised by the applicability checker.
///
/// The dry-run path collects every violation; the committing gate aborts on
/// the first one. Both paths produce values of this type so the two can
/// never disagree on what counts as a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    /// Rule is deactivated.
    #[error("Regra está desativada")]
    RuleInactive,

    /// Origin user does not exist.
    #[error("Utilizador de origem não encontrado: {0}")]
    OriginNotFound(UserId),

    /// Origin user is deactivated.
    #[error("Utilizador de origem não está ativo")]
    OriginInactive,

    /// Origin user holds the wrong role.
    #[error("Origem deve ser {required}, mas é {actual}")]
    OriginRoleMismatch {
        /// Role the rule allows as origin.
        required: UserRole,
        /// Role the user actually holds.
        actual: UserRole,
    },

    /// Destination user does not exist.
    #[error("Utilizador de destino não encontrado: {0}")]
    DestinationNotFound(UserId),

    /// Destination user is deactivated.
    #[error("Utilizador de destino não está ativo")]
    DestinationInactive,

    /// Destination user holds the wrong role.
    #[error("Destino deve ser {required}, mas é {actual}")]
    DestinationRoleMismatch {
        /// Role the rule allows as destination.
        required: UserRole,
        /// Role the user actually holds.
        actual: UserRole,
    },

    /// Origin and destination are the same user.
    #[error("Utilizador destino deve ser diferente do utilizador origem")]
    SelfTransfer,

    /// The rule is scoped per discipline but none was supplied.
    #[error("Disciplina é obrigatória para esta regra")]
    DisciplineRequired,

    /// The supplied discipline does not exist.
    #[error("Disciplina não encontrada: {0}")]
    DisciplineNotFound(DisciplineId),

    /// The supplied discipline is deactivated.
    #[error("Disciplina não está ativa: {0}")]
    DisciplineInactive(DisciplineId),

    /// The destination is not enrolled in the supplied discipline.
    #[error("Aluno não está inscrito na disciplina especificada")]
    NotEnrolled,

    /// Origin balance does not cover a debit.
    #[error("Saldo insuficiente ({balance}/{required})")]
    InsufficientBalance {
        /// Current origin balance.
        balance: Decimal,
        /// Amount the rule would debit.
        required: Decimal,
    },

    /// The configured usage ceiling for the current window is exhausted.
    #[error("Limite de {limit} ValCoins por {period} excedido. Total atual: {used}")]
    LimitExceeded {
        /// Configured ceiling.
        limit: Decimal,
        /// Amount already used in the window.
        used: Decimal,
        /// Window unit.
        period: LimitPeriod,
    },
}

impl RuleViolation {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::RuleInactive => "RULE_INACTIVE",
            Self::OriginNotFound(_) => "ORIGIN_NOT_FOUND",
            Self::OriginInactive => "ORIGIN_INACTIVE",
            Self::OriginRoleMismatch { .. } => "ORIGIN_ROLE_MISMATCH",
            Self::DestinationNotFound(_) => "DESTINATION_NOT_FOUND",
            Self::DestinationInactive => "DESTINATION_INACTIVE",
            Self::DestinationRoleMismatch { .. } => "DESTINATION_ROLE_MISMATCH",
            Self::SelfTransfer => "SELF_TRANSFER",
            Self::DisciplineRequired => "DISCIPLINE_REQUIRED",
            Self::DisciplineNotFound(_) => "DISCIPLINE_NOT_FOUND",
            Self::DisciplineInactive(_) => "DISCIPLINE_INACTIVE",
            Self::NotEnrolled => "NOT_ENROLLED",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::LimitExceeded { .. } => "LIMIT_EXCEEDED",
        }
    }
}

/// Soft signals attached to an otherwise applicable request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleWarning {
    /// The origin balance will be nearly empty after the debit.
    #[error("Saldo ficará baixo após esta transação")]
    LowBalanceAfterDebit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_violation_messages() {
        let v = RuleViolation::InsufficientBalance {
            balance: dec!(5),
            required: dec!(10),
        };
        assert_eq!(v.to_string(), "Saldo insuficiente (5/10)");

        let v = RuleViolation::LimitExceeded {
            limit: dec!(20),
            used: dec!(15),
            period: LimitPeriod::Diario,
        };
        assert_eq!(
            v.to_string(),
            "Limite de 20 ValCoins por diario excedido. Total atual: 15"
        );
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(RuleViolation::RuleInactive.error_code(), "RULE_INACTIVE");
        assert_eq!(RuleViolation::SelfTransfer.error_code(), "SELF_TRANSFER");
        assert_eq!(
            RuleViolation::LimitExceeded {
                limit: dec!(1),
                used: dec!(1),
                period: LimitPeriod::Mensal,
            }
            .error_code(),
            "LIMIT_EXCEEDED"
        );
    }
}
