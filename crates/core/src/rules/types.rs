//! Domain types for transaction rules and the users they connect.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use valcoin_shared::types::{DisciplineId, RuleId, UserId};

/// Platform user roles.
///
/// Roles gate which rules a user may originate or receive; they carry no
/// privilege ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    /// Student.
    Aluno,
    /// Teacher.
    Professor,
    /// Administrator.
    Admin,
}

impl UserRole {
    /// Parse a role from its wire representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ALUNO" => Some(Self::Aluno),
            "PROFESSOR" => Some(Self::Professor),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Returns the wire representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Aluno => "ALUNO",
            Self::Professor => "PROFESSOR",
            Self::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction of a transfer relative to the origin user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionDirection {
    /// Value leaves the origin balance.
    Debito,
    /// Value enters the origin balance.
    Credito,
}

impl TransactionDirection {
    /// Returns the wire representation of the direction.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debito => "DEBITO",
            Self::Credito => "CREDITO",
        }
    }
}

/// Period unit for a rule's usage limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitPeriod {
    /// No period limit.
    Nenhum,
    /// Resets every day.
    Diario,
    /// Resets every ISO week.
    Semanal,
    /// Resets every calendar month.
    Mensal,
    /// Resets every calendar year.
    Anual,
}

impl LimitPeriod {
    /// Returns true when no window applies.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::Nenhum)
    }

    /// Returns the wire representation of the period.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Nenhum => "nenhum",
            Self::Diario => "diario",
            Self::Semanal => "semanal",
            Self::Mensal => "mensal",
            Self::Anual => "anual",
        }
    }
}

impl Default for LimitPeriod {
    fn default() -> Self {
        Self::Nenhum
    }
}

impl std::fmt::Display for LimitPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named, pre-authorized transaction template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRule {
    /// Rule identifier.
    pub id: RuleId,
    /// Display name; catalog listings sort on it.
    pub name: String,
    /// Fixed transfer amount.
    pub amount: Decimal,
    /// Direction of the transfer.
    pub direction: TransactionDirection,
    /// Role the origin user must hold.
    pub origin_role: UserRole,
    /// Role the destination user must hold.
    pub destination_role: UserRole,
    /// Usage ceiling per window; `0` disables the limit.
    pub limit_amount: Decimal,
    /// Window unit for the usage ceiling.
    pub limit_period: LimitPeriod,
    /// Whether the limit is tracked per discipline (and a discipline is required).
    pub per_discipline: bool,
    /// Free-form category tag; some categories carry post-commit hooks.
    pub category: String,
    /// VAT rate reference resolved through settings.
    pub vat_ref: String,
    /// Minimum school year of the destination, informational.
    pub min_year: Option<i16>,
    /// Maximum school year of the destination, informational.
    pub max_year: Option<i16>,
    /// Icon hint for clients.
    pub icon: Option<String>,
    /// Inactive rules cannot be applied.
    pub is_active: bool,
}

impl TransactionRule {
    /// Returns true when a usage limit is configured.
    #[must_use]
    pub fn has_limit(&self) -> bool {
        self.limit_amount > Decimal::ZERO && !self.limit_period.is_none()
    }
}

/// The slice of a user row the applicability checker needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSnapshot {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Platform role.
    pub role: UserRole,
    /// Current ValCoin balance.
    pub balance: Decimal,
    /// Inactive users cannot take part in transfers.
    pub is_active: bool,
}

/// The slice of a discipline row the applicability checker needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisciplineSnapshot {
    /// Discipline identifier.
    pub id: DisciplineId,
    /// Inactive disciplines cannot scope a transfer.
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_role_parse() {
        assert_eq!(UserRole::parse("ALUNO"), Some(UserRole::Aluno));
        assert_eq!(UserRole::parse("professor"), Some(UserRole::Professor));
        assert_eq!(UserRole::parse("Admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::parse("invalid"), None);
    }

    #[test]
    fn test_role_round_trip() {
        for role in [UserRole::Aluno, UserRole::Professor, UserRole::Admin] {
            assert_eq!(UserRole::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn test_limit_period_wire_names() {
        assert_eq!(LimitPeriod::Nenhum.as_str(), "nenhum");
        assert_eq!(LimitPeriod::Diario.as_str(), "diario");
        assert_eq!(LimitPeriod::Semanal.as_str(), "semanal");
        assert_eq!(LimitPeriod::Mensal.as_str(), "mensal");
        assert_eq!(LimitPeriod::Anual.as_str(), "anual");
    }

    #[test]
    fn test_has_limit() {
        let mut rule = TransactionRule {
            id: RuleId::new(),
            name: "Bónus".to_string(),
            amount: dec!(10),
            direction: TransactionDirection::Credito,
            origin_role: UserRole::Professor,
            destination_role: UserRole::Aluno,
            limit_amount: dec!(20),
            limit_period: LimitPeriod::Diario,
            per_discipline: false,
            category: "Mérito".to_string(),
            vat_ref: "isento".to_string(),
            min_year: None,
            max_year: None,
            icon: None,
            is_active: true,
        };
        assert!(rule.has_limit());

        rule.limit_amount = Decimal::ZERO;
        assert!(!rule.has_limit());

        rule.limit_amount = dec!(20);
        rule.limit_period = LimitPeriod::Nenhum;
        assert!(!rule.has_limit());
    }
}
