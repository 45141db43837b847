//! Transaction status machine and row provenance.
//!
//! A transaction is either created `APROVADA` (rule-driven and system rows)
//! or `PENDENTE` and driven through approval exactly once. `APROVADA` and
//! `REJEITADA` are terminal. Rows not originated by a user (VAT settlement,
//! store counterparty) are immutable from the moment they exist.

use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Lifecycle status of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    /// Awaiting approval; no balance effect yet.
    Pendente,
    /// Approved; balance effects applied exactly once at this transition.
    Aprovada,
    /// Rejected; terminal, never affects balances.
    Rejeitada,
}

impl TransactionStatus {
    /// Returns true when no further transition is allowed.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Aprovada | Self::Rejeitada)
    }

    /// Returns the wire representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pendente => "PENDENTE",
            Self::Aprovada => "APROVADA",
            Self::Rejeitada => "REJEITADA",
        }
    }
}

/// Provenance of a ledger row.
///
/// Replaces the legacy convention of tagging generated rows through
/// description text: filtering and immutability decisions dispatch on this
/// field, never on string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OriginKind {
    /// A transfer a user asked for.
    User,
    /// The generated VAT counter-transaction routing tax to the sink account.
    VatSettlement,
    /// A generated counterpart row (store integrations).
    Counterparty,
}

impl OriginKind {
    /// Returns true for rows the system generated.
    #[must_use]
    pub const fn is_system(&self) -> bool {
        !matches!(self, Self::User)
    }

    /// Returns the wire representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::VatSettlement => "VAT_SETTLEMENT",
            Self::Counterparty => "COUNTERPARTY",
        }
    }
}

/// Stateless validator for status transitions and mutability.
pub struct StatusMachine;

impl StatusMachine {
    /// Validates the `PENDENTE → APROVADA` transition.
    ///
    /// # Errors
    ///
    /// Returns an error when the row is system-generated or already terminal;
    /// re-approving an approved row is rejected so balance effects can never
    /// apply twice.
    pub fn approve(
        current: TransactionStatus,
        kind: OriginKind,
    ) -> Result<TransactionStatus, LedgerError> {
        if kind.is_system() {
            return Err(LedgerError::SystemRowImmutable);
        }
        match current {
            TransactionStatus::Pendente => Ok(TransactionStatus::Aprovada),
            TransactionStatus::Aprovada => Err(LedgerError::AlreadyApproved),
            TransactionStatus::Rejeitada => Err(LedgerError::InvalidTransition {
                from: current,
                to: TransactionStatus::Aprovada,
            }),
        }
    }

    /// Validates the `PENDENTE → REJEITADA` transition.
    ///
    /// # Errors
    ///
    /// Returns an error when the row is system-generated, terminal, or the
    /// reason is empty.
    pub fn reject(
        current: TransactionStatus,
        kind: OriginKind,
        reason: &str,
    ) -> Result<TransactionStatus, LedgerError> {
        if kind.is_system() {
            return Err(LedgerError::SystemRowImmutable);
        }
        if reason.trim().is_empty() {
            return Err(LedgerError::RejectionReasonRequired);
        }
        match current {
            TransactionStatus::Pendente => Ok(TransactionStatus::Rejeitada),
            _ => Err(LedgerError::InvalidTransition {
                from: current,
                to: TransactionStatus::Rejeitada,
            }),
        }
    }

    /// Validates that a row may be edited or deleted.
    ///
    /// Only user-originated, still-pending rows are mutable.
    ///
    /// # Errors
    ///
    /// Returns an error for system rows and terminal rows.
    pub fn ensure_mutable(
        status: TransactionStatus,
        kind: OriginKind,
    ) -> Result<(), LedgerError> {
        if kind.is_system() {
            return Err(LedgerError::SystemRowImmutable);
        }
        if status.is_terminal() {
            return Err(LedgerError::TerminalRowImmutable(status));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approve_pending() {
        assert_eq!(
            StatusMachine::approve(TransactionStatus::Pendente, OriginKind::User).unwrap(),
            TransactionStatus::Aprovada
        );
    }

    #[test]
    fn test_approve_is_exactly_once() {
        assert!(matches!(
            StatusMachine::approve(TransactionStatus::Aprovada, OriginKind::User),
            Err(LedgerError::AlreadyApproved)
        ));
    }

    #[test]
    fn test_cannot_approve_rejected() {
        assert!(matches!(
            StatusMachine::approve(TransactionStatus::Rejeitada, OriginKind::User),
            Err(LedgerError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_reject_requires_reason() {
        assert!(matches!(
            StatusMachine::reject(TransactionStatus::Pendente, OriginKind::User, "  "),
            Err(LedgerError::RejectionReasonRequired)
        ));
        assert_eq!(
            StatusMachine::reject(TransactionStatus::Pendente, OriginKind::User, "duplicado")
                .unwrap(),
            TransactionStatus::Rejeitada
        );
    }

    #[test]
    fn test_reject_terminal_fails() {
        for status in [TransactionStatus::Aprovada, TransactionStatus::Rejeitada] {
            assert!(StatusMachine::reject(status, OriginKind::User, "motivo").is_err());
        }
    }

    #[test]
    fn test_system_rows_are_immutable() {
        for kind in [OriginKind::VatSettlement, OriginKind::Counterparty] {
            assert!(matches!(
                StatusMachine::approve(TransactionStatus::Pendente, kind),
                Err(LedgerError::SystemRowImmutable)
            ));
            assert!(matches!(
                StatusMachine::reject(TransactionStatus::Pendente, kind, "motivo"),
                Err(LedgerError::SystemRowImmutable)
            ));
            assert!(matches!(
                StatusMachine::ensure_mutable(TransactionStatus::Pendente, kind),
                Err(LedgerError::SystemRowImmutable)
            ));
        }
    }

    #[test]
    fn test_ensure_mutable() {
        assert!(StatusMachine::ensure_mutable(TransactionStatus::Pendente, OriginKind::User).is_ok());
        assert!(matches!(
            StatusMachine::ensure_mutable(TransactionStatus::Aprovada, OriginKind::User),
            Err(LedgerError::TerminalRowImmutable(TransactionStatus::Aprovada))
        ));
        assert!(matches!(
            StatusMachine::ensure_mutable(TransactionStatus::Rejeitada, OriginKind::User),
            Err(LedgerError::TerminalRowImmutable(TransactionStatus::Rejeitada))
        ));
    }

    #[test]
    fn test_origin_kind_classification() {
        assert!(!OriginKind::User.is_system());
        assert!(OriginKind::VatSettlement.is_system());
        assert!(OriginKind::Counterparty.is_system());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(TransactionStatus::Pendente.as_str(), "PENDENTE");
        assert_eq!(TransactionStatus::Aprovada.as_str(), "APROVADA");
        assert_eq!(TransactionStatus::Rejeitada.as_str(), "REJEITADA");
        assert_eq!(OriginKind::VatSettlement.as_str(), "VAT_SETTLEMENT");
    }
}
