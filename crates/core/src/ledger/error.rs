//! Ledger error types for state and integrity violations.

use thiserror::Error;
use valcoin_shared::types::TransactionId;

use super::status::TransactionStatus;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== State Errors ==========
    /// Transaction is already approved; balance effects apply exactly once.
    #[error("Transaction already approved")]
    AlreadyApproved,

    /// Invalid status transition.
    #[error("Cannot transition transaction from {from:?} to {to:?}")]
    InvalidTransition {
        /// Status the row currently holds.
        from: TransactionStatus,
        /// Status the caller asked for.
        to: TransactionStatus,
    },

    /// Rejections must carry a reason.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    // ========== Integrity Errors ==========
    /// System-generated rows cannot be edited, deleted, or re-driven.
    #[error("Cannot modify system-generated transaction")]
    SystemRowImmutable,

    /// Approved and rejected rows cannot be edited or deleted.
    #[error("Cannot modify transaction in terminal status {0:?}")]
    TerminalRowImmutable(TransactionStatus),

    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    // ========== Configuration Errors ==========
    /// A nonzero VAT rate applies but no settlement account is configured.
    #[error("VAT settlement account is not configured")]
    VatSinkNotConfigured,

    // ========== Infrastructure Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyApproved => "ALREADY_APPROVED",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::SystemRowImmutable => "SYSTEM_ROW_IMMUTABLE",
            Self::TerminalRowImmutable(_) => "TERMINAL_ROW_IMMUTABLE",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::VatSinkNotConfigured => "VAT_SINK_NOT_CONFIGURED",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::AlreadyApproved
            | Self::InvalidTransition { .. }
            | Self::RejectionReasonRequired => 400,
            Self::SystemRowImmutable | Self::TerminalRowImmutable(_) => 422,
            Self::TransactionNotFound(_) => 404,
            Self::VatSinkNotConfigured | Self::Database(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::AlreadyApproved.error_code(), "ALREADY_APPROVED");
        assert_eq!(
            LedgerError::SystemRowImmutable.error_code(),
            "SYSTEM_ROW_IMMUTABLE"
        );
        assert_eq!(
            LedgerError::VatSinkNotConfigured.error_code(),
            "VAT_SINK_NOT_CONFIGURED"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::AlreadyApproved.http_status_code(), 400);
        assert_eq!(LedgerError::SystemRowImmutable.http_status_code(), 422);
        assert_eq!(
            LedgerError::TransactionNotFound(TransactionId::new()).http_status_code(),
            404
        );
        assert_eq!(
            LedgerError::Database("boom".to_string()).http_status_code(),
            500
        );
    }
}
