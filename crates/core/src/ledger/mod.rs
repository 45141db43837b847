//! Ledger domain logic.
//!
//! This module implements the transaction side of the ledger:
//! - Transaction status machine (PENDENTE → APROVADA / REJEITADA)
//! - Origin kinds distinguishing user rows from system-generated rows
//! - VAT split computation
//! - Read-side display enrichment
//! - Error types for ledger operations

pub mod enrich;
pub mod error;
pub mod status;
pub mod vat;

#[cfg(test)]
mod vat_props;

pub use enrich::{EnrichedTransaction, LedgerRow, enrich};
pub use error::LedgerError;
pub use status::{OriginKind, StatusMachine, TransactionStatus};
pub use vat::{VAT_EXEMPT_REF, VatBreakdown, rate_for, split_gross};
