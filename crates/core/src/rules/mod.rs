//! Transaction rule catalog and applicability checking.
//!
//! This module implements the rule-application side of the ledger:
//! - Rule and user domain types
//! - The applicability checker (dry run and pre-commit gate share one path)
//! - Period limit window computation
//! - Post-commit hooks keyed by rule category

pub mod applicability;
pub mod error;
pub mod hooks;
pub mod types;
pub mod window;

#[cfg(test)]
mod applicability_props;

pub use applicability::{ApplicabilityReport, LimitStatus, RuleContext, evaluate};
pub use error::{RuleViolation, RuleWarning};
pub use hooks::{PostCommitHook, hook_for_category};
pub use types::{
    DisciplineSnapshot, LimitPeriod, TransactionDirection, TransactionRule, UserRole, UserSnapshot,
};
pub use window::window_start;
