//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application.

mod convert;
pub mod dashboard;
mod discipline;
pub mod legado;
pub mod rule;
pub mod settings;
pub mod transaction;
mod usage;
pub mod user;

pub use dashboard::{DashboardError, DashboardRepository, GlobalSummary, UserSnapshotView};
pub use legado::LegadoRepository;
pub use rule::{ApplicableRule, CreateRuleInput, RuleError, RuleRepository, UpdateRuleInput};
pub use settings::{SettingsError, SettingsRepository, VAT_RATES_KEY, VAT_SINK_KEY};
pub use transaction::{
    ApplyRuleInput, CheckApplicabilityInput, ManualTransactionInput, TimeFilter,
    TransactionError, TransactionFilter, TransactionRepository, TransferOutcome,
    UpdateTransactionInput,
};
pub use user::{UserError, UserListItem, UserRepository};
