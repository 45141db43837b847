//! `SeaORM` entity definitions.

pub mod discipline_enrollments;
pub mod disciplines;
pub mod legados;
pub mod rule_usage_windows;
pub mod sea_orm_active_enums;
pub mod settings;
pub mod transaction_rules;
pub mod transactions;
pub mod users;
