//! `SeaORM` Entity for the rule_usage_windows counter table.
//!
//! One row per (rule, origin, destination, discipline, window start). The
//! committing path locks the row FOR UPDATE before evaluating the limit, so
//! two concurrent applications against the same window serialize instead of
//! both passing the check. Destination and discipline use the nil UUID when
//! the key dimension does not apply, keeping the unique index total.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "rule_usage_windows")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub rule_id: Uuid,
    pub origin_id: Uuid,
    pub destination_id: Uuid,
    pub discipline_id: Uuid,
    pub window_start: DateTimeWithTimeZone,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub used_amount: Decimal,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transaction_rules::Entity",
        from = "Column::RuleId",
        to = "super::transaction_rules::Column::Id"
    )]
    Rule,
}

impl ActiveModelBehavior for ActiveModel {}
