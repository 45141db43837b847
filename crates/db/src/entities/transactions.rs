//! `SeaORM` Entity for the transactions table.
//!
//! Rows are append-mostly: `PENDENTE` rows may be edited or deleted, rows in
//! a terminal status and system-generated rows may not.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{OriginKind, TransactionDirection, TransactionStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub group_id: Uuid,
    pub origin_id: Uuid,
    pub destination_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    pub direction: TransactionDirection,
    pub status: TransactionStatus,
    pub origin_kind: OriginKind,
    pub description: String,
    pub rejection_reason: Option<String>,
    pub vat_ref: String,
    pub rule_id: Option<Uuid>,
    pub discipline_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OriginId",
        to = "super::users::Column::Id"
    )]
    OriginUser,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::DestinationId",
        to = "super::users::Column::Id"
    )]
    DestinationUser,
    #[sea_orm(
        belongs_to = "super::transaction_rules::Entity",
        from = "Column::RuleId",
        to = "super::transaction_rules::Column::Id"
    )]
    Rule,
}

impl ActiveModelBehavior for ActiveModel {}
