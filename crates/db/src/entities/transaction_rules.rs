//! `SeaORM` Entity for the transaction_rules table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{LimitPeriod, TransactionDirection, UserRole};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transaction_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    pub direction: TransactionDirection,
    pub origin_role: UserRole,
    pub destination_role: UserRole,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub limit_amount: Decimal,
    pub limit_period: LimitPeriod,
    pub per_discipline: bool,
    pub category: String,
    pub vat_ref: String,
    pub min_year: Option<i16>,
    pub max_year: Option<i16>,
    pub icon: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
