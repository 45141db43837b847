//! Dashboard repository for cached read-side snapshots.
//!
//! Snapshots are serialized views cached under well-known keys with a short
//! TTL; every committed ledger mutation invalidates the keys of the parties
//! involved. The database remains authoritative; a cache miss always falls
//! back to a fresh query.

use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;
use valcoin_core::ledger::enrich::{EnrichedTransaction, enrich};

use super::{convert, settings, user};
use crate::cache::ViewCache;
use crate::entities::sea_orm_active_enums::{OriginKind, TransactionStatus};
use crate::entities::{transactions, users};

/// Number of recent transactions embedded in a user snapshot.
const SNAPSHOT_RECENT_LIMIT: u64 = 10;

/// Error types for dashboard operations.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// User not found.
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Snapshot serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Global ledger summary.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalSummary {
    /// Count of approved user-intent transfers.
    pub approved_count: u64,
    /// Count of transfers awaiting approval.
    pub pending_count: u64,
    /// Total approved transfer volume.
    pub approved_volume: Decimal,
    /// Count of active users.
    pub active_users: u64,
}

/// Per-user dashboard snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct UserSnapshotView {
    /// User id.
    pub user_id: Uuid,
    /// Display name.
    pub name: String,
    /// Current balance.
    pub balance: Decimal,
    /// Transfers involving the user awaiting approval.
    pub pending_count: u64,
    /// Most recent transfers involving the user, system rows excluded.
    pub recent: Vec<EnrichedTransaction>,
}

#[derive(FromQueryResult)]
struct VolumeRow {
    total: Option<Decimal>,
}

/// Dashboard repository.
#[derive(Clone)]
pub struct DashboardRepository {
    db: DatabaseConnection,
    views: ViewCache,
}

impl DashboardRepository {
    /// Creates a new dashboard repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, views: ViewCache) -> Self {
        Self { db, views }
    }

    /// Returns the global ledger summary, cached under the well-known
    /// summary key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails on a cache miss.
    pub async fn global_summary(&self) -> Result<Value, DashboardError> {
        let key = ViewCache::summary_key();
        if let Some(cached) = self.views.get(&key) {
            debug!(key = %key, "serving global summary from cache");
            return Ok(cached.as_ref().clone());
        }

        let approved_count = transactions::Entity::find()
            .filter(transactions::Column::Status.eq(TransactionStatus::Aprovada))
            .filter(transactions::Column::OriginKind.eq(OriginKind::User))
            .count(&self.db)
            .await?;

        let pending_count = transactions::Entity::find()
            .filter(transactions::Column::Status.eq(TransactionStatus::Pendente))
            .count(&self.db)
            .await?;

        let volume = transactions::Entity::find()
            .select_only()
            .column_as(transactions::Column::Amount.sum(), "total")
            .filter(transactions::Column::Status.eq(TransactionStatus::Aprovada))
            .filter(transactions::Column::OriginKind.eq(OriginKind::User))
            .into_model::<VolumeRow>()
            .one(&self.db)
            .await?
            .and_then(|row| row.total)
            .unwrap_or(Decimal::ZERO);

        let active_users = users::Entity::find()
            .filter(users::Column::IsActive.eq(true))
            .count(&self.db)
            .await?;

        let summary = GlobalSummary {
            approved_count,
            pending_count,
            approved_volume: volume,
            active_users,
        };

        let value = serde_json::to_value(summary)?;
        self.views.set(key, value.clone());
        Ok(value)
    }

    /// Returns a user's dashboard snapshot, cached under the per-user key.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::UserNotFound`] for an unknown user.
    pub async fn user_snapshot(&self, user_id: Uuid) -> Result<Value, DashboardError> {
        let key = ViewCache::user_key(user_id);
        if let Some(cached) = self.views.get(&key) {
            debug!(key = %key, "serving user snapshot from cache");
            return Ok(cached.as_ref().clone());
        }

        let user_row = users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(DashboardError::UserNotFound(user_id))?;

        let involved = Condition::any()
            .add(transactions::Column::OriginId.eq(user_id))
            .add(transactions::Column::DestinationId.eq(user_id));

        let pending_count = transactions::Entity::find()
            .filter(involved.clone())
            .filter(transactions::Column::Status.eq(TransactionStatus::Pendente))
            .count(&self.db)
            .await?;

        let recent_rows = transactions::Entity::find()
            .filter(involved)
            .filter(transactions::Column::OriginKind.eq(OriginKind::User))
            .order_by_desc(transactions::Column::CreatedAt)
            .limit(SNAPSHOT_RECENT_LIMIT)
            .all(&self.db)
            .await?;

        let mut ids: Vec<Uuid> = recent_rows
            .iter()
            .flat_map(|row| [row.origin_id, row.destination_id])
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let names = user::load_name_map(&self.db, &ids).await?;
        let rates = settings::load_vat_rates(&self.db).await?;
        let ledger_rows: Vec<_> = recent_rows.iter().map(convert::transaction_to_row).collect();

        let snapshot = UserSnapshotView {
            user_id,
            name: user_row.name,
            balance: user_row.balance,
            pending_count,
            recent: enrich(&ledger_rows, &names, &rates),
        };

        let value = serde_json::to_value(snapshot)?;
        self.views.set(key, value.clone());
        Ok(value)
    }
}
