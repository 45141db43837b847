//! User repository for database operations.
//!
//! User rows are owned by the identity subsystem. The ledger reads them for
//! validation and display, and mutates `balance` strictly through arithmetic
//! column updates so concurrent writers serialize at the database.

use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;
use valcoin_core::rules::types::UserSnapshot;
use valcoin_shared::types::UserId;

use super::convert;
use crate::cache::ViewCache;
use crate::entities::users;

/// Error types for user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Listing serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One row of the user listing.
#[derive(Debug, Clone, Serialize)]
pub struct UserListItem {
    /// User id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Role wire value.
    pub role: String,
    /// Current balance.
    pub balance: Decimal,
    /// Active flag.
    pub is_active: bool,
}

/// User repository for read operations.
#[derive(Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
    views: ViewCache,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, views: ViewCache) -> Self {
        Self { db, views }
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Loads the applicability snapshot for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn snapshot(&self, id: Uuid) -> Result<Option<UserSnapshot>, DbErr> {
        load_snapshot(&self.db, id).await
    }

    /// Resolves display names for a set of users.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn name_map(&self, ids: &[Uuid]) -> Result<HashMap<UserId, String>, DbErr> {
        load_name_map(&self.db, ids).await
    }

    /// Lists active users with balances, name-sorted, cached under the
    /// global users key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails on a cache miss.
    pub async fn list_active(&self) -> Result<serde_json::Value, UserError> {
        let key = ViewCache::users_key();
        if let Some(cached) = self.views.get(&key) {
            debug!(key = %key, "serving user listing from cache");
            return Ok(cached.as_ref().clone());
        }

        let rows = users::Entity::find()
            .filter(users::Column::IsActive.eq(true))
            .order_by_asc(users::Column::Name)
            .all(&self.db)
            .await?;

        let items: Vec<UserListItem> = rows
            .into_iter()
            .map(|u| UserListItem {
                id: u.id,
                name: u.name,
                role: convert::role_to_core(&u.role).as_str().to_string(),
                balance: u.balance,
                is_active: u.is_active,
            })
            .collect();

        let value = serde_json::to_value(items)?;
        self.views.set(key, value.clone());
        Ok(value)
    }
}

/// Loads the applicability snapshot for a user, on any connection.
pub(crate) async fn load_snapshot<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<Option<UserSnapshot>, DbErr> {
    let user = users::Entity::find_by_id(id).one(conn).await?;
    Ok(user.as_ref().map(convert::user_to_snapshot))
}

/// Resolves display names for a set of users, on any connection.
pub(crate) async fn load_name_map<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
) -> Result<HashMap<UserId, String>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = users::Entity::find()
        .filter(users::Column::Id.is_in(ids.iter().copied()))
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|u| (UserId::from_uuid(u.id), u.name))
        .collect())
}

/// Applies a balance delta with an in-place arithmetic update.
///
/// `UPDATE users SET balance = balance + delta WHERE id = $1`. Never
/// read-modify-write in application memory, so concurrent debits and credits
/// against the same account serialize correctly at the database.
pub(crate) async fn apply_balance_delta<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    delta: Decimal,
) -> Result<(), DbErr> {
    users::Entity::update_many()
        .col_expr(
            users::Column::Balance,
            Expr::col(users::Column::Balance).add(delta),
        )
        .col_expr(
            users::Column::UpdatedAt,
            Expr::current_timestamp().into(),
        )
        .filter(users::Column::Id.eq(user_id))
        .exec(conn)
        .await?;

    Ok(())
}
