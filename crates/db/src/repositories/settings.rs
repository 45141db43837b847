//! Settings repository for the key/value configuration store.
//!
//! Settings the ledger core depends on:
//! - `vat_rates`: map of VAT rate reference → percentage
//! - `vat_settlement_account`: the user receiving VAT counter-transactions

use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::Set, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, TransactionTrait,
};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::cache::ViewCache;
use crate::entities::settings;

/// Key of the VAT rate map.
pub const VAT_RATES_KEY: &str = "vat_rates";

/// Key of the VAT settlement account id.
pub const VAT_SINK_KEY: &str = "vat_settlement_account";

/// Error types for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Settings repository.
#[derive(Clone)]
pub struct SettingsRepository {
    db: DatabaseConnection,
    views: ViewCache,
}

impl SettingsRepository {
    /// Creates a new settings repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, views: ViewCache) -> Self {
        Self { db, views }
    }

    /// Returns every setting as a key → JSON value map.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_all(&self) -> Result<HashMap<String, Value>, SettingsError> {
        let rows = settings::Entity::find().all(&self.db).await?;
        Ok(rows.into_iter().map(|row| (row.key, row.value)).collect())
    }

    /// Upserts a batch of settings in one transaction, then invalidates the
    /// global view snapshots (VAT display values embed rate data).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn upsert_many(
        &self,
        entries: HashMap<String, Value>,
    ) -> Result<(), SettingsError> {
        let txn = self.db.begin().await?;

        for (key, value) in entries {
            let model = settings::ActiveModel {
                key: Set(key),
                value: Set(value),
            };
            settings::Entity::insert(model)
                .on_conflict(
                    OnConflict::column(settings::Column::Key)
                        .update_column(settings::Column::Value)
                        .to_owned(),
                )
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        self.views.invalidate_for_transfer(None, None);
        Ok(())
    }

    /// Returns the configured VAT rate map.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn vat_rates(&self) -> Result<HashMap<String, Decimal>, SettingsError> {
        Ok(load_vat_rates(&self.db).await?)
    }

    /// Returns the configured VAT settlement account, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn vat_settlement_account(&self) -> Result<Option<Uuid>, SettingsError> {
        Ok(load_vat_sink(&self.db).await?)
    }
}

/// Loads the VAT rate map, on any connection.
///
/// Missing or malformed entries resolve to an empty map; individual rates
/// accept JSON numbers or numeric strings.
pub(crate) async fn load_vat_rates<C: ConnectionTrait>(
    conn: &C,
) -> Result<HashMap<String, Decimal>, DbErr> {
    let row = settings::Entity::find_by_id(VAT_RATES_KEY.to_string())
        .one(conn)
        .await?;

    let Some(Value::Object(map)) = row.map(|r| r.value) else {
        return Ok(HashMap::new());
    };

    Ok(map
        .into_iter()
        .filter_map(|(name, value)| parse_rate(&value).map(|rate| (name, rate)))
        .collect())
}

/// Loads the VAT settlement account id, on any connection.
///
/// The sink is mandatory whenever a nonzero rate applies; there is no
/// fallback scan for an administrator account.
pub(crate) async fn load_vat_sink<C: ConnectionTrait>(conn: &C) -> Result<Option<Uuid>, DbErr> {
    let row = settings::Entity::find_by_id(VAT_SINK_KEY.to_string())
        .one(conn)
        .await?;

    Ok(row
        .and_then(|r| r.value.as_str().map(str::to_string))
        .and_then(|s| Uuid::parse_str(&s).ok()))
}

fn parse_rate(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_rate_accepts_numbers_and_strings() {
        assert_eq!(parse_rate(&json!(23)), Some(dec!(23)));
        assert_eq!(parse_rate(&json!(6.5)), Some(dec!(6.5)));
        assert_eq!(parse_rate(&json!("13")), Some(dec!(13)));
        assert_eq!(parse_rate(&json!(null)), None);
        assert_eq!(parse_rate(&json!([1])), None);
    }
}
