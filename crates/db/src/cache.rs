//! Injected cache handles for the rule catalog and read-side view snapshots.
//!
//! Both handles are constructed once at process start and cloned into the
//! components that need them; no module-level global is involved. The
//! relational store stays the single source of truth; everything here is a
//! disposable read accelerator the system must be correct without.

use moka::sync::Cache;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;
use valcoin_core::rules::TransactionRule;
use valcoin_shared::config::CacheConfig;

/// Single well-known key for the rule listing.
const RULES_KEY: &str = "rules:all";

/// Well-known key for the global user listing snapshot.
const USERS_KEY: &str = "users:all";

/// Well-known key for the global ledger summary snapshot.
const SUMMARY_KEY: &str = "summary:global";

/// Cache for the active rule listing.
///
/// Holds at most one entry under a fixed key, with a long TTL (an hour by
/// default); every rule mutation invalidates it eagerly.
#[derive(Clone)]
pub struct RuleCache {
    cache: Cache<&'static str, Arc<Vec<TransactionRule>>>,
}

impl RuleCache {
    /// Creates a rule cache with the configured TTL.
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(config.rules_ttl_secs))
            .build();

        Self { cache }
    }

    /// Returns the cached rule listing, if present.
    #[must_use]
    pub fn get(&self) -> Option<Arc<Vec<TransactionRule>>> {
        self.cache.get(&RULES_KEY)
    }

    /// Stores the rule listing.
    pub fn set(&self, rules: Vec<TransactionRule>) {
        self.cache.insert(RULES_KEY, Arc::new(rules));
    }

    /// Drops the cached listing.
    pub fn invalidate(&self) {
        self.cache.invalidate(&RULES_KEY);
        debug!(key = RULES_KEY, "rule cache invalidated");
    }

    /// Forces pending maintenance; used by tests to observe invalidation.
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }
}

/// Cache for read-side view snapshots (global listings, per-user dashboards).
///
/// Entries carry a short TTL (a minute by default) and are invalidated
/// eagerly after every committed ledger mutation. Invalidation is
/// best-effort and infallible; it can degrade freshness, never correctness.
#[derive(Clone)]
pub struct ViewCache {
    cache: Cache<String, Arc<Value>>,
}

impl ViewCache {
    /// Creates a view cache with the configured TTL and capacity.
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.snapshot_capacity)
            .time_to_live(Duration::from_secs(config.snapshot_ttl_secs))
            .build();

        Self { cache }
    }

    /// Key for the global user listing snapshot.
    #[must_use]
    pub fn users_key() -> String {
        USERS_KEY.to_string()
    }

    /// Key for the global ledger summary snapshot.
    #[must_use]
    pub fn summary_key() -> String {
        SUMMARY_KEY.to_string()
    }

    /// Key for a per-user dashboard snapshot.
    #[must_use]
    pub fn user_key(user_id: Uuid) -> String {
        format!("dashboard:user:{user_id}")
    }

    /// Returns the snapshot stored under `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<Value>> {
        self.cache.get(key)
    }

    /// Stores a snapshot under `key`.
    pub fn set(&self, key: String, value: Value) {
        self.cache.insert(key, Arc::new(value));
    }

    /// Deletes the well-known global keys plus the per-user snapshots of the
    /// supplied parties. Idempotent; safe to call with no parties at all.
    pub fn invalidate_for_transfer(&self, origin_id: Option<Uuid>, destination_id: Option<Uuid>) {
        let mut keys = vec![Self::users_key(), Self::summary_key()];
        if let Some(origin) = origin_id {
            keys.push(Self::user_key(origin));
        }
        if let Some(destination) = destination_id {
            keys.push(Self::user_key(destination));
        }

        for key in keys {
            self.cache.invalidate(&key);
            debug!(key = %key, "view cache invalidated");
        }
    }

    /// Forces pending maintenance; used by tests to observe invalidation.
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> CacheConfig {
        CacheConfig::default()
    }

    #[test]
    fn test_rule_cache_round_trip() {
        let cache = RuleCache::new(&config());
        assert!(cache.get().is_none());

        cache.set(vec![]);
        assert!(cache.get().is_some());

        cache.invalidate();
        cache.run_pending_tasks();
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_view_cache_round_trip() {
        let cache = ViewCache::new(&config());
        let key = ViewCache::summary_key();

        assert!(cache.get(&key).is_none());
        cache.set(key.clone(), json!({"volume": "123.00"}));
        assert_eq!(*cache.get(&key).unwrap(), json!({"volume": "123.00"}));
    }

    #[test]
    fn test_invalidate_for_transfer_clears_party_snapshots() {
        let cache = ViewCache::new(&config());
        let origin = Uuid::now_v7();
        let destination = Uuid::now_v7();
        let bystander = Uuid::now_v7();

        cache.set(ViewCache::users_key(), json!([]));
        cache.set(ViewCache::summary_key(), json!({}));
        cache.set(ViewCache::user_key(origin), json!({"balance": "10"}));
        cache.set(ViewCache::user_key(destination), json!({"balance": "20"}));
        cache.set(ViewCache::user_key(bystander), json!({"balance": "30"}));

        cache.invalidate_for_transfer(Some(origin), Some(destination));
        cache.run_pending_tasks();

        assert!(cache.get(&ViewCache::users_key()).is_none());
        assert!(cache.get(&ViewCache::summary_key()).is_none());
        assert!(cache.get(&ViewCache::user_key(origin)).is_none());
        assert!(cache.get(&ViewCache::user_key(destination)).is_none());
        // Uninvolved users keep their snapshot.
        assert!(cache.get(&ViewCache::user_key(bystander)).is_some());
    }

    #[test]
    fn test_invalidate_for_transfer_without_parties_is_idempotent() {
        let cache = ViewCache::new(&config());
        cache.set(ViewCache::users_key(), json!([]));

        cache.invalidate_for_transfer(None, None);
        cache.invalidate_for_transfer(None, None);
        cache.run_pending_tasks();

        assert!(cache.get(&ViewCache::users_key()).is_none());
    }
}
