//! Two-tier user id → display name cache.
//!
//! Lookups go memory → SQLite (7 day TTL) → `users.info`. Successful remote
//! lookups are written through to both tiers. A failed lookup leaves a
//! placeholder in memory only so that a transient error never reaches disk.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, trace, warn};

use slackterm_net::{RateLimiter, SlackApi};
use slackterm_shared::constants::unknown_user;
use slackterm_shared::protocol::RawUser;
use slackterm_store::Database;

use crate::error::UnresolvedUser;

pub struct IdentityCache {
    api: Arc<dyn SlackApi>,
    limiter: RateLimiter,
    memory: RwLock<HashMap<String, String>>,
    store: Option<Mutex<Database>>,
}

impl IdentityCache {
    pub fn new(api: Arc<dyn SlackApi>, limiter: RateLimiter, store: Database) -> Self {
        Self {
            api,
            limiter,
            memory: RwLock::new(HashMap::new()),
            store: Some(Mutex::new(store)),
        }
    }

    /// In-process tier only. Used when the durable cache cannot be opened.
    pub fn without_store(api: Arc<dyn SlackApi>, limiter: RateLimiter) -> Self {
        Self {
            api,
            limiter,
            memory: RwLock::new(HashMap::new()),
            store: None,
        }
    }

    /// Open the durable tier in the user cache directory, degrading to the
    /// in-process tier if that fails.
    pub fn open_default(api: Arc<dyn SlackApi>, limiter: RateLimiter) -> Self {
        match Database::open_default() {
            Ok(db) => Self::new(api, limiter, db),
            Err(e) => {
                warn!(error = %e, "Identity cache unavailable, caching in memory only");
                Self::without_store(api, limiter)
            }
        }
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Seed the in-process tier, e.g. with the current user after login.
    pub fn prime(&self, user_id: &str, display_name: &str) {
        if let Ok(mut memory) = self.memory.write() {
            memory.insert(user_id.to_string(), display_name.to_string());
        }
    }

    pub async fn resolve(&self, user_id: &str) -> Result<String, UnresolvedUser> {
        if let Some(name) = self.from_memory(user_id) {
            trace!(user_id, "identity cache hit (memory)");
            return Ok(name);
        }

        if let Some(name) = self.from_store(user_id) {
            trace!(user_id, "identity cache hit (store)");
            self.prime(user_id, &name);
            return Ok(name);
        }

        debug!(user_id, "identity cache miss");
        self.limiter.acquire().await;

        match self.api.user_info(user_id).await {
            Ok(user) => {
                let name = display_name(&user, user_id);
                self.prime(user_id, &name);
                self.persist(user_id, &name);
                Ok(name)
            }
            Err(source) => {
                let placeholder = unknown_user(user_id);
                warn!(user_id, error = %source, "user lookup failed");
                self.prime(user_id, &placeholder);
                Err(UnresolvedUser {
                    placeholder,
                    source,
                })
            }
        }
    }

    /// Like [`resolve`](Self::resolve) but always yields a name.
    pub async fn resolve_or_placeholder(&self, user_id: &str) -> String {
        match self.resolve(user_id).await {
            Ok(name) => name,
            Err(unresolved) => unresolved.placeholder,
        }
    }

    fn from_memory(&self, user_id: &str) -> Option<String> {
        self.memory.read().ok()?.get(user_id).cloned()
    }

    fn from_store(&self, user_id: &str) -> Option<String> {
        let db = self.store.as_ref()?.lock().ok()?;
        match db.get_fresh_user(user_id) {
            Ok(found) => found.map(|identity| identity.display_name),
            Err(e) => {
                warn!(user_id, error = %e, "identity store read failed");
                None
            }
        }
    }

    fn persist(&self, user_id: &str, name: &str) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let Ok(db) = store.lock() else {
            return;
        };
        if let Err(e) = db.upsert_user(user_id, name) {
            warn!(user_id, error = %e, "identity store write failed");
        }
    }
}

fn display_name(user: &RawUser, user_id: &str) -> String {
    if !user.name.is_empty() {
        user.name.clone()
    } else if !user.real_name.is_empty() {
        user.real_name.clone()
    } else {
        unknown_user(user_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use chrono::Utc;

    use slackterm_shared::constants::IDENTITY_TTL_SECS;

    use super::*;
    use crate::test_utils::MockSlackApi;

    fn cache_with(api: MockSlackApi) -> (Arc<MockSlackApi>, IdentityCache) {
        let api = Arc::new(api);
        let db = Database::open_in_memory().unwrap();
        let cache = IdentityCache::new(api.clone(), RateLimiter::default(), db);
        (api, cache)
    }

    fn stored_name(cache: &IdentityCache, user_id: &str) -> Option<String> {
        let db = cache.store.as_ref().unwrap().lock().unwrap();
        db.get_user(user_id).unwrap().map(|u| u.display_name)
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let (api, cache) = cache_with(MockSlackApi::default().with_user("U1", "alice"));

        assert_eq!(cache.resolve("U1").await.unwrap(), "alice");
        assert_eq!(cache.resolve("U1").await.unwrap(), "alice");
        assert_eq!(api.calls.user_info.load(Ordering::SeqCst), 1);
        assert_eq!(stored_name(&cache, "U1").as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_fresh_store_row_skips_remote() {
        let (api, cache) = cache_with(MockSlackApi::default().with_user("U1", "alice"));
        {
            let db = cache.store.as_ref().unwrap().lock().unwrap();
            db.upsert_user("U1", "alice-cached").unwrap();
        }

        assert_eq!(cache.resolve("U1").await.unwrap(), "alice-cached");
        assert_eq!(api.calls.user_info.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stale_store_row_is_re_resolved() {
        let (api, cache) = cache_with(MockSlackApi::default().with_user("U1", "alice"));
        {
            let db = cache.store.as_ref().unwrap().lock().unwrap();
            let eight_days_ago = Utc::now().timestamp() - IDENTITY_TTL_SECS - 24 * 60 * 60;
            db.upsert_user_at("U1", "old-alice", eight_days_ago).unwrap();
        }

        assert_eq!(cache.resolve("U1").await.unwrap(), "alice");
        assert_eq!(api.calls.user_info.load(Ordering::SeqCst), 1);
        assert_eq!(stored_name(&cache, "U1").as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_failed_lookup_yields_placeholder_without_store_row() {
        let (api, cache) = cache_with(MockSlackApi::default());

        let err = cache.resolve("U999").await.unwrap_err();
        assert_eq!(err.placeholder, "unknown (U999)");
        assert!(stored_name(&cache, "U999").is_none());

        // The placeholder now lives in memory, so no second remote call.
        assert_eq!(cache.resolve_or_placeholder("U999").await, "unknown (U999)");
        assert_eq!(api.calls.user_info.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_without_store_and_prime() {
        let api = Arc::new(MockSlackApi::default().with_user("U1", "alice"));
        let cache = IdentityCache::without_store(api.clone(), RateLimiter::default());
        assert!(!cache.has_store());

        cache.prime("U0", "me");
        assert_eq!(cache.resolve("U0").await.unwrap(), "me");
        assert_eq!(cache.resolve("U1").await.unwrap(), "alice");
        assert_eq!(api.calls.user_info.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_store_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.db");
        let api = Arc::new(MockSlackApi::default().with_user("U1", "alice"));

        let first = IdentityCache::new(
            api.clone(),
            RateLimiter::default(),
            Database::open_at(&path).unwrap(),
        );
        first.resolve("U1").await.unwrap();
        drop(first);

        let second = IdentityCache::new(
            api.clone(),
            RateLimiter::default(),
            Database::open_at(&path).unwrap(),
        );
        assert_eq!(second.resolve("U1").await.unwrap(), "alice");
        assert_eq!(api.calls.user_info.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_display_name_fallbacks() {
        let named = RawUser {
            name: "alice".into(),
            real_name: "Alice A".into(),
            ..Default::default()
        };
        let real_only = RawUser {
            real_name: "Bob B".into(),
            ..Default::default()
        };
        assert_eq!(display_name(&named, "U1"), "alice");
        assert_eq!(display_name(&real_only, "U2"), "Bob B");
        assert_eq!(display_name(&RawUser::default(), "U3"), "unknown (U3)");
    }
}
