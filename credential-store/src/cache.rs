use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::model::ApiKey;

/// Bounded-lifetime cache entry populated by successful validations
///: a 5-minute TTL, synchronous local
/// invalidation on revoke, TTL-only invalidation for peer nodes.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone)]
struct CacheEntry {
    key: ApiKey,
    inserted_at: Instant,
}

#[derive(Clone, Default)]
pub struct KeyCache {
    inner: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl KeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key_hash: &str) -> Option<ApiKey> {
        let guard = self.inner.read().await;
        let entry = guard.get(key_hash)?;
        if entry.inserted_at.elapsed() >= CACHE_TTL {
            return None;
        }
        Some(entry.key.clone())
    }

    pub async fn insert(&self, key_hash: String, key: ApiKey) {
        let mut guard = self.inner.write().await;
        guard.insert(
            key_hash,
            CacheEntry {
                key,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Synchronous invalidation for the local node; peers
    /// rely on TTL expiry.
    pub async fn invalidate(&self, key_hash: &str) {
        let mut guard = self.inner.write().await;
        guard.remove(key_hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn sample_key() -> ApiKey {
        ApiKey {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            tier_override: None,
            name: "test".into(),
            scopes: vec!["read:products".into()],
            active: true,
            expires_at: None,
            last_used_at: None,
            created_at: Utc::now(),
            metadata: json!({}),
        }
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let cache = KeyCache::new();
        let key = sample_key();
        cache.insert("hash1".into(), key.clone()).await;
        let fetched = cache.get("hash1").await.expect("cached entry");
        assert_eq!(fetched.id, key.id);
    }

    #[tokio::test]
    async fn invalidate_removes_entry_synchronously() {
        let cache = KeyCache::new();
        let key = sample_key();
        cache.insert("hash1".into(), key).await;
        cache.invalidate("hash1").await;
        assert!(cache.get("hash1").await.is_none());
    }

    #[tokio::test]
    async fn miss_returns_none() {
        let cache = KeyCache::new();
        assert!(cache.get("missing").await.is_none());
    }
}
