//! In-memory cache implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use finhealth_core::{ResponseCache, Result};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Cache entry with an expiry timestamp.
#[derive(Debug, Clone)]
struct CacheEntry {
    data: Vec<u8>,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Duration) -> Self {
        let ttl = chrono::TimeDelta::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX);
        Self {
            data,
            expires_at: Utc::now()
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Simple in-memory cache for testing and development.
///
/// Entries are stored in a `RwLock`-protected `HashMap` and are lost when
/// the cache is dropped. Expired entries read back as misses.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    /// Create a new empty in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes expired entries, returning the number removed.
    pub async fn invalidate_stale(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Invalidated {} stale cache entries", removed);
        }
        removed
    }

    /// Clears all cached entries.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        debug!("Cleared all cache entries");
    }
}

#[async_trait]
impl ResponseCache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                debug!(key, "Cache hit");
                Ok(Some(entry.data.clone()))
            }
            Some(_) => {
                debug!(key, "Cache entry expired");
                Ok(None)
            }
            None => {
                debug!(key, "Cache miss");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), CacheEntry::new(value.to_vec(), ttl));
        debug!(key, bytes = value.len(), "Cached payload");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_cache_roundtrip() {
        let cache = InMemoryCache::new();

        assert!(cache.get("sec:cik_map").await.unwrap().is_none());

        cache
            .set("sec:cik_map", b"{\"0\":{}}", Duration::from_secs(60))
            .await
            .unwrap();

        let hit = cache.get("sec:cik_map").await.unwrap();
        assert_eq!(hit.as_deref(), Some(b"{\"0\":{}}".as_slice()));
    }

    #[tokio::test]
    async fn test_memory_cache_ttl_expiry() {
        let cache = InMemoryCache::new();
        cache
            .set("key", b"value", Duration::ZERO)
            .await
            .unwrap();

        // Zero TTL: readable as a miss immediately.
        assert!(cache.get("key").await.unwrap().is_none());
        assert_eq!(cache.invalidate_stale().await, 1);
    }

    #[tokio::test]
    async fn test_memory_cache_clear() {
        let cache = InMemoryCache::new();
        cache
            .set("key", b"value", Duration::from_secs(60))
            .await
            .unwrap();

        cache.clear().await;
        assert!(cache.get("key").await.unwrap().is_none());
    }
}
