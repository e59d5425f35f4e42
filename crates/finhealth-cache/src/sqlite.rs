//! SQLite-based cache implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use finhealth_core::{ProviderError, ResponseCache, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// SQLite-based response cache.
///
/// Stores payloads in a SQLite database file, providing persistence across
/// application runs. Expired entries read back as misses and are deleted
/// lazily on access or via [`invalidate_stale`](Self::invalidate_stale).
#[derive(Debug)]
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Create a new SQLite cache at the given path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| ProviderError::Cache(e.to_string()))?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory SQLite cache.
    ///
    /// Useful for testing; data is lost when the cache is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| ProviderError::Cache(e.to_string()))?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ProviderError::Cache(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS response_cache (
                key TEXT NOT NULL PRIMARY KEY,
                value BLOB NOT NULL,
                expires_at TEXT NOT NULL,
                cached_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| ProviderError::Cache(e.to_string()))?;

        Ok(())
    }

    /// Removes expired entries, returning the number removed.
    pub fn invalidate_stale(&self) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ProviderError::Cache(e.to_string()))?;

        let removed = conn
            .execute(
                "DELETE FROM response_cache WHERE expires_at <= ?1",
                params![Utc::now().to_rfc3339()],
            )
            .map_err(|e| ProviderError::Cache(e.to_string()))?;

        if removed > 0 {
            debug!("Invalidated {} stale cache entries", removed);
        }
        Ok(removed)
    }

    /// Clears all cached entries.
    pub fn clear(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ProviderError::Cache(e.to_string()))?;

        conn.execute("DELETE FROM response_cache", [])
            .map_err(|e| ProviderError::Cache(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ResponseCache for SqliteCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ProviderError::Cache(e.to_string()))?;

        let row: Option<(Vec<u8>, String)> = conn
            .query_row(
                "SELECT value, expires_at FROM response_cache WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| ProviderError::Cache(e.to_string()))?;

        match row {
            Some((value, expires_at)) => {
                let expired = DateTime::parse_from_rfc3339(&expires_at)
                    .map(|ts| ts <= Utc::now())
                    .unwrap_or(true);

                if expired {
                    debug!(key, "Cache entry expired");
                    conn.execute("DELETE FROM response_cache WHERE key = ?1", params![key])
                        .map_err(|e| ProviderError::Cache(e.to_string()))?;
                    Ok(None)
                } else {
                    debug!(key, "Cache hit");
                    Ok(Some(value))
                }
            }
            None => {
                debug!(key, "Cache miss");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let ttl = chrono::TimeDelta::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX);
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let conn = self
            .conn
            .lock()
            .map_err(|e| ProviderError::Cache(e.to_string()))?;

        conn.execute(
            "INSERT OR REPLACE INTO response_cache (key, value, expires_at, cached_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                key,
                value,
                expires_at.to_rfc3339(),
                Utc::now().to_rfc3339()
            ],
        )
        .map_err(|e| ProviderError::Cache(e.to_string()))?;

        debug!(key, bytes = value.len(), "Cached payload");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_cache_roundtrip() {
        let cache = SqliteCache::in_memory().unwrap();

        assert!(cache.get("sec:facts:0000320193").await.unwrap().is_none());

        cache
            .set("sec:facts:0000320193", b"{}", Duration::from_secs(60))
            .await
            .unwrap();

        let hit = cache.get("sec:facts:0000320193").await.unwrap();
        assert_eq!(hit.as_deref(), Some(b"{}".as_slice()));
    }

    #[tokio::test]
    async fn test_sqlite_cache_expiry() {
        let cache = SqliteCache::in_memory().unwrap();
        cache.set("key", b"value", Duration::ZERO).await.unwrap();

        assert!(cache.get("key").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_cache_overwrite() {
        let cache = SqliteCache::in_memory().unwrap();
        cache
            .set("key", b"old", Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("key", b"new", Duration::from_secs(60))
            .await
            .unwrap();

        let hit = cache.get("key").await.unwrap();
        assert_eq!(hit.as_deref(), Some(b"new".as_slice()));
    }

    #[tokio::test]
    async fn test_sqlite_cache_clear() {
        let cache = SqliteCache::in_memory().unwrap();
        cache
            .set("key", b"value", Duration::from_secs(60))
            .await
            .unwrap();

        cache.clear().unwrap();
        assert!(cache.get("key").await.unwrap().is_none());
    }
}
