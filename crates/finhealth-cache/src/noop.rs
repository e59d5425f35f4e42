//! No-op cache implementation.

use async_trait::async_trait;
use finhealth_core::{ResponseCache, Result};
use std::time::Duration;
use tracing::trace;

/// A no-op cache that doesn't store anything.
///
/// `get` always returns `Ok(None)` and `set` returns `Ok(())`. Useful for
/// disabling caching or testing code paths without cache hits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl NoopCache {
    /// Create a new no-op cache.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ResponseCache for NoopCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        trace!("NoopCache: get called, returning None");
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> Result<()> {
        trace!("NoopCache: set called, doing nothing");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_never_stores() {
        let cache = NoopCache::new();
        cache
            .set("key", b"value", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(cache.get("key").await.unwrap().is_none());
    }
}
