//! Cache trait for raw upstream responses.
//!
//! This module defines [`ResponseCache`], a byte-oriented read-through cache
//! that can sit in front of a provider's network calls. The cache is an
//! external collaborator: absence of a cache, or a cache failure, must
//! degrade to a direct network fetch, never a hard failure.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Trait for caching raw upstream response payloads.
///
/// Keys are provider-chosen strings (e.g., `"sec:facts:0000320193"`).
/// Implementations can store data in various backends (SQLite, in-memory,
/// etc.) to avoid repeated API calls.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Retrieves a cached payload.
    ///
    /// Returns `Ok(Some(bytes))` on a hit, `Ok(None)` on a miss or an
    /// expired entry.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores a payload with a time-to-live.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;
}
