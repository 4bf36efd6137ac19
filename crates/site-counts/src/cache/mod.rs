//! Object cache used by the filtered listing.
//!
//! Values are JSON documents addressed by a `(group, key)` pair and stored
//! with a per-entry TTL. Two backends are provided: an in-process Moka cache
//! and a shared Redis cache.

mod remote;

use std::time::{Duration, Instant};

use moka::Expiry;
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

pub use self::remote::RedisCache;

/// Cache group the block stores its entries under.
pub const CACHE_GROUP: &str = "site_counts";

/// Key of the filtered listing entry.
pub const FILTERED_POSTS_KEY: &str = "filtered_posts";

/// Default lifetime of the filtered listing (5 minutes).
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Maximum in-process cache capacity.
const MAX_CAPACITY: u64 = 10_000;

/// Key-value store with per-entry expiry.
///
/// `get` returns `None` when nothing is stored or the entry expired. A TTL
/// of zero means the entry never expires.
pub trait ObjectCache: Send + Sync {
    fn get(&self, group: &str, key: &str) -> Option<Value>;

    fn set(&self, group: &str, key: &str, value: Value, ttl: Duration);
}

/// Flatten a `(group, key)` pair into a single backend key.
pub fn namespaced_key(group: &str, key: &str) -> String {
    format!("{group}:{key}")
}

/// How the filtered listing derives its cache key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheKeyStrategy {
    /// One key for every request, whatever the tag, category or excluded id.
    #[default]
    Shared,
    /// Key suffixed with a hash of the request parameters.
    PerQuery,
}

impl CacheKeyStrategy {
    /// Cache key for a listing request.
    pub fn key_for(self, tag: &str, category: &str, exclude_id: Option<u64>) -> String {
        match self {
            CacheKeyStrategy::Shared => FILTERED_POSTS_KEY.to_string(),
            CacheKeyStrategy::PerQuery => {
                let mut hasher = Sha256::new();
                hasher.update(tag.as_bytes());
                hasher.update([0]);
                hasher.update(category.as_bytes());
                hasher.update([0]);
                if let Some(id) = exclude_id {
                    hasher.update(id.to_be_bytes());
                }
                let digest = hex::encode(hasher.finalize());
                format!("{FILTERED_POSTS_KEY}:{}", &digest[..16])
            }
        }
    }
}

impl std::str::FromStr for CacheKeyStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shared" => Ok(CacheKeyStrategy::Shared),
            "per-query" | "per_query" => Ok(CacheKeyStrategy::PerQuery),
            other => Err(format!(
                "unknown cache key strategy '{other}' (expected 'shared' or 'per-query')"
            )),
        }
    }
}

#[derive(Clone)]
struct CachedEntry {
    value: Value,
    ttl: Duration,
}

/// Expires each entry after the TTL it was stored with.
struct PerEntryTtl;

impl PerEntryTtl {
    fn lifetime(entry: &CachedEntry) -> Option<Duration> {
        (!entry.ttl.is_zero()).then_some(entry.ttl)
    }
}

impl Expiry<String, CachedEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Self::lifetime(value)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Self::lifetime(value)
    }
}

/// In-process cache backed by Moka.
///
/// Clones share the same storage.
#[derive(Clone)]
pub struct MemoryCache {
    inner: Cache<String, CachedEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        let inner = Cache::builder()
            .max_capacity(MAX_CAPACITY)
            .expire_after(PerEntryTtl)
            .build();
        Self { inner }
    }

    /// Get cache statistics (for monitoring).
    pub fn stats(&self) -> CacheStats {
        self.inner.run_pending_tasks();
        CacheStats {
            entry_count: self.inner.entry_count(),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectCache for MemoryCache {
    fn get(&self, group: &str, key: &str) -> Option<Value> {
        let full_key = namespaced_key(group, key);
        let hit = self.inner.get(&full_key).map(|entry| entry.value);
        debug!(key = %full_key, hit = hit.is_some(), "memory cache get");
        hit
    }

    fn set(&self, group: &str, key: &str, value: Value, ttl: Duration) {
        let full_key = namespaced_key(group, key);
        debug!(key = %full_key, ttl_secs = ttl.as_secs(), "memory cache set");
        self.inner.insert(full_key, CachedEntry { value, ttl });
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache").finish()
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of live entries.
    pub entry_count: u64,
}
