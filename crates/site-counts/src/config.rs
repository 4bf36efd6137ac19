//! Configuration loaded from environment variables.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::block::FilterSettings;
use crate::cache::{CacheKeyStrategy, DEFAULT_TTL_SECS, MemoryCache, ObjectCache, RedisCache};
use crate::query::DEFAULT_PAGE_SIZE;

/// Where cached listings are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    /// In-process Moka cache.
    Memory,
    /// Redis shared across processes.
    Redis,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache backend (default: memory).
    pub cache_backend: CacheBackend,

    /// Redis connection URL, used when the backend is `redis`.
    pub redis_url: String,

    /// Lifetime of the cached listing in seconds (default: 300).
    pub cache_ttl_secs: u64,

    /// How listing cache keys are derived (default: shared).
    pub cache_key_strategy: CacheKeyStrategy,

    /// Tag the block lists (default: "foo").
    pub filter_tag: String,

    /// Category the block lists (default: "baz").
    pub filter_category: String,

    /// Items requested per listing query (default: 6).
    pub filter_page_size: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cache_backend = match lookup("CACHE_BACKEND")
            .unwrap_or_else(|| "memory".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => CacheBackend::Memory,
            "redis" => CacheBackend::Redis,
            other => anyhow::bail!("CACHE_BACKEND must be 'memory' or 'redis', got '{other}'"),
        };

        let redis_url =
            lookup("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string());

        let cache_ttl_secs = lookup("CACHE_TTL_SECS")
            .unwrap_or_else(|| DEFAULT_TTL_SECS.to_string())
            .parse()
            .context("CACHE_TTL_SECS must be a valid u64")?;

        let cache_key_strategy = lookup("CACHE_KEY_STRATEGY")
            .unwrap_or_else(|| "shared".to_string())
            .parse::<CacheKeyStrategy>()
            .map_err(anyhow::Error::msg)
            .context("invalid CACHE_KEY_STRATEGY")?;

        let filter_tag = lookup("FILTER_TAG").unwrap_or_else(|| "foo".to_string());
        let filter_category = lookup("FILTER_CATEGORY").unwrap_or_else(|| "baz".to_string());

        let filter_page_size = lookup("FILTER_PAGE_SIZE")
            .unwrap_or_else(|| DEFAULT_PAGE_SIZE.to_string())
            .parse()
            .context("FILTER_PAGE_SIZE must be a valid u32")?;

        Ok(Self {
            cache_backend,
            redis_url,
            cache_ttl_secs,
            cache_key_strategy,
            filter_tag,
            filter_category,
            filter_page_size,
        })
    }

    /// Listing settings derived from this configuration.
    pub fn filter_settings(&self) -> FilterSettings {
        FilterSettings {
            tag: self.filter_tag.clone(),
            category: self.filter_category.clone(),
            page_size: self.filter_page_size,
            ttl: Duration::from_secs(self.cache_ttl_secs),
            key_strategy: self.cache_key_strategy,
        }
    }

    /// Construct the configured cache backend.
    pub fn build_cache(&self) -> Result<Arc<dyn ObjectCache>> {
        Ok(match self.cache_backend {
            CacheBackend::Memory => Arc::new(MemoryCache::new()),
            CacheBackend::Redis => Arc::new(
                RedisCache::open(&self.redis_url).context("failed to open Redis cache")?,
            ),
        })
    }
}
