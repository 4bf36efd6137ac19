//! Redis-backed object cache shared across processes.
//!
//! Values are stored as JSON strings under `group:key` with `SET EX`.
//! Connection or decode failures degrade to a miss (on read) or a no-op
//! (on write) and are logged.

use std::time::Duration;

use redis::{Client, Commands};
use serde_json::Value;
use tracing::{debug, warn};

use super::{ObjectCache, namespaced_key};
use crate::error::HostError;

/// Shared cache stored in Redis.
#[derive(Clone)]
pub struct RedisCache {
    client: Client,
}

impl RedisCache {
    /// Create a cache for the given Redis URL.
    ///
    /// The URL is validated here; the connection is opened per operation.
    pub fn open(url: &str) -> Result<Self, HostError> {
        let client = Client::open(url).map_err(|e| HostError::Cache(e.to_string()))?;
        Ok(Self { client })
    }

    fn connection(&self) -> Option<redis::Connection> {
        match self.client.get_connection() {
            Ok(conn) => Some(conn),
            Err(e) => {
                warn!(error = %e, "failed to get Redis connection for cache");
                None
            }
        }
    }
}

impl ObjectCache for RedisCache {
    fn get(&self, group: &str, key: &str) -> Option<Value> {
        let full_key = namespaced_key(group, key);
        let mut conn = self.connection()?;

        let raw: Option<String> = match conn.get(&full_key) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, key = %full_key, "failed to read cache value from Redis");
                return None;
            }
        };

        let value = decode_value(&raw?);
        if value.is_some() {
            debug!(key = %full_key, "redis cache hit");
        } else {
            warn!(key = %full_key, "discarding undecodable cache value");
        }
        value
    }

    fn set(&self, group: &str, key: &str, value: Value, ttl: Duration) {
        let full_key = namespaced_key(group, key);
        let Some(raw) = encode_value(&value) else {
            warn!(key = %full_key, "failed to encode cache value");
            return;
        };
        let Some(mut conn) = self.connection() else {
            return;
        };

        let result = match expiry_secs(ttl) {
            None => conn.set::<_, _, ()>(&full_key, raw),
            Some(secs) => conn.set_ex::<_, _, ()>(&full_key, raw, secs),
        };

        match result {
            Ok(()) => debug!(key = %full_key, ttl_secs = ttl.as_secs(), "redis cache set"),
            Err(e) => warn!(error = %e, key = %full_key, "failed to set cache value in Redis"),
        }
    }
}

fn encode_value(value: &Value) -> Option<String> {
    serde_json::to_string(value).ok()
}

fn decode_value(raw: &str) -> Option<Value> {
    serde_json::from_str(raw).ok()
}

/// `SET EX` seconds for a TTL; `None` stores without expiry.
fn expiry_secs(ttl: Duration) -> Option<u64> {
    if ttl.is_zero() {
        None
    } else {
        Some(ttl.as_secs().max(1))
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache").finish()
    }
}
