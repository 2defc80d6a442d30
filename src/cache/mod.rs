// ABOUTME: Cache store abstraction for upstream payloads and rate limit windows
// ABOUTME: Pluggable backend support (in-memory, Redis) behind one CacheProvider trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

/// Cache factory selecting the backend at startup
pub mod factory;
/// In-memory cache implementation
pub mod memory;
/// Read-through cache with refresh-ahead
pub mod read_through;
/// Redis cache implementation
pub mod redis;

pub use factory::Cache;

use crate::config::cache::{CacheSettings, RedisConnectionConfig};
use chrono::{DateTime, Utc};
use homedash_core::constants::cache::{DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CLEANUP_INTERVAL_SECS};
use homedash_core::errors::AppResult;
use std::time::Duration;

/// Cache provider trait for pluggable backend implementations
///
/// Values are opaque bytes; typed access lives on [`Cache`]. Besides plain
/// key/value storage the trait carries the sliding-window primitives used by
/// the rate limiter, so one store backs both.
///
/// `get` of an absent or expired key is `Ok(None)`, never an error.
///
/// # Examples
///
/// ```rust,no_run
/// use homedash::cache::memory::InMemoryCache;
/// use homedash::cache::{CacheConfig, CacheProvider};
/// use std::time::Duration;
/// # async fn example() -> homedash_core::errors::AppResult<()> {
///
/// let config = CacheConfig {
///     enable_background_cleanup: false,
///     ..Default::default()
/// };
/// let cache = InMemoryCache::new(config).await?;
///
/// cache
///     .set("autobrr:stats:autobrr-1", b"{}".to_vec(), Duration::from_secs(10))
///     .await?;
/// if let Some(entry) = cache.get("autobrr:stats:autobrr-1").await? {
///     println!("cached {} bytes, age {:?}", entry.data.len(), entry.age());
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait::async_trait]
pub trait CacheProvider: Send + Sync {
    /// Create new cache instance with configuration
    ///
    /// # Errors
    ///
    /// Returns an error if cache initialization fails
    async fn new(config: CacheConfig) -> AppResult<Self>
    where
        Self: Sized;

    /// Fetch an entry, `None` when absent or expired
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached
    async fn get(&self, key: &str) -> AppResult<Option<CacheEntry>>;

    /// Store a value with a TTL, overwriting any previous entry
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AppResult<()>;

    /// Remove a single entry
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Record one request timestamp in a window
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached
    async fn increment(&self, key: &str, timestamp: DateTime<Utc>) -> AppResult<()>;

    /// Drop timestamps older than `window_start` and count the rest
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached
    async fn clean_and_count(&self, key: &str, window_start: DateTime<Utc>) -> AppResult<u64>;

    /// Expire a whole window key after `ttl`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached
    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<()>;

    /// Verify cache backend is healthy
    ///
    /// # Errors
    ///
    /// Returns an error if health check fails
    async fn health_check(&self) -> AppResult<()>;

    /// Clear all cache entries and windows (for testing/admin)
    ///
    /// # Errors
    ///
    /// Returns an error if clear operation fails
    async fn clear_all(&self) -> AppResult<()>;

    /// Backend name for logs and readiness output
    fn backend_name(&self) -> &'static str;
}

/// Cached payload with its storage timestamps
///
/// `stored_at <= expires_at` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Opaque serialized payload
    pub data: Vec<u8>,
    /// When the entry was written
    pub stored_at: DateTime<Utc>,
    /// When the entry stops being served
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Entry written now with the given TTL
    #[must_use]
    pub fn new(data: Vec<u8>, ttl: Duration) -> Self {
        let stored_at = Utc::now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| stored_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            data,
            stored_at,
            expires_at,
        }
    }

    /// Whether the entry is past its expiry
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Time since the entry was written
    #[must_use]
    pub fn age(&self) -> Duration {
        (Utc::now() - self.stored_at).to_std().unwrap_or_default()
    }
}

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries (for in-memory cache)
    pub max_entries: usize,
    /// Redis connection URL (for Redis cache)
    pub redis_url: Option<String>,
    /// Cleanup interval for expired entries
    pub cleanup_interval: Duration,
    /// Enable background cleanup task (false in tests)
    pub enable_background_cleanup: bool,
    /// Redis connection and retry configuration
    pub redis_connection: RedisConnectionConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            redis_url: None,
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
            enable_background_cleanup: true,
            redis_connection: RedisConnectionConfig::default(),
        }
    }
}

impl CacheConfig {
    /// Cache configuration from the server settings
    #[must_use]
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self {
            max_entries: settings.max_entries,
            redis_url: settings.redis_url.clone(),
            cleanup_interval: Duration::from_secs(settings.cleanup_interval_secs.max(1)),
            enable_background_cleanup: true,
            redis_connection: settings.redis_connection.clone(),
        }
    }
}

/// Cache key for a service resource: `"<service>:<resource>:" + instance_id`
#[must_use]
pub fn resource_key(service: &str, resource: &str, instance_id: &str) -> String {
    format!("{service}:{resource}:{instance_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_key_layout() {
        assert_eq!(
            resource_key("autobrr", "irc", "autobrr-1"),
            "autobrr:irc:autobrr-1"
        );
    }

    #[test]
    fn test_cache_entry_timestamps() {
        let entry = CacheEntry::new(vec![1, 2, 3], Duration::from_secs(10));
        assert!(entry.stored_at <= entry.expires_at);
        assert!(!entry.is_expired());
        assert!(entry.age() < Duration::from_secs(1));
    }
}
