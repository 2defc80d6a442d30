// ABOUTME: Cache factory for environment-based backend selection
// ABOUTME: Redis when configured and reachable, in-memory otherwise; typed JSON helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

use super::memory::InMemoryCache;
use super::redis::RedisCache;
use super::{CacheConfig, CacheEntry, CacheProvider};
use chrono::{DateTime, Utc};
use homedash_core::errors::AppResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Unified cache interface
///
/// Constructed once at startup and shared by the read-through cache and the
/// rate limiter. Callers never see which backend is in use.
#[derive(Clone)]
pub struct Cache {
    inner: Arc<dyn CacheProvider>,
}

impl Cache {
    /// Create the cache selected by configuration
    ///
    /// A Redis URL selects the Redis backend. If Redis cannot be reached at
    /// startup the in-memory backend is used instead, so this always yields
    /// a usable store.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory backend cannot be created
    pub async fn new(config: CacheConfig) -> AppResult<Self> {
        if config.redis_url.is_some() {
            match RedisCache::new(config.clone()).await {
                Ok(redis) => {
                    info!("Initializing Redis cache");
                    return Ok(Self::from_provider(Arc::new(redis)));
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        "Redis unreachable at startup, falling back to in-memory cache"
                    );
                }
            }
        }

        info!(
            "Initializing in-memory cache (max entries: {})",
            config.max_entries
        );
        let inner = InMemoryCache::new(config).await?;
        Ok(Self::from_provider(Arc::new(inner)))
    }

    /// Wrap an existing provider
    #[must_use]
    pub fn from_provider(inner: Arc<dyn CacheProvider>) -> Self {
        Self { inner }
    }

    /// In-memory cache without background cleanup, for tests and tools
    #[must_use]
    pub fn in_memory(max_entries: usize) -> Self {
        let config = CacheConfig {
            max_entries,
            enable_background_cleanup: false,
            ..CacheConfig::default()
        };
        let memory = InMemoryCache::new_with_config(&config);
        Self::from_provider(Arc::new(memory))
    }

    /// Backend name (`memory` or `redis`)
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    /// Fetch a raw entry
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached
    pub async fn get_entry(&self, key: &str) -> AppResult<Option<CacheEntry>> {
        self.inner.get(key).await
    }

    /// Fetch and deserialize a value with its entry metadata
    ///
    /// A payload that no longer deserializes is reported as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<(T, CacheEntry)>> {
        let Some(entry) = self.inner.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_slice(&entry.data) {
            Ok(value) => Ok(Some((value, entry))),
            Err(e) => {
                warn!(cache_key = %key, error = %e, "Cached payload failed to deserialize");
                Ok(None)
            }
        }
    }

    /// Serialize and store a value with TTL
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or storage fails
    pub async fn set<T: Serialize + Sync>(&self, key: &str, value: &T, ttl: Duration) -> AppResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.inner.set(key, bytes, ttl).await
    }

    /// Remove single cache entry
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached
    pub async fn delete(&self, key: &str) -> AppResult<()> {
        self.inner.delete(key).await
    }

    /// Record one request timestamp in a window
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached
    pub async fn increment(&self, key: &str, timestamp: DateTime<Utc>) -> AppResult<()> {
        self.inner.increment(key, timestamp).await
    }

    /// Purge old timestamps and count the rest
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached
    pub async fn clean_and_count(&self, key: &str, window_start: DateTime<Utc>) -> AppResult<u64> {
        self.inner.clean_and_count(key, window_start).await
    }

    /// Expire a window key
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached
    pub async fn expire(&self, key: &str, ttl: Duration) -> AppResult<()> {
        self.inner.expire(key, ttl).await
    }

    /// Verify cache backend is healthy
    ///
    /// # Errors
    ///
    /// Returns an error if health check fails
    pub async fn health_check(&self) -> AppResult<()> {
        self.inner.health_check().await
    }

    /// Clear all cache entries
    ///
    /// # Errors
    ///
    /// Returns an error if clear operation fails
    pub async fn clear_all(&self) -> AppResult<()> {
        self.inner.clear_all().await
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("backend", &self.inner.backend_name())
            .finish()
    }
}
