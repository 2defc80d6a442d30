// ABOUTME: Read-through cache serving cached payloads with refresh-ahead of expiry
// ABOUTME: Stale hits return immediately and trigger one background refresh per key
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

use super::Cache;
use dashmap::DashSet;
use homedash_adapters::ResourceSpec;
use homedash_core::errors::AdapterResult;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How a payload was served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from cache, still fresh
    Hit,
    /// Served from cache past its freshness threshold; refresh spawned
    Stale,
    /// Fetched synchronously
    Miss,
}

impl CacheStatus {
    /// Value for the `X-Cache` response header
    #[must_use]
    pub const fn as_header(self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Stale => "STALE",
            Self::Miss => "MISS",
        }
    }
}

/// Read-through cache over the shared [`Cache`]
///
/// Cache backend failures never reach the caller: a failed read is a miss
/// and a failed write is logged. Fetch errors are returned and never cached.
/// Concurrent misses on one key may each fetch; the last write wins.
#[derive(Clone, Debug)]
pub struct ReadThroughCache {
    cache: Cache,
    refreshing: Arc<DashSet<String>>,
}

impl ReadThroughCache {
    /// Wrap the shared cache
    #[must_use]
    pub fn new(cache: Cache) -> Self {
        Self {
            cache,
            refreshing: Arc::new(DashSet::new()),
        }
    }

    /// Underlying cache
    #[must_use]
    pub const fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Serve `key` from cache or through `fetcher`
    ///
    /// # Errors
    ///
    /// Returns the fetcher's error on a miss
    pub async fn fetch<F, Fut>(
        &self,
        key: &str,
        spec: &ResourceSpec,
        fetcher: F,
    ) -> AdapterResult<(Value, CacheStatus)>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = AdapterResult<Value>> + Send + 'static,
    {
        match self.cache.get::<Value>(key).await {
            Ok(Some((value, entry))) => {
                if entry.age() > spec.fresh_for {
                    self.spawn_refresh(key, spec.ttl, fetcher);
                    return Ok((value, CacheStatus::Stale));
                }
                debug!(cache_key = %key, "Cache hit");
                return Ok((value, CacheStatus::Hit));
            }
            Ok(None) => debug!(cache_key = %key, "Cache miss"),
            Err(e) => warn!(cache_key = %key, error = %e, "Cache read failed, fetching directly"),
        }

        let value = fetcher().await?;
        store(&self.cache, key, &value, spec.ttl).await;
        Ok((value, CacheStatus::Miss))
    }

    /// Recompute an entry in the background; the caller never waits on it
    fn spawn_refresh<F, Fut>(&self, key: &str, ttl: Duration, fetcher: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = AdapterResult<Value>> + Send + 'static,
    {
        if !self.refreshing.insert(key.to_owned()) {
            debug!(cache_key = %key, "Refresh already in flight");
            return;
        }

        let cache = self.cache.clone();
        let refreshing = self.refreshing.clone();
        let key = key.to_owned();
        tokio::spawn(async move {
            let guard = RefreshGuard { refreshing, key };
            match fetcher().await {
                Ok(value) => {
                    store(&cache, &guard.key, &value, ttl).await;
                    debug!(cache_key = %guard.key, "Background refresh completed");
                }
                Err(e) => warn!(cache_key = %guard.key, error = %e, "Background refresh failed"),
            }
        });
    }
}

/// Releases a key's in-flight refresh slot, also when the fetcher panics
struct RefreshGuard {
    refreshing: Arc<DashSet<String>>,
    key: String,
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.refreshing.remove(&self.key);
    }
}

async fn store(cache: &Cache, key: &str, value: &Value, ttl: Duration) {
    if let Err(e) = cache.set(key, value, ttl).await {
        warn!(cache_key = %key, error = %e, "Cache write failed");
    }
}
