// ABOUTME: In-memory cache implementation with LRU eviction and TTL support
// ABOUTME: Holds rate limit windows alongside payloads, with background cleanup of both
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

use super::{CacheConfig, CacheEntry, CacheProvider};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use homedash_core::errors::AppResult;
use lru::LruCache;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

type EntryStore = Arc<RwLock<LruCache<String, CacheEntry>>>;
type WindowStore = Arc<DashMap<String, RateWindow>>;

/// Request timestamps of one rate limit key, oldest first
#[derive(Debug, Default)]
struct RateWindow {
    timestamps: VecDeque<DateTime<Utc>>,
    expires_at: Option<Instant>,
}

impl RateWindow {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-memory cache with LRU eviction and background cleanup
///
/// Payloads live in an `Arc<RwLock<LruCache>>` shared with the cleanup task;
/// rate windows live in a `DashMap` so limiter checks on different keys do
/// not contend. Contents are lost on restart.
#[derive(Clone)]
pub struct InMemoryCache {
    store: EntryStore,
    windows: WindowStore,
    shutdown_tx: Option<Arc<mpsc::Sender<()>>>,
}

impl InMemoryCache {
    /// Capacity used when the configuration asks for zero entries
    const DEFAULT_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1000) {
        Some(n) => n,
        None => unreachable!(),
    };

    pub(crate) fn new_with_config(config: &CacheConfig) -> Self {
        let capacity =
            NonZeroUsize::new(config.max_entries).unwrap_or(Self::DEFAULT_CACHE_CAPACITY);

        let store: EntryStore = Arc::new(RwLock::new(LruCache::new(capacity)));
        let windows: WindowStore = Arc::new(DashMap::new());

        let shutdown_tx = if config.enable_background_cleanup {
            let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
            let store_clone = store.clone();
            let windows_clone = windows.clone();
            let cleanup_interval = config.cleanup_interval;

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(cleanup_interval);
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            Self::cleanup_expired(&store_clone, &windows_clone).await;
                        }
                        _ = shutdown_rx.recv() => {
                            debug!("Cache cleanup task received shutdown signal");
                            break;
                        }
                    }
                }
            });

            Some(Arc::new(shutdown_tx))
        } else {
            None
        };

        Self {
            store,
            windows,
            shutdown_tx,
        }
    }

    /// Remove expired entries and expired windows
    async fn cleanup_expired(store: &EntryStore, windows: &WindowStore) {
        let mut store_guard = store.write().await;
        let expired_keys: Vec<String> = store_guard
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired_keys {
            store_guard.pop(key);
        }
        drop(store_guard);

        let windows_before = windows.len();
        windows.retain(|_, window| !window.is_expired());
        let windows_removed = windows_before.saturating_sub(windows.len());

        if !expired_keys.is_empty() || windows_removed > 0 {
            debug!(
                entries = expired_keys.len(),
                windows = windows_removed,
                "Cleaned up expired cache state"
            );
        }
    }

    /// Number of live payload entries (expired ones may still be counted)
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Whether no payload entries are held
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl CacheProvider for InMemoryCache {
    async fn new(config: CacheConfig) -> AppResult<Self> {
        Ok(Self::new_with_config(&config))
    }

    async fn get(&self, key: &str) -> AppResult<Option<CacheEntry>> {
        // LruCache::get updates recency, so this needs the write lock
        let mut store = self.store.write().await;
        let entry = match store.get(key) {
            Some(entry) if entry.is_expired() => {
                store.pop(key);
                None
            }
            Some(entry) => Some(entry.clone()),
            None => None,
        };
        drop(store);
        Ok(entry)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AppResult<()> {
        let entry = CacheEntry::new(value, ttl);
        // LruCache handles eviction automatically on push
        self.store.write().await.push(key.to_owned(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.store.write().await.pop(key);
        self.windows.remove(key);
        Ok(())
    }

    async fn increment(&self, key: &str, timestamp: DateTime<Utc>) -> AppResult<()> {
        let mut window = self.windows.entry(key.to_owned()).or_default();
        if window.is_expired() {
            *window = RateWindow::default();
        }
        // Keep the deque ordered even if clocks hand us an older timestamp
        let position = window
            .timestamps
            .iter()
            .rposition(|existing| *existing <= timestamp)
            .map_or(0, |index| index + 1);
        window.timestamps.insert(position, timestamp);
        Ok(())
    }

    async fn clean_and_count(&self, key: &str, window_start: DateTime<Utc>) -> AppResult<u64> {
        let Some(mut window) = self.windows.get_mut(key) else {
            return Ok(0);
        };
        if window.is_expired() {
            drop(window);
            self.windows.remove_if(key, |_, window| window.is_expired());
            return Ok(0);
        }
        while window
            .timestamps
            .front()
            .is_some_and(|oldest| *oldest < window_start)
        {
            window.timestamps.pop_front();
        }
        Ok(window.timestamps.len() as u64)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<()> {
        if let Some(mut window) = self.windows.get_mut(key) {
            window.expires_at = Some(Instant::now() + ttl);
        }
        Ok(())
    }

    async fn health_check(&self) -> AppResult<()> {
        Ok(())
    }

    async fn clear_all(&self) -> AppResult<()> {
        self.store.write().await.clear();
        self.windows.clear();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

impl Drop for InMemoryCache {
    fn drop(&mut self) {
        // Only the last clone stops the cleanup task
        if let Some(tx) = self.shutdown_tx.take() {
            if let Ok(tx) = Arc::try_unwrap(tx) {
                if let Err(e) = tx.try_send(()) {
                    debug!(error = ?e, "Cache shutdown signal send failed (channel likely closed)");
                }
            }
        }
    }
}
