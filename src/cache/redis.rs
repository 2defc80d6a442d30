// ABOUTME: Redis cache implementation with connection pooling and TTL support
// ABOUTME: Shared store that survives restarts; rate windows are sorted sets
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

use super::{CacheConfig, CacheEntry, CacheProvider};
use crate::config::cache::RedisConnectionConfig;
use chrono::{DateTime, Utc};
use homedash_core::constants::cache::CACHE_KEY_PREFIX;
use homedash_core::errors::{AppError, AppResult};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Bytes of timestamp header written before every payload
const HEADER_LEN: usize = 16;

/// Redis cache implementation with connection pooling
///
/// Uses Redis `ConnectionManager` for automatic reconnection. All keys are
/// prefixed with `CACHE_KEY_PREFIX`. Payloads carry a 16-byte header holding
/// `stored_at` and `expires_at` in epoch milliseconds so readers can compute
/// the entry age; expiry itself is enforced by `PSETEX`.
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    async fn new_with_config(config: &CacheConfig) -> AppResult<Self> {
        let redis_url = config
            .redis_url
            .as_ref()
            .ok_or_else(|| AppError::config("Redis URL is required for Redis cache backend"))?;

        let conn_config = &config.redis_connection;

        info!(
            "Connecting to Redis (timeout={}s, response_timeout={}s, retries={})",
            conn_config.connection_timeout_secs,
            conn_config.response_timeout_secs,
            conn_config.initial_connection_retries
        );

        let client = redis::Client::open(redis_url.as_str())
            .map_err(|e| AppError::storage(format!("Failed to create Redis client: {e}")))?;

        let manager = Self::connect_with_retry(&client, conn_config).await?;

        info!("Successfully connected to Redis");

        Ok(Self { manager })
    }

    /// Connect to Redis with exponential backoff retry on failure
    async fn connect_with_retry(
        client: &redis::Client,
        conn_config: &RedisConnectionConfig,
    ) -> AppResult<ConnectionManager> {
        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(Duration::from_secs(conn_config.connection_timeout_secs))
            .set_response_timeout(Duration::from_secs(conn_config.response_timeout_secs))
            .set_number_of_retries(conn_config.reconnection_retries)
            .set_exponent_base(conn_config.retry_exponent_base)
            .set_max_delay(conn_config.max_retry_delay_ms);

        let max_retries = conn_config.initial_connection_retries;
        let max_delay_ms = conn_config.max_retry_delay_ms;

        let mut last_error = None;
        let mut delay_ms = conn_config.initial_retry_delay_ms;

        for attempt in 0..=max_retries {
            match ConnectionManager::new_with_config(client.clone(), manager_config.clone()).await {
                Ok(manager) => {
                    if attempt > 0 {
                        info!("Redis connection established after {} retries", attempt);
                    }
                    return Ok(manager);
                }
                Err(e) => {
                    if attempt < max_retries {
                        warn!(
                            "Redis connection attempt {}/{} failed, retrying in {}ms: {}",
                            attempt + 1,
                            max_retries + 1,
                            delay_ms,
                            e
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        delay_ms = (delay_ms * 2).min(max_delay_ms);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(AppError::storage(format!(
            "Failed to connect to Redis after {} attempts: {}",
            max_retries + 1,
            last_error.map_or_else(|| "unknown error".to_owned(), |e| e.to_string())
        )))
    }

    fn build_key(key: &str) -> String {
        format!("{CACHE_KEY_PREFIX}{key}")
    }

    fn command_error(operation: &str, e: &redis::RedisError) -> AppError {
        error!("Redis {} operation failed: {}", operation, e);
        AppError::storage(format!("Cache error: {e}"))
    }

    fn encode(entry: &CacheEntry) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + entry.data.len());
        bytes.extend_from_slice(&entry.stored_at.timestamp_millis().to_be_bytes());
        bytes.extend_from_slice(&entry.expires_at.timestamp_millis().to_be_bytes());
        bytes.extend_from_slice(&entry.data);
        bytes
    }

    fn decode(bytes: &[u8]) -> Option<CacheEntry> {
        if bytes.len() < HEADER_LEN {
            return None;
        }
        let (stored, rest) = bytes.split_at(8);
        let (expires, data) = rest.split_at(8);
        let stored_at = DateTime::from_timestamp_millis(i64::from_be_bytes(stored.try_into().ok()?))?;
        let expires_at =
            DateTime::from_timestamp_millis(i64::from_be_bytes(expires.try_into().ok()?))?;
        Some(CacheEntry {
            data: data.to_vec(),
            stored_at,
            expires_at,
        })
    }

    /// Sorted-set member for a request timestamp; unique per request
    fn window_member(timestamp: DateTime<Utc>) -> String {
        format!("{}-{}", timestamp.timestamp_millis(), Uuid::new_v4())
    }

    fn ttl_millis(ttl: Duration) -> u64 {
        u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
    }

    async fn scan_delete(&self, pattern: &str) -> AppResult<u64> {
        let mut conn = self.manager.clone();
        let mut cursor = 0u64;
        let mut count = 0u64;

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(|e| Self::command_error("SCAN", &e))?;

            if !keys.is_empty() {
                let deleted: u64 = conn
                    .del(&keys)
                    .await
                    .map_err(|e| Self::command_error("DEL", &e))?;
                count += deleted;
            }

            cursor = new_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(count)
    }
}

#[async_trait::async_trait]
impl CacheProvider for RedisCache {
    async fn new(config: CacheConfig) -> AppResult<Self>
    where
        Self: Sized,
    {
        Self::new_with_config(&config).await
    }

    async fn get(&self, key: &str) -> AppResult<Option<CacheEntry>> {
        let redis_key = Self::build_key(key);
        let mut conn = self.manager.clone();

        let data: Option<Vec<u8>> = conn
            .get(&redis_key)
            .await
            .map_err(|e| Self::command_error("GET", &e))?;

        let Some(bytes) = data else {
            return Ok(None);
        };
        match Self::decode(&bytes) {
            Some(entry) if !entry.is_expired() => Ok(Some(entry)),
            Some(_) => Ok(None),
            None => {
                warn!(cache_key = %key, "Discarding malformed cache entry");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AppResult<()> {
        let entry = CacheEntry::new(value, ttl);
        let redis_key = Self::build_key(key);
        let mut conn = self.manager.clone();

        // PSETEX writes value and expiration atomically
        conn.pset_ex::<_, _, ()>(&redis_key, Self::encode(&entry), Self::ttl_millis(ttl))
            .await
            .map_err(|e| Self::command_error("PSETEX", &e))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let redis_key = Self::build_key(key);
        let mut conn = self.manager.clone();

        conn.del::<_, ()>(&redis_key)
            .await
            .map_err(|e| Self::command_error("DEL", &e))
    }

    async fn increment(&self, key: &str, timestamp: DateTime<Utc>) -> AppResult<()> {
        let redis_key = Self::build_key(key);
        let mut conn = self.manager.clone();

        conn.zadd::<_, _, _, ()>(
            &redis_key,
            Self::window_member(timestamp),
            timestamp.timestamp_millis(),
        )
        .await
        .map_err(|e| Self::command_error("ZADD", &e))
    }

    async fn clean_and_count(&self, key: &str, window_start: DateTime<Utc>) -> AppResult<u64> {
        let redis_key = Self::build_key(key);
        let mut conn = self.manager.clone();

        // Scores below window_start are outside the window; "(" makes the bound exclusive
        let (count,): (u64,) = redis::pipe()
            .atomic()
            .zrembyscore(
                &redis_key,
                "-inf",
                format!("({}", window_start.timestamp_millis()),
            )
            .ignore()
            .zcard(&redis_key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Self::command_error("ZREMRANGEBYSCORE/ZCARD", &e))?;

        Ok(count)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<()> {
        let redis_key = Self::build_key(key);
        let mut conn = self.manager.clone();
        let millis = i64::try_from(Self::ttl_millis(ttl)).unwrap_or(i64::MAX);

        conn.pexpire::<_, ()>(&redis_key, millis)
            .await
            .map_err(|e| Self::command_error("PEXPIRE", &e))
    }

    async fn health_check(&self) -> AppResult<()> {
        let mut conn = self.manager.clone();

        let response: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| Self::command_error("PING", &e))?;

        if response == "PONG" {
            Ok(())
        } else {
            Err(AppError::storage(format!(
                "Cache error: unexpected PING response '{response}'"
            )))
        }
    }

    async fn clear_all(&self) -> AppResult<()> {
        // Only keys under our prefix, so a shared Redis is left alone
        let pattern = format!("{CACHE_KEY_PREFIX}*");
        self.scan_delete(&pattern).await.map(|_| ())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
