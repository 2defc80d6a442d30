// ABOUTME: Cache and rate limiting configuration types
// ABOUTME: Handles Redis connection/retry settings and per-route-class rate limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

use crate::rate_limiting::RouteClass;
use homedash_core::constants::{cache, rate_limiting, redis};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Cache configuration as read from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Redis URL for the shared cache (optional)
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Maximum number of entries in the in-memory cache
    pub max_entries: usize,
    /// Cache cleanup interval in seconds
    pub cleanup_interval_secs: u64,
    /// Redis connection configuration
    #[serde(default)]
    pub redis_connection: RedisConnectionConfig,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            max_entries: cache::DEFAULT_CACHE_MAX_ENTRIES,
            cleanup_interval_secs: cache::DEFAULT_CLEANUP_INTERVAL_SECS,
            redis_connection: RedisConnectionConfig::default(),
        }
    }
}

impl CacheSettings {
    /// Load cache configuration from environment
    ///
    /// `REDIS_URL` wins; otherwise `REDIS_HOST` (+ `REDIS_PORT`) builds the URL.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            redis_url: redis_url_from_env(),
            max_entries: env::var("CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(cache::DEFAULT_CACHE_MAX_ENTRIES),
            cleanup_interval_secs: env::var("CACHE_CLEANUP_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(cache::DEFAULT_CLEANUP_INTERVAL_SECS),
            redis_connection: RedisConnectionConfig::from_env(),
        }
    }
}

fn redis_url_from_env() -> Option<String> {
    if let Some(url) = env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()) {
        return Some(url);
    }
    let host = env::var("REDIS_HOST").ok().filter(|host| !host.trim().is_empty())?;
    let port = env::var("REDIS_PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(redis::DEFAULT_REDIS_PORT);
    Some(format!("redis://{host}:{port}"))
}

/// Redis connection and retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConnectionConfig {
    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,
    /// Response/command timeout in seconds
    pub response_timeout_secs: u64,
    /// Number of reconnection retries after connection drop
    pub reconnection_retries: usize,
    /// Exponential backoff base for retry delays
    pub retry_exponent_base: u64,
    /// Maximum retry delay in milliseconds
    pub max_retry_delay_ms: u64,
    /// Number of retries for initial connection at startup
    pub initial_connection_retries: u32,
    /// Initial retry delay in milliseconds (doubles with exponential backoff)
    pub initial_retry_delay_ms: u64,
}

impl Default for RedisConnectionConfig {
    fn default() -> Self {
        Self {
            connection_timeout_secs: redis::CONNECTION_TIMEOUT_SECS,
            response_timeout_secs: redis::RESPONSE_TIMEOUT_SECS,
            reconnection_retries: redis::RECONNECTION_RETRIES,
            retry_exponent_base: redis::RETRY_EXPONENT_BASE,
            max_retry_delay_ms: redis::MAX_RETRY_DELAY_MS,
            initial_connection_retries: redis::INITIAL_CONNECTION_RETRIES,
            initial_retry_delay_ms: redis::INITIAL_RETRY_DELAY_MS,
        }
    }
}

impl RedisConnectionConfig {
    /// Load Redis connection configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            connection_timeout_secs: env::var("REDIS_CONNECTION_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(redis::CONNECTION_TIMEOUT_SECS),
            response_timeout_secs: env::var("REDIS_RESPONSE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(redis::RESPONSE_TIMEOUT_SECS),
            reconnection_retries: env::var("REDIS_RECONNECTION_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(redis::RECONNECTION_RETRIES),
            retry_exponent_base: env::var("REDIS_RETRY_EXPONENT_BASE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(redis::RETRY_EXPONENT_BASE),
            max_retry_delay_ms: env::var("REDIS_MAX_RETRY_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(redis::MAX_RETRY_DELAY_MS),
            initial_connection_retries: env::var("REDIS_INITIAL_CONNECTION_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(redis::INITIAL_CONNECTION_RETRIES),
            initial_retry_delay_ms: env::var("REDIS_INITIAL_RETRY_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(redis::INITIAL_RETRY_DELAY_MS),
        }
    }
}

/// Sliding window limit for one route class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteLimit {
    /// Requests admitted per window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_secs: u64,
}

impl RouteLimit {
    /// Window as a `Duration`
    #[must_use]
    pub const fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    fn from_env(class: RouteClass, default: Self) -> Self {
        let name = class.as_str().to_uppercase();
        Self {
            max_requests: env::var(format!("RATE_LIMIT_{name}_MAX"))
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_requests),
            window_secs: env::var(format!("RATE_LIMIT_{name}_WINDOW_SECS"))
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(default.window_secs),
        }
    }
}

/// Rate limiting configuration for every route class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Master switch; when false every request is admitted
    pub enabled: bool,
    /// Service resource routes
    pub api: RouteLimit,
    /// Health routes
    pub health: RouteLimit,
    /// Authentication routes
    pub auth: RouteLimit,
    /// Tailscale routes
    pub tailscale: RouteLimit,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api: RouteLimit {
                max_requests: rate_limiting::API_MAX_REQUESTS,
                window_secs: rate_limiting::API_WINDOW_SECS,
            },
            health: RouteLimit {
                max_requests: rate_limiting::HEALTH_MAX_REQUESTS,
                window_secs: rate_limiting::HEALTH_WINDOW_SECS,
            },
            auth: RouteLimit {
                max_requests: rate_limiting::AUTH_MAX_REQUESTS,
                window_secs: rate_limiting::AUTH_WINDOW_SECS,
            },
            tailscale: RouteLimit {
                max_requests: rate_limiting::TAILSCALE_MAX_REQUESTS,
                window_secs: rate_limiting::TAILSCALE_WINDOW_SECS,
            },
        }
    }
}

impl RateLimitConfig {
    /// Load rate limiting configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env::var("RATE_LIMIT_ENABLED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.enabled),
            api: RouteLimit::from_env(RouteClass::Api, defaults.api),
            health: RouteLimit::from_env(RouteClass::Health, defaults.health),
            auth: RouteLimit::from_env(RouteClass::Auth, defaults.auth),
            tailscale: RouteLimit::from_env(RouteClass::Tailscale, defaults.tailscale),
        }
    }

    /// Limit for a route class
    #[must_use]
    pub const fn for_class(&self, class: RouteClass) -> RouteLimit {
        match class {
            RouteClass::Api => self.api,
            RouteClass::Health => self.health,
            RouteClass::Auth => self.auth,
            RouteClass::Tailscale => self.tailscale,
        }
    }
}
