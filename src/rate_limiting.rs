// ABOUTME: Sliding-window rate limiter keyed by route class and client
// ABOUTME: Backed by the shared cache store; fails open when the store is unreachable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

//! # Sliding Window Rate Limiting
//!
//! Each (route class, client) pair owns one window of request timestamps in
//! the cache store. A check purges timestamps older than `now - window`,
//! counts the rest and either rejects (count reached the maximum) or records
//! the new timestamp and admits. Old timestamps are only purged on check;
//! whole windows are garbage-collected through `expire(key, window)`.

use crate::cache::Cache;
use crate::config::cache::{RateLimitConfig, RouteLimit};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use homedash_core::constants::rate_limiting::{
    API_KEY_PREFIX, AUTH_KEY_PREFIX, HEALTH_KEY_PREFIX, RATE_LIMIT_KEY_PREFIX,
    TAILSCALE_KEY_PREFIX,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Route classes with independent limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteClass {
    /// Service resource routes
    Api,
    /// Health routes
    Health,
    /// Authentication routes
    Auth,
    /// Tailscale routes
    Tailscale,
}

impl RouteClass {
    /// Lowercase class name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Health => "health",
            Self::Auth => "auth",
            Self::Tailscale => "tailscale",
        }
    }

    /// Key prefix isolating this class's windows
    #[must_use]
    pub const fn key_prefix(self) -> &'static str {
        match self {
            Self::Api => API_KEY_PREFIX,
            Self::Health => HEALTH_KEY_PREFIX,
            Self::Auth => AUTH_KEY_PREFIX,
            Self::Tailscale => TAILSCALE_KEY_PREFIX,
        }
    }

    /// Store key for a client's window
    #[must_use]
    pub fn window_key(self, client: &str) -> String {
        format!("{RATE_LIMIT_KEY_PREFIX}{}{client}", self.key_prefix())
    }
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Maximum requests per window
    pub limit: u32,
    /// Requests left in the current window after this one
    pub remaining: u32,
    /// End of a full window starting at this check
    ///
    /// Capacity may free up earlier, once the oldest counted request ages
    /// out; this is the latest a client has to wait.
    pub reset_at: DateTime<Utc>,
    /// Window length in seconds
    pub window_secs: u64,
}

impl RateLimitDecision {
    fn admitted(limit: RouteLimit, counted: u64, now: DateTime<Utc>) -> Self {
        let used = u32::try_from(counted.saturating_add(1)).unwrap_or(u32::MAX);
        Self {
            allowed: true,
            limit: limit.max_requests,
            remaining: limit.max_requests.saturating_sub(used),
            reset_at: now + window_duration(limit),
            window_secs: limit.window_secs,
        }
    }

    fn rejected(limit: RouteLimit, now: DateTime<Utc>) -> Self {
        Self {
            allowed: false,
            limit: limit.max_requests,
            remaining: 0,
            reset_at: now + window_duration(limit),
            window_secs: limit.window_secs,
        }
    }

    /// Seconds a rejected client should wait
    #[must_use]
    pub fn retry_after_secs(&self) -> u64 {
        u64::try_from((self.reset_at - Utc::now()).num_seconds().max(1)).unwrap_or(1)
    }
}

fn window_duration(limit: RouteLimit) -> ChronoDuration {
    ChronoDuration::seconds(i64::try_from(limit.window_secs).unwrap_or(i64::MAX))
}

/// Sliding-window limiter over the shared cache store
#[derive(Clone, Debug)]
pub struct SlidingWindowLimiter {
    cache: Cache,
    config: RateLimitConfig,
}

impl SlidingWindowLimiter {
    /// Create a limiter sharing the given cache
    #[must_use]
    pub const fn new(cache: Cache, config: RateLimitConfig) -> Self {
        Self { cache, config }
    }

    /// Limiter configuration
    #[must_use]
    pub const fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check and record one request for `client` in `class`
    ///
    /// The check and the record are two store operations; two requests racing
    /// on the last free slot may both be admitted.
    pub async fn check(&self, class: RouteClass, client: &str) -> RateLimitDecision {
        self.check_at(class, client, Utc::now()).await
    }

    /// [`SlidingWindowLimiter::check`] at an explicit instant
    pub async fn check_at(
        &self,
        class: RouteClass,
        client: &str,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let limit = self.config.for_class(class);
        if !self.config.enabled {
            return RateLimitDecision::admitted(limit, 0, now);
        }

        let key = class.window_key(client);
        let window_start = now - window_duration(limit);

        let counted = match self.cache.clean_and_count(&key, window_start).await {
            Ok(count) => count,
            Err(e) => {
                warn!(
                    route_class = %class,
                    cache_key = %key,
                    error = %e,
                    "Rate limit store unavailable, admitting request"
                );
                return RateLimitDecision::admitted(limit, 0, now);
            }
        };

        if counted >= u64::from(limit.max_requests) {
            debug!(route_class = %class, cache_key = %key, counted, "Rate limit exceeded");
            return RateLimitDecision::rejected(limit, now);
        }

        if let Err(e) = self.cache.increment(&key, now).await {
            warn!(route_class = %class, cache_key = %key, error = %e, "Failed to record request");
        } else if let Err(e) = self.cache.expire(&key, limit.window()).await {
            warn!(route_class = %class, cache_key = %key, error = %e, "Failed to set window expiry");
        }

        RateLimitDecision::admitted(limit, counted, now)
    }
}
