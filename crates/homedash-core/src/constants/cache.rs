// ABOUTME: Cache-related constants for capacity, cleanup intervals, and key prefixes
// ABOUTME: Supports both in-memory and Redis cache backends with the same defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

/// Default maximum cache entries for in-memory cache
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 10_000;

/// Default cleanup interval in seconds for expired entries
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300; // 5 minutes

/// Aggregate statistics TTL - stats move slowly relative to the poll cadence
pub const TTL_STATS_SECS: u64 = 10;

/// Connection status TTL (IRC networks, download clients)
pub const TTL_CONNECTION_STATUS_SECS: u64 = 5;

/// Download queue TTL
pub const TTL_QUEUE_SECS: u64 = 10;

/// Indexer list TTL
pub const TTL_INDEXERS_SECS: u64 = 30;

/// Mesh device list TTL
pub const TTL_DEVICES_SECS: u64 = 30;

/// Cache key prefix for namespacing inside a shared Redis
pub const CACHE_KEY_PREFIX: &str = "homedash:cache:";

/// Response header reporting how the read-through cache served a request
pub const CACHE_STATUS_HEADER: &str = "X-Cache";
