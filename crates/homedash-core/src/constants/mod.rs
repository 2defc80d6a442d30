// ABOUTME: Application-wide constants organized by domain
// ABOUTME: Cache, rate limiting, health monitoring, network, and Redis defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

/// Cache capacity, cleanup, and key namespacing
pub mod cache;

/// Health monitor and SSE defaults
pub mod health;

/// Upstream HTTP client and server defaults
pub mod network;

/// Sliding window rate limiter defaults per route class
pub mod rate_limiting;

/// Redis connection and retry defaults
pub mod redis;

/// Service names used in logs and health responses
pub mod service_names {
    /// Name of the dashboard server
    pub const HOMEDASH_SERVER: &str = "homedash-server";
}
