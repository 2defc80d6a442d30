// ABOUTME: Sliding window rate limit defaults for each route class
// ABOUTME: General API traffic, health checks, authentication, and mesh VPN routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

/// General API traffic: 60 requests per minute
pub const API_MAX_REQUESTS: u32 = 60;
/// General API window
pub const API_WINDOW_SECS: u64 = 60;
/// Key prefix for general API windows
pub const API_KEY_PREFIX: &str = "api:";

/// Health checks: 30 requests per minute
pub const HEALTH_MAX_REQUESTS: u32 = 30;
/// Health window
pub const HEALTH_WINDOW_SECS: u64 = 60;
/// Key prefix for health windows
pub const HEALTH_KEY_PREFIX: &str = "health:";

/// Authentication: 30 requests per minute
pub const AUTH_MAX_REQUESTS: u32 = 30;
/// Authentication window
pub const AUTH_WINDOW_SECS: u64 = 60;
/// Key prefix for authentication windows
pub const AUTH_KEY_PREFIX: &str = "auth:";

/// Tailscale is rate limited upstream, so it gets 20 requests per 2 minutes
pub const TAILSCALE_MAX_REQUESTS: u32 = 20;
/// Tailscale window
pub const TAILSCALE_WINDOW_SECS: u64 = 120;
/// Key prefix for Tailscale windows
pub const TAILSCALE_KEY_PREFIX: &str = "tailscale:";

/// Key prefix for every rate limit window stored in the cache
pub const RATE_LIMIT_KEY_PREFIX: &str = "ratelimit:";
