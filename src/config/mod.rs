// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Handles environment configs, cache and rate limit settings, and the service directory
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

//! Configuration module for the homedash server
//!
//! - **Environment**: server configuration from environment variables
//! - **Cache**: cache backend and per-route-class rate limit settings
//! - **Services**: the service directory consumed by routes and the monitor

/// Cache backend and rate limiting configuration
pub mod cache;
/// Environment and server configuration
pub mod environment;
/// Service directory contract and static implementation
pub mod services;

pub use cache::{CacheSettings, RateLimitConfig, RedisConnectionConfig, RouteLimit};
pub use environment::{HealthMonitorConfig, ServerConfig, SseConfig, UpstreamConfig};
pub use services::{ServiceDirectory, StaticServiceDirectory};
