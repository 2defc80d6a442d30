// ABOUTME: Main library entry point for the homedash service dashboard
// ABOUTME: Aggregation runtime with read-through caching, rate limiting, and health streaming
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

#![deny(unsafe_code)]

//! # Homedash
//!
//! A dashboard backend that aggregates statistics and health from
//! self-hosted services (autobrr, the *arr family, Tailscale) without
//! overloading any of them.
//!
//! ## Architecture
//!
//! - **Cache**: one store (in-memory or Redis) shared by everything below
//! - **Rate limiting**: sliding windows per route class and client
//! - **Read-through cache**: cached responses with refresh ahead of expiry
//! - **Monitor**: periodic health polling that emits state transitions
//! - **SSE**: fan-out of transitions to connected dashboards
//! - **Routes**: the axum HTTP surface over all of the above
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use homedash::config::ServerConfig;
//! use homedash::errors::AppResult;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("homedash configured on {}", config.bind_address());
//!     Ok(())
//! }
//! ```

/// Cache store backends and the read-through cache
pub mod cache;

/// Environment configuration and the service directory
pub mod config;

/// Structured logging setup
pub mod logging;

/// HTTP middleware (rate limiting, request tracing)
pub mod middleware;

/// Health polling and transition detection
pub mod monitor;

/// Sliding-window rate limiter
pub mod rate_limiting;

/// Shared resources injected into routes and tasks
pub mod resources;

/// HTTP routes
pub mod routes;

/// Server-sent health events
pub mod sse;

pub use homedash_core::{constants, errors, models};
