// ABOUTME: HTTP middleware for rate limiting and request tracing
// ABOUTME: Applied per route group by the router in routes/mod.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

/// Per-route-class rate limiting with standard headers
pub mod rate_limiting;
/// Request ids and per-request tracing spans
pub mod tracing;

pub use self::rate_limiting::{rate_limit_middleware, RateLimitState};
pub use self::tracing::{http_trace_layer, request_id_middleware, RequestId};
