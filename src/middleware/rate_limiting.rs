// ABOUTME: Rate limiting middleware for HTTP requests
// ABOUTME: Applies a route class limit per client and adds standard rate limit headers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

//! # Rate Limiting Middleware with HTTP Headers
//!
//! Wraps a router with [`rate_limit_middleware`] through
//! `axum::middleware::from_fn_with_state`, one [`RateLimitState`] per route
//! class. Rejected requests get `429` plus `Retry-After`.

use crate::rate_limiting::{RateLimitDecision, RouteClass, SlidingWindowLimiter};
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use homedash_core::errors::AppError;
use http::{HeaderMap, HeaderValue};
use std::net::SocketAddr;

/// HTTP header names for rate limiting
pub mod headers {
    /// HTTP header name for maximum requests allowed in the current window
    pub const X_RATE_LIMIT_LIMIT: &str = "X-RateLimit-Limit";
    /// HTTP header name for remaining requests in the current window
    pub const X_RATE_LIMIT_REMAINING: &str = "X-RateLimit-Remaining";
    /// HTTP header name for Unix timestamp when rate limit resets
    pub const X_RATE_LIMIT_RESET: &str = "X-RateLimit-Reset";
    /// HTTP header name for retry-after duration in seconds
    pub const RETRY_AFTER: &str = "Retry-After";
    /// Proxy header carrying the original client address
    pub const X_FORWARDED_FOR: &str = "X-Forwarded-For";
    /// Proxy header carrying the original client address (nginx)
    pub const X_REAL_IP: &str = "X-Real-IP";
}

/// Middleware state: the shared limiter plus the class it enforces
#[derive(Clone, Debug)]
pub struct RateLimitState {
    limiter: SlidingWindowLimiter,
    class: RouteClass,
}

impl RateLimitState {
    /// State enforcing `class`
    #[must_use]
    pub const fn new(limiter: SlidingWindowLimiter, class: RouteClass) -> Self {
        Self { limiter, class }
    }
}

/// Create a `HeaderMap` with rate limit headers
#[must_use]
pub fn create_rate_limit_headers(decision: &RateLimitDecision) -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(headers::X_RATE_LIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(
        headers::X_RATE_LIMIT_REMAINING,
        HeaderValue::from(decision.remaining),
    );
    headers.insert(
        headers::X_RATE_LIMIT_RESET,
        HeaderValue::from(decision.reset_at.timestamp()),
    );

    if !decision.allowed {
        headers.insert(
            headers::RETRY_AFTER,
            HeaderValue::from(decision.retry_after_secs()),
        );
    }

    headers
}

/// Identify the client: first `X-Forwarded-For` hop, then `X-Real-IP`, then the peer address
#[must_use]
pub fn client_identifier(request: &Request) -> String {
    let request_headers = request.headers();

    let forwarded = request_headers
        .get(headers::X_FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(client) = forwarded {
        return client.to_owned();
    }

    let real_ip = request_headers
        .get(headers::X_REAL_IP)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(client) = real_ip {
        return client.to_owned();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_owned(), |info| info.0.ip().to_string())
}

/// Reject the request with `429` when its client exhausted the class limit
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_identifier(&request);
    let decision = state.limiter.check(state.class, &client).await;
    let rate_headers = create_rate_limit_headers(&decision);

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        AppError::rate_limit_exceeded(decision.limit, decision.reset_at).into_response()
    };

    response.headers_mut().extend(rate_headers);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_client_identifier_prefers_forwarded_for() {
        let request = Request::builder()
            .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
            .header("X-Real-IP", "198.51.100.2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_identifier(&request), "203.0.113.7");
    }

    #[test]
    fn test_client_identifier_falls_back_to_unknown() {
        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_identifier(&request), "unknown");
    }
}
