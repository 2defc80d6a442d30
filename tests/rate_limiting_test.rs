// ABOUTME: Integration tests for the sliding-window rate limiter
// ABOUTME: Verifies per-class limits, window sliding, client isolation, and fail-open behavior
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::{Duration as ChronoDuration, Utc};
use common::failing_cache;
use homedash::cache::Cache;
use homedash::config::{RateLimitConfig, RouteLimit};
use homedash::rate_limiting::{RouteClass, SlidingWindowLimiter};

fn limiter_with(api: RouteLimit) -> SlidingWindowLimiter {
    let config = RateLimitConfig {
        api,
        ..RateLimitConfig::default()
    };
    SlidingWindowLimiter::new(Cache::in_memory(1_000), config)
}

#[tokio::test]
async fn test_exactly_one_rejection_past_the_limit() {
    let limiter = limiter_with(RouteLimit {
        max_requests: 5,
        window_secs: 60,
    });
    let now = Utc::now();

    let mut rejected = 0;
    for _ in 0..6 {
        let decision = limiter.check_at(RouteClass::Api, "10.0.0.1", now).await;
        if !decision.allowed {
            rejected += 1;
        }
    }
    assert_eq!(rejected, 1);
}

#[tokio::test]
async fn test_remaining_counts_down() {
    let limiter = limiter_with(RouteLimit {
        max_requests: 3,
        window_secs: 60,
    });
    let now = Utc::now();

    let remaining: Vec<u32> = {
        let mut values = Vec::new();
        for _ in 0..3 {
            values.push(limiter.check_at(RouteClass::Api, "c", now).await.remaining);
        }
        values
    };
    assert_eq!(remaining, vec![2, 1, 0]);

    let rejected = limiter.check_at(RouteClass::Api, "c", now).await;
    assert!(!rejected.allowed);
    assert_eq!(rejected.limit, 3);
    assert_eq!(rejected.remaining, 0);
    assert!(rejected.reset_at > now);
}

#[tokio::test]
async fn test_window_slides() {
    let limiter = limiter_with(RouteLimit {
        max_requests: 2,
        window_secs: 60,
    });
    let start = Utc::now() - ChronoDuration::seconds(120);

    assert!(limiter.check_at(RouteClass::Api, "c", start).await.allowed);
    assert!(limiter.check_at(RouteClass::Api, "c", start).await.allowed);
    assert!(!limiter.check_at(RouteClass::Api, "c", start).await.allowed);

    // Once the window has passed the old requests no longer count
    let later = start + ChronoDuration::seconds(61);
    assert!(limiter.check_at(RouteClass::Api, "c", later).await.allowed);
}

#[tokio::test]
async fn test_rejected_requests_are_not_recorded() {
    let limiter = limiter_with(RouteLimit {
        max_requests: 1,
        window_secs: 60,
    });
    let start = Utc::now() - ChronoDuration::seconds(120);

    assert!(limiter.check_at(RouteClass::Api, "c", start).await.allowed);
    for offset in 1..10 {
        let at = start + ChronoDuration::seconds(offset);
        assert!(!limiter.check_at(RouteClass::Api, "c", at).await.allowed);
    }

    // Only the admitted request counted, so the window reopens 60s after it
    let reopened = start + ChronoDuration::seconds(61);
    assert!(limiter.check_at(RouteClass::Api, "c", reopened).await.allowed);
}

#[tokio::test]
async fn test_clients_and_classes_are_isolated() {
    let limiter = limiter_with(RouteLimit {
        max_requests: 1,
        window_secs: 60,
    });
    let now = Utc::now();

    assert!(limiter.check_at(RouteClass::Api, "a", now).await.allowed);
    assert!(!limiter.check_at(RouteClass::Api, "a", now).await.allowed);

    assert!(limiter.check_at(RouteClass::Api, "b", now).await.allowed);
    assert!(limiter.check_at(RouteClass::Health, "a", now).await.allowed);
}

#[tokio::test]
async fn test_tailscale_class_uses_its_own_window() {
    let limiter = SlidingWindowLimiter::new(Cache::in_memory(100), RateLimitConfig::default());
    let decision = limiter.check(RouteClass::Tailscale, "c").await;
    assert!(decision.allowed);
    assert_eq!(decision.limit, 20);
    assert_eq!(decision.window_secs, 120);
}

#[tokio::test]
async fn test_store_failure_admits_requests() {
    common::init_test_logging();
    let config = RateLimitConfig {
        api: RouteLimit {
            max_requests: 1,
            window_secs: 60,
        },
        ..RateLimitConfig::default()
    };
    let limiter = SlidingWindowLimiter::new(failing_cache(), config);

    for _ in 0..5 {
        assert!(limiter.check(RouteClass::Api, "c").await.allowed);
    }
}

#[tokio::test]
async fn test_disabled_limiter_admits_everything() {
    let config = RateLimitConfig {
        enabled: false,
        api: RouteLimit {
            max_requests: 1,
            window_secs: 60,
        },
        ..RateLimitConfig::default()
    };
    let limiter = SlidingWindowLimiter::new(Cache::in_memory(100), config);

    for _ in 0..5 {
        assert!(limiter.check(RouteClass::Api, "c").await.allowed);
    }
}

#[tokio::test]
async fn test_reset_is_one_window_after_the_check() {
    let limiter = limiter_with(RouteLimit {
        max_requests: 1,
        window_secs: 60,
    });
    let now = Utc::now();

    let admitted = limiter.check_at(RouteClass::Api, "reset", now).await;
    assert_eq!(admitted.reset_at, now + ChronoDuration::seconds(60));

    let later = now + ChronoDuration::seconds(20);
    let rejected = limiter.check_at(RouteClass::Api, "reset", later).await;
    assert!(!rejected.allowed);
    assert_eq!(rejected.reset_at, later + ChronoDuration::seconds(60));
    assert!(rejected.retry_after_secs() <= rejected.window_secs + 20);
}
