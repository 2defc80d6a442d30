// ABOUTME: Route module organization for homedash HTTP endpoints
// ABOUTME: Assembles route groups, their rate limit classes, and the request tracing layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

//! Route module for the homedash server
//!
//! Each domain module contains route definitions and thin handlers. This
//! module merges them and attaches one rate limit class per group:
//!
//! | routes                           | class       |
//! |----------------------------------|-------------|
//! | `/api/:service/:resource`        | `api`       |
//! | `/api/:service/queue/:item_id`   | `api`       |
//! | `/api/tailscale/:resource`       | `tailscale` |
//! | `/api/health`, `/api/health/*`   | `health`    |
//! | `/health`, `/ready`              | none        |

/// Health check and monitored service health routes
pub mod health;
/// Service resource routes
pub mod services;

pub use health::HealthRoutes;
pub use services::ServiceRoutes;

use crate::middleware::{http_trace_layer, rate_limit_middleware, request_id_middleware, RateLimitState};
use crate::rate_limiting::{RouteClass, SlidingWindowLimiter};
use crate::resources::ServerResources;
use crate::sse::SseRoutes;
use axum::{middleware, Router};
use homedash_core::errors::AppError;
use std::sync::Arc;

/// Build the complete application router
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let limiter = &resources.limiter;

    Router::new()
        .merge(HealthRoutes::routes(Arc::clone(&resources)))
        .merge(rate_limited(
            HealthRoutes::service_routes(Arc::clone(&resources)),
            limiter,
            RouteClass::Health,
        ))
        .merge(rate_limited(
            SseRoutes::routes(Arc::clone(&resources)),
            limiter,
            RouteClass::Health,
        ))
        .merge(rate_limited(
            ServiceRoutes::tailscale_routes(Arc::clone(&resources)),
            limiter,
            RouteClass::Tailscale,
        ))
        .merge(rate_limited(
            ServiceRoutes::routes(Arc::clone(&resources)),
            limiter,
            RouteClass::Api,
        ))
        .fallback(handle_unknown_route)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(http_trace_layer())
}

/// Apply `class` limits to every route of `router`
fn rate_limited(router: Router, limiter: &SlidingWindowLimiter, class: RouteClass) -> Router {
    router.route_layer(middleware::from_fn_with_state(
        RateLimitState::new(limiter.clone(), class),
        rate_limit_middleware,
    ))
}

async fn handle_unknown_route() -> AppError {
    AppError::not_found("Route")
}
