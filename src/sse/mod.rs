// ABOUTME: Server-Sent Events infrastructure for live health updates
// ABOUTME: Client registry with bounded per-client queues and the streaming route
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

/// Client registry and fan-out of health transitions
pub mod broadcaster;
/// HTTP route handlers for SSE endpoints
pub mod routes;

pub use broadcaster::{HealthBroadcaster, HealthMessage, HealthSubscription, OverflowStrategy};
pub use routes::SseRoutes;
