// ABOUTME: Health monitor and event broadcaster constants
// ABOUTME: Poll cadence, per-check deadlines, and SSE client buffering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

/// Interval between two health poll ticks
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Deadline for a single service health check
pub const DEFAULT_CHECK_TIMEOUT_SECS: u64 = 10;

/// Per-client SSE queue depth before the overflow strategy applies
pub const DEFAULT_SSE_CLIENT_BUFFER: usize = 64;

/// SSE keepalive interval
pub const SSE_KEEPALIVE_SECS: u64 = 15;

/// SSE event name for health messages
pub const SSE_HEALTH_EVENT: &str = "health";
