// ABOUTME: Network defaults for the HTTP server and upstream HTTP client
// ABOUTME: Ports, bind address, and request deadlines for adapter calls
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

/// Default HTTP port
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default bind address
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default upstream request timeout in seconds
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Default upstream connect timeout in seconds
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 5;

/// User agent sent to upstream services
pub const USER_AGENT: &str = concat!("homedash/", env!("CARGO_PKG_VERSION"));
