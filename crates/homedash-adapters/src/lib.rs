// ABOUTME: Upstream service adapters for autobrr, the *arr family and Tailscale
// ABOUTME: ServiceAdapter trait, shared HTTP client, and the adapter registry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

//! Service adapters and their shared plumbing.
//!
//! The aggregation runtime talks to upstream products only through
//! [`ServiceAdapter`]; each adapter module is behind its own cargo feature.

pub use homedash_core::errors::{AdapterError, AdapterResult};

/// Service adapter trait and resource descriptors
pub mod core;
/// Shared HTTP client for upstream API calls
pub mod http_client;
/// Adapter registry keyed by service type
pub mod registry;

/// *arr family adapter (Sonarr, Radarr, Prowlarr)
#[cfg(feature = "adapter-arr")]
pub mod arr;
/// autobrr adapter
#[cfg(feature = "adapter-autobrr")]
pub mod autobrr;
/// Tailscale adapter
#[cfg(feature = "adapter-tailscale")]
pub mod tailscale;

pub use core::{
    EmptyPayload, QueueRemoval, ResourceSpec, ServiceAdapter, QUEUE_RESOURCE, STATS_RESOURCE,
};
pub use http_client::{ApiAuth, UpstreamClient};
pub use registry::AdapterRegistry;
