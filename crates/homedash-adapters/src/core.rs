// ABOUTME: Core service adapter trait shared by every upstream integration
// ABOUTME: Uniform fetch_stats/fetch_health contract plus named cacheable resources
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

//! # Service Adapter Contract
//!
//! Each upstream product (autobrr, Sonarr, Tailscale, ...) gets one
//! implementation of [`ServiceAdapter`]. The aggregation runtime only ever
//! talks to this trait: it never parses upstream payloads itself.
//!
//! Adapters expose:
//! - **`fetch_stats`**: aggregate statistics for the instance
//! - **`fetch_health`**: a [`HealthPayload`] for the health monitor
//! - **resources**: further named payloads (IRC status, queue, ...) with
//!   their own cache TTL and empty payload, fetched through `fetch_resource`
//!
//! ## Example: adding an adapter
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use homedash_adapters::core::{EmptyPayload, ResourceSpec, ServiceAdapter};
//! use homedash_core::errors::AdapterResult;
//! use homedash_core::models::HealthPayload;
//! use serde_json::Value;
//! use std::time::Duration;
//!
//! struct Custom;
//!
//! static RESOURCES: &[ResourceSpec] = &[ResourceSpec::new(
//!     "stats",
//!     Duration::from_secs(10),
//!     EmptyPayload::Object,
//! )];
//!
//! #[async_trait]
//! impl ServiceAdapter for Custom {
//!     fn service_type(&self) -> &'static str {
//!         "custom"
//!     }
//!
//!     fn resources(&self) -> &'static [ResourceSpec] {
//!         RESOURCES
//!     }
//!
//!     async fn fetch_stats(&self, _base_url: &str, _api_key: &str) -> AdapterResult<Value> {
//!         Ok(serde_json::json!({ "total": 0 }))
//!     }
//!
//!     async fn fetch_health(&self, _base_url: &str, _api_key: &str) -> AdapterResult<HealthPayload> {
//!         Ok(HealthPayload::online())
//!     }
//! }
//! ```

use async_trait::async_trait;
use homedash_core::errors::{AdapterError, AdapterResult};
use homedash_core::models::HealthPayload;
use serde_json::Value;
use std::time::Duration;

/// Name of the statistics resource every adapter serves
pub const STATS_RESOURCE: &str = "stats";

/// Download queue resource, the target of queue control actions
pub const QUEUE_RESOURCE: &str = "queue";

/// How a queue item is removed upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueRemoval {
    /// Also remove the download from the download client
    pub remove_from_client: bool,
    /// Add the release to the blocklist so it is not grabbed again
    pub blocklist: bool,
}

impl Default for QueueRemoval {
    fn default() -> Self {
        Self {
            remove_from_client: true,
            blocklist: false,
        }
    }
}

/// Shape of the payload returned for an unconfigured instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyPayload {
    /// `{}`
    Object,
    /// `[]`
    Array,
}

impl EmptyPayload {
    /// JSON value for this shape
    #[must_use]
    pub fn to_value(self) -> Value {
        match self {
            Self::Object => Value::Object(serde_json::Map::new()),
            Self::Array => Value::Array(Vec::new()),
        }
    }
}

/// A cacheable payload an adapter can fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSpec {
    /// Resource name as it appears in `/api/{service}/{resource}`
    pub name: &'static str,
    /// How long a fetched payload stays in the cache
    pub ttl: Duration,
    /// Age after which a cache hit triggers a background refresh
    pub fresh_for: Duration,
    /// Payload served when the instance is unconfigured
    pub empty: EmptyPayload,
}

impl ResourceSpec {
    /// Resource whose freshness threshold is half its TTL
    #[must_use]
    pub const fn new(name: &'static str, ttl: Duration, empty: EmptyPayload) -> Self {
        let half = ttl.as_millis() / 2;
        #[allow(clippy::cast_possible_truncation)] // TTLs are seconds-scale
        let fresh_for = Duration::from_millis(half as u64);
        Self {
            name,
            ttl,
            fresh_for,
            empty,
        }
    }

    /// Override the freshness threshold, clamped to the TTL
    #[must_use]
    pub const fn with_fresh_for(mut self, fresh_for: Duration) -> Self {
        self.fresh_for = if fresh_for.as_millis() > self.ttl.as_millis() {
            self.ttl
        } else {
            fresh_for
        };
        self
    }

    /// Empty payload as JSON
    #[must_use]
    pub fn empty_value(&self) -> Value {
        self.empty.to_value()
    }
}

/// Uniform contract implemented once per upstream product
#[async_trait]
pub trait ServiceAdapter: Send + Sync {
    /// Service type served by this adapter (`autobrr`, `sonarr`, ...)
    fn service_type(&self) -> &'static str;

    /// Resources this adapter can fetch; must include [`STATS_RESOURCE`]
    fn resources(&self) -> &'static [ResourceSpec];

    /// Fetch aggregate statistics
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` for an empty URL, `Timeout` when the deadline
    /// expires, and another variant for any upstream failure
    async fn fetch_stats(&self, base_url: &str, api_key: &str) -> AdapterResult<Value>;

    /// Fetch the current health of the instance
    ///
    /// # Errors
    ///
    /// Same classification as [`ServiceAdapter::fetch_stats`]
    async fn fetch_health(&self, base_url: &str, api_key: &str) -> AdapterResult<HealthPayload>;

    /// Fetch a named resource
    ///
    /// The default serves only [`STATS_RESOURCE`]; adapters with more
    /// resources override it.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedResource` for unknown names, otherwise the same
    /// classification as [`ServiceAdapter::fetch_stats`]
    async fn fetch_resource(
        &self,
        resource: &str,
        base_url: &str,
        api_key: &str,
    ) -> AdapterResult<Value> {
        if resource == STATS_RESOURCE {
            self.fetch_stats(base_url, api_key).await
        } else {
            Err(self.unsupported(resource))
        }
    }

    /// Remove one item from the download queue
    ///
    /// Only adapters with a queue override this.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedResource` when the service has no queue, otherwise
    /// the same classification as [`ServiceAdapter::fetch_stats`]
    async fn delete_queue_item(
        &self,
        _base_url: &str,
        _api_key: &str,
        _item_id: i64,
        _removal: QueueRemoval,
    ) -> AdapterResult<()> {
        Err(self.unsupported(QUEUE_RESOURCE))
    }

    /// Look up a resource by name
    fn resource(&self, name: &str) -> Option<&'static ResourceSpec> {
        self.resources().iter().find(|spec| spec.name == name)
    }

    /// Error for a resource this adapter does not serve
    fn unsupported(&self, resource: &str) -> AdapterError {
        AdapterError::UnsupportedResource {
            service: self.service_type().to_owned(),
            resource: resource.to_owned(),
        }
    }
}

/// Reject calls for instances without a URL
///
/// # Errors
///
/// Returns `NotConfigured` when `base_url` is blank
pub fn require_base_url(base_url: &str) -> AdapterResult<&str> {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        Err(AdapterError::NotConfigured)
    } else {
        Ok(trimmed)
    }
}

/// Serialize an adapter's typed payload for the cache
///
/// # Errors
///
/// Returns `UnexpectedResponse` if the payload cannot be represented as JSON
pub fn to_payload<T: serde::Serialize>(payload: &T) -> AdapterResult<Value> {
    serde_json::to_value(payload).map_err(|e| AdapterError::UnexpectedResponse(e.to_string()))
}
