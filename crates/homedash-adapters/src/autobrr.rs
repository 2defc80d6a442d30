// ABOUTME: autobrr adapter: release statistics, IRC network status and health
// ABOUTME: Talks to the autobrr REST API with the X-API-Token header
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

use crate::core::{
    require_base_url, to_payload, EmptyPayload, ResourceSpec, ServiceAdapter, STATS_RESOURCE,
};
use crate::http_client::{ApiAuth, UpstreamClient};
use async_trait::async_trait;
use homedash_core::constants::cache::{TTL_CONNECTION_STATUS_SECS, TTL_STATS_SECS};
use homedash_core::errors::AdapterResult;
use homedash_core::models::{HealthPayload, HealthStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Service type served by [`AutobrrAdapter`]
pub const SERVICE_TYPE: &str = "autobrr";

/// IRC network status resource
pub const IRC_RESOURCE: &str = "irc";

const API_KEY_HEADER: &str = "X-API-Token";

static RESOURCES: &[ResourceSpec] = &[
    ResourceSpec::new(
        STATS_RESOURCE,
        Duration::from_secs(TTL_STATS_SECS),
        EmptyPayload::Object,
    ),
    ResourceSpec::new(
        IRC_RESOURCE,
        Duration::from_secs(TTL_CONNECTION_STATUS_SECS),
        EmptyPayload::Array,
    ),
];

/// Release counters reported by `/api/release/stats`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseStats {
    /// Releases seen
    #[serde(default)]
    pub total_count: u64,
    /// Releases matching a filter
    #[serde(default)]
    pub filtered_count: u64,
    /// Releases rejected by filters
    #[serde(default)]
    pub filter_rejected_count: u64,
    /// Releases approved by a download client
    #[serde(default)]
    pub push_approved_count: u64,
    /// Releases rejected by a download client
    #[serde(default)]
    pub push_rejected_count: u64,
    /// Releases that failed to push
    #[serde(default)]
    pub push_error_count: u64,
}

/// One IRC network as reported by `/api/irc`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrcNetworkStatus {
    /// Network id
    #[serde(default)]
    pub id: i64,
    /// Network name
    pub name: String,
    /// Whether the network is enabled
    #[serde(default)]
    pub enabled: bool,
    /// Whether autobrr considers the connection healthy
    #[serde(default)]
    pub healthy: bool,
    /// Connection timestamp, when connected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_since: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConfigResponse {
    #[serde(default)]
    version: Option<String>,
}

/// Adapter for autobrr instances
#[derive(Debug, Clone)]
pub struct AutobrrAdapter {
    client: UpstreamClient,
}

impl AutobrrAdapter {
    /// Create an adapter using the shared upstream client
    #[must_use]
    pub const fn new(client: UpstreamClient) -> Self {
        Self { client }
    }

    /// Fetch release counters
    ///
    /// # Errors
    ///
    /// Returns an adapter error when the instance is unconfigured or the call fails
    pub async fn release_stats(&self, base_url: &str, api_key: &str) -> AdapterResult<ReleaseStats> {
        let base = require_base_url(base_url)?;
        self.client
            .get_json(base, "/api/release/stats", ApiAuth::Header(API_KEY_HEADER, api_key))
            .await
    }

    /// Fetch IRC network status
    ///
    /// # Errors
    ///
    /// Returns an adapter error when the instance is unconfigured or the call fails
    pub async fn irc_status(
        &self,
        base_url: &str,
        api_key: &str,
    ) -> AdapterResult<Vec<IrcNetworkStatus>> {
        let base = require_base_url(base_url)?;
        self.client
            .get_json(base, "/api/irc", ApiAuth::Header(API_KEY_HEADER, api_key))
            .await
    }
}

#[async_trait]
impl ServiceAdapter for AutobrrAdapter {
    fn service_type(&self) -> &'static str {
        SERVICE_TYPE
    }

    fn resources(&self) -> &'static [ResourceSpec] {
        RESOURCES
    }

    async fn fetch_stats(&self, base_url: &str, api_key: &str) -> AdapterResult<Value> {
        let stats = self.release_stats(base_url, api_key).await?;
        to_payload(&stats)
    }

    async fn fetch_health(&self, base_url: &str, api_key: &str) -> AdapterResult<HealthPayload> {
        let base = require_base_url(base_url)?;
        let auth = ApiAuth::Header(API_KEY_HEADER, api_key);

        self.client
            .probe(base, "/api/healthz/liveness", auth)
            .await?;

        let version = self
            .client
            .get_json::<ConfigResponse>(base, "/api/config", auth)
            .await
            .ok()
            .and_then(|config| config.version);

        let networks = self.irc_status(base, api_key).await?;
        let unhealthy: Vec<&str> = networks
            .iter()
            .filter(|network| network.enabled && !network.healthy)
            .map(|network| network.name.as_str())
            .collect();

        let payload = if unhealthy.is_empty() {
            HealthPayload::online()
        } else {
            HealthPayload::with_message(
                HealthStatus::Warning,
                format!("IRC network unhealthy: {}", unhealthy.join(", ")),
            )
        };
        Ok(payload.version(version))
    }

    async fn fetch_resource(
        &self,
        resource: &str,
        base_url: &str,
        api_key: &str,
    ) -> AdapterResult<Value> {
        match resource {
            STATS_RESOURCE => self.fetch_stats(base_url, api_key).await,
            IRC_RESOURCE => {
                let networks = self.irc_status(base_url, api_key).await?;
                to_payload(&networks)
            }
            other => Err(self.unsupported(other)),
        }
    }
}
