// ABOUTME: Tailscale adapter: tailnet device list and device statistics
// ABOUTME: Uses the Tailscale v2 API with a bearer API key
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

use crate::core::{
    require_base_url, to_payload, EmptyPayload, ResourceSpec, ServiceAdapter, STATS_RESOURCE,
};
use crate::http_client::{ApiAuth, UpstreamClient};
use async_trait::async_trait;
use homedash_core::constants::cache::{TTL_DEVICES_SECS, TTL_STATS_SECS};
use homedash_core::errors::AdapterResult;
use homedash_core::models::{HealthPayload, HealthStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Service type served by [`TailscaleAdapter`]
pub const SERVICE_TYPE: &str = "tailscale";

/// Device list resource
pub const DEVICES_RESOURCE: &str = "devices";

const DEVICES_PATH: &str = "/api/v2/tailnet/-/devices";

static RESOURCES: &[ResourceSpec] = &[
    ResourceSpec::new(
        STATS_RESOURCE,
        Duration::from_secs(TTL_STATS_SECS),
        EmptyPayload::Object,
    ),
    ResourceSpec::new(
        DEVICES_RESOURCE,
        Duration::from_secs(TTL_DEVICES_SECS),
        EmptyPayload::Array,
    ),
];

/// One device of the tailnet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Device id
    pub id: String,
    /// MagicDNS name
    #[serde(default)]
    pub name: String,
    /// Machine hostname
    #[serde(default)]
    pub hostname: String,
    /// Tailnet addresses
    #[serde(default)]
    pub addresses: Vec<String>,
    /// Operating system
    #[serde(default)]
    pub os: String,
    /// Whether an admin authorized the device
    #[serde(default)]
    pub authorized: bool,
    /// Whether a client update is available
    #[serde(default)]
    pub update_available: bool,
    /// Last time the device talked to the control plane
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DevicesResponse {
    #[serde(default)]
    devices: Vec<Device>,
}

/// Aggregate tailnet statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TailnetStats {
    /// Devices in the tailnet
    pub total: u64,
    /// Authorized devices
    pub authorized: u64,
    /// Devices with a pending client update
    pub updates_available: u64,
}

impl TailnetStats {
    fn from_devices(devices: &[Device]) -> Self {
        Self {
            total: devices.len() as u64,
            authorized: devices.iter().filter(|d| d.authorized).count() as u64,
            updates_available: devices.iter().filter(|d| d.update_available).count() as u64,
        }
    }
}

/// Adapter for the Tailscale control plane API
#[derive(Debug, Clone)]
pub struct TailscaleAdapter {
    client: UpstreamClient,
}

impl TailscaleAdapter {
    /// Create an adapter using the shared upstream client
    #[must_use]
    pub const fn new(client: UpstreamClient) -> Self {
        Self { client }
    }

    /// Fetch every device of the tailnet
    ///
    /// # Errors
    ///
    /// Returns an adapter error when the instance is unconfigured or the call fails
    pub async fn devices(&self, base_url: &str, api_key: &str) -> AdapterResult<Vec<Device>> {
        let base = require_base_url(base_url)?;
        let response: DevicesResponse = self
            .client
            .get_json(base, DEVICES_PATH, ApiAuth::Bearer(api_key))
            .await?;
        Ok(response.devices)
    }
}

#[async_trait]
impl ServiceAdapter for TailscaleAdapter {
    fn service_type(&self) -> &'static str {
        SERVICE_TYPE
    }

    fn resources(&self) -> &'static [ResourceSpec] {
        RESOURCES
    }

    async fn fetch_stats(&self, base_url: &str, api_key: &str) -> AdapterResult<Value> {
        let devices = self.devices(base_url, api_key).await?;
        to_payload(&TailnetStats::from_devices(&devices))
    }

    async fn fetch_health(&self, base_url: &str, api_key: &str) -> AdapterResult<HealthPayload> {
        let devices = self.devices(base_url, api_key).await?;
        let pending = devices.iter().filter(|d| !d.authorized).count();
        if pending == 0 {
            Ok(HealthPayload::online())
        } else {
            Ok(HealthPayload::with_message(
                HealthStatus::Warning,
                format!("{pending} device(s) awaiting authorization"),
            ))
        }
    }

    async fn fetch_resource(
        &self,
        resource: &str,
        base_url: &str,
        api_key: &str,
    ) -> AdapterResult<Value> {
        match resource {
            STATS_RESOURCE => self.fetch_stats(base_url, api_key).await,
            DEVICES_RESOURCE => to_payload(&self.devices(base_url, api_key).await?),
            other => Err(self.unsupported(other)),
        }
    }
}
