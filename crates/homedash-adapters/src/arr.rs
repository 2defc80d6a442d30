// ABOUTME: *arr family adapter (Sonarr, Radarr, Prowlarr) sharing one REST dialect
// ABOUTME: System status, health warnings, download queue and indexer statistics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

//! Sonarr, Radarr and Prowlarr expose the same API shape under different
//! version prefixes, so one adapter type serves all three, parameterized by
//! [`ArrFlavor`].

pub use crate::core::QUEUE_RESOURCE;
use crate::core::{
    require_base_url, to_payload, EmptyPayload, QueueRemoval, ResourceSpec, ServiceAdapter,
    STATS_RESOURCE,
};
use crate::http_client::{ApiAuth, UpstreamClient};
use async_trait::async_trait;
use homedash_core::constants::cache::{TTL_INDEXERS_SECS, TTL_QUEUE_SECS, TTL_STATS_SECS};
use homedash_core::errors::AdapterResult;
use homedash_core::models::{HealthPayload, HealthStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Indexer list resource (Prowlarr)
pub const INDEXERS_RESOURCE: &str = "indexers";

const API_KEY_HEADER: &str = "X-Api-Key";

/// Queue records requested per call
const QUEUE_PAGE_SIZE: u32 = 50;

static DOWNLOADER_RESOURCES: &[ResourceSpec] = &[
    ResourceSpec::new(
        STATS_RESOURCE,
        Duration::from_secs(TTL_STATS_SECS),
        EmptyPayload::Object,
    ),
    ResourceSpec::new(
        QUEUE_RESOURCE,
        Duration::from_secs(TTL_QUEUE_SECS),
        EmptyPayload::Array,
    ),
];

static INDEXER_RESOURCES: &[ResourceSpec] = &[
    ResourceSpec::new(
        STATS_RESOURCE,
        Duration::from_secs(TTL_STATS_SECS),
        EmptyPayload::Object,
    ),
    ResourceSpec::new(
        INDEXERS_RESOURCE,
        Duration::from_secs(TTL_INDEXERS_SECS),
        EmptyPayload::Array,
    ),
];

/// Which *arr product an adapter talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrFlavor {
    /// TV series manager
    Sonarr,
    /// Movie manager
    Radarr,
    /// Indexer manager
    Prowlarr,
}

impl ArrFlavor {
    /// Service type string
    #[must_use]
    pub const fn service_type(self) -> &'static str {
        match self {
            Self::Sonarr => "sonarr",
            Self::Radarr => "radarr",
            Self::Prowlarr => "prowlarr",
        }
    }

    const fn api_prefix(self) -> &'static str {
        match self {
            Self::Sonarr | Self::Radarr => "/api/v3",
            Self::Prowlarr => "/api/v1",
        }
    }

    const fn resources(self) -> &'static [ResourceSpec] {
        match self {
            Self::Sonarr | Self::Radarr => DOWNLOADER_RESOURCES,
            Self::Prowlarr => INDEXER_RESOURCES,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SystemStatus {
    #[serde(default)]
    version: Option<String>,
}

/// One entry of the `/health` check list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckEntry {
    /// Component that raised the entry
    #[serde(default)]
    pub source: String,
    /// `ok`, `notice`, `warning` or `error`
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueuePage {
    #[serde(default)]
    total_records: u64,
    #[serde(default)]
    records: Vec<Value>,
}

/// Per-indexer counters from Prowlarr's `/indexerstats`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexerStatsEntry {
    #[serde(default)]
    number_of_queries: u64,
    #[serde(default)]
    number_of_grabs: u64,
    #[serde(default)]
    number_of_failed_queries: u64,
    #[serde(default)]
    number_of_failed_grabs: u64,
}

#[derive(Debug, Default, Deserialize)]
struct IndexerStatsResponse {
    #[serde(default)]
    indexers: Vec<IndexerStatsEntry>,
}

/// Indexer summary returned by the `indexers` resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexerSummary {
    /// Indexer id
    pub id: i64,
    /// Indexer name
    pub name: String,
    /// Whether the indexer is enabled
    #[serde(default)]
    pub enable: bool,
    /// `torrent` or `usenet`
    #[serde(default)]
    pub protocol: String,
    /// Search priority
    #[serde(default)]
    pub priority: i64,
}

/// Aggregate statistics for Sonarr and Radarr
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloaderStats {
    /// Items in the download queue
    pub queue_total: u64,
    /// Health entries of type `warning`
    pub warnings: u64,
    /// Health entries of type `error`
    pub errors: u64,
}

/// Aggregate statistics for Prowlarr
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexerStats {
    /// Indexers reporting statistics
    pub indexers: u64,
    /// Queries across all indexers
    pub queries: u64,
    /// Grabs across all indexers
    pub grabs: u64,
    /// Failed queries across all indexers
    pub failed_queries: u64,
    /// Failed grabs across all indexers
    pub failed_grabs: u64,
}

impl IndexerStats {
    fn aggregate(entries: &[IndexerStatsEntry]) -> Self {
        entries.iter().fold(
            Self {
                indexers: entries.len() as u64,
                ..Self::default()
            },
            |mut acc, entry| {
                acc.queries += entry.number_of_queries;
                acc.grabs += entry.number_of_grabs;
                acc.failed_queries += entry.number_of_failed_queries;
                acc.failed_grabs += entry.number_of_failed_grabs;
                acc
            },
        )
    }
}

/// Reduce health entries to one status and message
fn summarize_health(entries: &[HealthCheckEntry]) -> HealthPayload {
    let messages_of = |kind: &str| -> Vec<&str> {
        entries
            .iter()
            .filter(|entry| entry.kind.eq_ignore_ascii_case(kind))
            .map(|entry| entry.message.as_str())
            .collect()
    };

    let errors = messages_of("error");
    if !errors.is_empty() {
        return HealthPayload::with_message(HealthStatus::Error, errors.join("; "));
    }
    let warnings = messages_of("warning");
    if !warnings.is_empty() {
        return HealthPayload::with_message(HealthStatus::Warning, warnings.join("; "));
    }
    HealthPayload::online()
}

/// Adapter for Sonarr, Radarr and Prowlarr
#[derive(Debug, Clone)]
pub struct ArrAdapter {
    flavor: ArrFlavor,
    client: UpstreamClient,
}

impl ArrAdapter {
    /// Create an adapter for one product
    #[must_use]
    pub const fn new(flavor: ArrFlavor, client: UpstreamClient) -> Self {
        Self { flavor, client }
    }

    /// Product served by this adapter
    #[must_use]
    pub const fn flavor(&self) -> ArrFlavor {
        self.flavor
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        base_url: &str,
        api_key: &str,
        endpoint: &str,
    ) -> AdapterResult<T> {
        let base = require_base_url(base_url)?;
        let path = format!("{}{endpoint}", self.flavor.api_prefix());
        self.client
            .get_json(base, &path, Self::auth(api_key))
            .await
    }

    fn auth(api_key: &str) -> ApiAuth<'_> {
        ApiAuth::Header(API_KEY_HEADER, api_key)
    }

    async fn health_entries(
        &self,
        base_url: &str,
        api_key: &str,
    ) -> AdapterResult<Vec<HealthCheckEntry>> {
        self.get(base_url, api_key, "/health").await
    }

    async fn queue_page(&self, base_url: &str, api_key: &str) -> AdapterResult<QueuePage> {
        let endpoint = format!("/queue?page=1&pageSize={QUEUE_PAGE_SIZE}");
        self.get(base_url, api_key, &endpoint).await
    }

    async fn downloader_stats(&self, base_url: &str, api_key: &str) -> AdapterResult<Value> {
        let queue = self.queue_page(base_url, api_key).await?;
        let entries = self.health_entries(base_url, api_key).await?;
        let count = |kind: &str| {
            entries
                .iter()
                .filter(|entry| entry.kind.eq_ignore_ascii_case(kind))
                .count() as u64
        };
        to_payload(&DownloaderStats {
            queue_total: queue.total_records,
            warnings: count("warning"),
            errors: count("error"),
        })
    }

    async fn indexer_stats(&self, base_url: &str, api_key: &str) -> AdapterResult<Value> {
        let response: IndexerStatsResponse = self.get(base_url, api_key, "/indexerstats").await?;
        to_payload(&IndexerStats::aggregate(&response.indexers))
    }

    async fn indexers(&self, base_url: &str, api_key: &str) -> AdapterResult<Value> {
        let indexers: Vec<IndexerSummary> = self.get(base_url, api_key, "/indexer").await?;
        to_payload(&indexers)
    }
}

#[async_trait]
impl ServiceAdapter for ArrAdapter {
    fn service_type(&self) -> &'static str {
        self.flavor.service_type()
    }

    fn resources(&self) -> &'static [ResourceSpec] {
        self.flavor.resources()
    }

    async fn fetch_stats(&self, base_url: &str, api_key: &str) -> AdapterResult<Value> {
        match self.flavor {
            ArrFlavor::Sonarr | ArrFlavor::Radarr => self.downloader_stats(base_url, api_key).await,
            ArrFlavor::Prowlarr => self.indexer_stats(base_url, api_key).await,
        }
    }

    async fn fetch_health(&self, base_url: &str, api_key: &str) -> AdapterResult<HealthPayload> {
        let status: SystemStatus = self.get(base_url, api_key, "/system/status").await?;
        let entries = self.health_entries(base_url, api_key).await?;
        Ok(summarize_health(&entries).version(status.version))
    }

    async fn fetch_resource(
        &self,
        resource: &str,
        base_url: &str,
        api_key: &str,
    ) -> AdapterResult<Value> {
        match (self.flavor, resource) {
            (_, STATS_RESOURCE) => self.fetch_stats(base_url, api_key).await,
            (ArrFlavor::Sonarr | ArrFlavor::Radarr, QUEUE_RESOURCE) => {
                let queue = self.queue_page(base_url, api_key).await?;
                Ok(Value::Array(queue.records))
            }
            (ArrFlavor::Prowlarr, INDEXERS_RESOURCE) => self.indexers(base_url, api_key).await,
            (_, other) => Err(self.unsupported(other)),
        }
    }

    async fn delete_queue_item(
        &self,
        base_url: &str,
        api_key: &str,
        item_id: i64,
        removal: QueueRemoval,
    ) -> AdapterResult<()> {
        if self.flavor == ArrFlavor::Prowlarr {
            return Err(self.unsupported(QUEUE_RESOURCE));
        }
        let base = require_base_url(base_url)?;
        let path = format!(
            "{}/queue/{item_id}?removeFromClient={}&blocklist={}",
            self.flavor.api_prefix(),
            removal.remove_from_client,
            removal.blocklist
        );
        self.client.delete(base, &path, Self::auth(api_key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: &str, message: &str) -> HealthCheckEntry {
        HealthCheckEntry {
            source: "test".to_owned(),
            kind: kind.to_owned(),
            message: message.to_owned(),
        }
    }

    #[test]
    fn test_summarize_health_prefers_errors() {
        let payload = summarize_health(&[
            entry("warning", "update available"),
            entry("error", "download client unavailable"),
        ]);
        assert_eq!(payload.status, HealthStatus::Error);
        assert_eq!(payload.message.as_deref(), Some("download client unavailable"));
    }

    #[test]
    fn test_summarize_health_notice_is_online() {
        let payload = summarize_health(&[entry("notice", "backup pending")]);
        assert_eq!(payload.status, HealthStatus::Online);
        assert!(payload.message.is_none());
    }

    #[test]
    fn test_indexer_stats_aggregate() {
        let entries = vec![
            IndexerStatsEntry {
                number_of_queries: 10,
                number_of_grabs: 2,
                number_of_failed_queries: 1,
                number_of_failed_grabs: 0,
            },
            IndexerStatsEntry {
                number_of_queries: 5,
                number_of_grabs: 1,
                number_of_failed_queries: 0,
                number_of_failed_grabs: 1,
            },
        ];
        let stats = IndexerStats::aggregate(&entries);
        assert_eq!(stats.indexers, 2);
        assert_eq!(stats.queries, 15);
        assert_eq!(stats.grabs, 3);
        assert_eq!(stats.failed_queries, 1);
        assert_eq!(stats.failed_grabs, 1);
    }

    #[test]
    fn test_resources_per_flavor() {
        let client = UpstreamClient::default();
        let prowlarr = ArrAdapter::new(ArrFlavor::Prowlarr, client.clone());
        assert!(prowlarr.resource(INDEXERS_RESOURCE).is_some());
        assert!(prowlarr.resource(QUEUE_RESOURCE).is_none());

        let radarr = ArrAdapter::new(ArrFlavor::Radarr, client);
        assert!(radarr.resource(QUEUE_RESOURCE).is_some());
        assert_eq!(radarr.service_type(), "radarr");
    }
}
