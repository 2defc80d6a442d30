// ABOUTME: Service directory contract and a static YAML-backed implementation
// ABOUTME: Resolves instance ids to service records for routes and the health monitor
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

use async_trait::async_trait;
use homedash_core::errors::{AppError, AppResult};
use homedash_core::models::ServiceRecord;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Read-only source of configured service instances
#[async_trait]
pub trait ServiceDirectory: Send + Sync {
    /// Record for one instance, `None` when unknown
    async fn lookup(&self, instance_id: &str) -> AppResult<Option<ServiceRecord>>;

    /// Every configured instance
    async fn list(&self) -> AppResult<Vec<ServiceRecord>>;
}

/// Directory over a fixed set of records
#[derive(Debug, Clone, Default)]
pub struct StaticServiceDirectory {
    records: Arc<HashMap<String, ServiceRecord>>,
}

impl StaticServiceDirectory {
    /// Build from records
    ///
    /// # Errors
    ///
    /// Returns an error if an instance id is empty or appears twice
    pub fn from_records(records: Vec<ServiceRecord>) -> AppResult<Self> {
        let mut by_id = HashMap::with_capacity(records.len());
        for record in records {
            if record.instance_id.trim().is_empty() {
                return Err(AppError::config("Service record with empty instanceId"));
            }
            let id = record.instance_id.clone();
            if by_id.insert(id.clone(), record).is_some() {
                return Err(AppError::config(format!(
                    "Duplicate service instanceId '{id}'"
                )));
            }
        }
        Ok(Self {
            records: Arc::new(by_id),
        })
    }

    /// Parse a YAML list of records
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or the records conflict
    pub fn from_yaml_str(yaml: &str) -> AppResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let records: Vec<ServiceRecord> = serde_yaml::from_str(yaml)
            .map_err(|e| AppError::config(format!("Invalid services YAML: {e}")))?;
        Self::from_records(records)
    }

    /// Load a YAML list of records from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub async fn from_yaml_file(path: &Path) -> AppResult<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::config(format!(
                "Failed to read services file {}: {e}",
                path.display()
            ))
        })?;
        let directory = Self::from_yaml_str(&content)?;
        info!(
            services_file = %path.display(),
            service_count = directory.len(),
            "Loaded service directory"
        );
        Ok(directory)
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no service is configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ServiceDirectory for StaticServiceDirectory {
    async fn lookup(&self, instance_id: &str) -> AppResult<Option<ServiceRecord>> {
        Ok(self.records.get(instance_id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<ServiceRecord>> {
        let mut records: Vec<ServiceRecord> = self.records.values().cloned().collect();
        records.sort_by(|a, b| a.instance_id.cmp(&b.instance_id));
        Ok(records)
    }
}
