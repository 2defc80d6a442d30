// ABOUTME: Shared models for service health and service configuration records
// ABOUTME: HealthState transitions, health payloads returned by adapters, ServiceRecord
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Health status of a monitored service instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Service answered and reported no problems
    Online,
    /// Service answered but reported degraded operation
    Warning,
    /// Service failed, timed out, or reported errors
    Error,
    /// No URL or credentials configured for the instance
    Unconfigured,
}

impl HealthStatus {
    /// Lowercase wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Unconfigured => "unconfigured",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health payload returned by an adapter's health check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthPayload {
    /// Status reported by the upstream
    pub status: HealthStatus,
    /// Optional detail (warning text, error summary)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Upstream version, when the service exposes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl HealthPayload {
    /// Healthy payload without detail
    #[must_use]
    pub const fn online() -> Self {
        Self {
            status: HealthStatus::Online,
            message: None,
            version: None,
        }
    }

    /// Payload with a status and message
    pub fn with_message(status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
            version: None,
        }
    }

    /// Attach the upstream version
    #[must_use]
    pub fn version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }
}

/// Last known health of one service instance.
///
/// `last_changed_at <= last_checked_at` always holds; `last_changed_at`
/// moves only when `status` or `message` differs from the previous
/// observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthState {
    /// Service instance identifier
    pub instance_id: String,
    /// Current status
    pub status: HealthStatus,
    /// Optional human-readable detail
    #[serde(default)]
    pub message: Option<String>,
    /// When the instance was last polled
    pub last_checked_at: DateTime<Utc>,
    /// When status or message last changed
    pub last_changed_at: DateTime<Utc>,
}

impl HealthState {
    /// First observation of an instance
    #[must_use]
    pub const fn first(
        instance_id: String,
        status: HealthStatus,
        message: Option<String>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            instance_id,
            status,
            message,
            last_checked_at: observed_at,
            last_changed_at: observed_at,
        }
    }

    /// Whether an observation differs from this state
    #[must_use]
    pub fn differs_from(&self, status: HealthStatus, message: Option<&str>) -> bool {
        self.status != status || self.message.as_deref() != message
    }
}

/// A health state transition pushed to streaming clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthEvent {
    /// State after the transition
    #[serde(flatten)]
    pub state: HealthState,
    /// Status before the transition, absent on first observation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<HealthStatus>,
}

/// Configured service instance, supplied by the configuration collaborator
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    /// Unique instance identifier (e.g. `autobrr-1`)
    pub instance_id: String,
    /// Adapter type (`autobrr`, `sonarr`, ...)
    pub service_type: String,
    /// Base URL of the upstream API, empty when unconfigured
    #[serde(default)]
    pub url: String,
    /// API key or token
    #[serde(default)]
    pub api_key: String,
    /// Optional display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl ServiceRecord {
    /// Whether the record has a URL to call
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

// Keep API keys out of logs
impl fmt::Debug for ServiceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRecord")
            .field("instance_id", &self.instance_id)
            .field("service_type", &self.service_type)
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("display_name", &self.display_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_differs_from_compares_status_and_message() {
        let now = Utc::now();
        let state = HealthState::first("a".to_owned(), HealthStatus::Online, None, now);

        assert!(!state.differs_from(HealthStatus::Online, None));
        assert!(state.differs_from(HealthStatus::Error, None));
        assert!(state.differs_from(HealthStatus::Online, Some("slow")));
    }

    #[test]
    fn test_service_record_debug_redacts_api_key() {
        let record = ServiceRecord {
            instance_id: "sonarr-1".to_owned(),
            service_type: "sonarr".to_owned(),
            url: "http://sonarr:8989".to_owned(),
            api_key: "super-secret".to_owned(),
            display_name: None,
        };
        let debug = format!("{record:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_health_event_serializes_flat_camel_case() {
        let now = Utc::now();
        let event = HealthEvent {
            state: HealthState::first("x".to_owned(), HealthStatus::Warning, None, now),
            previous_status: Some(HealthStatus::Online),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["instanceId"], "x");
        assert_eq!(json["status"], "warning");
        assert_eq!(json["previousStatus"], "online");
    }
}
