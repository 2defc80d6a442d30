// ABOUTME: Error taxonomy for service adapter calls
// ABOUTME: Separates unconfigured services and deadline expiry from upstream faults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

use thiserror::Error;

/// Errors reported by a service adapter or by the plumbing around it.
///
/// `NotConfigured` is not a fault: callers turn it into an empty success
/// response or the `unconfigured` health state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdapterError {
    /// No URL or credentials on record for the instance
    #[error("service not configured")]
    NotConfigured,

    /// The call exceeded its deadline
    #[error("request timed out after {after_secs}s")]
    Timeout {
        /// Deadline that was exceeded
        after_secs: u64,
    },

    /// The call was canceled before completing
    #[error("request canceled")]
    Canceled,

    /// Connection to the upstream could not be established
    #[error("service unreachable: {0}")]
    Unreachable(String),

    /// Upstream answered with a non-success status
    #[error("upstream returned {status}: {message}")]
    Upstream {
        /// HTTP status returned by the upstream
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Upstream answered, but the payload could not be understood
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The adapter has no resource with this name
    #[error("{service} has no resource named '{resource}'")]
    UnsupportedResource {
        /// Service type
        service: String,
        /// Requested resource
        resource: String,
    },

    /// Service configuration lookup failed
    #[error("service lookup failed: {0}")]
    Lookup(String),
}

impl AdapterError {
    /// Whether the error stands for deadline expiry or cancellation
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Canceled)
    }

    /// Whether the error means the instance simply has no configuration
    #[must_use]
    pub const fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured)
    }

    /// Classify a `reqwest` transport error
    #[cfg(feature = "adapter-errors")]
    #[must_use]
    pub fn from_reqwest(error: &reqwest::Error, timeout_secs: u64) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                after_secs: timeout_secs,
            }
        } else if error.is_connect() {
            Self::Unreachable(error.to_string())
        } else if error.is_decode() {
            Self::UnexpectedResponse(error.to_string())
        } else if let Some(status) = error.status() {
            Self::Upstream {
                status: status.as_u16(),
                message: error.to_string(),
            }
        } else {
            Self::Unreachable(error.to_string())
        }
    }
}

/// Result type for adapter calls
pub type AdapterResult<T> = Result<T, AdapterError>;
