// ABOUTME: Unified error handling with standard error codes and HTTP status mapping
// ABOUTME: AppError is the single error type surfaced by routes and infrastructure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

//! # Unified Error Handling System
//!
//! Every fallible operation in the runtime returns [`AppResult`]. Errors
//! carry an [`ErrorCode`] which decides the HTTP status, so the route layer
//! never has to inspect messages to pick a status code.

/// Errors reported by service adapters
pub mod adapter;

pub use adapter::{AdapterError, AdapterResult};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request rate exceeded for a route class
    RateLimitExceeded,
    /// Malformed request input
    InvalidInput,
    /// Required query parameter or field absent
    MissingRequiredField,
    /// Unknown service, resource, or instance
    ResourceNotFound,
    /// Upstream service returned a fault or an unexpected response
    ExternalServiceError,
    /// Upstream service could not be reached
    ExternalServiceUnavailable,
    /// Upstream call exceeded its deadline or was canceled
    ExternalTimeout,
    /// Configuration is invalid or could not be loaded
    ConfigError,
    /// Cache or rate limit store failure
    StorageError,
    /// Payload (de)serialization failure
    SerializationError,
    /// Anything else
    InternalError,
}

impl ErrorCode {
    /// HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidInput | Self::MissingRequiredField => 400,
            Self::ResourceNotFound => 404,
            Self::RateLimitExceeded => 429,
            Self::ExternalTimeout => 504,
            // Upstream faults are reported as internal errors so clients can tell
            // them apart from deadline expiry (504) without parsing messages
            Self::ExternalServiceError
            | Self::ExternalServiceUnavailable
            | Self::ConfigError
            | Self::StorageError
            | Self::SerializationError
            | Self::InternalError => 500,
        }
    }

    /// User-facing description of this error class
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::RateLimitExceeded => "Rate limit exceeded",
            Self::InvalidInput => "Invalid input",
            Self::MissingRequiredField => "Missing required field",
            Self::ResourceNotFound => "Resource not found",
            Self::ExternalServiceError => "Upstream service error",
            Self::ExternalServiceUnavailable => "Upstream service unavailable",
            Self::ExternalTimeout => "Upstream request timed out",
            Self::ConfigError => "Configuration error",
            Self::StorageError => "Storage error",
            Self::SerializationError => "Serialization error",
            Self::InternalError => "Internal server error",
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional structured details (rate limit reset time, upstream status, ...)
    pub details: Option<serde_json::Value>,
}

impl AppError {
    /// Create a new error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attach structured details
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Rate limit exceeded for a route class
    #[must_use]
    pub fn rate_limit_exceeded(limit: u32, reset_at: chrono::DateTime<chrono::Utc>) -> Self {
        Self::new(
            ErrorCode::RateLimitExceeded,
            format!("Rate limit of {limit} requests exceeded"),
        )
        .with_details(serde_json::json!({
            "limit": limit,
            "reset_at": reset_at.to_rfc3339(),
        }))
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Required field missing
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{field} is required"),
        )
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Upstream fault
    pub fn external_service(service: &str, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("{service}: {}", message.into()),
        )
    }

    /// Upstream deadline exceeded
    pub fn external_timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExternalTimeout, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Storage (cache backend) error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    /// Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error.to_string())
    }
}

impl From<AdapterError> for AppError {
    fn from(error: AdapterError) -> Self {
        let code = match &error {
            AdapterError::Timeout { .. } | AdapterError::Canceled => ErrorCode::ExternalTimeout,
            AdapterError::Unreachable(_) => ErrorCode::ExternalServiceUnavailable,
            AdapterError::UnsupportedResource { .. } => ErrorCode::ResourceNotFound,
            AdapterError::NotConfigured
            | AdapterError::Upstream { .. }
            | AdapterError::UnexpectedResponse(_)
            | AdapterError::Lookup(_) => ErrorCode::ExternalServiceError,
        };
        Self::new(code, error.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error body: `{"error": <message>, "code": <CODE>}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
    /// Machine-readable code
    pub code: ErrorCode,
    /// Structured details when available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        Self {
            error: error.message.clone(),
            code: error.code,
            details: error.details.clone(),
        }
    }
}

#[cfg(feature = "http-response")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = http::StatusCode::from_u16(self.http_status())
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse::from(&self);
        (status, axum::Json(body)).into_response()
    }
}
