// ABOUTME: Health check route handlers for the server itself and monitored services
// ABOUTME: Liveness, readiness including cache backend health, and per-instance health state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

//! Health check routes
//!
//! `/health` and `/ready` describe this server and are meant for load
//! balancer probes. `/api/health` and `/api/health/{instance_id}` expose
//! the monitor's latest view of the upstream services.

use crate::resources::ServerResources;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use homedash_core::constants::service_names;
use homedash_core::errors::AppError;
use homedash_core::models::HealthState;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Server liveness body
#[derive(Debug, Clone, Serialize)]
pub struct LivenessResponse {
    /// Always `healthy` while the process answers
    pub status: &'static str,
    /// Service name
    pub service: &'static str,
    /// Service version
    pub version: &'static str,
    /// Seconds since startup
    pub uptime_seconds: u64,
    /// Response timestamp (RFC 3339)
    pub timestamp: String,
}

/// Health check routes
pub struct HealthRoutes;

impl HealthRoutes {
    /// Unauthenticated `/health` and `/ready`
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::handle_liveness))
            .route("/ready", get(Self::handle_readiness))
            .with_state(resources)
    }

    /// Monitored service health: `/api/health` and `/api/health/:instance_id`
    pub fn service_routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/health", get(Self::handle_snapshot))
            .route("/api/health/:instance_id", get(Self::handle_instance))
            .with_state(resources)
    }

    async fn handle_liveness(State(resources): State<Arc<ServerResources>>) -> Json<LivenessResponse> {
        Json(LivenessResponse {
            status: "healthy",
            service: service_names::HOMEDASH_SERVER,
            version: env!("CARGO_PKG_VERSION"),
            uptime_seconds: resources.started_at.elapsed().as_secs(),
            timestamp: Utc::now().to_rfc3339(),
        })
    }

    async fn handle_readiness(State(resources): State<Arc<ServerResources>>) -> Response {
        let backend = resources.cache.backend_name();
        match resources.cache.health_check().await {
            Ok(()) => Json(json!({
                "status": "ready",
                "cache": { "backend": backend, "status": "healthy" },
                "timestamp": Utc::now().to_rfc3339(),
            }))
            .into_response(),
            Err(e) => {
                warn!(cache_backend = backend, error = %e, "Readiness check failed");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({
                        "status": "not_ready",
                        "cache": { "backend": backend, "status": "unhealthy", "error": e.message },
                        "timestamp": Utc::now().to_rfc3339(),
                    })),
                )
                    .into_response()
            }
        }
    }

    async fn handle_snapshot(
        State(resources): State<Arc<ServerResources>>,
    ) -> Json<Vec<HealthState>> {
        Json(resources.monitor.snapshot().await)
    }

    async fn handle_instance(
        State(resources): State<Arc<ServerResources>>,
        Path(instance_id): Path<String>,
    ) -> Result<Json<HealthState>, AppError> {
        resources
            .monitor
            .get_state(&instance_id)
            .await
            .map(Json)
            .ok_or_else(|| AppError::not_found(format!("Health state for '{instance_id}'")))
    }
}
