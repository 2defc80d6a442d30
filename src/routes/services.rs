// ABOUTME: Service resource route handlers served through the read-through cache
// ABOUTME: Queue control actions, empty payloads for unconfigured instances, 504/500 mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

//! Service resource routes
//!
//! `GET /api/{service}/{resource}?instanceId=<id>` resolves the instance
//! through the service directory, then serves the adapter resource from the
//! read-through cache. Instances without a URL get the resource's empty
//! payload with `200`; those responses are never cached.
//!
//! `DELETE /api/{service}/queue/{item_id}?instanceId=<id>` removes a queue
//! item upstream and drops the cached queue and stats of that instance.

use crate::cache::read_through::CacheStatus;
use crate::cache::resource_key;
use crate::resources::ServerResources;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Json, Router};
use homedash_adapters::{QueueRemoval, ResourceSpec, QUEUE_RESOURCE, STATS_RESOURCE};
use homedash_core::constants::cache::CACHE_STATUS_HEADER;
use homedash_core::errors::{AppError, AppResult};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Query parameters shared by every resource route
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceQuery {
    /// Service instance to read
    pub instance_id: Option<String>,
}

/// Query parameters of the queue delete action
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueDeleteQuery {
    /// Service instance owning the queue
    pub instance_id: Option<String>,
    /// Also remove the download from the download client
    #[serde(default = "default_remove_from_client")]
    pub remove_from_client: bool,
    /// Blocklist the release
    #[serde(default)]
    pub blocklist: bool,
}

const fn default_remove_from_client() -> bool {
    true
}

impl QueueDeleteQuery {
    const fn removal(&self) -> QueueRemoval {
        QueueRemoval {
            remove_from_client: self.remove_from_client,
            blocklist: self.blocklist,
        }
    }
}

/// Service resource routes
pub struct ServiceRoutes;

impl ServiceRoutes {
    /// `GET /api/:service/:resource` and `DELETE /api/:service/queue/:item_id`
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/:service/:resource", get(Self::handle_resource))
            .route(
                "/api/:service/queue/:item_id",
                delete(Self::handle_queue_delete),
            )
            .with_state(resources)
    }

    /// `GET /api/tailscale/:resource`, limited separately from other services
    pub fn tailscale_routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/tailscale/:resource", get(Self::handle_tailscale_resource))
            .with_state(resources)
    }

    async fn handle_resource(
        State(resources): State<Arc<ServerResources>>,
        Path((service, resource)): Path<(String, String)>,
        Query(query): Query<InstanceQuery>,
    ) -> Result<Response, AppError> {
        serve_resource(&resources, &service, &resource, query).await
    }

    async fn handle_queue_delete(
        State(resources): State<Arc<ServerResources>>,
        Path((service, item_id)): Path<(String, i64)>,
        Query(query): Query<QueueDeleteQuery>,
    ) -> Result<Response, AppError> {
        delete_queue_item(&resources, &service, item_id, query).await
    }

    async fn handle_tailscale_resource(
        State(resources): State<Arc<ServerResources>>,
        Path(resource): Path<String>,
        Query(query): Query<InstanceQuery>,
    ) -> Result<Response, AppError> {
        serve_resource(&resources, "tailscale", &resource, query).await
    }
}

/// Serve one adapter resource for one instance
///
/// # Errors
///
/// - `400` when `instanceId` is missing
/// - `404` for an unknown service or resource
/// - `504` when the upstream call timed out, `500` for other failures
pub async fn serve_resource(
    resources: &ServerResources,
    service: &str,
    resource: &str,
    query: InstanceQuery,
) -> AppResult<Response> {
    let instance_id = query
        .instance_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::missing_field("instanceId"))?;

    let adapter = resources
        .adapters
        .get(service)
        .ok_or_else(|| AppError::not_found(format!("Service '{service}'")))?;
    let spec = adapter.resource(resource).ok_or_else(|| {
        AppError::not_found(format!("Resource '{resource}' of service '{service}'"))
    })?;

    let record = match resources.directory.lookup(&instance_id).await? {
        Some(record) if record.service_type != service => {
            return Err(instance_not_found(service, &instance_id));
        }
        Some(record) if record.is_configured() => record,
        _ => {
            debug!(instance_id = %instance_id, service, resource, "Service not configured");
            return Ok(empty_response(spec));
        }
    };

    let key = resource_key(service, spec.name, &instance_id);
    let (url, api_key, name) = (record.url, record.api_key, spec.name);
    let fetcher = move || async move { adapter.fetch_resource(name, &url, &api_key).await };

    match resources.read_through.fetch(&key, spec, fetcher).await {
        Ok((value, status)) => Ok(cached_response(value, status)),
        Err(e) if e.is_not_configured() => Ok(empty_response(spec)),
        Err(e) => {
            warn!(
                instance_id = %instance_id,
                cache_key = %key,
                timeout = e.is_timeout(),
                error = %e,
                "Service resource fetch failed"
            );
            Err(AppError::from(e))
        }
    }
}

/// Remove a queue item upstream, then invalidate the instance's cached queue
///
/// # Errors
///
/// - `400` when `instanceId` is missing or the instance has no URL
/// - `404` for an unknown service, instance, or a service without a queue
/// - `504` when the upstream call timed out, `500` for other failures
pub async fn delete_queue_item(
    resources: &ServerResources,
    service: &str,
    item_id: i64,
    query: QueueDeleteQuery,
) -> AppResult<Response> {
    let removal = query.removal();
    let instance_id = query
        .instance_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::missing_field("instanceId"))?;

    let adapter = resources
        .adapters
        .get(service)
        .ok_or_else(|| AppError::not_found(format!("Service '{service}'")))?;
    if adapter.resource(QUEUE_RESOURCE).is_none() {
        return Err(AppError::not_found(format!(
            "Resource '{QUEUE_RESOURCE}' of service '{service}'"
        )));
    }

    let record = match resources.directory.lookup(&instance_id).await? {
        Some(record) if record.service_type == service => record,
        _ => return Err(instance_not_found(service, &instance_id)),
    };
    if !record.is_configured() {
        return Err(AppError::invalid_input(format!(
            "Instance '{instance_id}' has no URL configured"
        )));
    }

    if let Err(e) = adapter
        .delete_queue_item(&record.url, &record.api_key, item_id, removal)
        .await
    {
        warn!(
            instance_id = %instance_id,
            item_id,
            timeout = e.is_timeout(),
            error = %e,
            "Queue item removal failed"
        );
        return Err(AppError::from(e));
    }

    for resource in [QUEUE_RESOURCE, STATS_RESOURCE] {
        let key = resource_key(service, resource, &instance_id);
        if let Err(e) = resources.read_through.cache().delete(&key).await {
            warn!(cache_key = %key, error = %e, "Cache invalidation failed");
        }
    }
    info!(
        instance_id = %instance_id,
        item_id,
        remove_from_client = removal.remove_from_client,
        blocklist = removal.blocklist,
        "Queue item removed"
    );
    Ok(StatusCode::NO_CONTENT.into_response())
}

fn instance_not_found(service: &str, instance_id: &str) -> AppError {
    AppError::not_found(format!("Instance '{instance_id}' of service '{service}'"))
}

fn empty_response(spec: &ResourceSpec) -> Response {
    Json(spec.empty_value()).into_response()
}

fn cached_response(value: Value, status: CacheStatus) -> Response {
    ([(CACHE_STATUS_HEADER, status.as_header())], Json(value)).into_response()
}
