// ABOUTME: Integration tests for the upstream service adapters
// ABOUTME: Runs autobrr, *arr and Tailscale adapters against a fake upstream on localhost
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Json, Router};
use homedash::errors::AdapterError;
use homedash::models::HealthStatus;
use homedash_adapters::arr::{ArrAdapter, ArrFlavor};
use homedash_adapters::autobrr::AutobrrAdapter;
use homedash_adapters::tailscale::TailscaleAdapter;
use homedash_adapters::{AdapterRegistry, QueueRemoval, ServiceAdapter, UpstreamClient};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tokio::net::TcpListener;

const API_KEY: &str = "test-key";

/// Serve `app` on an ephemeral localhost port and return its base URL
async fn spawn_upstream(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{address}")
}

fn header_is(headers: &HeaderMap, name: &str, expected: &str) -> bool {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == expected)
}

fn autobrr_upstream(irc_healthy: bool) -> Router {
    Router::new()
        .route("/api/healthz/liveness", get(|| async { "OK" }))
        .route(
            "/api/config",
            get(|| async { Json(json!({ "version": "1.50.0" })) }),
        )
        .route(
            "/api/release/stats",
            get(|headers: HeaderMap| async move {
                if !header_is(&headers, "x-api-token", API_KEY) {
                    return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
                }
                Json(json!({
                    "total_count": 120,
                    "filtered_count": 30,
                    "filter_rejected_count": 90,
                    "push_approved_count": 25,
                    "push_rejected_count": 4,
                    "push_error_count": 1
                }))
                .into_response()
            }),
        )
        .route(
            "/api/irc",
            get(move || async move {
                Json(json!([
                    { "id": 1, "name": "libera", "enabled": true, "healthy": irc_healthy },
                    { "id": 2, "name": "old", "enabled": false, "healthy": false }
                ]))
            }),
        )
}

fn client() -> UpstreamClient {
    UpstreamClient::new(2, 1)
}

#[tokio::test]
async fn test_autobrr_stats_and_irc() {
    let base = spawn_upstream(autobrr_upstream(true)).await;
    let adapter = AutobrrAdapter::new(client());

    let stats = adapter.fetch_stats(&base, API_KEY).await.unwrap();
    assert_eq!(stats["total_count"], 120);
    assert_eq!(stats["push_error_count"], 1);

    let irc = adapter.fetch_resource("irc", &base, API_KEY).await.unwrap();
    assert_eq!(irc.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_autobrr_health_reports_unhealthy_networks() {
    let base = spawn_upstream(autobrr_upstream(true)).await;
    let adapter = AutobrrAdapter::new(client());
    let health = adapter.fetch_health(&base, API_KEY).await.unwrap();
    assert_eq!(health.status, HealthStatus::Online);
    assert_eq!(health.version.as_deref(), Some("1.50.0"));

    let base = spawn_upstream(autobrr_upstream(false)).await;
    let health = adapter.fetch_health(&base, API_KEY).await.unwrap();
    assert_eq!(health.status, HealthStatus::Warning);
    assert_eq!(
        health.message.as_deref(),
        Some("IRC network unhealthy: libera")
    );
}

#[tokio::test]
async fn test_wrong_api_key_is_upstream_error() {
    let base = spawn_upstream(autobrr_upstream(true)).await;
    let adapter = AutobrrAdapter::new(client());

    let error = adapter.fetch_stats(&base, "wrong").await.unwrap_err();
    assert!(matches!(error, AdapterError::Upstream { status: 401, .. }));
}

#[tokio::test]
async fn test_blank_url_is_not_configured() {
    let adapter = AutobrrAdapter::new(client());
    let error = adapter.fetch_stats("  ", API_KEY).await.unwrap_err();
    assert!(error.is_not_configured());
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let app = Router::new().route(
        "/api/release/stats",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({}))
        }),
    );
    let base = spawn_upstream(app).await;
    let adapter = AutobrrAdapter::new(UpstreamClient::new(1, 1));

    let error = adapter.fetch_stats(&base, API_KEY).await.unwrap_err();
    assert!(error.is_timeout(), "expected timeout, got {error:?}");
}

#[tokio::test]
async fn test_unreachable_upstream() {
    // Bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let adapter = AutobrrAdapter::new(client());
    let error = adapter
        .fetch_stats(&format!("http://{address}"), API_KEY)
        .await
        .unwrap_err();
    assert!(matches!(error, AdapterError::Unreachable(_)), "got {error:?}");
}

#[tokio::test]
async fn test_malformed_payload_is_unexpected_response() {
    let app = Router::new().route("/api/irc", get(|| async { "not json" }));
    let base = spawn_upstream(app).await;
    let adapter = AutobrrAdapter::new(client());

    let error = adapter.fetch_resource("irc", &base, API_KEY).await.unwrap_err();
    assert!(matches!(error, AdapterError::UnexpectedResponse(_)));
}

fn sonarr_upstream() -> Router {
    Router::new()
        .route(
            "/api/v3/system/status",
            get(|| async { Json(json!({ "version": "4.0.0" })) }),
        )
        .route(
            "/api/v3/health",
            get(|headers: HeaderMap| async move {
                if !header_is(&headers, "x-api-key", API_KEY) {
                    return StatusCode::UNAUTHORIZED.into_response();
                }
                Json(json!([
                    { "source": "IndexerCheck", "type": "warning", "message": "No indexers" },
                    { "source": "UpdateCheck", "type": "notice", "message": "Update soon" }
                ]))
                .into_response()
            }),
        )
        .route(
            "/api/v3/queue",
            get(|| async {
                Json(json!({
                    "totalRecords": 2,
                    "records": [{ "id": 1 }, { "id": 2 }]
                }))
            }),
        )
}

#[tokio::test]
async fn test_sonarr_stats_health_and_queue() {
    let base = spawn_upstream(sonarr_upstream()).await;
    let adapter = ArrAdapter::new(ArrFlavor::Sonarr, client());

    let stats = adapter.fetch_stats(&base, API_KEY).await.unwrap();
    assert_eq!(stats, json!({ "queueTotal": 2, "warnings": 1, "errors": 0 }));

    let health = adapter.fetch_health(&base, API_KEY).await.unwrap();
    assert_eq!(health.status, HealthStatus::Warning);
    assert_eq!(health.message.as_deref(), Some("No indexers"));
    assert_eq!(health.version.as_deref(), Some("4.0.0"));

    let queue = adapter.fetch_resource("queue", &base, API_KEY).await.unwrap();
    assert_eq!(queue.as_array().unwrap().len(), 2);

    // Sonarr has no indexers resource
    let error = adapter
        .fetch_resource("indexers", &base, API_KEY)
        .await
        .unwrap_err();
    assert!(matches!(error, AdapterError::UnsupportedResource { .. }));
}

#[tokio::test]
async fn test_sonarr_queue_item_delete() {
    let app = Router::new().route(
        "/api/v3/queue/:id",
        delete(
            |Path(id): Path<i64>,
             Query(query): Query<HashMap<String, String>>,
             headers: HeaderMap| async move {
                let expected = query.get("removeFromClient").map(String::as_str) == Some("true")
                    && query.get("blocklist").map(String::as_str) == Some("true");
                if !header_is(&headers, "x-api-key", API_KEY) {
                    StatusCode::UNAUTHORIZED
                } else if id == 42 && expected {
                    StatusCode::OK
                } else {
                    StatusCode::NOT_FOUND
                }
            },
        ),
    );
    let base = spawn_upstream(app).await;
    let adapter = ArrAdapter::new(ArrFlavor::Sonarr, client());
    let removal = QueueRemoval {
        remove_from_client: true,
        blocklist: true,
    };

    adapter
        .delete_queue_item(&base, API_KEY, 42, removal)
        .await
        .unwrap();

    let error = adapter
        .delete_queue_item(&base, API_KEY, 41, removal)
        .await
        .unwrap_err();
    assert!(matches!(error, AdapterError::Upstream { status: 404, .. }));

    let error = adapter
        .delete_queue_item("", API_KEY, 42, removal)
        .await
        .unwrap_err();
    assert!(error.is_not_configured());
}

#[tokio::test]
async fn test_queue_delete_unsupported_without_queue() {
    let prowlarr = ArrAdapter::new(ArrFlavor::Prowlarr, client());
    let error = prowlarr
        .delete_queue_item("http://prowlarr.invalid", API_KEY, 1, QueueRemoval::default())
        .await
        .unwrap_err();
    assert!(matches!(error, AdapterError::UnsupportedResource { .. }));

    let autobrr = AutobrrAdapter::new(client());
    let error = autobrr
        .delete_queue_item("http://autobrr.invalid", API_KEY, 1, QueueRemoval::default())
        .await
        .unwrap_err();
    assert!(matches!(error, AdapterError::UnsupportedResource { .. }));
}

#[tokio::test]
async fn test_prowlarr_indexer_stats() {
    let app = Router::new().route(
        "/api/v1/indexerstats",
        get(|| async {
            Json(json!({
                "indexers": [
                    { "numberOfQueries": 10, "numberOfGrabs": 2, "numberOfFailedQueries": 1 },
                    { "numberOfQueries": 5, "numberOfGrabs": 1, "numberOfFailedGrabs": 1 }
                ]
            }))
        }),
    );
    let base = spawn_upstream(app).await;
    let adapter = ArrAdapter::new(ArrFlavor::Prowlarr, client());

    let stats = adapter.fetch_stats(&base, API_KEY).await.unwrap();
    assert_eq!(stats["indexers"], 2);
    assert_eq!(stats["queries"], 15);
    assert_eq!(stats["grabs"], 3);
    assert_eq!(stats["failedQueries"], 1);
    assert_eq!(stats["failedGrabs"], 1);
}

#[tokio::test]
async fn test_tailscale_devices_use_bearer_auth() {
    let app = Router::new().route(
        "/api/v2/tailnet/-/devices",
        get(|headers: HeaderMap| async move {
            if !header_is(&headers, "authorization", &format!("Bearer {API_KEY}")) {
                return StatusCode::UNAUTHORIZED.into_response();
            }
            Json(json!({
                "devices": [
                    { "id": "1", "hostname": "nas", "authorized": true, "updateAvailable": true },
                    { "id": "2", "hostname": "laptop", "authorized": false }
                ]
            }))
            .into_response()
        }),
    );
    let base = spawn_upstream(app).await;
    let adapter = TailscaleAdapter::new(client());

    let stats = adapter.fetch_stats(&base, API_KEY).await.unwrap();
    assert_eq!(
        stats,
        json!({ "total": 2, "authorized": 1, "updatesAvailable": 1 })
    );

    let health = adapter.fetch_health(&base, API_KEY).await.unwrap();
    assert_eq!(health.status, HealthStatus::Warning);
    assert_eq!(
        health.message.as_deref(),
        Some("1 device(s) awaiting authorization")
    );
}

#[test]
fn test_default_registry_resolves_every_service_type() {
    let registry = AdapterRegistry::with_defaults(&client());
    for service_type in ["autobrr", "sonarr", "radarr", "prowlarr", "tailscale"] {
        let adapter = registry.get(service_type).unwrap();
        assert_eq!(adapter.service_type(), service_type);
        assert!(adapter.resource("stats").is_some());
    }
    assert!(registry.get("gopher").is_none());
}
