// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Scripted service adapters, failing cache providers, and server resource builders
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
//! Shared test utilities for `homedash`
//!
//! Integration tests never talk to real upstreams: they register a
//! [`ScriptedAdapter`] whose health and resource answers the test controls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use homedash::cache::{Cache, CacheConfig, CacheEntry, CacheProvider};
use homedash::config::{ServerConfig, StaticServiceDirectory};
use homedash::errors::{AdapterError, AdapterResult, AppError, AppResult};
use homedash::models::{HealthPayload, ServiceRecord};
use homedash::resources::ServerResources;
use homedash_adapters::{AdapterRegistry, EmptyPayload, QueueRemoval, ResourceSpec, ServiceAdapter};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Service type served by [`ScriptedAdapter`]
pub const SCRIPTED_SERVICE: &str = "scripted";

static SCRIPTED_RESOURCES: &[ResourceSpec] = &[
    ResourceSpec::new("stats", Duration::from_secs(60), EmptyPayload::Object),
    ResourceSpec::new("queue", Duration::from_secs(60), EmptyPayload::Array),
];

/// What the scripted adapter answers next
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Succeed with this value
    Value(Value),
    /// Fail with this error
    Fail(AdapterError),
    /// Sleep, then succeed with this value
    Slow(Duration, Value),
}

/// Adapter whose answers are set by the test
#[derive(Debug)]
pub struct ScriptedAdapter {
    health: Mutex<Result<HealthPayload, AdapterError>>,
    health_delay: Mutex<Option<Duration>>,
    resource: Mutex<Scripted>,
    resource_calls: AtomicUsize,
    health_calls: AtomicUsize,
    deleted: Mutex<Vec<(i64, QueueRemoval)>>,
}

impl ScriptedAdapter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            health: Mutex::new(Ok(HealthPayload::online())),
            health_delay: Mutex::new(None),
            resource: Mutex::new(Scripted::Value(json!({ "total": 1 }))),
            resource_calls: AtomicUsize::new(0),
            health_calls: AtomicUsize::new(0),
            deleted: Mutex::new(Vec::new()),
        })
    }

    pub fn set_health(&self, health: Result<HealthPayload, AdapterError>) {
        *self.health.lock().unwrap() = health;
    }

    pub fn set_health_delay(&self, delay: Option<Duration>) {
        *self.health_delay.lock().unwrap() = delay;
    }

    pub fn set_resource(&self, answer: Scripted) {
        *self.resource.lock().unwrap() = answer;
    }

    pub fn resource_calls(&self) -> usize {
        self.resource_calls.load(Ordering::SeqCst)
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    /// Queue items removed so far, in call order
    pub fn deleted_items(&self) -> Vec<(i64, QueueRemoval)> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ServiceAdapter for ScriptedAdapter {
    fn service_type(&self) -> &'static str {
        SCRIPTED_SERVICE
    }

    fn resources(&self) -> &'static [ResourceSpec] {
        SCRIPTED_RESOURCES
    }

    async fn fetch_stats(&self, base_url: &str, api_key: &str) -> AdapterResult<Value> {
        self.fetch_resource("stats", base_url, api_key).await
    }

    async fn fetch_health(&self, _base_url: &str, _api_key: &str) -> AdapterResult<HealthPayload> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.health_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.health.lock().unwrap().clone()
    }

    async fn fetch_resource(
        &self,
        resource: &str,
        _base_url: &str,
        _api_key: &str,
    ) -> AdapterResult<Value> {
        if self.resource(resource).is_none() {
            return Err(self.unsupported(resource));
        }
        self.resource_calls.fetch_add(1, Ordering::SeqCst);
        let answer = self.resource.lock().unwrap().clone();
        match answer {
            Scripted::Value(value) => Ok(value),
            Scripted::Fail(error) => Err(error),
            Scripted::Slow(delay, value) => {
                tokio::time::sleep(delay).await;
                Ok(value)
            }
        }
    }

    async fn delete_queue_item(
        &self,
        _base_url: &str,
        _api_key: &str,
        item_id: i64,
        removal: QueueRemoval,
    ) -> AdapterResult<()> {
        self.deleted.lock().unwrap().push((item_id, removal));
        Ok(())
    }
}

/// Configured record for the scripted service
pub fn scripted_record(instance_id: &str) -> ServiceRecord {
    ServiceRecord {
        instance_id: instance_id.to_owned(),
        service_type: SCRIPTED_SERVICE.to_owned(),
        url: "http://scripted.invalid".to_owned(),
        api_key: "secret".to_owned(),
        display_name: None,
    }
}

/// Record without a URL
pub fn unconfigured_record(instance_id: &str, service_type: &str) -> ServiceRecord {
    ServiceRecord {
        instance_id: instance_id.to_owned(),
        service_type: service_type.to_owned(),
        url: String::new(),
        api_key: String::new(),
        display_name: None,
    }
}

/// Registry holding only `adapter`
pub fn registry_with(adapter: Arc<ScriptedAdapter>) -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();
    registry.register(adapter);
    registry
}

/// Server configuration suitable for tests: fast health checks, small SSE buffers
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.health.check_timeout_secs = 1;
    config.sse.client_buffer = 8;
    config
}

/// Resources around an in-memory cache, the scripted adapter and `records`
pub fn create_test_server_resources(
    config: ServerConfig,
    adapter: Arc<ScriptedAdapter>,
    records: Vec<ServiceRecord>,
) -> Arc<ServerResources> {
    init_test_logging();
    let directory = StaticServiceDirectory::from_records(records).unwrap();
    Arc::new(ServerResources::new(
        Arc::new(config),
        Cache::in_memory(1_000),
        registry_with(adapter),
        Arc::new(directory),
    ))
}

/// Cache provider whose every operation fails, for fail-open checks
#[derive(Debug, Default)]
pub struct FailingCacheProvider;

fn unavailable() -> AppError {
    AppError::storage("cache backend unavailable")
}

#[async_trait]
impl CacheProvider for FailingCacheProvider {
    async fn new(_config: CacheConfig) -> AppResult<Self> {
        Ok(Self)
    }

    async fn get(&self, _key: &str) -> AppResult<Option<CacheEntry>> {
        Err(unavailable())
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> AppResult<()> {
        Err(unavailable())
    }

    async fn delete(&self, _key: &str) -> AppResult<()> {
        Err(unavailable())
    }

    async fn increment(&self, _key: &str, _timestamp: DateTime<Utc>) -> AppResult<()> {
        Err(unavailable())
    }

    async fn clean_and_count(&self, _key: &str, _window_start: DateTime<Utc>) -> AppResult<u64> {
        Err(unavailable())
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> AppResult<()> {
        Err(unavailable())
    }

    async fn health_check(&self) -> AppResult<()> {
        Err(unavailable())
    }

    async fn clear_all(&self) -> AppResult<()> {
        Err(unavailable())
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

/// Cache whose backend always fails
pub fn failing_cache() -> Cache {
    Cache::from_provider(Arc::new(FailingCacheProvider))
}
