// ABOUTME: Centralized resource container for dependency injection into routes and tasks
// ABOUTME: Builds the shared cache, limiter, adapters, service directory and health monitor once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

//! # Server Resources
//!
//! Everything shared between handlers lives here and is built exactly once
//! at startup. The cache store in particular is injected into both the
//! read-through cache and the rate limiter so they share one backend.

use crate::cache::read_through::ReadThroughCache;
use crate::cache::{Cache, CacheConfig};
use crate::config::{ServerConfig, ServiceDirectory, StaticServiceDirectory};
use crate::monitor::HealthMonitor;
use crate::rate_limiting::SlidingWindowLimiter;
use crate::sse::HealthBroadcaster;
use homedash_adapters::{AdapterRegistry, UpstreamClient};
use homedash_core::errors::AppResult;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Shared server resources
#[derive(Clone)]
pub struct ServerResources {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Shared cache store
    pub cache: Cache,
    /// Read-through cache for service resources
    pub read_through: ReadThroughCache,
    /// Sliding-window limiter
    pub limiter: SlidingWindowLimiter,
    /// Adapter per service type
    pub adapters: AdapterRegistry,
    /// Configured service instances
    pub directory: Arc<dyn ServiceDirectory>,
    /// Health monitor and its broadcaster
    pub monitor: HealthMonitor,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl ServerResources {
    /// Assemble resources from already-built parts
    #[must_use]
    pub fn new(
        config: Arc<ServerConfig>,
        cache: Cache,
        adapters: AdapterRegistry,
        directory: Arc<dyn ServiceDirectory>,
    ) -> Self {
        let read_through = ReadThroughCache::new(cache.clone());
        let limiter = SlidingWindowLimiter::new(cache.clone(), config.rate_limits.clone());
        let broadcaster = HealthBroadcaster::new(config.sse.client_buffer, config.sse.overflow);
        let monitor = HealthMonitor::new(
            adapters.clone(),
            Arc::clone(&directory),
            broadcaster,
            config.health,
        );

        Self {
            config,
            cache,
            read_through,
            limiter,
            adapters,
            directory,
            monitor,
            started_at: Instant::now(),
        }
    }

    /// Build every resource from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be created or the services file
    /// cannot be loaded
    pub async fn from_config(config: ServerConfig) -> AppResult<Self> {
        let cache = Cache::new(CacheConfig::from_settings(&config.cache)).await?;
        info!(cache_backend = cache.backend_name(), "Cache store ready");

        let client = UpstreamClient::new(
            config.upstream.timeout_secs,
            config.upstream.connect_timeout_secs,
        );
        let adapters = AdapterRegistry::with_defaults(&client);
        info!(service_types = ?adapters.service_types(), "Service adapters registered");

        let directory = match &config.services_file {
            Some(path) => StaticServiceDirectory::from_yaml_file(path).await?,
            None => {
                warn!("SERVICES_FILE not set, no services will be monitored");
                StaticServiceDirectory::default()
            }
        };

        Ok(Self::new(
            Arc::new(config),
            cache,
            adapters,
            Arc::new(directory),
        ))
    }
}
