// ABOUTME: Adapter registry mapping service types to ServiceAdapter implementations
// ABOUTME: Built once at startup and shared by the route layer and the health monitor
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

#[cfg(feature = "adapter-arr")]
use crate::arr::{ArrAdapter, ArrFlavor};
#[cfg(feature = "adapter-autobrr")]
use crate::autobrr::AutobrrAdapter;
use crate::core::ServiceAdapter;
use crate::http_client::UpstreamClient;
#[cfg(feature = "adapter-tailscale")]
use crate::tailscale::TailscaleAdapter;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Registry of adapters keyed by service type
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<&'static str, Arc<dyn ServiceAdapter>>,
}

impl AdapterRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every adapter compiled into this build
    #[must_use]
    pub fn with_defaults(client: &UpstreamClient) -> Self {
        let mut registry = Self::new();

        #[cfg(feature = "adapter-autobrr")]
        registry.register(Arc::new(AutobrrAdapter::new(client.clone())));

        #[cfg(feature = "adapter-arr")]
        for flavor in [ArrFlavor::Sonarr, ArrFlavor::Radarr, ArrFlavor::Prowlarr] {
            registry.register(Arc::new(ArrAdapter::new(flavor, client.clone())));
        }

        #[cfg(feature = "adapter-tailscale")]
        registry.register(Arc::new(TailscaleAdapter::new(client.clone())));

        let _ = client;
        registry
    }

    /// Register an adapter, replacing any adapter of the same service type
    pub fn register(&mut self, adapter: Arc<dyn ServiceAdapter>) {
        self.adapters.insert(adapter.service_type(), adapter);
    }

    /// Adapter for a service type
    #[must_use]
    pub fn get(&self, service_type: &str) -> Option<Arc<dyn ServiceAdapter>> {
        self.adapters.get(service_type).cloned()
    }

    /// Whether an adapter exists for a service type
    #[must_use]
    pub fn is_supported(&self, service_type: &str) -> bool {
        self.adapters.contains_key(service_type)
    }

    /// Registered service types, sorted
    #[must_use]
    pub fn service_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.adapters.keys().copied().collect();
        types.sort_unstable();
        types
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("service_types", &self.service_types())
            .finish()
    }
}
