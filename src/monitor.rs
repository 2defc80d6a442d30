// ABOUTME: Periodic health polling of every configured service instance
// ABOUTME: Diffs each observation against the last known state and broadcasts transitions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

//! # Health Monitor
//!
//! One long-lived task wakes on a fixed interval, asks every service's
//! adapter for its health (concurrently, each bounded by the check
//! timeout) and folds the result into the per-instance [`HealthState`].
//! A changed status or message stamps `last_changed_at` and emits exactly
//! one [`HealthEvent`]; an identical observation only moves
//! `last_checked_at`. A failing or slow service is reported as `error`
//! and never affects the others or the loop cadence.

use crate::config::{HealthMonitorConfig, ServiceDirectory};
use crate::sse::{HealthBroadcaster, HealthSubscription};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use homedash_adapters::AdapterRegistry;
use homedash_core::models::{HealthEvent, HealthState, HealthStatus, ServiceRecord};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Result of one health check before it is folded into state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Instance polled
    pub instance_id: String,
    /// Mapped status
    pub status: HealthStatus,
    /// Detail, e.g. the failure message
    pub message: Option<String>,
}

/// Polls adapters and owns the per-instance health states
#[derive(Clone)]
pub struct HealthMonitor {
    registry: AdapterRegistry,
    directory: Arc<dyn ServiceDirectory>,
    broadcaster: HealthBroadcaster,
    states: Arc<RwLock<HashMap<String, HealthState>>>,
    config: HealthMonitorConfig,
}

impl HealthMonitor {
    /// Create a monitor; nothing is polled until [`HealthMonitor::start`] or [`HealthMonitor::poll_once`]
    #[must_use]
    pub fn new(
        registry: AdapterRegistry,
        directory: Arc<dyn ServiceDirectory>,
        broadcaster: HealthBroadcaster,
        config: HealthMonitorConfig,
    ) -> Self {
        Self {
            registry,
            directory,
            broadcaster,
            states: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Broadcaster transitions are published to
    #[must_use]
    pub const fn broadcaster(&self) -> &HealthBroadcaster {
        &self.broadcaster
    }

    /// Poll every configured service once; returns the number of transitions
    pub async fn poll_once(&self) -> usize {
        let records = match self.directory.list().await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Service directory unavailable, skipping health poll");
                return 0;
            }
        };

        let observations = join_all(records.iter().map(|record| self.check(record))).await;

        let observed_at = Utc::now();
        let mut transitions = 0;
        for observation in observations {
            if self.record_observation(observation, observed_at).await.is_some() {
                transitions += 1;
            }
        }

        let tracked: HashSet<&str> = records.iter().map(|r| r.instance_id.as_str()).collect();
        self.forget_untracked(&tracked).await;

        debug!(services = records.len(), transitions, "Health poll complete");
        transitions
    }

    /// Run one service's health check under the check timeout
    pub async fn check(&self, record: &ServiceRecord) -> Observation {
        let (status, message) = self.check_status(record).await;
        Observation {
            instance_id: record.instance_id.clone(),
            status,
            message,
        }
    }

    async fn check_status(&self, record: &ServiceRecord) -> (HealthStatus, Option<String>) {
        let Some(adapter) = self.registry.get(&record.service_type) else {
            return (
                HealthStatus::Error,
                Some(format!("unsupported service type '{}'", record.service_type)),
            );
        };
        if !record.is_configured() {
            return (HealthStatus::Unconfigured, None);
        }

        let deadline = self.config.check_timeout();
        match time::timeout(deadline, adapter.fetch_health(&record.url, &record.api_key)).await {
            Ok(Ok(payload)) => (payload.status, payload.message),
            Ok(Err(e)) if e.is_not_configured() => (HealthStatus::Unconfigured, None),
            Ok(Err(e)) => {
                debug!(instance_id = %record.instance_id, error = %e, "Health check failed");
                (HealthStatus::Error, Some(e.to_string()))
            }
            Err(_) => {
                warn!(
                    instance_id = %record.instance_id,
                    timeout_secs = deadline.as_secs(),
                    "Health check timed out"
                );
                (
                    HealthStatus::Error,
                    Some(format!(
                        "health check timed out after {}s",
                        deadline.as_secs()
                    )),
                )
            }
        }
    }

    /// Fold one observation into state, publishing a transition if it changed anything
    ///
    /// Publishing happens under the state lock so subscribers never see a
    /// transition that precedes their snapshot.
    pub async fn record_observation(
        &self,
        observation: Observation,
        observed_at: DateTime<Utc>,
    ) -> Option<HealthEvent> {
        let Observation {
            instance_id,
            status,
            message,
        } = observation;

        let mut states = self.states.write().await;
        let event = match states.get_mut(&instance_id) {
            Some(state) if !state.differs_from(status, message.as_deref()) => {
                state.last_checked_at = observed_at.max(state.last_checked_at);
                None
            }
            Some(state) => {
                let previous_status = state.status;
                let observed_at = observed_at.max(state.last_checked_at);
                state.status = status;
                state.message = message;
                state.last_checked_at = observed_at;
                state.last_changed_at = observed_at;
                Some(HealthEvent {
                    state: state.clone(),
                    previous_status: Some(previous_status),
                })
            }
            None => {
                let state = HealthState::first(instance_id.clone(), status, message, observed_at);
                states.insert(instance_id, state.clone());
                Some(HealthEvent {
                    state,
                    previous_status: None,
                })
            }
        };

        if let Some(event) = &event {
            let delivered = self.broadcaster.publish(event);
            info!(
                instance_id = %event.state.instance_id,
                status = %event.state.status,
                previous_status = ?event.previous_status,
                clients = delivered,
                "Health state changed"
            );
        }
        event
    }

    async fn forget_untracked(&self, tracked: &HashSet<&str>) {
        let mut states = self.states.write().await;
        states.retain(|instance_id, _| {
            let keep = tracked.contains(instance_id.as_str());
            if !keep {
                debug!(instance_id = %instance_id, "Service removed from directory");
            }
            keep
        });
    }

    /// Latest state of one instance
    pub async fn get_state(&self, instance_id: &str) -> Option<HealthState> {
        self.states.read().await.get(instance_id).cloned()
    }

    /// Latest state of every tracked instance, ordered by id
    pub async fn snapshot(&self) -> Vec<HealthState> {
        let states = self.states.read().await;
        sorted_snapshot(&states)
    }

    /// Register a streaming client; its queue starts with the current snapshot
    pub async fn subscribe(&self) -> HealthSubscription {
        let states = self.states.read().await;
        self.broadcaster.register(sorted_snapshot(&states))
    }

    /// Spawn the polling loop
    #[must_use]
    pub fn start(&self) -> MonitorHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let monitor = self.clone();

        let task = tokio::spawn(async move {
            let mut interval = time::interval(monitor.config.poll_interval());
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                interval_secs = monitor.config.poll_interval_secs,
                timeout_secs = monitor.config.check_timeout_secs,
                "Health monitor started"
            );

            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    _ = interval.tick() => {
                        monitor.poll_once().await;
                    }
                }
            }

            monitor.broadcaster.close_all();
            info!("Health monitor stopped");
        });

        MonitorHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }
}

fn sorted_snapshot(states: &HashMap<String, HealthState>) -> Vec<HealthState> {
    let mut snapshot: Vec<HealthState> = states.values().cloned().collect();
    snapshot.sort_by(|a, b| a.instance_id.cmp(&b.instance_id));
    snapshot
}

/// Handle to a running monitor loop
#[derive(Debug)]
pub struct MonitorHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Stop the loop and wait until every client stream is closed
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            error!(error = %e, "Health monitor task failed");
        }
    }
}
