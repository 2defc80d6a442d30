// ABOUTME: Fan-out of health transitions to connected SSE clients
// ABOUTME: Per-client bounded queues so one slow client never blocks the others
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

use dashmap::DashMap;
use homedash_core::errors::AppError;
use homedash_core::models::{HealthEvent, HealthState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What to do when a client's queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowStrategy {
    /// Skip the event for that client and keep the connection
    DropEvent,
    /// Disconnect the client
    #[default]
    CloseConnection,
}

impl OverflowStrategy {
    /// Configuration name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DropEvent => "drop_event",
            Self::CloseConnection => "close_connection",
        }
    }
}

impl fmt::Display for OverflowStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverflowStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "drop_event" => Ok(Self::DropEvent),
            "close_connection" => Ok(Self::CloseConnection),
            other => Err(AppError::config(format!(
                "Unknown SSE overflow strategy '{other}' (expected drop_event or close_connection)"
            ))),
        }
    }
}

/// Message delivered to a streaming client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HealthMessage {
    /// Current state of one tracked service, sent on subscribe
    Snapshot(HealthState),
    /// A state change observed by the monitor
    Transition(HealthEvent),
}

/// Registry of connected clients
#[derive(Clone)]
pub struct HealthBroadcaster {
    clients: Arc<DashMap<Uuid, mpsc::Sender<HealthMessage>>>,
    closed: Arc<AtomicBool>,
    buffer: usize,
    overflow: OverflowStrategy,
}

impl HealthBroadcaster {
    /// Broadcaster with `buffer` queued messages per client
    #[must_use]
    pub fn new(buffer: usize, overflow: OverflowStrategy) -> Self {
        Self {
            clients: Arc::new(DashMap::new()),
            closed: Arc::new(AtomicBool::new(false)),
            buffer: buffer.max(1),
            overflow,
        }
    }

    /// Register a client whose queue starts with `snapshot`
    ///
    /// The caller must hold the state lock so no transition slips in between
    /// the snapshot and the registration. After [`HealthBroadcaster::close_all`]
    /// the subscription yields the snapshot and then ends.
    #[must_use]
    pub fn register(&self, snapshot: Vec<HealthState>) -> HealthSubscription {
        let (tx, rx) = mpsc::channel(self.buffer + snapshot.len());
        for state in snapshot {
            // Capacity covers the whole snapshot
            let _ = tx.try_send(HealthMessage::Snapshot(state));
        }

        let id = Uuid::new_v4();
        if self.closed.load(Ordering::Acquire) {
            debug!(client_id = %id, "SSE broadcaster closed, stream ends after snapshot");
        } else {
            self.clients.insert(id, tx);
            debug!(client_id = %id, clients = self.clients.len(), "SSE client registered");
        }

        HealthSubscription {
            id,
            receiver: rx,
            clients: Arc::clone(&self.clients),
        }
    }

    /// Deliver a transition to every client; returns how many received it
    pub fn publish(&self, event: &HealthEvent) -> usize {
        let mut delivered = 0;
        let mut disconnected = Vec::new();

        for client in self.clients.iter() {
            match client
                .value()
                .try_send(HealthMessage::Transition(event.clone()))
            {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => match self.overflow {
                    OverflowStrategy::DropEvent => {
                        warn!(
                            client_id = %client.key(),
                            instance_id = %event.state.instance_id,
                            "SSE client queue full, event dropped"
                        );
                    }
                    OverflowStrategy::CloseConnection => {
                        warn!(
                            client_id = %client.key(),
                            instance_id = %event.state.instance_id,
                            "SSE client queue full, closing connection"
                        );
                        disconnected.push(*client.key());
                    }
                },
                Err(TrySendError::Closed(_)) => disconnected.push(*client.key()),
            }
        }

        for id in disconnected {
            self.clients.remove(&id);
            debug!(client_id = %id, "SSE client removed");
        }
        delivered
    }

    /// Drop every client, ending their streams
    pub fn close_all(&self) {
        self.closed.store(true, Ordering::Release);
        let count = self.clients.len();
        self.clients.clear();
        info!(clients = count, "Closed all SSE client streams");
    }

    /// Number of connected clients
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Configured overflow behavior
    #[must_use]
    pub const fn overflow_strategy(&self) -> OverflowStrategy {
        self.overflow
    }
}

impl fmt::Debug for HealthBroadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthBroadcaster")
            .field("clients", &self.clients.len())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .field("buffer", &self.buffer)
            .field("overflow", &self.overflow)
            .finish()
    }
}

/// One client's end of the broadcaster; unregisters on drop
#[derive(Debug)]
pub struct HealthSubscription {
    id: Uuid,
    receiver: mpsc::Receiver<HealthMessage>,
    clients: Arc<DashMap<Uuid, mpsc::Sender<HealthMessage>>>,
}

impl HealthSubscription {
    /// Client identifier
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Next message, `None` once the client was removed
    pub async fn recv(&mut self) -> Option<HealthMessage> {
        self.receiver.recv().await
    }
}

impl Drop for HealthSubscription {
    fn drop(&mut self) {
        self.clients.remove(&self.id);
    }
}
