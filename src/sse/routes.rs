// ABOUTME: SSE route handler streaming health snapshots and transitions
// ABOUTME: Sends the current state of every service first, then one event per change
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

use crate::resources::ServerResources;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::Router;
use futures_util::Stream;
use homedash_core::constants::health::{SSE_HEALTH_EVENT, SSE_KEEPALIVE_SECS};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Health event stream routes
pub struct SseRoutes;

impl SseRoutes {
    /// `GET /api/health/events`
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/health/events", get(Self::handle_health_events))
            .with_state(resources)
    }

    /// Open a health stream: snapshot burst, then transitions until shutdown
    async fn handle_health_events(
        State(resources): State<Arc<ServerResources>>,
    ) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
        let mut subscription = resources.monitor.subscribe().await;
        let client_id = subscription.id();
        info!(client_id = %client_id, "SSE health stream opened");

        let stream = async_stream::stream! {
            let mut event_id: u64 = 0;
            while let Some(message) = subscription.recv().await {
                event_id += 1;
                match Event::default()
                    .id(event_id.to_string())
                    .event(SSE_HEALTH_EVENT)
                    .json_data(&message)
                {
                    Ok(event) => yield Ok::<_, Infallible>(event),
                    Err(e) => warn!(client_id = %client_id, error = %e, "Failed to encode health event"),
                }
            }
            info!(client_id = %client_id, "SSE health stream closed");
        };

        Sse::new(stream).keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(SSE_KEEPALIVE_SECS))
                .text("keepalive"),
        )
    }
}
