// ABOUTME: Integration tests for the SSE health broadcaster
// ABOUTME: Fan-out to every client, overflow strategies, and client cleanup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use chrono::Utc;
use homedash::models::{HealthEvent, HealthState, HealthStatus};
use homedash::sse::{HealthBroadcaster, HealthMessage, OverflowStrategy};

fn event(instance_id: &str, status: HealthStatus) -> HealthEvent {
    HealthEvent {
        state: HealthState::first(instance_id.to_owned(), status, None, Utc::now()),
        previous_status: None,
    }
}

#[tokio::test]
async fn test_publish_reaches_every_client() {
    let broadcaster = HealthBroadcaster::new(4, OverflowStrategy::CloseConnection);
    let mut first = broadcaster.register(Vec::new());
    let mut second = broadcaster.register(Vec::new());

    assert_eq!(broadcaster.publish(&event("svc-1", HealthStatus::Online)), 2);

    for subscription in [&mut first, &mut second] {
        match subscription.recv().await.unwrap() {
            HealthMessage::Transition(received) => {
                assert_eq!(received.state.instance_id, "svc-1");
            }
            other => panic!("expected transition, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_snapshot_is_queued_first() {
    let broadcaster = HealthBroadcaster::new(1, OverflowStrategy::CloseConnection);
    let snapshot = vec![
        HealthState::first("a".to_owned(), HealthStatus::Online, None, Utc::now()),
        HealthState::first("b".to_owned(), HealthStatus::Error, None, Utc::now()),
    ];
    let mut subscription = broadcaster.register(snapshot);

    // A snapshot larger than the buffer still leaves room for one transition
    assert_eq!(broadcaster.publish(&event("c", HealthStatus::Warning)), 1);

    assert!(matches!(subscription.recv().await, Some(HealthMessage::Snapshot(s)) if s.instance_id == "a"));
    assert!(matches!(subscription.recv().await, Some(HealthMessage::Snapshot(s)) if s.instance_id == "b"));
    assert!(matches!(subscription.recv().await, Some(HealthMessage::Transition(e)) if e.state.instance_id == "c"));
}

#[tokio::test]
async fn test_drop_event_keeps_slow_client_connected() {
    let broadcaster = HealthBroadcaster::new(2, OverflowStrategy::DropEvent);
    let mut slow = broadcaster.register(Vec::new());

    for i in 0..5 {
        broadcaster.publish(&event(&format!("svc-{i}"), HealthStatus::Online));
    }
    assert_eq!(broadcaster.client_count(), 1);

    // The queued events survive, later ones were dropped
    assert!(matches!(slow.recv().await, Some(HealthMessage::Transition(e)) if e.state.instance_id == "svc-0"));
    assert!(matches!(slow.recv().await, Some(HealthMessage::Transition(e)) if e.state.instance_id == "svc-1"));

    broadcaster.publish(&event("svc-9", HealthStatus::Error));
    assert!(matches!(slow.recv().await, Some(HealthMessage::Transition(e)) if e.state.instance_id == "svc-9"));
}

#[tokio::test]
async fn test_close_connection_disconnects_slow_client_only() {
    let broadcaster = HealthBroadcaster::new(1, OverflowStrategy::CloseConnection);
    let mut slow = broadcaster.register(Vec::new());
    let mut fast = broadcaster.register(Vec::new());

    assert_eq!(broadcaster.publish(&event("svc-0", HealthStatus::Online)), 2);
    assert!(fast.recv().await.is_some());

    // `slow` still holds svc-0 in its queue, so this one overflows it
    assert_eq!(broadcaster.publish(&event("svc-1", HealthStatus::Error)), 1);
    assert_eq!(broadcaster.client_count(), 1);
    assert!(fast.recv().await.is_some());

    // The slow client drains what it had, then its stream ends
    assert!(slow.recv().await.is_some());
    assert!(slow.recv().await.is_none());
}

#[tokio::test]
async fn test_dropped_subscription_unregisters() {
    let broadcaster = HealthBroadcaster::new(4, OverflowStrategy::DropEvent);
    let subscription = broadcaster.register(Vec::new());
    assert_eq!(broadcaster.client_count(), 1);

    drop(subscription);
    assert_eq!(broadcaster.client_count(), 0);
    assert_eq!(broadcaster.publish(&event("svc-1", HealthStatus::Online)), 0);
}

#[tokio::test]
async fn test_close_all_ends_every_stream() {
    let broadcaster = HealthBroadcaster::new(4, OverflowStrategy::CloseConnection);
    let mut first = broadcaster.register(Vec::new());
    let mut second = broadcaster.register(Vec::new());

    broadcaster.close_all();
    assert_eq!(broadcaster.client_count(), 0);
    assert!(first.recv().await.is_none());
    assert!(second.recv().await.is_none());
}

#[test]
fn test_transition_message_wire_shape() {
    let message = HealthMessage::Transition(HealthEvent {
        state: HealthState::first(
            "autobrr-1".to_owned(),
            HealthStatus::Error,
            Some("request timed out after 5s".to_owned()),
            Utc::now(),
        ),
        previous_status: Some(HealthStatus::Online),
    });

    let value = serde_json::to_value(&message).unwrap();
    assert_eq!(value["type"], "transition");
    assert_eq!(value["instanceId"], "autobrr-1");
    assert_eq!(value["status"], "error");
    assert_eq!(value["previousStatus"], "online");
    assert_eq!(value["message"], "request timed out after 5s");
}
