// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use futures::StreamExt as _;
use orc_core::event::{EventPayload, MemoryWrittenPayload};

fn sample_event(summary: &str) -> OrchestratorEvent {
    OrchestratorEvent::new(0, EventPayload::MemoryWritten(MemoryWrittenPayload { summary: summary.into(), details: None }))
}

#[tokio::test]
async fn publish_with_no_subscribers_does_not_panic() {
    let bus = EventBus::new(Arc::new(Metrics::new()));
    bus.publish(sample_event("no one is listening"));
}

#[tokio::test]
async fn subscriber_receives_published_events_in_order() {
    let bus = EventBus::new(Arc::new(Metrics::new()));
    let mut stream = Box::pin(bus.subscribe_stream());
    bus.publish(sample_event("first"));
    bus.publish(sample_event("second"));

    let first = stream.next().await.expect("first event");
    let second = stream.next().await.expect("second event");
    assert!(matches!(first.payload, EventPayload::MemoryWritten(p) if p.summary == "first"));
    assert!(matches!(second.payload, EventPayload::MemoryWritten(p) if p.summary == "second"));
}

#[tokio::test]
async fn two_subscribers_both_see_every_event() {
    let bus = EventBus::new(Arc::new(Metrics::new()));
    let mut a = Box::pin(bus.subscribe_stream());
    let mut b = Box::pin(bus.subscribe_stream());
    bus.publish(sample_event("fan-out"));

    assert!(a.next().await.is_some());
    assert!(b.next().await.is_some());
}

#[tokio::test]
async fn a_lagging_subscriber_drops_events_without_blocking_publish() {
    let metrics = Arc::new(Metrics::new());
    let bus = EventBus::with_capacity(2, metrics.clone());
    let mut slow = Box::pin(bus.subscribe_stream());

    for i in 0..10 {
        bus.publish(sample_event(&format!("event-{i}")));
    }

    // The slow subscriber eventually yields something (the tail of the
    // burst), but never the full 10 events, and the drops were counted.
    let mut seen = 0;
    while tokio::time::timeout(std::time::Duration::from_millis(50), slow.next()).await.ok().flatten().is_some() {
        seen += 1;
    }
    assert!(seen < 10);
    assert!(metrics.snapshot().dropped_sse_messages > 0);
}
