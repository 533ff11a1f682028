// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Event Bus (spec §4.G, §5): "publishers never block on slow
//! subscribers; slow SSE subscribers may drop (a dropped message MUST
//! NOT block other subscribers)". Spec §9 names the exact shape:
//! "event emitters re-modeled as a broadcast channel with bounded
//! per-subscriber queues, overflow is an explicit drop (log + counter)
//! never back-pressure" — this is `tokio::sync::broadcast` verbatim,
//! with lag turned into a counted, logged drop rather than a stalled
//! subscriber.

use crate::metrics::Metrics;
use futures::Stream;
use orc_core::event::OrchestratorEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::StreamExt;

/// Default per-subscriber queue depth before the broadcast channel
/// starts dropping the oldest unread event for that subscriber.
pub const DEFAULT_CAPACITY: usize = 1024;

pub struct EventBus {
    sender: broadcast::Sender<OrchestratorEvent>,
    metrics: Arc<Metrics>,
}

impl EventBus {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, metrics)
    }

    pub fn with_capacity(capacity: usize, metrics: Arc<Metrics>) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, metrics }
    }

    /// Publish to every current subscriber. Never blocks; if nobody is
    /// listening this is a silent no-op (spec doesn't require
    /// durability for subscriber-less publishes).
    pub fn publish(&self, event: OrchestratorEvent) {
        tracing::trace!(event_type = event.payload.type_name(), event_id = %event.id, "publish");
        let _ = self.sender.send(event);
    }

    /// A raw subscription; lag is surfaced as `RecvError::Lagged` per
    /// `tokio::sync::broadcast`'s own contract.
    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.sender.subscribe()
    }

    /// A subscription as a `Stream`, with lagged/dropped events
    /// silently skipped (each one counted in [`Metrics`]) instead of
    /// terminating the stream or blocking the publisher.
    pub fn subscribe_stream(&self) -> impl Stream<Item = OrchestratorEvent> + Send + 'static {
        let metrics = self.metrics.clone();
        BroadcastStream::new(self.sender.subscribe()).filter_map(move |item| match item {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                for _ in 0..skipped {
                    metrics.record_dropped_sse_message();
                }
                tracing::warn!(skipped, "subscriber lagged, dropping events");
                None
            }
        })
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
