// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lightweight in-process counters (not a spec.md requirement; carried
//! as an ambient-stack supplement per the workspace's expanded scope,
//! since the teacher's `oj-daemon` likewise exposes a metrics surface
//! alongside its listener). No external metrics exporter crate is
//! pulled in: these are plain atomics snapshotted on demand, matching
//! the corpus's preference for cheap, dependency-free counters over a
//! full `metrics`/`prometheus` integration that nothing here consumes.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct Metrics {
    spawns: AtomicU64,
    reuses: AtomicU64,
    prompt_failures: AtomicU64,
    dropped_sse_messages: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub spawns: u64,
    pub reuses: u64,
    pub prompt_failures: u64,
    pub dropped_sse_messages: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_spawn(&self) {
        self.spawns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reuse(&self) {
        self.reuses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_prompt_failure(&self) {
        self.prompt_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_sse_message(&self) {
        self.dropped_sse_messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            spawns: self.spawns.load(Ordering::Relaxed),
            reuses: self.reuses.load(Ordering::Relaxed),
            prompt_failures: self.prompt_failures.load(Ordering::Relaxed),
            dropped_sse_messages: self.dropped_sse_messages.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
