// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Job Registry (spec §3 `Job`, §4.E, §8 invariant 2 and boundary
//! behavior on the 201st terminal job).
//!
//! Grounded on `orc_core::job::Job`'s terminal-absorbing state machine
//! for the per-job transitions, and on the teacher's own event-emitter
//! idiom (notify-on-change, no back-pressure on the publisher) for the
//! waiter mechanism — implemented here with one `tokio::sync::Notify`
//! per job rather than a `Set<callback>`.

use crate::RegistryError;
use orc_core::{Clock, Job, JobId, JobReport, JobTarget};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const RETENTION_MS: u64 = 24 * 60 * 60 * 1000;
const MAX_RETAINED: usize = 200;
const DEFAULT_LIST_LIMIT: usize = 50;

struct JobEntry {
    job: Job,
    notify: Arc<tokio::sync::Notify>,
    waiters: AtomicUsize,
}

/// In-memory, UUID-keyed background job table with await/peek/cancel and
/// bounded retention (spec §4.E).
pub struct JobRegistry<C: Clock> {
    clock: C,
    entries: Mutex<HashMap<JobId, JobEntry>>,
}

impl<C: Clock> JobRegistry<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, entries: Mutex::new(HashMap::new()) }
    }

    /// `create(input)`: random id, inserts a `running` job.
    pub fn create(
        &self,
        target: JobTarget,
        message: impl Into<String>,
        session_id: Option<orc_core::SessionId>,
        requested_by: Option<String>,
    ) -> Job {
        let mut job = Job::new(target, message, self.clock.epoch_ms());
        job.session_id = session_id;
        job.requested_by = requested_by;
        let id = job.id;
        let mut entries = self.entries.lock();
        entries.insert(
            id,
            JobEntry { job: job.clone(), notify: Arc::new(tokio::sync::Notify::new()), waiters: AtomicUsize::new(0) },
        );
        job
    }

    pub fn set_result(&self, id: JobId, response_text: String) -> Result<(), RegistryError> {
        self.transition(id, |job, now| job.set_result(now, response_text))
    }

    pub fn set_error(&self, id: JobId, error: String) -> Result<(), RegistryError> {
        self.transition(id, |job, now| job.set_error(now, error))
    }

    /// `cancel(id, reason?)`: best-effort per spec §5 — moves a
    /// `running` job to `canceled` and is a no-op on anything else,
    /// including an already-canceled job (idempotent).
    pub fn cancel(&self, id: JobId, reason: Option<String>) -> Result<(), RegistryError> {
        self.transition(id, |job, now| job.cancel(now, reason))
    }

    fn transition(
        &self,
        id: JobId,
        f: impl FnOnce(&mut Job, u64) -> Result<(), orc_core::AlreadyTerminal>,
    ) -> Result<(), RegistryError> {
        let now = self.clock.epoch_ms();
        let notify = {
            let mut entries = self.entries.lock();
            let entry = entries
                .get_mut(&id)
                .ok_or_else(|| RegistryError::UnknownJob { job_id: id.to_string() })?;
            // Already-terminal transitions are ignored, not errors, per
            // spec §4.E — the AlreadyTerminal error exists only so
            // callers who want to log it can.
            let _ = f(&mut entry.job, now);
            entry.notify.clone()
        };
        notify.notify_waiters();
        self.prune(now);
        Ok(())
    }

    /// `attachReport`: merges even onto an already-terminal job.
    pub fn attach_report(&self, id: JobId, report: JobReport) -> Result<(), RegistryError> {
        let mut entries = self.entries.lock();
        let entry = entries
            .get_mut(&id)
            .ok_or_else(|| RegistryError::UnknownJob { job_id: id.to_string() })?;
        entry.job.attach_report(report);
        Ok(())
    }

    /// `peek(id)`: current snapshot, or `None` if unknown.
    pub fn peek(&self, id: JobId) -> Option<Job> {
        self.entries.lock().get(&id).map(|e| e.job.clone())
    }

    /// `await(id, {timeoutMs})`: returns immediately if already terminal;
    /// otherwise blocks (without starving pruning — waiters are
    /// tracked) until a terminal transition or `timeout_ms` elapses.
    pub async fn await_job(&self, id: JobId, timeout_ms: u64) -> Result<Job, RegistryError> {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let notify = {
                let entries = self.entries.lock();
                let entry = entries
                    .get(&id)
                    .ok_or_else(|| RegistryError::UnknownJob { job_id: id.to_string() })?;
                if entry.job.status.is_terminal() {
                    return Ok(entry.job.clone());
                }
                entry.waiters.fetch_add(1, Ordering::SeqCst);
                entry.notify.clone()
            };
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let wait = tokio::time::timeout(remaining, notify.notified()).await;
            {
                let entries = self.entries.lock();
                if let Some(entry) = entries.get(&id) {
                    entry.waiters.fetch_sub(1, Ordering::SeqCst);
                }
            }
            if wait.is_err() {
                return Err(RegistryError::AwaitTimeout { job_id: id.to_string(), timeout_ms });
            }
        }
    }

    /// `list({workerId?, limit})`: newest-first, capped at 50 by default.
    pub fn list(&self, worker_id: Option<&JobTarget>, limit: Option<usize>) -> Vec<Job> {
        let now = self.clock.epoch_ms();
        self.prune(now);
        let entries = self.entries.lock();
        let mut jobs: Vec<Job> = entries
            .values()
            .map(|e| &e.job)
            .filter(|j| worker_id.map_or(true, |w| &j.target == w))
            .cloned()
            .collect();
        jobs.sort_by_key(|j| std::cmp::Reverse(j.started_at));
        jobs.truncate(limit.unwrap_or(DEFAULT_LIST_LIMIT));
        jobs
    }

    /// Drop terminal jobs older than 24h with no active waiters, then
    /// (if still over [`MAX_RETAINED`]) drop the oldest such jobs until
    /// the cap is met (spec §4.E, §8 "201st terminal job evicts the
    /// oldest").
    fn prune(&self, now: u64) {
        let mut entries = self.entries.lock();
        let stale: Vec<JobId> = entries
            .iter()
            .filter(|(_, e)| {
                e.job.status.is_terminal()
                    && e.waiters.load(Ordering::SeqCst) == 0
                    && e.job.finished_at.is_some_and(|f| now.saturating_sub(f) > RETENTION_MS)
            })
            .map(|(id, _)| *id)
            .collect();
        for id in stale {
            entries.remove(&id);
        }
        if entries.len() <= MAX_RETAINED {
            return;
        }
        let mut terminal_no_waiters: Vec<(JobId, u64)> = entries
            .iter()
            .filter(|(_, e)| e.job.status.is_terminal() && e.waiters.load(Ordering::SeqCst) == 0)
            .map(|(id, e)| (*id, e.job.finished_at.unwrap_or(0)))
            .collect();
        terminal_no_waiters.sort_by_key(|(_, finished_at)| *finished_at);
        let overflow = entries.len() - MAX_RETAINED;
        for (id, _) in terminal_no_waiters.into_iter().take(overflow) {
            entries.remove(&id);
        }
    }
}

#[cfg(test)]
#[path = "job_registry_tests.rs"]
mod tests;
