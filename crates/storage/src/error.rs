// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors at the Device/Job Registry boundary (spec §7 taxonomy: these
/// surface to callers as `ConfigError`-equivalents; the registries
/// themselves never surface transient I/O as a hard error — see
/// `device_registry::list_entries`).
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("io error persisting registry: {0}")]
    Io(#[from] std::io::Error),
    #[error("serializing registry: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("timed out waiting for job {job_id} after {timeout_ms}ms")]
    AwaitTimeout { job_id: String, timeout_ms: u64 },
    #[error("no job with id {job_id}")]
    UnknownJob { job_id: String },
}
