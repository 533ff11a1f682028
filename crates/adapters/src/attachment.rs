// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attachment normalization (spec §4.D.3 step 2): copy path attachments
//! that live outside the worker's base directory, and materialize
//! base64-encoded ones, into `<baseDir>/.opencode/attachments/`.

use crate::error::BackendError;
use base64::Engine;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone)]
pub enum AttachmentInput {
    Path(PathBuf),
    Base64 { data: String, filename: String },
}

#[derive(Debug, Clone)]
pub struct NormalizedAttachment {
    pub path: PathBuf,
    /// `true` if this file was created by normalization and must be
    /// cleaned up after the prompt completes, regardless of outcome.
    pub created: bool,
}

fn extension_of(name: &str) -> &str {
    Path::new(name).extension().and_then(|e| e.to_str()).unwrap_or("bin")
}

/// Normalize one batch of attachments for a single prompt (spec
/// §4.D.3 step 2). `counter` disambiguates multiple attachments
/// materialized within the same millisecond.
pub fn normalize(
    inputs: &[AttachmentInput],
    base_dir: &Path,
    worker_id: &str,
    now_epoch_ms: u64,
    counter: &AtomicU64,
) -> Result<Vec<NormalizedAttachment>, BackendError> {
    let attachments_dir = base_dir.join(".opencode").join("attachments");
    let mut out = Vec::with_capacity(inputs.len());

    for input in inputs {
        match input {
            AttachmentInput::Path(path) => {
                if path.starts_with(base_dir) {
                    out.push(NormalizedAttachment { path: path.clone(), created: false });
                    continue;
                }
                std::fs::create_dir_all(&attachments_dir)?;
                let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("bin");
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let dest = attachments_dir.join(format!("{worker_id}-{now_epoch_ms}-{n}.{ext}"));
                std::fs::copy(path, &dest)?;
                out.push(NormalizedAttachment { path: dest, created: true });
            }
            AttachmentInput::Base64 { data, filename } => {
                std::fs::create_dir_all(&attachments_dir)?;
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(data)
                    .map_err(|e| BackendError::SpawnFailed(format!("invalid base64 attachment: {e}")))?;
                let ext = extension_of(filename);
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let dest = attachments_dir.join(format!("{worker_id}-{now_epoch_ms}-{n}.{ext}"));
                std::fs::write(&dest, bytes)?;
                out.push(NormalizedAttachment { path: dest, created: true });
            }
        }
    }
    Ok(out)
}

/// Remove every file normalization created, regardless of whether the
/// prompt that used them succeeded (spec §4.D.3 step 2).
pub fn cleanup(attachments: &[NormalizedAttachment]) {
    for a in attachments {
        if a.created {
            let _ = std::fs::remove_file(&a.path);
        }
    }
}

#[cfg(test)]
#[path = "attachment_tests.rs"]
mod tests;
