// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The paused-run on-disk store (spec §4.F "Pause persistence": when a
//! run pauses, serialize the `WorkflowRunState` to an on-disk store
//! keyed by `runId`; `continueWorkflow` loads it; terminal runs are
//! deleted). Grounded on `orc_registry::DeviceRegistry`'s atomic
//! write-via-tmp-then-rename pattern, specialized to one file per run
//! (each run pauses/resumes independently, so there is no shared file
//! to race over the way the device registry's single file does).

use crate::error::WorkflowError;
use orc_core::workflow::WorkflowRunState;
use orc_core::RunId;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Guards one directory of paused-run files.
pub struct PauseStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl PauseStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), write_lock: Mutex::new(()) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, run_id: &RunId) -> PathBuf {
        self.dir.join(format!("{}.json", run_id.as_str()))
    }

    /// Persist a paused run, overwriting any prior record for the same id.
    pub fn save(&self, state: &WorkflowRunState) -> Result<(), WorkflowError> {
        let _guard = self.write_lock.lock();
        std::fs::create_dir_all(&self.dir)?;
        let bytes = serde_json::to_vec_pretty(state)?;
        let path = self.path_for(&state.run_id);
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &bytes)?;
        std::fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Load a paused run by id. Returns `Ok(None)` rather than erroring
    /// when no record exists, since "no such run" is a normal
    /// `continueWorkflow` outcome the caller turns into `UnknownRun`.
    pub fn load(&self, run_id: &RunId) -> Result<Option<WorkflowRunState>, WorkflowError> {
        let path = self.path_for(run_id);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Delete a run's record. A terminal transition calls this; a
    /// missing file is not an error (already deleted, or never paused).
    pub fn delete(&self, run_id: &RunId) -> Result<(), WorkflowError> {
        let _guard = self.write_lock.lock();
        let path = self.path_for(run_id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
