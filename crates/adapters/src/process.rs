// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server-backend subprocess lifecycle (spec §4.D.1 steps 2-4, shutdown
//! contract). The spawn-into-its-own-process-group step uses
//! `std::os::unix::process::CommandExt::process_group` (portable
//! builder API, no `unsafe`); the group-kill step needs `nix::sys::
//! signal::killpg`, which is why `nix` stays a dependency (see
//! DESIGN.md).

use crate::error::BackendError;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

/// Line `ocserve` writes to stdout once its HTTP listener is bound
/// (spec §4.D.1 step 4).
const READY_MARKER: &str = "opencode server listening";

pub struct SpawnedProcess {
    pub child: Child,
    pub pid: u32,
}

/// Spawn `command` detached into its own process group so the whole
/// tree can be killed together (spec §4.D.1 step 3).
pub fn spawn_detached(command: &str, args: &[String], cwd: &Path, env: &[(String, String)]) -> Result<SpawnedProcess, BackendError> {
    let mut cmd = Command::new(command);
    cmd.args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0);
    for (key, value) in env {
        cmd.env(key, value);
    }
    let child = cmd.spawn().map_err(|e| BackendError::SpawnFailed(e.to_string()))?;
    let pid = child.id().ok_or_else(|| BackendError::SpawnFailed("child exited before pid was observable".into()))?;
    tracing::info!(command, pid, cwd = %cwd.display(), "spawned worker process");
    Ok(SpawnedProcess { child, pid })
}

/// Pull the `http(s)://...` URL out of a line matching [`READY_MARKER`].
pub fn parse_ready_url(line: &str) -> Option<String> {
    if !line.contains(READY_MARKER) {
        return None;
    }
    line.split_whitespace().find(|tok| tok.starts_with("http://") || tok.starts_with("https://")).map(String::from)
}

/// Read stdout line-by-line until [`parse_ready_url`] matches or
/// `timeout` elapses, collecting everything seen for error context
/// (spec §4.D.1 step 4: "fail with collected output").
pub async fn wait_for_ready(child: &mut Child, timeout: Duration) -> Result<String, BackendError> {
    let stdout = child.stdout.take().ok_or_else(|| BackendError::SpawnFailed("child stdout not piped".into()))?;
    let mut lines = BufReader::new(stdout).lines();
    let mut collected = String::new();

    let result = tokio::time::timeout(timeout, async {
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            collected.push_str(&line);
                            collected.push('\n');
                            if let Some(url) = parse_ready_url(&line) {
                                return Ok(url);
                            }
                        }
                        Ok(None) => return Err(BackendError::ProcessExited { status: "stdout closed before ready".into() }),
                        Err(e) => return Err(BackendError::Io(e)),
                    }
                }
                status = child.wait() => {
                    let status = status.map_err(BackendError::Io)?;
                    return Err(BackendError::ProcessExited { status: status.to_string() });
                }
            }
        }
    })
    .await;

    match result {
        Ok(Ok(url)) => {
            tracing::info!(%url, "worker process ready");
            Ok(url)
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "worker process failed before becoming ready");
            Err(e)
        }
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "worker process did not become ready in time");
            Err(BackendError::SpawnTimeout { elapsed_ms: timeout.as_millis() as u64, tail: collected })
        }
    }
}

fn is_alive(pid: u32) -> bool {
    matches!(signal::kill(Pid::from_raw(pid as i32), None), Ok(()) | Err(nix::errno::Errno::EPERM))
}

/// SIGTERM the process group, escalate to SIGKILL after `grace` if
/// still alive (spec §4.D.1 shutdown contract).
pub async fn shutdown_process_group(pid: u32, grace: Duration) -> Result<(), BackendError> {
    let pgid = Pid::from_raw(pid as i32);
    if signal::killpg(pgid, Signal::SIGTERM).is_err() {
        // Already gone; nothing left to escalate.
        return Ok(());
    }
    let deadline = tokio::time::Instant::now() + grace;
    while tokio::time::Instant::now() < deadline {
        if !is_alive(pid) {
            tracing::info!(pid, "worker process group exited after SIGTERM");
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    if is_alive(pid) {
        tracing::warn!(pid, "worker process group still alive after grace period, sending SIGKILL");
        let _ = signal::killpg(pgid, Signal::SIGKILL);
    }
    Ok(())
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
