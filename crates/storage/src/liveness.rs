// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process liveness check (spec §4.A `isProcessAlive(pid)`), injectable
//! so registry pruning is testable without real processes.

use nix::sys::signal;
use nix::unistd::Pid;

/// Returns `true` iff a process with `pid` currently exists on this host.
///
/// Implemented as `kill(pid, 0)`: delivers no signal, only checks
/// existence/permission. `ESRCH` means dead; `EPERM` still means alive
/// (owned by another user).
pub fn is_process_alive(pid: u32) -> bool {
    match signal::kill(Pid::from_raw(pid as i32), None) {
        Ok(()) => true,
        Err(nix::errno::Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Abstraction over [`is_process_alive`] so tests can fake which pids are
/// alive without spawning real processes.
pub trait Liveness: Send + Sync {
    fn is_alive(&self, pid: u32) -> bool;
}

/// The real, OS-backed liveness check.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLiveness;

impl Liveness for SystemLiveness {
    fn is_alive(&self, pid: u32) -> bool {
        is_process_alive(pid)
    }
}

#[cfg(test)]
#[path = "liveness_tests.rs"]
mod tests;
