// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The gating table (spec §4.F step 7) that decides what the runner
//! does after each step completes. No teacher analog: the teacher's
//! `runtime/gate.rs` runs shell pass/fail gates for CI-style jobs,
//! an unrelated concept from this table-driven execution/intervene
//! gate. Encoded directly from the spec's table.

use orc_core::workflow::{ExecutionGate, InterveneGate, StepStatus, WorkflowUi};

/// What the runner should do after a step completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Continue,
    Pause { reason: &'static str, retry_current: bool },
    TerminateError,
    TerminateSuccess,
}

/// Decide the next state for a just-finished step.
///
/// `is_last_step` is true when this was the final step in the
/// workflow: the spec requires the last successful step to always
/// terminate with `status=success`, overriding every row of the
/// table below.
pub fn decide(ui: &WorkflowUi, status: StepStatus, has_warning: bool, is_last_step: bool) -> GateDecision {
    if is_last_step && status == StepStatus::Success {
        return GateDecision::TerminateSuccess;
    }
    match ui.execution {
        ExecutionGate::Step => match status {
            StepStatus::Success => GateDecision::Pause { reason: "execution=step", retry_current: false },
            StepStatus::Error => GateDecision::Pause { reason: "execution=step", retry_current: true },
        },
        ExecutionGate::Auto => match (ui.intervene, status) {
            (InterveneGate::Always, StepStatus::Success) => {
                GateDecision::Pause { reason: "intervene=always", retry_current: false }
            }
            (InterveneGate::Always, StepStatus::Error) => {
                GateDecision::Pause { reason: "intervene=always", retry_current: true }
            }
            (InterveneGate::OnWarning, StepStatus::Success) if has_warning => {
                GateDecision::Pause { reason: "intervene=on-warning", retry_current: false }
            }
            (InterveneGate::OnWarning, StepStatus::Success) => GateDecision::Continue,
            (InterveneGate::OnWarning, StepStatus::Error) => {
                GateDecision::Pause { reason: "intervene=on-warning", retry_current: true }
            }
            (InterveneGate::OnError, StepStatus::Success) => GateDecision::Continue,
            (InterveneGate::OnError, StepStatus::Error) => {
                GateDecision::Pause { reason: "intervene=on-error", retry_current: true }
            }
            (InterveneGate::Never, StepStatus::Error) => GateDecision::TerminateError,
            (InterveneGate::Never, StepStatus::Success) => GateDecision::Continue,
        },
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
