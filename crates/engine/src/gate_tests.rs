// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use orc_core::workflow::{ExecutionGate, InterveneGate};

fn ui(execution: ExecutionGate, intervene: InterveneGate) -> WorkflowUi {
    WorkflowUi { execution, intervene }
}

#[test]
fn step_execution_always_pauses_on_success() {
    let d = decide(&ui(ExecutionGate::Step, InterveneGate::Never), StepStatus::Success, false, false);
    assert_eq!(d, GateDecision::Pause { reason: "execution=step", retry_current: false });
}

#[test]
fn step_execution_pauses_and_retries_on_error() {
    let d = decide(&ui(ExecutionGate::Step, InterveneGate::Never), StepStatus::Error, false, false);
    assert_eq!(d, GateDecision::Pause { reason: "execution=step", retry_current: true });
}

#[test]
fn auto_always_pauses_on_success_and_error() {
    let g = ui(ExecutionGate::Auto, InterveneGate::Always);
    assert_eq!(decide(&g, StepStatus::Success, false, false), GateDecision::Pause { reason: "intervene=always", retry_current: false });
    assert_eq!(decide(&g, StepStatus::Error, false, false), GateDecision::Pause { reason: "intervene=always", retry_current: true });
}

#[test]
fn auto_on_warning_pauses_only_when_warning_present() {
    let g = ui(ExecutionGate::Auto, InterveneGate::OnWarning);
    assert_eq!(decide(&g, StepStatus::Success, true, false), GateDecision::Pause { reason: "intervene=on-warning", retry_current: false });
    assert_eq!(decide(&g, StepStatus::Success, false, false), GateDecision::Continue);
}

#[test]
fn auto_on_error_continues_on_success_and_retries_on_error() {
    let g = ui(ExecutionGate::Auto, InterveneGate::OnError);
    assert_eq!(decide(&g, StepStatus::Success, false, false), GateDecision::Continue);
    assert_eq!(decide(&g, StepStatus::Error, false, false), GateDecision::Pause { reason: "intervene=on-error", retry_current: true });
}

#[test]
fn auto_never_terminates_on_error_and_continues_on_success() {
    let g = ui(ExecutionGate::Auto, InterveneGate::Never);
    assert_eq!(decide(&g, StepStatus::Error, false, false), GateDecision::TerminateError);
    assert_eq!(decide(&g, StepStatus::Success, false, false), GateDecision::Continue);
}

#[test]
fn last_successful_step_always_terminates_with_success_regardless_of_gating() {
    // Even execution=step, which would otherwise always pause on success.
    let g = ui(ExecutionGate::Step, InterveneGate::Never);
    assert_eq!(decide(&g, StepStatus::Success, false, true), GateDecision::TerminateSuccess);
}

#[test]
fn last_step_error_still_follows_the_table() {
    // The override only applies to success; an error on the last step
    // still follows whatever the table says (e.g. terminate with error
    // under intervene=never).
    let g = ui(ExecutionGate::Auto, InterveneGate::Never);
    assert_eq!(decide(&g, StepStatus::Error, false, true), GateDecision::TerminateError);
}
