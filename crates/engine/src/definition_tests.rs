// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use orc_core::WorkerProfileId;

fn step(id: &str, skills: &[&str]) -> WorkflowStepDef {
    WorkflowStepDef {
        id: id.into(),
        title: id.into(),
        worker_id: WorkerProfileId::from_string("wkp-test"),
        prompt: "{task}".into(),
        carry: false,
        timeout_ms: None,
        required_skills: skills.iter().map(|s| s.to_string()).collect(),
    }
}

#[test]
fn required_skills_unions_across_steps() {
    let def = WorkflowDefinition {
        id: orc_core::WorkflowId::from_string("wfl-test"),
        name: "test".into(),
        steps: vec![step("s1", &["git"]), step("s2", &["git", "docker"])],
    };
    let skills = def.required_skills();
    assert_eq!(skills.len(), 2);
    assert!(skills.contains("git"));
    assert!(skills.contains("docker"));
}
