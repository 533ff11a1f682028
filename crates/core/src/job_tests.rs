use super::*;
use crate::ids::WorkerProfileId;

fn sample() -> Job {
    Job::new(JobTarget::Worker(WorkerProfileId::from_string("wkp-coder")), "do it", 1_000)
}

#[test]
fn new_job_starts_running() {
    let job = sample();
    assert_eq!(job.status, JobStatus::Running);
    assert!(job.finished_at.is_none());
}

#[test]
fn set_result_transitions_to_succeeded_and_computes_duration() {
    let mut job = sample();
    job.set_result(1_500, "done".to_string()).unwrap();
    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(job.duration_ms, Some(500));
    assert_eq!(job.response_text.as_deref(), Some("done"));
}

#[test]
fn terminal_transition_is_irreversible() {
    let mut job = sample();
    job.set_result(1_200, "done".to_string()).unwrap();
    let err = job.set_error(1_300, "too late".to_string()).unwrap_err();
    assert_eq!(err.status, JobStatus::Succeeded);
    // state is unchanged by the rejected transition
    assert_eq!(job.status, JobStatus::Succeeded);
    assert!(job.error.is_none());
}

#[test]
fn cancel_is_idempotent_once_terminal() {
    let mut job = sample();
    job.cancel(1_100, Some("user requested".to_string())).unwrap();
    assert_eq!(job.status, JobStatus::Canceled);
    assert!(job.cancel(1_200, None).is_err());
    assert_eq!(job.status, JobStatus::Canceled);
}

#[test]
fn attach_report_merges_even_on_terminal_job() {
    let mut job = sample();
    job.set_result(1_100, "done".to_string()).unwrap();
    job.attach_report(JobReport {
        summary: Some("summary".to_string()),
        notes: vec!["note-1".to_string()],
        ..Default::default()
    });
    job.attach_report(JobReport {
        issues: vec!["issue-1".to_string()],
        ..Default::default()
    });
    assert_eq!(job.report.summary.as_deref(), Some("summary"));
    assert_eq!(job.report.notes, vec!["note-1".to_string()]);
    assert_eq!(job.report.issues, vec!["issue-1".to_string()]);
}

#[test]
fn job_target_workflow_round_trips() {
    let job = Job::new(
        JobTarget::Workflow(crate::ids::RunId::from_string("run-abc")),
        "run it",
        0,
    );
    let json = serde_json::to_string(&job).unwrap();
    assert!(json.contains("\"workflow:run-abc\""));
    let back: Job = serde_json::from_str(&json).unwrap();
    assert_eq!(back.target, job.target);
}
