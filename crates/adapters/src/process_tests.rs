// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parse_ready_url_extracts_http_url() {
    let line = "opencode server listening (v1.2) on http://127.0.0.1:4096";
    assert_eq!(parse_ready_url(line).as_deref(), Some("http://127.0.0.1:4096"));
}

#[test]
fn parse_ready_url_ignores_unrelated_lines() {
    assert_eq!(parse_ready_url("booting up, please wait..."), None);
}

#[tokio::test]
async fn spawn_and_wait_for_ready_parses_stdout_line() {
    let script = format!("echo '{READY_MARKER} on http://127.0.0.1:9999'; sleep 5");
    let mut spawned = spawn_detached("sh", &["-c".into(), script], std::path::Path::new("."), &[]).unwrap();
    let url = wait_for_ready(&mut spawned.child, Duration::from_secs(5)).await.unwrap();
    assert_eq!(url, "http://127.0.0.1:9999");
    shutdown_process_group(spawned.pid, Duration::from_millis(200)).await.unwrap();
}

#[tokio::test]
async fn wait_for_ready_reports_early_exit() {
    let mut spawned = spawn_detached("sh", &["-c".into(), "exit 1".into()], std::path::Path::new("."), &[]).unwrap();
    let err = wait_for_ready(&mut spawned.child, Duration::from_secs(5)).await.unwrap_err();
    assert!(matches!(err, BackendError::ProcessExited { .. }));
}

#[tokio::test]
async fn shutdown_process_group_kills_a_long_running_child() {
    let mut spawned = spawn_detached("sh", &["-c".into(), "sleep 30".into()], std::path::Path::new("."), &[]).unwrap();
    let pid = spawned.pid;
    assert!(is_alive(pid));
    shutdown_process_group(pid, Duration::from_millis(300)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!is_alive(pid));
    let _ = spawned.child.wait().await;
}
