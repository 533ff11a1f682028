// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use base64::Engine;
use std::sync::atomic::AtomicU64;
use tempfile::TempDir;

#[test]
fn path_inside_base_dir_is_referenced_without_copying() {
    let base = TempDir::new().unwrap();
    let file = base.path().join("shot.png");
    std::fs::write(&file, b"pretend-png").unwrap();
    let counter = AtomicU64::new(0);
    let out = normalize(&[AttachmentInput::Path(file.clone())], base.path(), "wkr-1", 1000, &counter).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].path, file);
    assert!(!out[0].created);
}

#[test]
fn path_outside_base_dir_is_copied_in() {
    let base = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    let file = outside.path().join("shot.jpg");
    std::fs::write(&file, b"pretend-jpg").unwrap();
    let counter = AtomicU64::new(0);
    let out = normalize(&[AttachmentInput::Path(file.clone())], base.path(), "wkr-1", 1000, &counter).unwrap();
    assert_eq!(out.len(), 1);
    assert!(out[0].created);
    assert!(out[0].path.starts_with(base.path().join(".opencode").join("attachments")));
    assert!(out[0].path.to_string_lossy().contains("wkr-1-1000-0"));
    assert_eq!(std::fs::read(&out[0].path).unwrap(), b"pretend-jpg");
}

#[test]
fn base64_attachment_is_decoded_and_materialized() {
    let base = TempDir::new().unwrap();
    let data = base64::engine::general_purpose::STANDARD.encode(b"raw-bytes");
    let counter = AtomicU64::new(0);
    let out = normalize(&[AttachmentInput::Base64 { data, filename: "note.txt".into() }], base.path(), "wkr-2", 42, &counter).unwrap();
    assert_eq!(std::fs::read(&out[0].path).unwrap(), b"raw-bytes");
    assert!(out[0].path.to_string_lossy().ends_with(".txt"));
}

#[test]
fn cleanup_only_removes_created_files() {
    let base = TempDir::new().unwrap();
    let kept = base.path().join("kept.png");
    std::fs::write(&kept, b"x").unwrap();
    let created = base.path().join("made.png");
    std::fs::write(&created, b"y").unwrap();

    let attachments = vec![
        NormalizedAttachment { path: kept.clone(), created: false },
        NormalizedAttachment { path: created.clone(), created: true },
    ];
    cleanup(&attachments);
    assert!(kept.exists());
    assert!(!created.exists());
}

#[test]
fn counter_disambiguates_multiple_attachments_in_same_millisecond() {
    let base = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    let a = outside.path().join("a.png");
    let b = outside.path().join("b.png");
    std::fs::write(&a, b"a").unwrap();
    std::fs::write(&b, b"b").unwrap();
    let counter = AtomicU64::new(0);
    let out = normalize(&[AttachmentInput::Path(a), AttachmentInput::Path(b)], base.path(), "wkr-3", 5, &counter).unwrap();
    assert_ne!(out[0].path, out[1].path);
}
