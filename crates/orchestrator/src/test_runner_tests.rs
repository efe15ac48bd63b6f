// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn paths() -> (tempfile::TempDir, ProjectPaths) {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = ProjectPaths::new(dir.path());
    std::fs::create_dir_all(paths.root()).expect("create .warden dir");
    (dir, paths)
}

#[tokio::test]
async fn successful_command_reports_passed() {
    let (_dir, paths) = paths();
    let response = run_tests(&paths, "true", &[], None).await;
    match response {
        Response::TestRun { passed, .. } => assert!(passed),
        other => panic!("expected TestRun, got {other:?}"),
    }
}

#[tokio::test]
async fn failing_command_reports_not_passed() {
    let (_dir, paths) = paths();
    let response = run_tests(&paths, "false", &[], None).await;
    match response {
        Response::TestRun { passed, .. } => assert!(!passed),
        other => panic!("expected TestRun, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_binary_reports_not_passed_with_reason() {
    let (_dir, paths) = paths();
    let response = run_tests(&paths, "this-binary-does-not-exist-anywhere", &[], None).await;
    match response {
        Response::TestRun { passed, output_tail } => {
            assert!(!passed);
            assert!(output_tail.contains("failed to spawn"));
        }
        other => panic!("expected TestRun, got {other:?}"),
    }
}

#[tokio::test]
async fn timeout_is_reported_as_failure() {
    let (_dir, paths) = paths();
    let response = run_tests(&paths, "sleep 5", &[], Some(0)).await;
    match response {
        Response::TestRun { passed, output_tail } => {
            assert!(!passed);
            assert!(output_tail.contains("timed out"));
        }
        other => panic!("expected TestRun, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_test_command_is_reported_without_spawning() {
    let (_dir, paths) = paths();
    let response = run_tests(&paths, "   ", &[], None).await;
    match response {
        Response::TestRun { passed, output_tail } => {
            assert!(!passed);
            assert_eq!(output_tail, "no test_command configured");
        }
        other => panic!("expected TestRun, got {other:?}"),
    }
}
