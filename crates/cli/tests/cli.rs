// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box tests against the compiled `warden` binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn warden() -> Command {
    Command::cargo_bin("warden").expect("warden binary built by the cli crate")
}

#[test]
fn help_lists_the_top_level_subcommands() {
    warden()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("resume"))
        .stdout(predicate::str::contains("pause"))
        .stdout(predicate::str::contains("log"));
}

#[test]
fn status_on_a_project_with_no_run_reports_no_run() {
    let project = tempfile::tempdir().unwrap();
    warden()
        .args(["status", "--project"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No run found"));
}

#[test]
fn status_json_on_a_project_with_no_run_emits_no_run_status() {
    let project = tempfile::tempdir().unwrap();
    warden()
        .args(["status", "--project"])
        .arg(project.path())
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\":\"no_run\""));
}

#[test]
fn pause_writes_a_pause_signal_file() {
    let project = tempfile::tempdir().unwrap();
    warden().args(["pause", "--project"]).arg(project.path()).assert().success();

    let pause_file = project.path().join(".warden").join("pause.signal");
    assert!(pause_file.exists());
}

#[test]
fn log_without_a_log_file_fails_with_a_clear_message() {
    let project = tempfile::tempdir().unwrap();
    warden()
        .args(["log", "--project"])
        .arg(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no log file"));
}

#[test]
fn start_without_a_feature_argument_fails() {
    let project = tempfile::tempdir().unwrap();
    warden()
        .args(["start", "--project"])
        .arg(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("feature description"));
}
