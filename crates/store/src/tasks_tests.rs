// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;
use warden_core::{TaskId, TaskStatus};

fn paths() -> (tempfile::TempDir, ProjectPaths) {
    let dir = tempdir().expect("tempdir");
    let paths = ProjectPaths::new(dir.path());
    (dir, paths)
}

#[test]
fn create_then_get_round_trips() {
    let (_dir, paths) = paths();
    let task = Task::test_fixture(1);
    create_task(&paths, &task).expect("create");
    let loaded = get_task(&paths, &task.id).expect("get");
    assert_eq!(loaded.id, task.id);
    assert_eq!(loaded.status, TaskStatus::Pending);
}

#[test]
fn create_twice_fails() {
    let (_dir, paths) = paths();
    let task = Task::test_fixture(1);
    create_task(&paths, &task).expect("first create");
    assert!(create_task(&paths, &task).is_err());
}

#[test]
fn claim_then_second_claim_fails() {
    let (_dir, paths) = paths();
    let task = Task::test_fixture(1);
    create_task(&paths, &task).expect("create");
    claim_task(&paths, &task.id, "worker-a", 100).expect("first claim");
    assert!(claim_task(&paths, &task.id, "worker-b", 200).is_err());
}

#[test]
fn complete_requires_matching_owner() {
    let (_dir, paths) = paths();
    let task = Task::test_fixture(1);
    create_task(&paths, &task).expect("create");
    claim_task(&paths, &task.id, "worker-a", 100).expect("claim");
    let err = complete_task(&paths, &task.id, "worker-b", "done", vec![], 200);
    assert!(err.is_err());
    let done = complete_task(&paths, &task.id, "worker-a", "done", vec!["a.rs".into()], 200)
        .expect("complete");
    assert_eq!(done.status, TaskStatus::Completed);
}

#[test]
fn reset_orphans_clears_in_progress_tasks() {
    let (_dir, paths) = paths();
    let task = Task::test_fixture(1);
    create_task(&paths, &task).expect("create");
    claim_task(&paths, &task.id, "worker-a", 100).expect("claim");

    let reset = reset_orphans(&paths).expect("reset");
    assert_eq!(reset, vec![task.id.clone()]);

    let reloaded = get_task(&paths, &task.id).expect("get");
    assert_eq!(reloaded.status, TaskStatus::Pending);
    assert!(reloaded.owner.is_none());
}

#[test]
fn reset_orphans_not_owned_by_leaves_active_owners_alone() {
    let (_dir, paths) = paths();
    let alive = Task::test_fixture(1);
    let dead = Task::test_fixture(2);
    create_task(&paths, &alive).expect("create alive");
    create_task(&paths, &dead).expect("create dead");
    claim_task(&paths, &alive.id, "worker-alive", 100).expect("claim alive");
    claim_task(&paths, &dead.id, "worker-dead", 100).expect("claim dead");

    let active: std::collections::HashSet<String> = ["worker-alive".to_string()].into_iter().collect();
    let reset = reset_orphans_not_owned_by(&paths, &active).expect("reset");

    assert_eq!(reset, vec![dead.id.clone()]);
    assert_eq!(get_task(&paths, &alive.id).expect("get").status, TaskStatus::InProgress);
    assert_eq!(get_task(&paths, &dead.id).expect("get").status, TaskStatus::Pending);
}

#[test]
fn list_tasks_sorts_by_id() {
    let (_dir, paths) = paths();
    create_task(&paths, &Task::test_fixture(2)).expect("create 2");
    create_task(&paths, &Task::test_fixture(1)).expect("create 1");
    let listed = list_tasks(&paths).expect("list");
    assert_eq!(listed.iter().map(|t| t.id.clone()).collect::<Vec<_>>(), vec![
        TaskId::sequential(1),
        TaskId::sequential(2),
    ]);
}

#[test]
fn get_missing_task_reports_not_found() {
    let (_dir, paths) = paths();
    let err = get_task(&paths, &TaskId::sequential(99)).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}
