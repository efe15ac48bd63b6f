// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use warden_adapters::FakeWorkerProcess;
use warden_core::{SessionState, Task, TaskStatus};
use warden_store::tasks as store_tasks;

struct InstantSleeper;

#[async_trait::async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

fn paths() -> (tempfile::TempDir, ProjectPaths) {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = ProjectPaths::new(dir.path());
    std::fs::create_dir_all(paths.sessions_dir()).expect("create sessions dir");
    std::fs::create_dir_all(paths.tasks_dir()).expect("create tasks dir");
    std::fs::create_dir_all(paths.messages_dir()).expect("create messages dir");
    (dir, paths)
}

fn supervisor(process: FakeWorkerProcess) -> WorkerSupervisor {
    WorkerSupervisor::new(Arc::new(process), "/tmp/project", "127.0.0.1:9999")
}

#[tokio::test]
async fn spawn_worker_writes_starting_status() {
    let (_dir, paths) = paths();
    let supervisor = supervisor(FakeWorkerProcess::new());
    let session_id = supervisor.spawn_worker(&paths, 100).await.unwrap();

    let status = sessions::get_session_status(&paths, &session_id).unwrap();
    assert_eq!(status.state, SessionState::Starting);
}

#[tokio::test]
async fn spawn_up_to_tops_off_to_concurrency() {
    let (_dir, paths) = paths();
    let supervisor = supervisor(FakeWorkerProcess::new());
    supervisor.spawn_worker(&paths, 100).await.unwrap();

    let spawned = supervisor.spawn_up_to(&paths, 3, 100).await.unwrap();
    assert_eq!(spawned.len(), 2);
}

#[tokio::test]
async fn spawn_up_to_is_a_noop_once_at_concurrency() {
    let (_dir, paths) = paths();
    let supervisor = supervisor(FakeWorkerProcess::new());
    supervisor.spawn_up_to(&paths, 2, 100).await.unwrap();

    let second_round = supervisor.spawn_up_to(&paths, 2, 100).await.unwrap();
    assert!(second_round.is_empty());
}

#[tokio::test]
async fn reap_finished_marks_done_on_zero_exit() {
    let (_dir, paths) = paths();
    let process = FakeWorkerProcess::new();
    let supervisor = supervisor(process.clone());
    let session_id = supervisor.spawn_worker(&paths, 100).await.unwrap();

    process.complete(&session_id, 0);
    let finished = supervisor.reap_finished(&paths, 200).await.unwrap();

    assert_eq!(finished, vec![(session_id.clone(), Some(0))]);
    assert_eq!(sessions::get_session_status(&paths, &session_id).unwrap().state, SessionState::Done);
    assert!(supervisor.active_session_ids().is_empty());
}

#[tokio::test]
async fn reap_finished_marks_failed_on_nonzero_exit() {
    let (_dir, paths) = paths();
    let process = FakeWorkerProcess::new();
    let supervisor = supervisor(process.clone());
    let session_id = supervisor.spawn_worker(&paths, 100).await.unwrap();

    process.complete(&session_id, 1);
    supervisor.reap_finished(&paths, 200).await.unwrap();

    assert_eq!(sessions::get_session_status(&paths, &session_id).unwrap().state, SessionState::Failed);
}

#[tokio::test]
async fn reap_finished_leaves_still_running_workers_active() {
    let (_dir, paths) = paths();
    let supervisor = supervisor(FakeWorkerProcess::new());
    let session_id = supervisor.spawn_worker(&paths, 100).await.unwrap();

    let finished = supervisor.reap_finished(&paths, 200).await.unwrap();
    assert!(finished.is_empty());
    assert!(supervisor.active_session_ids().contains(session_id.as_str()));
}

#[tokio::test]
async fn recover_orphans_leaves_active_sessions_alone() {
    let (_dir, paths) = paths();
    let supervisor = supervisor(FakeWorkerProcess::new());
    let session_id = supervisor.spawn_worker(&paths, 100).await.unwrap();

    let owned = Task::test_fixture(1);
    let orphaned = Task::test_fixture(2);
    store_tasks::create_task(&paths, &owned).unwrap();
    store_tasks::create_task(&paths, &orphaned).unwrap();
    store_tasks::claim_task(&paths, &owned.id, session_id.as_str(), 100).unwrap();
    store_tasks::claim_task(&paths, &orphaned.id, "session-999", 100).unwrap();

    let reset = supervisor.recover_orphans(&paths).unwrap();

    assert_eq!(reset, vec![orphaned.id.clone()]);
    assert_eq!(store_tasks::get_task(&paths, &owned.id).unwrap().status, TaskStatus::InProgress);
    assert_eq!(store_tasks::get_task(&paths, &orphaned.id).unwrap().status, TaskStatus::Pending);
}

#[tokio::test]
async fn broadcast_wind_down_is_readable_by_every_session() {
    let (_dir, paths) = paths();
    let supervisor = supervisor(FakeWorkerProcess::new());
    supervisor.broadcast_wind_down(&paths, WindDownReason::UsageLimit, Some(999), 100).unwrap();

    let updates = messages::read_updates_for(&paths, "worker-a", 0).unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].message_type, warden_core::MessageType::WindDown);
    assert_eq!(updates[0].metadata.as_ref().unwrap()["reason"], "usage_limit");
}

#[tokio::test]
async fn wait_for_drain_returns_empty_once_worker_completes() {
    let (_dir, paths) = paths();
    let process = FakeWorkerProcess::new();
    let supervisor = supervisor(process.clone());
    let session_id = supervisor.spawn_worker(&paths, 100).await.unwrap();
    process.complete(&session_id, 0);

    let remaining =
        supervisor.wait_for_drain(&paths, &InstantSleeper, Duration::from_secs(120), Duration::from_secs(1), 200).await.unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn wait_for_drain_reports_orphans_after_grace_window() {
    let (_dir, paths) = paths();
    let supervisor = supervisor(FakeWorkerProcess::new());
    let session_id = supervisor.spawn_worker(&paths, 100).await.unwrap();

    let remaining =
        supervisor.wait_for_drain(&paths, &InstantSleeper, Duration::from_secs(3), Duration::from_secs(1), 200).await.unwrap();
    assert_eq!(remaining, vec![session_id]);
}
