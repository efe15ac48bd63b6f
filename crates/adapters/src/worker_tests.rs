// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use warden_core::SessionId;

fn spec(sentinel: bool) -> WorkerSpawnSpec {
    WorkerSpawnSpec {
        session_id: SessionId::sequential(1),
        project_dir: std::path::PathBuf::from("/tmp/project"),
        coordination_addr: "127.0.0.1:9999".to_string(),
        sentinel,
    }
}

#[tokio::test]
async fn fake_worker_process_records_spawn_specs() {
    let process = FakeWorkerProcess::new();
    let mut handle = process.spawn(spec(false)).await.unwrap();
    assert!(handle.is_running());
    handle.kill().await.unwrap();
    assert!(!handle.is_running());

    assert_eq!(process.spawned().len(), 1);
    assert!(!process.spawned()[0].sentinel);
}

#[tokio::test]
async fn sentinel_flag_is_recorded_on_spawn_spec() {
    let process = FakeWorkerProcess::new();
    process.spawn(spec(true)).await.unwrap();
    assert!(process.spawned()[0].sentinel);
}

#[tokio::test]
async fn complete_marks_natural_exit_without_kill() {
    let process = FakeWorkerProcess::new();
    let session_id = SessionId::sequential(1);
    let mut handle = process.spawn(spec(false)).await.unwrap();
    assert!(handle.is_running());

    process.complete(&session_id, 0);

    assert!(!handle.is_running());
    assert_eq!(handle.wait().await.unwrap(), Some(0));
}
