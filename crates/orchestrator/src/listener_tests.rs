// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::net::TcpStream;
use warden_core::FakeClock;
use warden_wire::{encode, read_message, write_message, Request, Response};

fn paths() -> (tempfile::TempDir, warden_store::ProjectPaths) {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = warden_store::ProjectPaths::new(dir.path());
    for d in paths.all_dirs() {
        std::fs::create_dir_all(d).expect("create dir");
    }
    (dir, paths)
}

async fn roundtrip(addr: std::net::SocketAddr, session_id: &str, request: Request) -> Response {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    write_message(&mut stream, session_id.as_bytes()).await.expect("write session id");
    let bytes = encode(&request).expect("encode request");
    write_message(&mut stream, &bytes).await.expect("write request");
    let response_bytes = read_message(&mut stream).await.expect("read response");
    warden_wire::decode(&response_bytes).expect("decode response")
}

#[tokio::test]
async fn dispatches_one_request_per_connection() {
    let (_dir, paths) = paths();
    let task = warden_core::Task::test_fixture(1);
    warden_store::tasks::create_task(&paths, &task).unwrap();

    let listener = CoordinationListener::new(paths, FakeClock::new(), "true");
    let (bound, addr) = listener.bind("127.0.0.1:0").await.unwrap();
    tokio::spawn(bound.run());

    let response = roundtrip(addr, "worker-1", Request::ListTasks { status: None }).await;
    match response {
        Response::Tasks { tasks } => assert_eq!(tasks.len(), 1),
        other => panic!("expected Tasks, got {other:?}"),
    }
}

#[tokio::test]
async fn a_malformed_connection_does_not_stop_the_accept_loop() {
    let (_dir, paths) = paths();
    let listener = CoordinationListener::new(paths, FakeClock::new(), "true");
    let (bound, addr) = listener.bind("127.0.0.1:0").await.unwrap();
    tokio::spawn(bound.run());

    // Connect and immediately drop without sending anything.
    {
        let _stream = TcpStream::connect(addr).await.expect("connect");
    }

    let response = roundtrip(addr, "worker-1", Request::ListTasks { status: None }).await;
    assert!(matches!(response, Response::Tasks { .. }));
}

#[tokio::test]
async fn claim_task_sees_the_connecting_session_id() {
    let (_dir, paths) = paths();
    let task = warden_core::Task::test_fixture(1);
    warden_store::tasks::create_task(&paths, &task).unwrap();

    let listener = CoordinationListener::new(paths.clone(), FakeClock::new(), "true");
    let (bound, addr) = listener.bind("127.0.0.1:0").await.unwrap();
    tokio::spawn(bound.run());

    let response = roundtrip(addr, "worker-7", Request::ClaimTask { task_id: task.id.clone() }).await;
    assert!(matches!(response, Response::TaskClaimed { .. }));

    let claimed = warden_store::tasks::get_task(&paths, &task.id).unwrap();
    assert_eq!(claimed.status, warden_core::TaskStatus::InProgress);
}
