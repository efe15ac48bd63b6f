// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawns worker and sentinel subprocesses under the fixed env-var contract:
//! project directory, coordination service address, session id — nothing
//! else crosses the boundary.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use warden_core::SessionId;

use crate::error::AdapterError;

pub const ENV_PROJECT_DIR: &str = "WARDEN_PROJECT_DIR";
pub const ENV_COORDINATION_ADDR: &str = "WARDEN_COORDINATION_ADDR";
pub const ENV_SESSION_ID: &str = "WARDEN_SESSION_ID";

#[derive(Debug, Clone)]
pub struct WorkerSpawnSpec {
    pub session_id: SessionId,
    pub project_dir: PathBuf,
    pub coordination_addr: String,
    /// Restricted tool/verb subset passed to a sentinel; empty for a regular worker.
    pub sentinel: bool,
}

/// A handle to a spawned subprocess: alive until `wait` resolves or `kill`
/// is called. Implementations must tolerate `kill` on an already-exited
/// process without erroring — the supervisor's orphan sweep may race a
/// process that just finished on its own.
#[async_trait]
pub trait WorkerHandle: Send + Sync {
    fn session_id(&self) -> &SessionId;
    async fn wait(&mut self) -> Result<Option<i32>, AdapterError>;
    async fn kill(&mut self) -> Result<(), AdapterError>;
    fn is_running(&self) -> bool;
}

#[async_trait]
pub trait WorkerProcess: Send + Sync + 'static {
    async fn spawn(&self, spec: WorkerSpawnSpec) -> Result<Box<dyn WorkerHandle>, AdapterError>;
}

pub struct CommandWorkerProcess {
    pub binary_path: PathBuf,
}

impl CommandWorkerProcess {
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self { binary_path: binary_path.into() }
    }
}

struct ChildWorkerHandle {
    session_id: SessionId,
    child: tokio::process::Child,
    exited_code: Option<i32>,
}

#[async_trait]
impl WorkerHandle for ChildWorkerHandle {
    fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    async fn wait(&mut self) -> Result<Option<i32>, AdapterError> {
        let status = self.child.wait().await.map_err(AdapterError::Spawn)?;
        self.exited_code = status.code();
        Ok(self.exited_code)
    }

    async fn kill(&mut self) -> Result<(), AdapterError> {
        match self.child.kill().await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()), // already exited
            Err(e) => Err(AdapterError::Spawn(e)),
        }
    }

    fn is_running(&self) -> bool {
        self.exited_code.is_none()
    }
}

#[async_trait]
impl WorkerProcess for CommandWorkerProcess {
    async fn spawn(&self, spec: WorkerSpawnSpec) -> Result<Box<dyn WorkerHandle>, AdapterError> {
        let mut command = tokio::process::Command::new(&self.binary_path);
        command
            .env(ENV_PROJECT_DIR, &spec.project_dir)
            .env(ENV_COORDINATION_ADDR, &spec.coordination_addr)
            .env(ENV_SESSION_ID, spec.session_id.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if spec.sentinel {
            command.arg("--sentinel");
        }

        let child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AdapterError::ToolNotFound(self.binary_path.display().to_string())
            } else {
                AdapterError::Spawn(e)
            }
        })?;

        Ok(Box::new(ChildWorkerHandle { session_id: spec.session_id, child, exited_code: None }))
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use std::sync::Arc;
    use parking_lot::Mutex;

    struct FakeHandleState {
        exited_code: Option<i32>,
        killed: bool,
    }

    pub struct FakeWorkerHandle {
        session_id: SessionId,
        state: Arc<Mutex<FakeHandleState>>,
    }

    #[async_trait]
    impl WorkerHandle for FakeWorkerHandle {
        fn session_id(&self) -> &SessionId {
            &self.session_id
        }

        async fn wait(&mut self) -> Result<Option<i32>, AdapterError> {
            Ok(self.state.lock().exited_code)
        }

        async fn kill(&mut self) -> Result<(), AdapterError> {
            let mut state = self.state.lock();
            state.killed = true;
            state.exited_code.get_or_insert(-9);
            Ok(())
        }

        fn is_running(&self) -> bool {
            !self.state.lock().killed && self.state.lock().exited_code.is_none()
        }
    }

    #[derive(Clone, Default)]
    pub struct FakeWorkerProcess {
        spawned: Arc<Mutex<Vec<WorkerSpawnSpec>>>,
        states: Arc<Mutex<std::collections::HashMap<SessionId, Arc<Mutex<FakeHandleState>>>>>,
    }

    impl FakeWorkerProcess {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn spawned(&self) -> Vec<WorkerSpawnSpec> {
            self.spawned.lock().clone()
        }

        /// Mark a previously-spawned session as having exited naturally with
        /// `code`, as opposed to `kill`. Lets a supervisor's poll loop observe
        /// a worker finishing on its own without a real subprocess.
        pub fn complete(&self, session_id: &SessionId, code: i32) {
            if let Some(state) = self.states.lock().get(session_id) {
                let mut state = state.lock();
                state.exited_code = Some(code);
            }
        }
    }

    #[async_trait]
    impl WorkerProcess for FakeWorkerProcess {
        async fn spawn(&self, spec: WorkerSpawnSpec) -> Result<Box<dyn WorkerHandle>, AdapterError> {
            self.spawned.lock().push(spec.clone());
            let state = Arc::new(Mutex::new(FakeHandleState { exited_code: None, killed: false }));
            self.states.lock().insert(spec.session_id.clone(), state.clone());
            Ok(Box::new(FakeWorkerHandle { session_id: spec.session_id, state }))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeWorkerHandle, FakeWorkerProcess};

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
