// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawns and tracks worker subprocesses against the Coordination Service:
//! the execution workers proper plus exactly one read-only sentinel per
//! cycle, the wind-down broadcast, and orphan recovery.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use warden_adapters::{WorkerHandle, WorkerProcess, WorkerSpawnSpec};
use warden_core::{Message, MessageType, SessionId, SessionState, SessionStatus, TaskId};
use warden_store::{messages, sessions, tasks, ProjectPaths};

use crate::budget::Sleeper;
use crate::error::OrchestratorError;

/// Why a wind-down broadcast was issued, carried in the message metadata so
/// workers (and the engine's own next-cycle decision) can tell a budget
/// squeeze from a user-requested pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindDownReason {
    UsageLimit,
    CycleLimit,
    UserRequested,
}

impl WindDownReason {
    fn as_str(self) -> &'static str {
        match self {
            Self::UsageLimit => "usage_limit",
            Self::CycleLimit => "cycle_limit",
            Self::UserRequested => "user_requested",
        }
    }
}

struct ActiveWorker {
    handle: Box<dyn WorkerHandle>,
    sentinel: bool,
}

pub struct WorkerSupervisor {
    process: Arc<dyn WorkerProcess>,
    project_dir: PathBuf,
    coordination_addr: String,
    next_seq: Mutex<u32>,
    active: Mutex<Vec<ActiveWorker>>,
}

impl WorkerSupervisor {
    pub fn new(process: Arc<dyn WorkerProcess>, project_dir: impl Into<PathBuf>, coordination_addr: impl Into<String>) -> Self {
        Self {
            process,
            project_dir: project_dir.into(),
            coordination_addr: coordination_addr.into(),
            next_seq: Mutex::new(0),
            active: Mutex::new(Vec::new()),
        }
    }

    fn next_session_id(&self) -> SessionId {
        let mut seq = self.next_seq.lock();
        *seq += 1;
        SessionId::sequential(*seq)
    }

    async fn spawn(&self, paths: &ProjectPaths, sentinel: bool, now_ms: u64) -> Result<SessionId, OrchestratorError> {
        let session_id = self.next_session_id();
        sessions::save_session_status(paths, &SessionStatus::new(session_id.clone(), now_ms))?;
        let handle = self
            .process
            .spawn(WorkerSpawnSpec {
                session_id: session_id.clone(),
                project_dir: self.project_dir.clone(),
                coordination_addr: self.coordination_addr.clone(),
                sentinel,
            })
            .await?;
        self.active.lock().push(ActiveWorker { handle, sentinel });
        Ok(session_id)
    }

    pub async fn spawn_worker(&self, paths: &ProjectPaths, now_ms: u64) -> Result<SessionId, OrchestratorError> {
        self.spawn(paths, false, now_ms).await
    }

    /// Spawn the cycle's single read-only sentinel. Callers are responsible
    /// for calling this at most once per cycle.
    pub async fn spawn_sentinel(&self, paths: &ProjectPaths, now_ms: u64) -> Result<SessionId, OrchestratorError> {
        self.spawn(paths, true, now_ms).await
    }

    /// Spawn fresh workers until the number of currently-running,
    /// non-sentinel workers reaches `concurrency`. Used both for initial
    /// fill and for the respawn policy (idle workers, pending tasks left).
    pub async fn spawn_up_to(&self, paths: &ProjectPaths, concurrency: u32, now_ms: u64) -> Result<Vec<SessionId>, OrchestratorError> {
        let running = self.active.lock().iter().filter(|w| !w.sentinel && w.handle.is_running()).count() as u32;
        let mut spawned = Vec::new();
        for _ in running..concurrency {
            spawned.push(self.spawn_worker(paths, now_ms).await?);
        }
        Ok(spawned)
    }

    fn non_sentinel_session_ids(&self) -> Vec<SessionId> {
        self.active.lock().iter().filter(|w| !w.sentinel).map(|w| w.handle.session_id().clone()).collect()
    }

    /// Session ids of every worker (sentinel or not) still tracked as
    /// active, used by orphan recovery to decide which `in_progress` tasks
    /// are legitimately owned.
    pub fn active_session_ids(&self) -> HashSet<String> {
        self.active.lock().iter().map(|w| w.handle.session_id().as_str().to_string()).collect()
    }

    /// Remove workers that have exited from the active set, persist their
    /// terminal session status, and report which finished with which code.
    pub async fn reap_finished(&self, paths: &ProjectPaths, now_ms: u64) -> Result<Vec<(SessionId, Option<i32>)>, OrchestratorError> {
        let drained = std::mem::take(&mut *self.active.lock());
        let mut still_running = Vec::new();
        let mut finished = Vec::new();

        for mut worker in drained {
            if worker.handle.is_running() {
                still_running.push(worker);
                continue;
            }
            let code = worker.handle.wait().await?;
            let session_id = worker.handle.session_id().clone();
            let state = if code == Some(0) { SessionState::Done } else { SessionState::Failed };
            if let Ok(mut status) = sessions::get_session_status(paths, &session_id) {
                status.state = state;
                status.updated_at_ms = now_ms;
                sessions::save_session_status(paths, &status)?;
            }
            finished.push((session_id, code));
        }

        *self.active.lock() = still_running;
        Ok(finished)
    }

    /// Reclaim `in_progress` tasks owned by sessions no longer in the active
    /// set. Safe to call both before spawning (to reclaim a prior crashed
    /// run's tasks) and periodically during execution.
    pub fn recover_orphans(&self, paths: &ProjectPaths) -> Result<Vec<TaskId>, OrchestratorError> {
        Ok(tasks::reset_orphans_not_owned_by(paths, &self.active_session_ids())?)
    }

    /// Broadcast the wind-down message every worker must observe on its
    /// next `read_updates` poll.
    pub fn broadcast_wind_down(
        &self,
        paths: &ProjectPaths,
        reason: WindDownReason,
        resets_at_ms: Option<u64>,
        now_ms: u64,
    ) -> Result<(), OrchestratorError> {
        let mut message = Message::new("supervisor", MessageType::WindDown, "winding down", now_ms);
        let mut metadata = serde_json::json!({ "reason": reason.as_str() });
        if let Some(resets_at_ms) = resets_at_ms {
            metadata["resets_at"] = serde_json::json!(resets_at_ms);
        }
        message.metadata = Some(metadata);
        messages::post_message(paths, "supervisor", &message)?;
        Ok(())
    }

    /// Poll until every non-sentinel worker has drained or `grace` has
    /// elapsed (measured in poll counts rather than wall clock, so this is
    /// driven by an injectable `Sleeper` the same way `BudgetMonitor` is).
    /// Returns the session ids still active past the grace window — these
    /// are the orphans the next `recover_orphans` sweep must reclaim.
    pub async fn wait_for_drain(
        &self,
        paths: &ProjectPaths,
        sleeper: &dyn Sleeper,
        grace: Duration,
        poll_interval: Duration,
        now_ms: u64,
    ) -> Result<Vec<SessionId>, OrchestratorError> {
        let poll_ms = poll_interval.as_millis().max(1);
        let max_polls = (grace.as_millis() / poll_ms).max(1);

        for _ in 0..max_polls {
            self.reap_finished(paths, now_ms).await?;
            let remaining = self.non_sentinel_session_ids();
            if remaining.is_empty() {
                return Ok(remaining);
            }
            sleeper.sleep(poll_interval).await;
        }

        self.reap_finished(paths, now_ms).await?;
        Ok(self.non_sentinel_session_ids())
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
