// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The unit of work claimed and completed by workers.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::error::CoreError;

crate::define_sequential_id! {
    /// Stable, monotone task identifier (`task-001`, `task-002`, ...).
    ///
    /// Sequential rather than random so task listings sort in creation order
    /// without an extra field, and so log lines stay short and diffable.
    pub struct TaskId("task-");
}

/// Where a task sits in its lifecycle.
///
/// `owner` is `Some` if and only if `status == InProgress` (enforced by the
/// mutation methods below, never by construction alone).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

crate::simple_display! {
    TaskStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Failed => "failed",
    }
}

/// The kind of work a task represents, used to route reviewer attention and
/// to pick default risk posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    BackendApi,
    FrontendUi,
    Database,
    Security,
    Testing,
    Infrastructure,
    General,
}

crate::simple_display! {
    TaskType {
        BackendApi => "backend_api",
        FrontendUi => "frontend_ui",
        Database => "database",
        Security => "security",
        Testing => "testing",
        Infrastructure => "infrastructure",
        General => "general",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

crate::simple_display! {
    RiskLevel {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

/// One node in the task DAG planned for a cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub subject: String,
    pub description: String,
    pub status: TaskStatus,
    pub owner: Option<String>,
    pub depends_on: BTreeSet<TaskId>,
    /// Reverse edge of `depends_on`, maintained by the store on task creation.
    pub blocks: BTreeSet<TaskId>,
    pub result_summary: Option<String>,
    pub files_changed: Vec<String>,
    pub task_type: TaskType,
    pub security_requirements: Vec<String>,
    pub performance_requirements: Vec<String>,
    pub acceptance_criteria: Vec<String>,
    pub risk_level: RiskLevel,
    pub created_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub completed_at_ms: Option<u64>,
}

impl Task {
    pub fn new(id: TaskId, subject: impl Into<String>, task_type: TaskType, created_at_ms: u64) -> Self {
        Self {
            id,
            subject: subject.into(),
            description: String::new(),
            status: TaskStatus::Pending,
            owner: None,
            depends_on: BTreeSet::new(),
            blocks: BTreeSet::new(),
            result_summary: None,
            files_changed: Vec::new(),
            task_type,
            security_requirements: Vec::new(),
            performance_requirements: Vec::new(),
            acceptance_criteria: Vec::new(),
            risk_level: RiskLevel::Low,
            created_at_ms,
            started_at_ms: None,
            completed_at_ms: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Transition `Pending -> InProgress`, recording the owner and start
    /// time. Callers are expected to have already verified dependencies are
    /// satisfied (the atomic check lives in the store, under the task's
    /// lock, so two callers can't both succeed for the same task).
    pub fn claim(&mut self, owner: impl Into<String>, now_ms: u64) -> Result<(), CoreError> {
        if self.status != TaskStatus::Pending {
            return Err(CoreError::TaskNotPending {
                task: self.id.to_string(),
                current: self.status.to_string(),
            });
        }
        self.status = TaskStatus::InProgress;
        self.owner = Some(owner.into());
        self.started_at_ms = Some(now_ms);
        Ok(())
    }

    pub fn complete(
        &mut self,
        caller: &str,
        summary: impl Into<String>,
        files_changed: Vec<String>,
        now_ms: u64,
    ) -> Result<(), CoreError> {
        if self.owner.as_deref() != Some(caller) {
            return Err(CoreError::TaskNotOwnedBy {
                task: self.id.to_string(),
                caller: caller.to_string(),
                owner: self.owner.clone(),
            });
        }
        self.status = TaskStatus::Completed;
        self.result_summary = Some(summary.into());
        self.files_changed = files_changed;
        self.completed_at_ms = Some(now_ms);
        Ok(())
    }

    /// Reset an orphaned `InProgress` task back to `Pending` so it can be
    /// reclaimed. Idempotent: resetting an already-pending task is a no-op.
    pub fn reset_orphan(&mut self) {
        if self.status == TaskStatus::InProgress {
            self.status = TaskStatus::Pending;
            self.owner = None;
            self.started_at_ms = None;
        }
    }

    pub fn fail(&mut self, summary: impl Into<String>, now_ms: u64) {
        self.status = TaskStatus::Failed;
        self.result_summary = Some(summary.into());
        self.completed_at_ms = Some(now_ms);
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Task {
    pub fn test_fixture(n: u32) -> Self {
        Self::new(TaskId::sequential(n), format!("task {n}"), TaskType::General, 0)
    }
}

/// Check a planned task set for the two DAG invariants the planner must
/// uphold: `depends_on`/`blocks` are exact mirrors of each other, and the
/// graph they describe is acyclic. Run once per plan, before any task is
/// persisted.
pub fn validate_dag(tasks: &[Task]) -> Result<(), CoreError> {
    let by_id: HashMap<&TaskId, &Task> = tasks.iter().map(|t| (&t.id, t)).collect();

    for task in tasks {
        for dep in &task.depends_on {
            let Some(dep_task) = by_id.get(dep) else { continue };
            if !dep_task.blocks.contains(&task.id) {
                return Err(CoreError::DependencyCycle(task.id.to_string()));
            }
        }
    }

    let mut state: HashMap<&TaskId, u8> = HashMap::new(); // 0=unvisited 1=visiting 2=done
    for task in tasks {
        if visit_for_cycle(&task.id, &by_id, &mut state)? {
            return Err(CoreError::DependencyCycle(task.id.to_string()));
        }
    }
    Ok(())
}

fn visit_for_cycle<'a>(
    id: &'a TaskId,
    by_id: &HashMap<&'a TaskId, &'a Task>,
    state: &mut HashMap<&'a TaskId, u8>,
) -> Result<bool, CoreError> {
    match state.get(id) {
        Some(2) => return Ok(false),
        Some(1) => return Ok(true),
        _ => {}
    }
    state.insert(id, 1);
    if let Some(task) = by_id.get(id) {
        for dep in &task.depends_on {
            if visit_for_cycle(dep, by_id, state)? {
                return Ok(true);
            }
        }
    }
    state.insert(id, 2);
    Ok(false)
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;

#[cfg(all(test, feature = "test-support"))]
#[path = "task_proptest.rs"]
mod proptests;
