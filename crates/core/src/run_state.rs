// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The top-level run state: one record per project, the root of the cycle
//! engine's state machine.

use serde::{Deserialize, Serialize};

use crate::flow::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Initializing,
    Questioning,
    Planning,
    Executing,
    Reviewing,
    FlowTracing,
    Checkpointing,
    Completed,
    Escalated,
    Paused,
    Failed,
}

crate::simple_display! {
    RunStatus {
        Initializing => "initializing",
        Questioning => "questioning",
        Planning => "planning",
        Executing => "executing",
        Reviewing => "reviewing",
        FlowTracing => "flow_tracing",
        Checkpointing => "checkpointing",
        Completed => "completed",
        Escalated => "escalated",
        Paused => "paused",
        Failed => "failed",
    }
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

/// Why the run paused, recorded so `resume` can decide whether it still
/// needs to wait for a budget reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    UsageLimit,
    CycleLimit,
    UserRequested,
    ReviewerRateLimited,
}

crate::simple_display! {
    PauseReason {
        UsageLimit => "usage_limit",
        CycleLimit => "cycle_limit",
        UserRequested => "user_requested",
        ReviewerRateLimited => "reviewer_rate_limited",
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Normalized utilization fraction in `[0, 1]`.
    pub utilization: f64,
    pub resets_at_ms: u64,
    pub sampled_at_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewerMetrics {
    pub total_reviews: u32,
    pub approvals: u32,
    pub presumed_rate_limits: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSummary {
    pub findings_by_severity: std::collections::BTreeMap<String, u32>,
    pub cross_boundary_count: u32,
}

impl FlowSummary {
    pub fn from_counts(counts: &std::collections::HashMap<Severity, u32>, cross_boundary_count: u32) -> Self {
        let mut findings_by_severity = std::collections::BTreeMap::new();
        for (severity, count) in counts {
            findings_by_severity.insert(severity.to_string(), *count);
        }
        Self { findings_by_severity, cross_boundary_count }
    }
}

/// One completed cycle's tally, appended to `RunState::cycle_history` at
/// checkpoint time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleRecord {
    pub index: u32,
    pub plan_version: u32,
    pub tasks_completed: u32,
    pub tasks_failed: u32,
    pub plan_approved: bool,
    pub code_approved: bool,
    pub plan_rounds: u32,
    pub code_rounds: u32,
    pub started_at_ms: u64,
    pub ended_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_summary: Option<FlowSummary>,
}

impl CycleRecord {
    pub fn duration_ms(&self) -> u64 {
        self.ended_at_ms.saturating_sub(self.started_at_ms)
    }
}

/// The singleton per-project run state. Every transition is written
/// through to the durable store before the engine acts on it; recovery
/// after a crash is just reloading this record plus a sweep for orphaned
/// tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub feature: String,
    pub working_branch: String,
    pub base_commit: String,
    pub status: RunStatus,
    pub current_cycle: u32,
    pub cycle_cap: u32,
    pub concurrency_cap: u32,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_reason: Option<PauseReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_after_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_usage_snapshot: Option<UsageSnapshot>,
    #[serde(default)]
    pub reviewer_metrics: ReviewerMetrics,
    #[serde(default)]
    pub active_session_ids: Vec<String>,
    #[serde(default)]
    pub cycle_history: Vec<CycleRecord>,
}

impl RunState {
    pub fn new(
        feature: impl Into<String>,
        working_branch: impl Into<String>,
        base_commit: impl Into<String>,
        cycle_cap: u32,
        concurrency_cap: u32,
        now_ms: u64,
    ) -> Self {
        Self {
            feature: feature.into(),
            working_branch: working_branch.into(),
            base_commit: base_commit.into(),
            status: RunStatus::Initializing,
            current_cycle: 0,
            cycle_cap,
            concurrency_cap,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            paused_at_ms: None,
            pause_reason: None,
            resume_after_ms: None,
            last_usage_snapshot: None,
            reviewer_metrics: ReviewerMetrics::default(),
            active_session_ids: Vec::new(),
            cycle_history: Vec::new(),
        }
    }

    /// `status == paused` iff `paused_at != null` iff `resume_after != null`.
    pub fn invariants_hold(&self) -> bool {
        let paused_consistent = (self.status == RunStatus::Paused)
            == (self.paused_at_ms.is_some() && self.resume_after_ms.is_some());
        let cycle_in_range = self.current_cycle <= self.cycle_cap;
        paused_consistent && cycle_in_range
    }

    pub fn pause(&mut self, reason: PauseReason, resume_after_ms: u64, now_ms: u64) {
        self.status = RunStatus::Paused;
        self.paused_at_ms = Some(now_ms);
        self.pause_reason = Some(reason);
        self.resume_after_ms = Some(resume_after_ms);
        self.updated_at_ms = now_ms;
    }

    /// Resume from pause. If any task was left `pending`/`in_progress`, the
    /// caller should skip planning for this cycle and go straight to
    /// execute (the orchestrator's job; this just clears the pause fields).
    pub fn resume(&mut self, now_ms: u64) {
        self.status = RunStatus::Executing;
        self.paused_at_ms = None;
        self.pause_reason = None;
        self.resume_after_ms = None;
        self.updated_at_ms = now_ms;
    }

    pub fn record_cycle(&mut self, record: CycleRecord) {
        self.current_cycle = record.index;
        self.cycle_history.push(record);
    }
}

#[cfg(test)]
#[path = "run_state_tests.rs"]
mod tests;
