// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The top-level plan/execute/review/checkpoint state machine. Every
//! transition is persisted to `RunState` before the engine acts on it, so a
//! crash mid-cycle just replays from the last durable checkpoint on resume.
//!
//! The engine composes the other six control-plane pieces (Budget Monitor,
//! Reviewer Driver, Flow Tracer, Worker Supervisor, Coordination Service,
//! Known-Issue Registry) but owns none of their internals — this module is
//! the only place that knows the order they run in.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use warden_adapters::{ReviewerTool, UsageReport, VcsFacade};
use warden_core::{
    Clock, CycleRecord, Flow, FlowFinding, FlowSummary, KnownIssue, PauseReason, RiskLevel, RunState, RunStatus,
    Severity, Task, TaskId, TaskStatus, TaskType,
};
use warden_store::{known_issues, run_state, tasks, ProjectPaths};

use crate::budget::{BudgetCallback, BudgetMonitor, Sleeper};
use crate::config::WardenConfig;
use crate::error::OrchestratorError;
use crate::planner;
use crate::reviewer_driver::{self, ReviewDialogueOutcome};
use crate::supervisor::{WindDownReason, WorkerSupervisor};

/// A budget callback the execute loop doesn't need to react to inline — it
/// reads `is_critical`/`is_wind_down` off the monitor after every poll
/// instead.
struct NoopBudgetCallback;

impl BudgetCallback for NoopBudgetCallback {
    fn on_poll(&self, _report: &UsageReport, _crossed_wind_down: bool, _crossed_critical: bool) {}
}

/// What stopped the execute step's monitor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// No `pending` and no `in_progress` tasks remain.
    Drained,
    UsageLimitReached,
    UserRequestedPause,
}

/// First matching row of the checkpoint decision table wins. See
/// `decide_checkpoint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointDecision {
    Pause,
    Continue,
    Complete,
    Escalate,
}

/// Pure decision function for step 4 of the cycle. Kept free of any I/O so
/// the gating logic is exercised directly in tests without a store or VCS.
#[allow(clippy::too_many_arguments)]
pub fn decide_checkpoint(
    user_requested_pause: bool,
    budget_critical_or_wind_down: bool,
    flow_findings_have_critical_or_high: bool,
    code_review_approved: bool,
    remaining: u32,
    failed: u32,
    next_cycle: u32,
    cycle_cap: u32,
) -> CheckpointDecision {
    if user_requested_pause {
        return CheckpointDecision::Pause;
    }
    if budget_critical_or_wind_down {
        return CheckpointDecision::Pause;
    }
    if flow_findings_have_critical_or_high {
        return CheckpointDecision::Continue;
    }
    if !code_review_approved {
        return CheckpointDecision::Continue;
    }
    if remaining == 0 && failed == 0 {
        return CheckpointDecision::Complete;
    }
    if next_cycle >= cycle_cap {
        return CheckpointDecision::Escalate;
    }
    if remaining > 0 || failed > 0 {
        return CheckpointDecision::Continue;
    }
    CheckpointDecision::Complete
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationOption {
    Continue,
    Redirect,
    Stop,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EscalationRecord {
    pub reason: String,
    pub details: String,
    pub timestamp_ms: u64,
    pub options: Vec<EscalationOption>,
}

impl EscalationRecord {
    pub fn new(reason: impl Into<String>, details: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            reason: reason.into(),
            details: details.into(),
            timestamp_ms,
            options: vec![EscalationOption::Continue, EscalationOption::Redirect, EscalationOption::Stop],
        }
    }
}

/// Non-interactive callers get exit code 2 so the launching shell knows to
/// resume later rather than treating this as a fatal error.
pub const ESCALATION_EXIT_CODE: i32 = 2;

/// Synthesize fix tasks for every flow finding at high or critical severity,
/// assigning ids starting at `next_id`. Per spec, critical findings raise a
/// high-risk task; high findings raise a medium-risk one.
pub fn fix_tasks_from_findings(findings: &[FlowFinding], next_id: u32, now_ms: u64) -> Vec<Task> {
    findings
        .iter()
        .filter(|f| f.severity.is_high_or_critical())
        .enumerate()
        .map(|(offset, finding)| {
            let mut task =
                Task::new(TaskId::sequential(next_id + offset as u32), format!("Fix: {}", finding.title), TaskType::Security, now_ms);
            task.description = finding.description.clone();
            task.risk_level = if finding.severity == Severity::Critical { RiskLevel::High } else { RiskLevel::Medium };
            task.acceptance_criteria = vec!["the finding is resolved".to_string()];
            task
        })
        .collect()
}

/// Drives one project's cycle engine. Generic over `Clock` so tests can
/// drive it with a `FakeClock` the same way `BudgetMonitor` is.
pub struct CycleEngine<C: Clock> {
    paths: ProjectPaths,
    project_dir: PathBuf,
    config: WardenConfig,
    clock: C,
    reviewer: Arc<dyn ReviewerTool>,
    vcs: Arc<dyn VcsFacade>,
    budget: BudgetMonitor<C>,
    supervisor: WorkerSupervisor,
    sleeper: Arc<dyn Sleeper>,
}

impl<C: Clock> CycleEngine<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        paths: ProjectPaths,
        project_dir: impl Into<PathBuf>,
        config: WardenConfig,
        clock: C,
        reviewer: Arc<dyn ReviewerTool>,
        vcs: Arc<dyn VcsFacade>,
        budget: BudgetMonitor<C>,
        supervisor: WorkerSupervisor,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self { paths, project_dir: project_dir.into(), config, clock, reviewer, vcs, budget, supervisor, sleeper }
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    /// Step 1: Plan. Invokes the planning LLM, derives tasks, persists the
    /// plan text and the new task set. Returns the next task-sequence
    /// counter so the caller can thread it into later steps (fix tasks).
    pub async fn plan(&self, run: &mut RunState, prompt: &str) -> Result<u32, OrchestratorError> {
        run.status = RunStatus::Planning;
        run_state::save_run_state(&self.paths, run)?;

        let next_id = tasks::list_tasks(&self.paths)?.len() as u32 + 1;
        let now_ms = self.clock.epoch_ms();

        let output = planner::run_planning(self.reviewer.as_ref(), &self.project_dir, prompt, self.config.reviewer_timeout(), next_id, now_ms)
            .await?
            .ok_or(OrchestratorError::PlannerProducedNoTasks)?;

        for warning in &output.warnings {
            tracing::warn!(%warning, "planner dependency warning");
        }

        let plan_version = run.cycle_history.last().map(|r| r.plan_version).unwrap_or(0) + 1;
        std::fs::write(self.paths.plan_file(plan_version), &output.plan_text)?;

        for task in &output.tasks {
            tasks::create_task(&self.paths, task)?;
        }

        Ok(next_id + output.tasks.len() as u32)
    }

    /// Step 2: Execute. Resets orphans, starts workers plus a sentinel, then
    /// polls until drained, a budget wind-down, or a user-requested pause.
    pub async fn execute(&self, run: &mut RunState) -> Result<ExecuteOutcome, OrchestratorError> {
        run.status = RunStatus::Executing;
        run_state::save_run_state(&self.paths, run)?;

        self.supervisor.recover_orphans(&self.paths)?;
        let now_ms = self.clock.epoch_ms();
        let pending = self.pending_count()?;
        self.supervisor.spawn_up_to(&self.paths, self.config.concurrency.min(pending.max(1)), now_ms).await?;
        self.supervisor.spawn_sentinel(&self.paths, now_ms).await?;

        loop {
            self.sleeper.sleep(self.config.engine_poll_interval()).await;
            let now_ms = self.clock.epoch_ms();
            self.supervisor.reap_finished(&self.paths, now_ms).await?;

            let all_tasks = tasks::list_tasks(&self.paths)?;
            let pending = all_tasks.iter().filter(|t| t.status == TaskStatus::Pending).count();
            let in_progress = all_tasks.iter().filter(|t| t.status == TaskStatus::InProgress).count();
            if pending == 0 && in_progress == 0 {
                return Ok(ExecuteOutcome::Drained);
            }

            let report = self.budget.poll(&NoopBudgetCallback).await?;
            if self.budget.is_critical() {
                let resets_at = Some(report.five_hour.resets_at_ms.max(report.seven_day.resets_at_ms));
                self.supervisor.broadcast_wind_down(&self.paths, WindDownReason::UsageLimit, resets_at, now_ms)?;
                self.supervisor
                    .wait_for_drain(&self.paths, self.sleeper.as_ref(), self.config.orphan_grace(), self.config.engine_poll_interval(), now_ms)
                    .await?;
                return Ok(ExecuteOutcome::UsageLimitReached);
            }

            if self.paths.pause_signal_file().exists() {
                std::fs::remove_file(self.paths.pause_signal_file())?;
                self.supervisor.broadcast_wind_down(&self.paths, WindDownReason::UserRequested, None, now_ms)?;
                self.supervisor
                    .wait_for_drain(&self.paths, self.sleeper.as_ref(), self.config.orphan_grace(), self.config.engine_poll_interval(), now_ms)
                    .await?;
                return Ok(ExecuteOutcome::UserRequestedPause);
            }

            self.supervisor.recover_orphans(&self.paths)?;
            if pending > 0 {
                self.supervisor.spawn_up_to(&self.paths, self.config.concurrency, now_ms).await?;
            }
        }
    }

    fn pending_count(&self) -> Result<u32, OrchestratorError> {
        Ok(tasks::list_tasks(&self.paths)?.iter().filter(|t| t.status == TaskStatus::Pending).count() as u32)
    }

    /// Step 3: Review + Flow-Trace, run concurrently against the same
    /// base-commit diff. `build_code_review_prompt` and `build_trace_prompt`
    /// embed the diff/changed-file context the caller already gathered.
    pub async fn review_and_trace(
        &self,
        flows: Vec<Flow>,
        build_code_review_prompt: impl Fn(u32, Option<&warden_core::ReviewResult>) -> String,
        build_trace_prompt: impl Fn(&Flow) -> String,
    ) -> Result<(ReviewDialogueOutcome, Vec<FlowFinding>), OrchestratorError> {
        let reviewer = self.reviewer.clone();
        let project_dir = self.project_dir.clone();
        let timeout = self.config.reviewer_timeout();
        let max_rounds = self.config.reviewer_max_rounds;
        let parallelism = self.config.flow_trace_parallelism;

        let review_fut = reviewer_driver::run_review_dialogue(reviewer.as_ref(), &project_dir, timeout, max_rounds, build_code_review_prompt);
        let trace_fut = crate::flow_tracer::run_flow_tracing(reviewer.clone(), &project_dir, flows, timeout, parallelism, build_trace_prompt);

        let (review, findings) = tokio::try_join!(review_fut, trace_fut)?;
        Ok((review, findings))
    }

    /// Step 4's git side: best-effort checkpoint commit. A failure here is
    /// swallowed with a warning per the engine's propagation policy — only
    /// `RunState` persistence failures are fatal.
    pub async fn checkpoint_commit(&self, cycle_index: u32) -> Option<String> {
        match self.vcs.commit(&format!("warden: checkpoint cycle {cycle_index}")).await {
            Ok(sha) => Some(sha),
            Err(e) => {
                tracing::warn!(error = %e, "checkpoint commit failed");
                None
            }
        }
    }

    /// Step 5: Record cycle. Appends the tally and persists `RunState`.
    pub fn record_cycle(&self, run: &mut RunState, record: CycleRecord) -> Result<(), OrchestratorError> {
        run.record_cycle(record);
        run.updated_at_ms = self.clock.epoch_ms();
        run_state::save_run_state(&self.paths, run)?;
        Ok(())
    }

    /// Step 6: Fix tasks from findings, persisted as new pending tasks.
    pub fn create_fix_tasks(&self, findings: &[FlowFinding], next_id: u32) -> Result<Vec<Task>, OrchestratorError> {
        let now_ms = self.clock.epoch_ms();
        let fix_tasks = fix_tasks_from_findings(findings, next_id, now_ms);
        for task in &fix_tasks {
            tasks::create_task(&self.paths, task)?;
        }
        Ok(fix_tasks)
    }

    /// Step 6's companion: merge flow findings into the known-issue
    /// registry so unresolved findings feed the next replan regardless of
    /// whether a fix task for them landed this cycle.
    pub fn register_known_issues(&self, findings: &[FlowFinding], cycle_found: u32) -> Result<(), OrchestratorError> {
        let incoming: Vec<KnownIssue> =
            findings.iter().map(|f| KnownIssue::from_flow_finding(f, cycle_found, warden_core::KnownIssueId::new())).collect();
        known_issues::add_known_issues(&self.paths, incoming)?;
        Ok(())
    }

    pub fn unresolved_known_issues(&self) -> Result<Vec<KnownIssue>, OrchestratorError> {
        let registry = known_issues::load_known_issues(&self.paths)?;
        Ok(warden_core::unresolved(&registry).into_iter().cloned().collect())
    }

    /// Step 7: Escalation. Persists the escalation record; the caller (the
    /// CLI binary) decides whether to exit non-interactively or prompt.
    pub fn escalate(&self, run: &mut RunState, reason: impl Into<String>, details: impl Into<String>) -> Result<EscalationRecord, OrchestratorError> {
        let now_ms = self.clock.epoch_ms();
        let record = EscalationRecord::new(reason, details, now_ms);
        warden_store::atomic::write_json_atomic(&self.paths.escalation_file(), &record)?;
        run.status = RunStatus::Escalated;
        run.updated_at_ms = now_ms;
        run_state::save_run_state(&self.paths, run)?;
        Ok(record)
    }

    /// Step 4's `pause` path, persisting `RunState` with the right reason
    /// and resume-after timestamp.
    pub fn pause(&self, run: &mut RunState, reason: PauseReason, resume_after_ms: u64) -> Result<(), OrchestratorError> {
        let now_ms = self.clock.epoch_ms();
        run.pause(reason, resume_after_ms, now_ms);
        run_state::save_run_state(&self.paths, run)?;
        Ok(())
    }

    pub fn complete(&self, run: &mut RunState) -> Result<(), OrchestratorError> {
        run.status = RunStatus::Completed;
        run.updated_at_ms = self.clock.epoch_ms();
        run_state::save_run_state(&self.paths, run)?;
        Ok(())
    }

    /// Resume semantics: if any task is `pending` or `in_progress`, this
    /// cycle skips planning and goes straight to `execute`.
    pub fn should_skip_planning(&self) -> Result<bool, OrchestratorError> {
        let all_tasks = tasks::list_tasks(&self.paths)?;
        Ok(all_tasks.iter().any(|t| matches!(t.status, TaskStatus::Pending | TaskStatus::InProgress)))
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }
}

/// Rendered per round, embedding the base-commit diff and (from round 1
/// onward) the previous round's issues for the reviewer to re-check.
fn build_code_review_prompt(round: u32, previous: Option<&warden_core::ReviewResult>, diff: &str) -> String {
    let mut prompt = format!(
        "Review this diff against the feature's acceptance criteria and respond with a fenced ```json verdict block.\n\n{diff}"
    );
    if let Some(prev) = previous {
        prompt.push_str(&format!("\n\nRound {round}: address these prior findings:\n"));
        for issue in &prev.issues {
            prompt.push_str(&format!("- {}\n", issue.display_line()));
        }
    }
    prompt
}

fn build_trace_prompt(flow: &Flow, diff: &str) -> String {
    format!(
        "Trace the end-to-end flow \"{}\" ({}) through this diff and respond with a fenced ```json findings block.\n\n{diff}",
        flow.name, flow.description
    )
}

/// What a full cycle decided, returned to the caller (`warden-cli`'s run
/// loop) so it knows whether to keep looping, stop, or surface an
/// escalation.
#[derive(Debug)]
pub struct CycleOutcome {
    pub decision: CheckpointDecision,
    pub checkpoint_sha: Option<String>,
    pub escalation: Option<EscalationRecord>,
}

impl<C: Clock> CycleEngine<C> {
    /// Runs one full iteration of the top-level cycle (SPEC_FULL §4.8,
    /// steps 1-7) against `run`, mutating it and persisting every
    /// transition along the way. The caller's run loop just checks
    /// `decision` and either calls this again, exits, or surfaces
    /// `escalation`.
    pub async fn run_cycle(&self, run: &mut RunState, feature: &str, skip_flow_review: bool) -> Result<CycleOutcome, OrchestratorError> {
        let cycle_index = run.current_cycle + 1;
        let started_at_ms = self.clock.epoch_ms();

        let planned = !self.should_skip_planning()?;
        if planned {
            let known_issues = self.unresolved_known_issues()?;
            let mut prompt = format!(
                "Plan the feature \"{feature}\" for cycle {cycle_index}. Respond with a fenced ```json block: {{\"tasks\": [...]}}."
            );
            if !known_issues.is_empty() {
                prompt.push_str("\n\nUnresolved known issues to address:\n");
                for issue in &known_issues {
                    prompt.push_str(&format!("- {}\n", issue.description));
                }
            }
            self.plan(run, &prompt).await?;
        }

        let execute_outcome = self.execute(run).await?;

        let diff = self.vcs.diff_against(&run.base_commit).await.unwrap_or_default();
        let changed_files = self.vcs.changed_files(&run.base_commit).await.unwrap_or_default();

        let flows = if skip_flow_review {
            Vec::new()
        } else {
            let flow_prompt = format!(
                "Derive at most {} end-to-end user flows touched by this diff. Changed files: {changed_files:?}. Respond with a fenced ```json block: {{\"flows\": [...]}}.\n\n{diff}",
                self.config.max_flows_per_cycle
            );
            crate::flow_tracer::derive_flows(
                self.reviewer.as_ref(),
                &self.project_dir,
                &flow_prompt,
                self.config.reviewer_timeout(),
                self.config.max_flows_per_cycle,
            )
            .await
            .unwrap_or_default()
        };

        let review_diff = diff.clone();
        let trace_diff = diff.clone();
        let (review, findings) = self
            .review_and_trace(
                flows,
                move |round, previous| build_code_review_prompt(round, previous, &review_diff),
                move |flow| build_trace_prompt(flow, &trace_diff),
            )
            .await?;

        let fix_next_id = tasks::list_tasks(&self.paths)?.len() as u32 + 1;
        if !findings.is_empty() {
            self.create_fix_tasks(&findings, fix_next_id)?;
            self.register_known_issues(&findings, cycle_index)?;
        }

        let checkpoint_sha = self.checkpoint_commit(cycle_index).await;

        let all_tasks = tasks::list_tasks(&self.paths)?;
        let remaining = all_tasks.iter().filter(|t| matches!(t.status, TaskStatus::Pending | TaskStatus::InProgress)).count() as u32;
        let failed = all_tasks.iter().filter(|t| t.status == TaskStatus::Failed).count() as u32;
        let completed = all_tasks.iter().filter(|t| t.status == TaskStatus::Completed).count() as u32;

        let user_pause = matches!(execute_outcome, ExecuteOutcome::UserRequestedPause);
        let budget_pause = matches!(execute_outcome, ExecuteOutcome::UsageLimitReached);
        let has_critical_or_high = findings.iter().any(|f| f.severity.is_high_or_critical());

        let decision = decide_checkpoint(
            user_pause,
            budget_pause,
            has_critical_or_high,
            review.final_result.outcome.is_approved(),
            remaining,
            failed,
            cycle_index + 1,
            run.cycle_cap,
        );

        let plan_version = run.cycle_history.last().map(|r| r.plan_version).unwrap_or(0) + u32::from(planned);
        let record = CycleRecord {
            index: cycle_index,
            plan_version,
            tasks_completed: completed,
            tasks_failed: failed,
            plan_approved: true,
            code_approved: review.final_result.outcome.is_approved(),
            plan_rounds: 0,
            code_rounds: review.rounds,
            started_at_ms,
            ended_at_ms: self.clock.epoch_ms(),
            flow_summary: if findings.is_empty() { None } else { Some(flow_summary_from_findings(&findings)) },
        };
        self.record_cycle(run, record)?;

        let mut escalation = None;
        match decision {
            CheckpointDecision::Pause => {
                let reason = if user_pause {
                    PauseReason::UserRequested
                } else {
                    PauseReason::UsageLimit
                };
                let resume_after_ms = self.clock.epoch_ms() + if budget_pause { 5 * 60 * 60 * 1000 } else { 0 };
                self.pause(run, reason, resume_after_ms)?;
            }
            CheckpointDecision::Complete => {
                self.complete(run)?;
            }
            CheckpointDecision::Escalate => {
                escalation = Some(self.escalate(run, "cycle cap reached", format!("{} cycles without completion", run.cycle_cap))?);
            }
            CheckpointDecision::Continue => {}
        }

        Ok(CycleOutcome { decision, checkpoint_sha, escalation })
    }
}

pub fn flow_summary_from_findings(findings: &[FlowFinding]) -> FlowSummary {
    let mut counts: std::collections::HashMap<Severity, u32> = std::collections::HashMap::new();
    let mut cross_boundary_count = 0;
    for finding in findings {
        *counts.entry(finding.severity).or_insert(0) += 1;
        if finding.cross_boundary {
            cross_boundary_count += 1;
        }
    }
    FlowSummary::from_counts(&counts, cross_boundary_count)
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
