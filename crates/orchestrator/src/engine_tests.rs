// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use warden_adapters::{FakeReviewerTool, FakeUsageEndpoint, FakeVcsFacade, FakeWorkerProcess, ReviewerRun, UsageWindow};
use warden_core::{FakeClock, TaskId};
use warden_store::ProjectPaths;

struct InstantSleeper;

#[async_trait::async_trait]
impl crate::budget::Sleeper for InstantSleeper {
    async fn sleep(&self, _duration: std::time::Duration) {}
}

fn paths() -> (tempfile::TempDir, ProjectPaths) {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = ProjectPaths::new(dir.path());
    for d in paths.all_dirs() {
        std::fs::create_dir_all(d).expect("create dir");
    }
    (dir, paths)
}

fn thresholds() -> crate::budget::BudgetThresholds {
    crate::budget::BudgetThresholds { wind_down: 0.80, critical: 0.90, resume: 0.50 }
}

fn engine(paths: &ProjectPaths, usage: FakeUsageEndpoint, reviewer: FakeReviewerTool, vcs: FakeVcsFacade) -> CycleEngine<FakeClock> {
    let budget = crate::budget::BudgetMonitor::new(std::sync::Arc::new(usage), FakeClock::new(), std::sync::Arc::new(InstantSleeper), thresholds());
    let supervisor = WorkerSupervisor::new(std::sync::Arc::new(FakeWorkerProcess::new()), "/tmp/project", "127.0.0.1:9999");
    let mut config = WardenConfig::default();
    config.engine_poll_secs = 0;
    config.orphan_grace_secs = 0;
    CycleEngine::new(
        paths.clone(),
        "/tmp/project",
        config,
        FakeClock::new(),
        std::sync::Arc::new(reviewer),
        std::sync::Arc::new(vcs),
        budget,
        supervisor,
        std::sync::Arc::new(InstantSleeper),
    )
}

fn run_state() -> RunState {
    RunState::new("demo feature", "warden/demo", "0".repeat(40), 10, 4, 0)
}

#[test]
fn decide_checkpoint_pause_wins_over_everything() {
    let decision = decide_checkpoint(true, true, true, false, 5, 5, 20, 10);
    assert_eq!(decision, CheckpointDecision::Pause);
}

#[test]
fn decide_checkpoint_critical_findings_continue_even_when_approved_and_drained() {
    let decision = decide_checkpoint(false, false, true, true, 0, 0, 1, 10);
    assert_eq!(decision, CheckpointDecision::Continue);
}

#[test]
fn decide_checkpoint_unapproved_review_continues() {
    let decision = decide_checkpoint(false, false, false, false, 0, 0, 1, 10);
    assert_eq!(decision, CheckpointDecision::Continue);
}

#[test]
fn decide_checkpoint_drained_and_approved_completes() {
    let decision = decide_checkpoint(false, false, false, true, 0, 0, 1, 10);
    assert_eq!(decision, CheckpointDecision::Complete);
}

#[test]
fn decide_checkpoint_cap_reached_escalates() {
    let decision = decide_checkpoint(false, false, false, true, 1, 0, 10, 10);
    assert_eq!(decision, CheckpointDecision::Escalate);
}

#[test]
fn decide_checkpoint_remaining_work_below_cap_continues() {
    let decision = decide_checkpoint(false, false, false, true, 1, 0, 5, 10);
    assert_eq!(decision, CheckpointDecision::Continue);
}

#[test]
fn fix_tasks_from_findings_skips_low_and_medium_severity() {
    let findings = vec![
        finding(Severity::Low),
        finding(Severity::Medium),
        finding(Severity::High),
        finding(Severity::Critical),
    ];
    let tasks = fix_tasks_from_findings(&findings, 1, 100);
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].risk_level, RiskLevel::Medium);
    assert_eq!(tasks[1].risk_level, RiskLevel::High);
    assert_eq!(tasks[0].task_type, TaskType::Security);
}

fn finding(severity: Severity) -> FlowFinding {
    FlowFinding {
        severity,
        actor: "user".to_string(),
        title: format!("{severity} finding"),
        description: "d".to_string(),
        file_path: "a.rs".to_string(),
        line: None,
        cross_boundary: severity == Severity::Critical,
        edge_case: None,
        flow_id: warden_core::FlowId::new("flow"),
    }
}

#[test]
fn flow_summary_counts_by_severity_and_cross_boundary() {
    let findings = vec![finding(Severity::High), finding(Severity::Critical), finding(Severity::Critical)];
    let summary = flow_summary_from_findings(&findings);
    assert_eq!(summary.findings_by_severity["critical"], 2);
    assert_eq!(summary.findings_by_severity["high"], 1);
    assert_eq!(summary.cross_boundary_count, 2);
}

#[tokio::test]
async fn plan_persists_tasks_and_plan_text() {
    let (_dir, paths) = paths();
    let reviewer = FakeReviewerTool::new();
    reviewer.push_response(ReviewerRun {
        stdout: "```json\n{\"tasks\":[{\"subject\":\"add endpoint\"}]}\n```".to_string(),
        stderr: String::new(),
        exit_code: Some(0),
        timed_out: false,
    });
    let engine = engine(&paths, FakeUsageEndpoint::new(), reviewer, FakeVcsFacade::new());
    let mut run = run_state();

    let next_id = engine.plan(&mut run, "plan the feature").await.unwrap();

    assert_eq!(next_id, 2);
    let tasks = warden_store::tasks::list_tasks(&paths).unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, TaskId::sequential(1));
    assert!(paths.plan_file(1).exists());
}

#[tokio::test]
async fn plan_with_no_task_block_is_fatal() {
    let (_dir, paths) = paths();
    let reviewer = FakeReviewerTool::new();
    reviewer.push_response(ReviewerRun { stdout: "no plan".to_string(), stderr: String::new(), exit_code: Some(0), timed_out: false });
    let engine = engine(&paths, FakeUsageEndpoint::new(), reviewer, FakeVcsFacade::new());
    let mut run = run_state();

    let err = engine.plan(&mut run, "plan the feature").await.unwrap_err();
    assert!(matches!(err, OrchestratorError::PlannerProducedNoTasks));
}

#[tokio::test]
async fn execute_drains_immediately_with_no_tasks() {
    let (_dir, paths) = paths();
    let engine = engine(&paths, FakeUsageEndpoint::new(), FakeReviewerTool::new(), FakeVcsFacade::new());
    let mut run = run_state();

    let outcome = engine.execute(&mut run).await.unwrap();
    assert_eq!(outcome, ExecuteOutcome::Drained);
}

#[tokio::test]
async fn execute_winds_down_when_budget_critical() {
    let (_dir, paths) = paths();
    let task = Task::test_fixture(1);
    warden_store::tasks::create_task(&paths, &task).unwrap();

    let usage = FakeUsageEndpoint::new();
    usage.set_report(UsageReport {
        five_hour: UsageWindow { utilization: 0.95, resets_at_ms: 999 },
        seven_day: UsageWindow { utilization: 0.1, resets_at_ms: 0 },
    });
    let engine = engine(&paths, usage, FakeReviewerTool::new(), FakeVcsFacade::new());
    let mut run = run_state();

    let outcome = engine.execute(&mut run).await.unwrap();
    assert_eq!(outcome, ExecuteOutcome::UsageLimitReached);
}

#[tokio::test]
async fn execute_detects_user_requested_pause_signal() {
    let (_dir, paths) = paths();
    let task = Task::test_fixture(1);
    warden_store::tasks::create_task(&paths, &task).unwrap();
    std::fs::write(paths.pause_signal_file(), "").unwrap();

    let engine = engine(&paths, FakeUsageEndpoint::new(), FakeReviewerTool::new(), FakeVcsFacade::new());
    let mut run = run_state();

    let outcome = engine.execute(&mut run).await.unwrap();
    assert_eq!(outcome, ExecuteOutcome::UserRequestedPause);
    assert!(!paths.pause_signal_file().exists());
}

#[tokio::test]
async fn checkpoint_commit_swallows_vcs_failures() {
    let (_dir, paths) = paths();
    let engine = engine(&paths, FakeUsageEndpoint::new(), FakeReviewerTool::new(), FakeVcsFacade::new());
    let sha = engine.checkpoint_commit(1).await;
    assert!(sha.is_some());
}

#[test]
fn escalate_persists_record_and_marks_run_escalated() {
    let (_dir, paths) = paths();
    let engine = engine(&paths, FakeUsageEndpoint::new(), FakeReviewerTool::new(), FakeVcsFacade::new());
    let mut run = run_state();

    let record = engine.escalate(&mut run, "cycle cap reached", "20 cycles without completion").unwrap();
    assert_eq!(record.options.len(), 3);
    assert_eq!(run.status, RunStatus::Escalated);
    assert!(paths.escalation_file().exists());
}

#[test]
fn should_skip_planning_true_when_tasks_pending() {
    let (_dir, paths) = paths();
    warden_store::tasks::create_task(&paths, &Task::test_fixture(1)).unwrap();
    let engine = engine(&paths, FakeUsageEndpoint::new(), FakeReviewerTool::new(), FakeVcsFacade::new());
    assert!(engine.should_skip_planning().unwrap());
}

#[test]
fn should_skip_planning_false_when_no_tasks() {
    let (_dir, paths) = paths();
    let engine = engine(&paths, FakeUsageEndpoint::new(), FakeReviewerTool::new(), FakeVcsFacade::new());
    assert!(!engine.should_skip_planning().unwrap());
}

#[test]
fn register_and_query_unresolved_known_issues() {
    let (_dir, paths) = paths();
    let engine = engine(&paths, FakeUsageEndpoint::new(), FakeReviewerTool::new(), FakeVcsFacade::new());
    let findings = vec![finding(Severity::High)];

    engine.register_known_issues(&findings, 1).unwrap();
    let unresolved = engine.unresolved_known_issues().unwrap();
    assert_eq!(unresolved.len(), 1);
}

fn approve_run() -> ReviewerRun {
    ReviewerRun {
        stdout: "```json\n{\"review_performed\":true,\"verdict\":\"APPROVE\",\"issues\":[],\"summary\":\"ok\"}\n```".to_string(),
        stderr: String::new(),
        exit_code: Some(0),
        timed_out: false,
    }
}

fn empty_plan_run() -> ReviewerRun {
    ReviewerRun { stdout: "```json\n{\"tasks\":[]}\n```".to_string(), stderr: String::new(), exit_code: Some(0), timed_out: false }
}

#[tokio::test]
async fn run_cycle_completes_when_drained_and_approved() {
    let (_dir, paths) = paths();
    let reviewer = FakeReviewerTool::new();
    reviewer.push_response(empty_plan_run());
    reviewer.push_response(approve_run());
    let engine = engine(&paths, FakeUsageEndpoint::new(), reviewer, FakeVcsFacade::new());
    let mut run = run_state();

    let outcome = engine.run_cycle(&mut run, "demo feature", true).await.unwrap();

    assert_eq!(outcome.decision, CheckpointDecision::Complete);
    assert!(outcome.checkpoint_sha.is_some());
    assert!(outcome.escalation.is_none());
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.cycle_history.len(), 1);
}

#[tokio::test]
async fn run_cycle_continues_when_review_escalates_without_approval() {
    let (_dir, paths) = paths();
    let reviewer = FakeReviewerTool::new();
    reviewer.push_response(empty_plan_run());
    for _ in 0..2 {
        reviewer.push_response(ReviewerRun {
            stdout: "```json\n{\"review_performed\":true,\"verdict\":\"NEEDS_FIXES\",\"issues\":[{\"description\":\"missing validation\",\"severity\":\"major\"}],\"summary\":\"x\"}\n```"
                .to_string(),
            stderr: String::new(),
            exit_code: Some(0),
            timed_out: false,
        });
    }
    let engine = engine(&paths, FakeUsageEndpoint::new(), reviewer, FakeVcsFacade::new());
    let mut run = run_state();

    let outcome = engine.run_cycle(&mut run, "demo feature", true).await.unwrap();

    assert_eq!(outcome.decision, CheckpointDecision::Continue);
    assert_eq!(run.status, RunStatus::Executing);
}

#[tokio::test]
async fn run_cycle_escalates_when_cycle_cap_reached_with_failed_work_remaining() {
    let (_dir, paths) = paths();
    let mut failed = Task::test_fixture(1);
    failed.status = TaskStatus::Failed;
    warden_store::tasks::create_task(&paths, &failed).unwrap();

    let reviewer = FakeReviewerTool::new();
    reviewer.push_response(empty_plan_run());
    reviewer.push_response(approve_run());
    let engine = engine(&paths, FakeUsageEndpoint::new(), reviewer, FakeVcsFacade::new());
    let mut run = RunState::new("demo feature", "warden/demo", "0".repeat(40), 1, 4, 0);

    let outcome = engine.run_cycle(&mut run, "demo feature", true).await.unwrap();

    assert_eq!(outcome.decision, CheckpointDecision::Escalate);
    assert!(outcome.escalation.is_some());
    assert_eq!(run.status, RunStatus::Escalated);
    assert!(paths.escalation_file().exists());
}
