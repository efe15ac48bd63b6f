// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The control plane driving a project's autonomous plan/execute/review/
//! checkpoint cycles: a Coordination Service workers talk to, a Budget
//! Monitor and Reviewer Driver and Flow Tracer it calls into, and the Cycle
//! Engine state machine that ties them together.

pub mod budget;
pub mod config;
pub mod coordination;
pub mod engine;
pub mod error;
pub mod flow_tracer;
pub mod listener;
pub mod planner;
pub mod reviewer_driver;
pub mod supervisor;
pub mod test_runner;

pub use budget::{BudgetCallback, BudgetMonitor, BudgetThresholds, Sleeper, TokioSleeper};
pub use config::{PartialWardenConfig, WardenConfig};
pub use engine::{
    decide_checkpoint, fix_tasks_from_findings, flow_summary_from_findings, CheckpointDecision, CycleEngine,
    CycleOutcome, EscalationOption, EscalationRecord, ExecuteOutcome, ESCALATION_EXIT_CODE,
};
pub use error::OrchestratorError;
pub use flow_tracer::{derive_flows, run_flow_tracing};
pub use listener::{BoundListener, CoordinationListener};
pub use planner::{run_planning, PlanOutput};
pub use reviewer_driver::{run_review, run_review_dialogue, ReviewDialogueOutcome};
pub use supervisor::{WindDownReason, WorkerSupervisor};
