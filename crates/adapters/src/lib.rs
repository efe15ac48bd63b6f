// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! warden-adapters: every external collaborator the cycle engine depends on,
//! each behind a trait with a real implementation and a fake for tests —
//! the reviewer CLI, semgrep, the usage endpoint, git, and worker
//! subprocesses.

pub mod error;
pub mod reviewer;
pub mod static_analysis;
pub mod usage;
pub mod vcs;
pub mod worker;

pub use error::AdapterError;
pub use reviewer::{parse_review_json, CliReviewerTool, ReviewerRun, ReviewerTool};
pub use static_analysis::{parse_semgrep_json, SemgrepTool, StaticAnalysisTool, StaticFinding};
pub use usage::{HttpUsageEndpoint, UsageEndpoint, UsageReport, UsageWindow};
pub use vcs::{GitVcsFacade, VcsFacade};
pub use worker::{
    CommandWorkerProcess, WorkerHandle, WorkerProcess, WorkerSpawnSpec, ENV_COORDINATION_ADDR,
    ENV_PROJECT_DIR, ENV_SESSION_ID,
};

#[cfg(any(test, feature = "test-support"))]
pub use reviewer::{FakeReviewerTool, ReviewerCall};
#[cfg(any(test, feature = "test-support"))]
pub use static_analysis::FakeStaticAnalysisTool;
#[cfg(any(test, feature = "test-support"))]
pub use usage::FakeUsageEndpoint;
#[cfg(any(test, feature = "test-support"))]
pub use vcs::FakeVcsFacade;
#[cfg(any(test, feature = "test-support"))]
pub use worker::{FakeWorkerHandle, FakeWorkerProcess};
