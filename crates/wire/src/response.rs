// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Responses returned by the coordination service for each `Request` verb.

use serde::{Deserialize, Serialize};
use warden_core::{ArchitecturalDecision, Contract, Message, SessionStatus, Task};

use crate::types::{DependencySummary, RequestErrorKind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    Tasks {
        tasks: Vec<Task>,
    },
    TaskClaimed {
        task: Box<Task>,
        dependency_context: Vec<DependencySummary>,
        in_progress: Vec<String>,
        contracts: Vec<Contract>,
        decisions: Vec<ArchitecturalDecision>,
        #[serde(default)]
        warnings: Vec<String>,
    },
    TaskCompleted {
        task: Box<Task>,
    },
    Updates {
        messages: Vec<Message>,
    },
    UpdatePosted {
        message: Box<Message>,
    },
    SessionStatus {
        status: Option<Box<SessionStatus>>,
    },
    ContractRegistered {
        contract: Box<Contract>,
    },
    Contracts {
        contracts: Vec<Contract>,
    },
    DecisionRecorded {
        decision: Box<ArchitecturalDecision>,
    },
    Decisions {
        decisions: Vec<ArchitecturalDecision>,
    },
    TestRun {
        passed: bool,
        /// Combined stdout/stderr, truncated to the last 5000 characters.
        output_tail: String,
    },
    Error {
        error: RequestErrorKind,
        message: String,
    },
}

impl Response {
    /// Truncate `output` to its last 5000 characters for a `TestRun`
    /// response, so a noisy test run can't blow up the wire payload.
    pub fn test_run(passed: bool, output: &str) -> Self {
        let tail: String = output.chars().rev().take(5000).collect::<Vec<_>>().into_iter().rev().collect();
        Self::TestRun { passed, output_tail: tail }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
