// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The coordination service's verb set, carried as one request per
//! connection alongside the calling session's id.

use warden_core::{ContractType, DecisionCategory, MessageType, TaskId, TaskStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "verb")]
pub enum Request {
    ListTasks {
        #[serde(default)]
        status: Option<TaskStatus>,
    },
    ClaimTask {
        task_id: TaskId,
    },
    CompleteTask {
        task_id: TaskId,
        summary: String,
        files_changed: Vec<String>,
    },
    ReadUpdates {
        #[serde(default)]
        since_ms: u64,
    },
    PostUpdate {
        message_type: MessageType,
        content: String,
        #[serde(default)]
        to: Option<String>,
    },
    GetSessionStatus {
        session_id: String,
    },
    RegisterContract {
        id: String,
        contract_type: ContractType,
        specification: String,
    },
    GetContracts {
        #[serde(default)]
        contract_type: Option<ContractType>,
        #[serde(default)]
        id_substring: Option<String>,
    },
    RecordDecision {
        category: DecisionCategory,
        decision: String,
        rationale: String,
        #[serde(default)]
        originating_task: Option<String>,
    },
    GetDecisions {
        #[serde(default)]
        category: Option<DecisionCategory>,
    },
    RunTests {
        #[serde(default)]
        files: Vec<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
