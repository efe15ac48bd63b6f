// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only architectural decisions recorded by workers for cross-worker
//! consistency.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Randomly minted decision identifier.
    pub struct DecisionId("dec-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionCategory {
    Naming,
    Auth,
    DataModel,
    ErrorHandling,
    ApiDesign,
    Testing,
    Performance,
    Other,
}

crate::simple_display! {
    DecisionCategory {
        Naming => "naming",
        Auth => "auth",
        DataModel => "data_model",
        ErrorHandling => "error_handling",
        ApiDesign => "api_design",
        Testing => "testing",
        Performance => "performance",
        Other => "other",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchitecturalDecision {
    pub id: DecisionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub originating_task: Option<String>,
    pub session_id: String,
    pub category: DecisionCategory,
    pub decision: String,
    pub rationale: String,
    pub timestamp_ms: u64,
}

#[cfg(test)]
#[path = "decision_tests.rs"]
mod tests;
