// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The deduplicated, cross-cycle registry of findings that feeds replanning.

use serde::{Deserialize, Serialize};

use crate::flow::{FlowFinding, Severity};

crate::define_id! {
    /// Randomly minted known-issue identifier.
    pub struct KnownIssueId("iss-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSource {
    CodexReview,
    FlowTracing,
    Semgrep,
    IncrementalReview,
    Sentinel,
}

crate::simple_display! {
    IssueSource {
        CodexReview => "codex_review",
        FlowTracing => "flow_tracing",
        Semgrep => "semgrep",
        IncrementalReview => "incremental_review",
        Sentinel => "sentinel",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownIssue {
    pub id: KnownIssueId,
    pub description: String,
    pub severity: Severity,
    pub source: IssueSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    pub cycle_found: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_addressed: Option<u32>,
    #[serde(default)]
    pub addressed: bool,
}

impl KnownIssue {
    /// Dedup key: file path (if any) plus the lowercased first 80 characters
    /// of the description.
    pub fn dedup_key(&self) -> String {
        let prefix: String = self.description.to_lowercase().chars().take(80).collect();
        match &self.file_path {
            Some(path) => format!("{path}::{prefix}"),
            None => prefix,
        }
    }

    pub fn from_flow_finding(finding: &FlowFinding, cycle_found: u32, now_id: KnownIssueId) -> Self {
        Self {
            id: now_id,
            description: finding.title.clone(),
            severity: finding.severity,
            source: IssueSource::FlowTracing,
            file_path: Some(finding.file_path.clone()),
            cycle_found,
            cycle_addressed: None,
            addressed: false,
        }
    }

    pub fn mark_addressed(&mut self, cycle: u32) {
        self.addressed = true;
        self.cycle_addressed = Some(cycle);
    }
}

/// Append `incoming` issues to `registry`, skipping any whose dedup key
/// already exists. Running this twice with the same `incoming` is a no-op
/// the second time.
pub fn add_known_issues(registry: &mut Vec<KnownIssue>, incoming: Vec<KnownIssue>) {
    let mut seen: std::collections::HashSet<String> =
        registry.iter().map(KnownIssue::dedup_key).collect();
    for issue in incoming {
        let key = issue.dedup_key();
        if seen.insert(key) {
            registry.push(issue);
        }
    }
}

pub fn mark_addressed(registry: &mut [KnownIssue], ids: &[KnownIssueId], cycle: u32) {
    for issue in registry.iter_mut() {
        if ids.contains(&issue.id) {
            issue.mark_addressed(cycle);
        }
    }
}

pub fn unresolved(registry: &[KnownIssue]) -> Vec<&KnownIssue> {
    registry.iter().filter(|issue| !issue.addressed).collect()
}

#[cfg(test)]
#[path = "known_issue_tests.rs"]
mod tests;

#[cfg(all(test, feature = "test-support"))]
#[path = "known_issue_proptest.rs"]
mod proptests;
