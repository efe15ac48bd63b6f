// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end flows and the findings traced through them.

use serde::{Deserialize, Serialize};

/// Findings and known issues share one severity scale; order matches rank,
/// not declaration order, so `max`/`sort` behave (critical is "greatest").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

crate::simple_display! {
    Severity {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

impl Severity {
    fn rank(self) -> u8 {
        match self {
            Severity::Low => 0,
            Severity::Medium => 1,
            Severity::High => 2,
            Severity::Critical => 3,
        }
    }

    pub fn is_high_or_critical(self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

/// A stable, slug-style identifier for a derived end-to-end flow
/// (`user-signup`, `checkout-payment`, ...), not randomly generated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(pub String);

impl FlowId {
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FlowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One end-to-end flow derived from a diff, traced by a single read-only
/// subtask.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    pub id: FlowId,
    pub name: String,
    pub description: String,
    pub entry_points: Vec<String>,
    pub actors: Vec<String>,
    pub edge_cases: Vec<String>,
}

/// A single observation surfaced while tracing a flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowFinding {
    pub severity: Severity,
    pub actor: String,
    pub title: String,
    pub description: String,
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub cross_boundary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_case: Option<String>,
    pub flow_id: FlowId,
}

impl FlowFinding {
    /// Dedup key: file path plus the lowercased first 60 characters of the
    /// title. Colliding findings keep whichever has the higher severity.
    pub fn dedup_key(&self) -> String {
        let prefix: String = self.title.to_lowercase().chars().take(60).collect();
        format!("{}::{}", self.file_path, prefix)
    }
}

/// Deduplicate findings by [`FlowFinding::dedup_key`], retaining the
/// higher-severity finding on collision. Preserves first-seen order among
/// surviving keys.
pub fn dedup_findings(findings: Vec<FlowFinding>) -> Vec<FlowFinding> {
    let mut order: Vec<String> = Vec::new();
    let mut by_key: std::collections::HashMap<String, FlowFinding> = std::collections::HashMap::new();

    for finding in findings {
        let key = finding.dedup_key();
        match by_key.get(&key) {
            Some(existing) if existing.severity >= finding.severity => {}
            Some(_) => {
                by_key.insert(key, finding);
            }
            None => {
                order.push(key.clone());
                by_key.insert(key, finding);
            }
        }
    }

    order.into_iter().filter_map(|key| by_key.remove(&key)).collect()
}

#[cfg(test)]
#[path = "flow_tests.rs"]
mod tests;
