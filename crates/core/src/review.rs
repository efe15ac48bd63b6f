// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The reviewer's verdict vocabulary, shared between the adapter that calls
//! the external reviewer tool and the orchestrator that acts on the result.

use serde::{Deserialize, Serialize};

/// Verdicts the external reviewer tool itself can hand back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Approve,
    NeedsDiscussion,
    MajorConcerns,
    NeedsFixes,
    MajorProblems,
}

crate::simple_display! {
    Verdict {
        Approve => "APPROVE",
        NeedsDiscussion => "NEEDS_DISCUSSION",
        MajorConcerns => "MAJOR_CONCERNS",
        NeedsFixes => "NEEDS_FIXES",
        MajorProblems => "MAJOR_PROBLEMS",
    }
}

impl Verdict {
    pub fn is_approved(self) -> bool {
        matches!(self, Verdict::Approve)
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim() {
            "APPROVE" => Some(Verdict::Approve),
            "NEEDS_DISCUSSION" => Some(Verdict::NeedsDiscussion),
            "MAJOR_CONCERNS" => Some(Verdict::MajorConcerns),
            "NEEDS_FIXES" => Some(Verdict::NeedsFixes),
            "MAJOR_PROBLEMS" => Some(Verdict::MajorProblems),
            _ => None,
        }
    }
}

/// The outcome of one logical review (up to two attempts), including the
/// two internal outcomes the driver itself produces rather than the
/// reviewer: `NoVerdict` (ran, unparseable) and `RateLimited` (persistent
/// execution failure). `Error` means two attempts both produced
/// unparseable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewOutcome {
    Verdict(Verdict),
    NoVerdict,
    RateLimited,
    Error,
}

impl std::fmt::Display for ReviewOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewOutcome::Verdict(v) => write!(f, "{v}"),
            ReviewOutcome::NoVerdict => f.write_str("NO_VERDICT"),
            ReviewOutcome::RateLimited => f.write_str("RATE_LIMITED"),
            ReviewOutcome::Error => f.write_str("ERROR"),
        }
    }
}

impl ReviewOutcome {
    pub fn is_approved(self) -> bool {
        matches!(self, ReviewOutcome::Verdict(Verdict::Approve))
    }

    pub fn verdict(self) -> Option<Verdict> {
        match self {
            ReviewOutcome::Verdict(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Minor,
    Major,
    Critical,
    Unknown,
}

crate::simple_display! {
    IssueSeverity {
        Minor => "minor",
        Major => "major",
        Critical => "critical",
        Unknown => "unknown",
    }
}

impl IssueSeverity {
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "minor" => IssueSeverity::Minor,
            "major" => IssueSeverity::Major,
            "critical" => IssueSeverity::Critical,
            _ => IssueSeverity::Unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewIssue {
    pub description: String,
    pub severity: IssueSeverity,
}

impl ReviewIssue {
    /// `"[<severity>] <description>"`, the presentation form handed to the
    /// investigator between dialogue rounds.
    pub fn display_line(&self) -> String {
        format!("[{}] {}", self.severity, self.description)
    }

    /// Recurrence key: first 80 characters of the description, used to
    /// detect the same issue coming back across rounds.
    pub fn recurrence_key(&self) -> String {
        self.description.chars().take(80).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewResult {
    pub review_performed: bool,
    pub outcome: ReviewOutcome,
    pub issues: Vec<ReviewIssue>,
    pub summary: String,
}

/// The reviewer CLI's actual reply shape: a flat `verdict` string rather
/// than the `outcome` enum's internal tagging. Bridged into [`ReviewResult`]
/// by hand below since `#[derive(Deserialize)]` can't express "unknown or
/// missing `verdict` string means `NoVerdict`".
#[derive(Deserialize)]
struct RawReviewResult {
    review_performed: bool,
    verdict: Option<String>,
    #[serde(default)]
    issues: Vec<ReviewIssue>,
    #[serde(default)]
    summary: String,
}

impl<'de> Deserialize<'de> for ReviewResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawReviewResult::deserialize(deserializer)?;
        let outcome = match raw.verdict.as_deref().and_then(Verdict::from_str_loose) {
            Some(v) => ReviewOutcome::Verdict(v),
            None => ReviewOutcome::NoVerdict,
        };
        Ok(ReviewResult { review_performed: raw.review_performed, outcome, issues: raw.issues, summary: raw.summary })
    }
}

impl ReviewResult {
    pub fn no_verdict() -> Self {
        Self { review_performed: false, outcome: ReviewOutcome::NoVerdict, issues: Vec::new(), summary: String::new() }
    }

    pub fn rate_limited() -> Self {
        Self { review_performed: false, outcome: ReviewOutcome::RateLimited, issues: Vec::new(), summary: String::new() }
    }

    pub fn error() -> Self {
        Self { review_performed: false, outcome: ReviewOutcome::Error, issues: Vec::new(), summary: String::new() }
    }
}

#[cfg(test)]
#[path = "review_tests.rs"]
mod tests;
