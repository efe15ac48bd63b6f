// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drives one logical review (two attempts against the reviewer CLI) and,
//! on top of that, a full plan/code review dialogue across multiple rounds
//! with per-issue recurrence escalation.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use warden_adapters::{parse_review_json, AdapterError, ReviewerTool};
use warden_core::{ReviewIssue, ReviewOutcome, ReviewResult};

/// Run one logical review: up to two attempts against the reviewer CLI.
/// A real verdict on either attempt returns immediately. A tool-not-found
/// error is never retried and propagates as `Err`. Otherwise, a second
/// consecutive failure is classified as `RateLimited` (execution failure —
/// crash, timeout, or empty output) or `Error` (ran but produced output
/// that doesn't parse).
pub async fn run_review(
    tool: &dyn ReviewerTool,
    project_dir: &Path,
    prompt: &str,
    timeout: Duration,
) -> Result<ReviewResult, AdapterError> {
    for attempt in 0..2 {
        let run = tool.run(project_dir, prompt, timeout).await?;
        if let Some(result) = parse_review_json(&run.stdout) {
            return Ok(result);
        }
        if attempt == 1 {
            let execution_failed = run.timed_out || run.exit_code != Some(0) || run.stdout.trim().is_empty();
            return Ok(if execution_failed { ReviewResult::rate_limited() } else { ReviewResult::error() });
        }
    }
    Ok(ReviewResult::no_verdict())
}

#[derive(Debug, Clone)]
pub struct ReviewDialogueOutcome {
    pub rounds: u32,
    pub final_result: ReviewResult,
    /// Recurrence keys (first 80 chars of description) that came back twice
    /// and forced the dialogue to stop before a verdict was reached.
    pub escalated_issues: Vec<String>,
}

/// Run a plan/code review dialogue for up to `max_rounds`, re-invoking the
/// reviewer with investigator feedback each round a prior attempt raised
/// issues. `build_prompt` receives the round number and the previous
/// round's result (`None` on round 0) and returns the prompt to send.
/// Stops early, with `escalated_issues` non-empty, the moment any issue's
/// recurrence key has appeared in two consecutive rounds' issue lists.
pub async fn run_review_dialogue(
    tool: &dyn ReviewerTool,
    project_dir: &Path,
    timeout: Duration,
    max_rounds: u32,
    build_prompt: impl Fn(u32, Option<&ReviewResult>) -> String,
) -> Result<ReviewDialogueOutcome, AdapterError> {
    let mut recurrence: HashMap<String, u32> = HashMap::new();
    let mut previous: Option<ReviewResult> = None;

    for round in 0..max_rounds {
        let prompt = build_prompt(round, previous.as_ref());
        let result = run_review(tool, project_dir, &prompt, timeout).await?;

        if result.outcome.is_approved() || matches!(result.outcome, ReviewOutcome::RateLimited) {
            return Ok(ReviewDialogueOutcome { rounds: round + 1, final_result: result, escalated_issues: Vec::new() });
        }

        let escalated = recurring_issues(&result.issues, &mut recurrence);
        if !escalated.is_empty() {
            return Ok(ReviewDialogueOutcome { rounds: round + 1, final_result: result, escalated_issues: escalated });
        }

        previous = Some(result);
    }

    Ok(ReviewDialogueOutcome {
        rounds: max_rounds,
        final_result: previous.unwrap_or_else(ReviewResult::no_verdict),
        escalated_issues: Vec::new(),
    })
}

/// Bump each issue's recurrence count and return the keys that have now
/// been seen twice — the escalation trigger.
fn recurring_issues(issues: &[ReviewIssue], recurrence: &mut HashMap<String, u32>) -> Vec<String> {
    let mut escalated = Vec::new();
    for issue in issues {
        let key = issue.recurrence_key();
        let count = recurrence.entry(key.clone()).or_insert(0);
        *count += 1;
        if *count >= 2 {
            escalated.push(key);
        }
    }
    escalated
}

#[cfg(test)]
#[path = "reviewer_driver_tests.rs"]
mod tests;
