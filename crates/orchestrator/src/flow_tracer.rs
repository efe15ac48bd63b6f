// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs a bounded-parallelism, read-only tracing subtask per derived flow
//! and deduplicates the findings. Reuses the reviewer CLI's exec contract —
//! tracing is just another read-only invocation of the same tool, with its
//! own JSON reply shape.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use warden_adapters::{AdapterError, ReviewerTool};
use warden_core::{dedup_findings, Flow, FlowFinding};

#[derive(Deserialize)]
struct RawFindings {
    findings: Vec<FlowFinding>,
}

#[derive(Deserialize)]
struct RawFlows {
    flows: Vec<Flow>,
}

/// Parse the flow-derivation subtask's fenced ```json reply. `None` if no
/// fence is present or it doesn't parse — the caller treats that as zero
/// derived flows for the cycle, same as an unparseable trace reply.
fn parse_derived_flows(stdout: &str) -> Option<Vec<Flow>> {
    let fence_start = stdout.find("```json")?;
    let after = &stdout[fence_start + "```json".len()..];
    let fence_end = after.find("```")?;
    serde_json::from_str::<RawFlows>(after[..fence_end].trim()).ok().map(|r| r.flows)
}

/// Derive at most `max_flows` end-to-end flows from a diff, via the same
/// read-only exec contract the tracing subtasks use. `build_prompt` embeds
/// the diff and changed-file list the caller already gathered.
pub async fn derive_flows(
    tool: &dyn ReviewerTool,
    project_dir: &Path,
    prompt: &str,
    timeout: Duration,
    max_flows: usize,
) -> Result<Vec<Flow>, AdapterError> {
    let run = tool.run(project_dir, prompt, timeout).await?;
    let flows = parse_derived_flows(&run.stdout).unwrap_or_default();
    Ok(flows.into_iter().take(max_flows).collect())
}

/// Parse a tracing subtask's fenced ```json reply into its findings. Unlike
/// the reviewer's verdict JSON, a trace subtask that produces no fence or
/// malformed JSON just contributes zero findings — a single flow's tracer
/// hiccup shouldn't fail the whole cycle's flow-tracing step.
fn parse_trace_findings(stdout: &str) -> Vec<FlowFinding> {
    let Some(fence_start) = stdout.find("```json") else { return Vec::new() };
    let after = &stdout[fence_start + "```json".len()..];
    let Some(fence_end) = after.find("```") else { return Vec::new() };
    serde_json::from_str::<RawFindings>(after[..fence_end].trim()).map(|r| r.findings).unwrap_or_default()
}

/// Run the derived flows (already capped to at most 8 by the caller) at
/// bounded parallelism, then dedup across all of them. `build_prompt`
/// renders the read-only tracing instructions for one flow.
pub async fn run_flow_tracing(
    tool: Arc<dyn ReviewerTool>,
    project_dir: &Path,
    flows: Vec<Flow>,
    timeout: Duration,
    parallelism: usize,
    build_prompt: impl Fn(&Flow) -> String,
) -> Result<Vec<FlowFinding>, AdapterError> {
    let semaphore = Arc::new(Semaphore::new(parallelism.max(1)));
    let mut join_set: JoinSet<Result<Vec<FlowFinding>, AdapterError>> = JoinSet::new();

    for flow in flows {
        let tool = tool.clone();
        let project_dir: PathBuf = project_dir.to_path_buf();
        let prompt = build_prompt(&flow);
        let semaphore = semaphore.clone();
        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let run = tool.run(&project_dir, &prompt, timeout).await?;
            Ok(parse_trace_findings(&run.stdout))
        });
    }

    let mut all_findings = Vec::new();
    while let Some(result) = join_set.join_next().await {
        match result {
            Ok(Ok(findings)) => all_findings.extend(findings),
            Ok(Err(e)) => return Err(e),
            Err(_join_error) => continue, // a traced task panicked; treat as zero findings for that flow
        }
    }

    Ok(dedup_findings(all_findings))
}

#[cfg(test)]
#[path = "flow_tracer_tests.rs"]
mod tests;
