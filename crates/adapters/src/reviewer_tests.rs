// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parse_review_json_extracts_fenced_block() {
    let stdout = "some preamble\n```json\n{\"review_performed\":true,\"verdict\":\"APPROVE\",\"issues\":[],\"summary\":\"looks good\"}\n```\ntrailing notes";
    let result = parse_review_json(stdout).expect("parses");
    assert!(result.review_performed);
    assert!(result.outcome.is_approved());
}

#[test]
fn parse_review_json_returns_none_without_fence() {
    assert!(parse_review_json("no json here").is_none());
}

#[test]
fn parse_review_json_returns_none_on_malformed_body() {
    let stdout = "```json\n{not valid json\n```";
    assert!(parse_review_json(stdout).is_none());
}

#[tokio::test]
async fn fake_reviewer_tool_replays_queued_responses_in_order() {
    let tool = FakeReviewerTool::new();
    tool.push_response(ReviewerRun {
        stdout: "first".to_string(),
        stderr: String::new(),
        exit_code: Some(0),
        timed_out: false,
    });
    tool.push_response(ReviewerRun {
        stdout: "second".to_string(),
        stderr: String::new(),
        exit_code: Some(0),
        timed_out: false,
    });

    let dir = std::path::Path::new("/tmp/project");
    let first = tool.run(dir, "prompt one", std::time::Duration::from_secs(1)).await.unwrap();
    let second = tool.run(dir, "prompt two", std::time::Duration::from_secs(1)).await.unwrap();

    assert_eq!(first.stdout, "first");
    assert_eq!(second.stdout, "second");
    assert_eq!(tool.calls().len(), 2);
    assert_eq!(tool.calls()[0].prompt, "prompt one");
}
