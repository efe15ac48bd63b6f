// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parse_semgrep_json_maps_results() {
    let stdout = r#"{
        "results": [
            {
                "check_id": "rules.sql-injection",
                "path": "src/db.rs",
                "start": {"line": 10},
                "end": {"line": 12},
                "extra": {"message": "unsanitized query", "severity": "ERROR"}
            }
        ]
    }"#;
    let findings = parse_semgrep_json(stdout).expect("parses");
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].check_id, "rules.sql-injection");
    assert_eq!(findings[0].start_line, 10);
    assert_eq!(findings[0].severity, "ERROR");
}

#[test]
fn parse_semgrep_json_rejects_malformed_output() {
    assert!(parse_semgrep_json("not json").is_err());
}

#[tokio::test]
async fn fake_static_analysis_tool_returns_configured_findings() {
    let tool = FakeStaticAnalysisTool::new();
    tool.set_findings(vec![StaticFinding {
        check_id: "x".into(),
        path: "a.rs".into(),
        start_line: 1,
        end_line: 1,
        message: "m".into(),
        severity: "WARNING".into(),
    }]);
    let dir = std::path::Path::new("/tmp/project");
    let findings = tool.scan(dir, "p/ci", &["src".to_string()]).await.unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(tool.call_count(), 1);
}
