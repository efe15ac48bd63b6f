// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn finding(severity: Severity, file: &str, title: &str) -> FlowFinding {
    FlowFinding {
        severity,
        actor: "user".to_string(),
        title: title.to_string(),
        description: "desc".to_string(),
        file_path: file.to_string(),
        line: None,
        cross_boundary: false,
        edge_case: None,
        flow_id: FlowId::new("checkout"),
    }
}

#[test]
fn severity_orders_critical_highest() {
    assert!(Severity::Critical > Severity::High);
    assert!(Severity::High > Severity::Medium);
    assert!(Severity::Medium > Severity::Low);
}

#[test]
fn high_and_critical_flagged_as_high_or_critical() {
    assert!(Severity::High.is_high_or_critical());
    assert!(Severity::Critical.is_high_or_critical());
    assert!(!Severity::Medium.is_high_or_critical());
}

#[test]
fn dedup_key_combines_file_and_lowercased_title_prefix() {
    let f = finding(Severity::Low, "app/api/x.ts", "SQL Injection In Login");
    assert_eq!(f.dedup_key(), "app/api/x.ts::sql injection in login");
}

#[test]
fn dedup_retains_higher_severity_on_collision() {
    let low = finding(Severity::Low, "a.ts", "missing auth check");
    let high = finding(Severity::High, "a.ts", "missing auth check");
    let deduped = dedup_findings(vec![low, high]);
    assert_eq!(deduped.len(), 1);
    assert_eq!(deduped[0].severity, Severity::High);
}

#[test]
fn dedup_keeps_distinct_findings() {
    let a = finding(Severity::Low, "a.ts", "issue one");
    let b = finding(Severity::Low, "b.ts", "issue two");
    let deduped = dedup_findings(vec![a, b]);
    assert_eq!(deduped.len(), 2);
}
