// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn issue(desc: &str, file: Option<&str>) -> KnownIssue {
    KnownIssue {
        id: KnownIssueId::new(),
        description: desc.to_string(),
        severity: Severity::High,
        source: IssueSource::FlowTracing,
        file_path: file.map(str::to_string),
        cycle_found: 1,
        cycle_addressed: None,
        addressed: false,
    }
}

#[test]
fn add_known_issues_deduplicates_by_key() {
    let mut registry = Vec::new();
    add_known_issues(&mut registry, vec![issue("SQL injection", Some("a.ts"))]);
    assert_eq!(registry.len(), 1);

    // Re-adding the same finding (even with a fresh id) is a no-op.
    add_known_issues(&mut registry, vec![issue("sql injection", Some("a.ts"))]);
    assert_eq!(registry.len(), 1);
}

#[test]
fn add_known_issues_is_idempotent_against_already_known() {
    let mut registry = Vec::new();
    let fresh = vec![issue("finding one", Some("a.ts")), issue("finding two", Some("b.ts"))];
    add_known_issues(&mut registry, fresh.clone());
    let already_known = registry.clone();

    add_known_issues(&mut registry, [fresh, already_known].concat());
    assert_eq!(registry.len(), 2);
}

#[test]
fn mark_addressed_sets_cycle_and_flag() {
    let mut registry = vec![issue("leak", Some("a.ts"))];
    let id = registry[0].id;
    mark_addressed(&mut registry, &[id], 3);
    assert!(registry[0].addressed);
    assert_eq!(registry[0].cycle_addressed, Some(3));
}

#[test]
fn unresolved_filters_out_addressed() {
    let mut registry = vec![issue("a", Some("a.ts")), issue("b", Some("b.ts"))];
    let id = registry[0].id;
    mark_addressed(&mut registry, &[id], 1);
    let open = unresolved(&registry);
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].description, "b");
}

#[test]
fn dedup_key_omits_separator_when_file_path_absent() {
    let i = issue("standalone finding", None);
    assert_eq!(i.dedup_key(), "standalone finding");
}
