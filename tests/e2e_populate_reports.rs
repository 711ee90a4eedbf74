//! End-to-end coverage for the cache-to-database load and the reports
//! that read straight from the local store.

mod common;

use common::{IssueSeed, TmWorkspace, run_tm};
use tracker_metrics::fetch::IssueListRequest;

fn bug_request(branches: &[&str]) -> IssueListRequest {
    IssueListRequest::new(branches.iter().map(ToString::to_string).collect(), Some(1))
}

#[test]
fn e2e_populate_then_untriaged_report() {
    let _log = common::test_log("e2e_populate_then_untriaged_report");
    let workspace = TmWorkspace::new();

    let on_main = vec![
        IssueSeed {
            id: 3_000_001,
            title: "Critical crash in router".to_string(),
            component: "routing system".to_string(),
            ..IssueSeed::default()
        }
        .json(),
        IssueSeed {
            id: 3_000_002,
            title: "Already triaged".to_string(),
            tags: vec![197_921],
            ..IssueSeed::default()
        }
        .json(),
        IssueSeed {
            id: 3_000_003,
            title: "Major, not critical".to_string(),
            priority: 300,
            ..IssueSeed::default()
        }
        .json(),
    ];
    let on_maintenance = vec![
        IssueSeed {
            id: 3_000_004,
            title: "Critical but fixed".to_string(),
            status: 2,
            version: "10.3.x-dev".to_string(),
            ..IssueSeed::default()
        }
        .json(),
        IssueSeed {
            id: 3_000_005,
            title: "Triage deferred".to_string(),
            status: 13,
            version: "10.3.x-dev".to_string(),
            tags: vec![197_925],
            ..IssueSeed::default()
        }
        .json(),
        IssueSeed {
            id: 3_000_006,
            title: "Second untriaged critical".to_string(),
            component: "cache system".to_string(),
            status: 8,
            version: "10.3.x-dev".to_string(),
            ..IssueSeed::default()
        }
        .json(),
    ];
    workspace.seed_full_cache(
        &bug_request(&["11.x", "10.3.x"]),
        &[("11.x", on_main), ("10.3.x", on_maintenance)],
    );

    let populate = run_tm(
        &workspace,
        ["populate", "--types", "bug", "--branches", "11.x,10.3.x"],
    );
    assert!(
        populate.status.success(),
        "populate failed: {}",
        populate.stderr
    );
    assert!(
        populate
            .stdout
            .contains("Loaded 6 new issues (0 already present)."),
        "unexpected populate output: {}",
        populate.stdout
    );

    // Loading the same cache again must not duplicate anything.
    let again = run_tm(
        &workspace,
        ["populate", "--types", "bug", "--branches", "11.x,10.3.x"],
    );
    assert!(again.status.success(), "repeat failed: {}", again.stderr);
    assert!(
        again
            .stdout
            .contains("Loaded 0 new issues (6 already present)."),
        "repeat load not idempotent: {}",
        again.stdout
    );

    let untriaged = run_tm(&workspace, ["untriaged"]);
    assert!(
        untriaged.status.success(),
        "untriaged failed: {}",
        untriaged.stderr
    );
    let lines = untriaged.stdout_lines();
    assert_eq!(lines.len(), 3, "unexpected report:\n{}", untriaged.stdout);
    assert_eq!(lines[0], "nid, title, component, age, last_update");
    assert!(
        lines[1].starts_with("\"3000001\",\"Critical crash in router\",\"routing system\","),
        "unexpected first row: {}",
        lines[1]
    );
    assert!(
        lines[2].starts_with("\"3000006\",\"Second untriaged critical\",\"cache system\","),
        "unexpected second row: {}",
        lines[2]
    );
}

#[test]
fn e2e_timestamp_reflects_newest_change() {
    let _log = common::test_log("e2e_timestamp_reflects_newest_change");
    let workspace = TmWorkspace::new();

    let seeds = vec![
        IssueSeed {
            id: 3_000_020,
            changed: 1_700_000_000,
            ..IssueSeed::default()
        }
        .json(),
        IssueSeed {
            id: 3_000_021,
            changed: 1_690_000_000,
            ..IssueSeed::default()
        }
        .json(),
    ];
    workspace.seed_full_cache(&bug_request(&["11.x"]), &[("11.x", seeds)]);

    let populate = run_tm(&workspace, ["populate", "--types", "bug", "--branches", "11.x"]);
    assert!(
        populate.status.success(),
        "populate failed: {}",
        populate.stderr
    );

    let timestamp = run_tm(&workspace, ["timestamp"]);
    assert!(
        timestamp.status.success(),
        "timestamp failed: {}",
        timestamp.stderr
    );
    assert_eq!(timestamp.stdout.trim(), "14 Nov, 2023");
}

#[test]
fn e2e_populate_without_cache_points_at_fetch() {
    let _log = common::test_log("e2e_populate_without_cache_points_at_fetch");
    let workspace = TmWorkspace::new();

    let populate = run_tm(&workspace, ["populate", "--types", "bug", "--branches", "11.x"]);
    assert!(!populate.status.success());
    assert_eq!(populate.status.code(), Some(1));
    assert!(
        populate.stderr.contains("No cached data"),
        "missing cache-miss message: {}",
        populate.stderr
    );
    assert!(
        populate.stderr.contains("Hint: Run: tm fetch"),
        "missing hint: {}",
        populate.stderr
    );
}

#[test]
fn e2e_populate_reset_and_truncate() {
    let _log = common::test_log("e2e_populate_reset_and_truncate");
    let workspace = TmWorkspace::new();

    let seeds = vec![
        IssueSeed {
            id: 3_000_030,
            ..IssueSeed::default()
        }
        .json(),
        IssueSeed {
            id: 3_000_031,
            ..IssueSeed::default()
        }
        .json(),
    ];
    workspace.seed_full_cache(&bug_request(&["11.x"]), &[("11.x", seeds)]);

    let first = run_tm(&workspace, ["populate", "--types", "bug", "--branches", "11.x"]);
    assert!(first.status.success(), "populate failed: {}", first.stderr);
    assert!(first.stdout.contains("Loaded 2 new issues (0 already present)."));

    // Truncate wipes the rows, so the same cache loads as new again.
    let truncated = run_tm(
        &workspace,
        ["populate", "--truncate", "--types", "bug", "--branches", "11.x"],
    );
    assert!(
        truncated.status.success(),
        "truncate failed: {}",
        truncated.stderr
    );
    assert!(truncated.stdout.contains("Loaded 2 new issues (0 already present)."));

    let reset = run_tm(
        &workspace,
        ["populate", "--reset", "--types", "bug", "--branches", "11.x"],
    );
    assert!(reset.status.success(), "reset failed: {}", reset.stderr);
    assert!(reset.stdout.contains("Loaded 2 new issues (0 already present)."));

    let conflicting = run_tm(
        &workspace,
        ["populate", "--reset", "--truncate", "--types", "bug"],
    );
    assert!(!conflicting.status.success());
    assert_eq!(conflicting.status.code(), Some(2));
    assert!(
        conflicting.stderr.contains("cannot be used with"),
        "missing conflict message: {}",
        conflicting.stderr
    );
}

#[test]
fn e2e_timestamp_on_empty_store_points_at_populate() {
    let _log = common::test_log("e2e_timestamp_on_empty_store_points_at_populate");
    let workspace = TmWorkspace::new();

    let timestamp = run_tm(&workspace, ["timestamp"]);
    assert!(!timestamp.status.success());
    assert!(
        timestamp.stderr.contains("holds no issues"),
        "unexpected error: {}",
        timestamp.stderr
    );
    assert!(
        timestamp.stderr.contains("tm populate"),
        "missing pointer at populate: {}",
        timestamp.stderr
    );
}

#[test]
fn e2e_populate_rejects_malformed_branch() {
    let _log = common::test_log("e2e_populate_rejects_malformed_branch");
    let workspace = TmWorkspace::new();

    let populate = run_tm(
        &workspace,
        ["populate", "--types", "bug", "--branches", "not-a-branch"],
    );
    assert!(!populate.status.success());
    assert_eq!(populate.status.code(), Some(1));
    assert!(
        populate.stderr.contains("Invalid branch format"),
        "unexpected error: {}",
        populate.stderr
    );
}
