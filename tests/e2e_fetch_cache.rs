//! End-to-end coverage for the fetch commands' weekly-cache behavior.
//!
//! The network path is exercised by unit tests with a scripted page
//! source; here the full cache is pre-seeded so the commands complete
//! without touching the network at all.

mod common;

use common::{IssueSeed, TmWorkspace, run_tm};
use std::fs;
use tracker_metrics::fetch::{FixedIssueListRequest, IssueListRequest};

fn full_cache_entries(workspace: &TmWorkspace) -> usize {
    fs::read_dir(workspace.cache_dir().join("full"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[test]
fn e2e_fetch_is_satisfied_by_the_weekly_cache() {
    let _log = common::test_log("e2e_fetch_is_satisfied_by_the_weekly_cache");
    let workspace = TmWorkspace::new();

    let seeds = vec![
        IssueSeed {
            id: 3_000_070,
            ..IssueSeed::default()
        }
        .json(),
        IssueSeed {
            id: 3_000_071,
            ..IssueSeed::default()
        }
        .json(),
    ];
    workspace.seed_full_cache(
        &IssueListRequest::new(vec!["11.x".to_string()], Some(1)),
        &[("11.x", seeds)],
    );
    assert_eq!(full_cache_entries(&workspace), 1);

    let fetch = run_tm(&workspace, ["fetch", "--types", "bug", "--branches", "11.x"]);
    assert!(fetch.status.success(), "fetch failed: {}", fetch.stderr);

    // A cache hit rewrites nothing and leaves no partial entry behind.
    assert_eq!(full_cache_entries(&workspace), 1);
    let partials = fs::read_dir(workspace.cache_dir().join("partial"))
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(partials, 0);
}

#[test]
fn e2e_fetch_fixed_is_satisfied_by_the_weekly_cache() {
    let _log = common::test_log("e2e_fetch_fixed_is_satisfied_by_the_weekly_cache");
    let workspace = TmWorkspace::new();

    // The rolling branch has no co-released set, so two sub-queries:
    // one per fixed status. The closed-fixed list stays empty.
    let fixed = vec![
        IssueSeed {
            id: 3_000_080,
            status: 2,
            ..IssueSeed::default()
        }
        .json(),
    ];
    workspace.seed_full_cache(
        &FixedIssueListRequest::new(vec!["11.x".to_string()], Some(1)),
        &[("11.x/fixed", fixed)],
    );
    assert_eq!(full_cache_entries(&workspace), 2);

    let fetch_fixed = run_tm(&workspace, ["fetch-fixed", "11.x", "--types", "bug"]);
    assert!(
        fetch_fixed.status.success(),
        "fetch-fixed failed: {}",
        fetch_fixed.stderr
    );
    assert_eq!(full_cache_entries(&workspace), 2);
}

#[test]
fn e2e_fetch_rejects_unknown_categories() {
    let _log = common::test_log("e2e_fetch_rejects_unknown_categories");
    let workspace = TmWorkspace::new();

    let fetch = run_tm(&workspace, ["fetch", "--types", "nonsense"]);
    assert!(!fetch.status.success());
    assert_eq!(fetch.status.code(), Some(1));
    assert!(
        fetch.stderr.contains("Unknown category label: 'nonsense'"),
        "unexpected error: {}",
        fetch.stderr
    );

    let mixed = run_tm(&workspace, ["fetch", "--types", "bug,2"]);
    assert!(!mixed.status.success());
    assert!(
        mixed.stderr.contains("mixes labels and numeric codes"),
        "unexpected error: {}",
        mixed.stderr
    );
}
