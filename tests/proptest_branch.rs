//! Property-based tests for release-branch handling.
//!
//! Uses proptest to verify that:
//! - Branch sets start with the requested branch and never repeat
//! - Every branch-set member is itself a well-formed release branch
//! - Adjacent minors inside the cap always make the set
//! - Both branch spellings resolve to the same set
//! - Out-of-policy and malformed names are rejected

use proptest::prelude::*;
use std::collections::HashSet;
use tracing::info;

use tracker_metrics::branch::{BranchFormat, BranchPolicy, sanitize_branch, validate_branch};
use tracker_metrics::error::MetricsError;

/// Initialize test logging for proptest
fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

/// Highest known minor for each major the policy covers.
fn minor_cap(major: u32) -> u32 {
    match major {
        8 => 9,
        9 | 10 | 11 => 5,
        _ => panic!("major {major} outside the policy"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        ..Default::default()
    })]

    /// Property: the requested branch leads its own set
    #[test]
    fn branch_set_leads_with_itself(major in 8u32..=11, minor in 0u32..=9) {
        init_test_logging();
        prop_assume!(minor <= minor_cap(major));
        let branch = format!("{major}.{minor}.x");
        info!("proptest_branch_set: branch={branch}");

        let set = BranchPolicy::default().branch_set(&branch).unwrap();
        prop_assert_eq!(&set[0], &branch);
    }

    /// Property: set members are unique, well-formed release branches
    #[test]
    fn branch_set_members_are_unique_and_well_formed(
        major in 8u32..=11,
        minor in 0u32..=9,
    ) {
        init_test_logging();
        prop_assume!(minor <= minor_cap(major));
        let branch = format!("{major}.{minor}.x");

        let set = BranchPolicy::default().branch_set(&branch).unwrap();
        let unique: HashSet<&String> = set.iter().collect();
        prop_assert_eq!(unique.len(), set.len(), "duplicates in {:?}", set);
        for member in &set {
            prop_assert!(
                validate_branch(member, BranchFormat::Git).is_ok(),
                "malformed member {member} in {set:?}"
            );
        }
    }

    /// Property: minors within two steps and inside the cap are present
    #[test]
    fn branch_set_walks_adjacent_minors(major in 8u32..=11, minor in 0u32..=9) {
        init_test_logging();
        let cap = minor_cap(major);
        prop_assume!(minor <= cap);
        let branch = format!("{major}.{minor}.x");

        let set = BranchPolicy::default().branch_set(&branch).unwrap();
        for step in 1..=2u32 {
            if minor >= step {
                let lower = format!("{major}.{}.x", minor - step);
                prop_assert!(set.contains(&lower), "{lower} missing from {set:?}");
            }
            if minor + step <= cap {
                let upper = format!("{major}.{}.x", minor + step);
                prop_assert!(set.contains(&upper), "{upper} missing from {set:?}");
            }
        }
    }

    /// Property: the git and issue spellings produce the same set
    #[test]
    fn branch_set_spellings_agree(major in 8u32..=11, minor in 0u32..=9) {
        init_test_logging();
        prop_assume!(minor <= minor_cap(major));
        let policy = BranchPolicy::default();

        let from_git = policy.branch_set(&format!("{major}.{minor}.x")).unwrap();
        let from_issue = policy.branch_set(&format!("{major}.{minor}.x-dev")).unwrap();
        prop_assert_eq!(from_git, from_issue);
    }

    /// Property: minors past the cap are outside the policy
    #[test]
    fn minor_beyond_cap_is_unknown(major in 8u32..=11, excess in 1u32..=12) {
        init_test_logging();
        let minor = minor_cap(major) + excess;
        let branch = format!("{major}.{minor}.x");

        let err = BranchPolicy::default().branch_set(&branch).unwrap_err();
        prop_assert!(
            matches!(err, MetricsError::UnknownBranch { .. }),
            "expected UnknownBranch for {branch}, got {err}"
        );
    }

    /// Property: majors the policy never covered are rejected
    #[test]
    fn unknown_major_is_rejected(major in 12u32..=99, minor in 0u32..=9) {
        init_test_logging();
        let branch = format!("{major}.{minor}.x");

        let err = BranchPolicy::default().branch_set(&branch).unwrap_err();
        prop_assert!(
            matches!(err, MetricsError::UnknownBranch { .. }),
            "expected UnknownBranch for {branch}, got {err}"
        );
    }

    /// Property: validation is idempotent and spelling round-trips
    #[test]
    fn validation_round_trips(major in 0u32..=99, minor in 0u32..=99) {
        init_test_logging();
        let branch = format!("{major}.{minor}.x");

        let git = validate_branch(&branch, BranchFormat::Git).unwrap();
        prop_assert_eq!(&git, &branch);
        prop_assert_eq!(
            validate_branch(&git, BranchFormat::Git).unwrap(),
            git.clone()
        );

        let issue = validate_branch(&branch, BranchFormat::Issue).unwrap();
        prop_assert_eq!(&issue, &format!("{branch}-dev"));
        prop_assert_eq!(validate_branch(&issue, BranchFormat::Git).unwrap(), git);
    }

    /// Property: names without the release shape never validate
    #[test]
    fn garbage_branches_are_rejected(name in "[a-z]{1,12}") {
        init_test_logging();

        let err = validate_branch(&name, BranchFormat::Git).unwrap_err();
        prop_assert!(
            matches!(err, MetricsError::InvalidBranchFormat { .. }),
            "expected InvalidBranchFormat for {name}, got {err}"
        );
    }

    /// Property: shell metacharacters never pass the git-name gate
    #[test]
    fn unsafe_git_names_are_rejected(
        prefix in "[a-z0-9]{0,6}",
        bad in r"[ ;$&|`'\\]",
        suffix in "[a-z0-9]{0,6}",
    ) {
        init_test_logging();
        let name = format!("{prefix}{bad}{suffix}");

        prop_assert!(
            sanitize_branch(&name).is_err(),
            "unsafe name {name:?} passed"
        );
    }

    /// Property: plain release and contrib spellings pass the git gate
    #[test]
    fn safe_git_names_pass(name in "[A-Za-z0-9_.-]{1,20}(/[A-Za-z0-9_.-]{1,10})?") {
        init_test_logging();
        prop_assert!(sanitize_branch(&name).is_ok(), "safe name {name:?} rejected");
    }
}
