//! CSV of issues fixed on a branch, cross-checked against the commit
//! log so only issues with a landed commit appear.

use std::collections::HashMap;
use std::io::{self, Write};

use crate::branch::BranchPolicy;
use crate::config::Config;
use crate::error::{MetricsError, Result};
use crate::gitlog::CommitLogParser;
use crate::metadata::{project, LabelTable, CATEGORIES, PRIMARY_PROJECT, PRIORITIES};
use crate::model::{IssueRow, ParsedCommit};
use crate::query::IssueFilter;
use crate::report::{quoted_row, strip_quotes, write_rows};
use crate::store::LocalStore;

use crate::cli::FixesArgs;

const HEADER: &str = "\"nid\",\"Date\",\"Title\",\"Type\",\"Priority\",\"Component\"";

/// Execute the fixes command.
///
/// The store query alone overcounts: an issue marked fixed may have
/// been committed to a different branch of the co-release set, or
/// reverted. Requiring a matching `Issue #<id>` commit on the named
/// branch keeps only fixes that actually landed there.
///
/// # Errors
///
/// Returns branch and label errors for bad arguments, plus store and
/// git failures.
pub fn execute(args: &FixesArgs, config: &Config) -> Result<()> {
    let store = LocalStore::open(&config.db_path)?;
    let fixed = IssueFilter::fixed_in(
        &BranchPolicy::default(),
        &args.branch,
        &args.types,
        &args.priorities,
    )?
    .compile()?
    .run(store.connection())?;

    let core = project(PRIMARY_PROJECT).ok_or_else(|| MetricsError::UnknownProject {
        project: PRIMARY_PROJECT.to_string(),
    })?;
    let commits = CommitLogParser::new(core, &config.repos_dir).issue_commits(
        &args.branch,
        None,
        None,
    )?;

    let rows = landed_rows(&fixed, &commits);
    let stdout = io::stdout();
    write_rows(&mut stdout.lock(), HEADER, &rows)?;
    Ok(())
}

/// Keep only issues with a commit on the branch, ordered by id.
fn landed_rows(fixed: &[IssueRow], commits: &HashMap<i64, ParsedCommit>) -> Vec<String> {
    let mut landed: Vec<(&IssueRow, &ParsedCommit)> = fixed
        .iter()
        .filter_map(|issue| commits.get(&issue.id).map(|commit| (issue, commit)))
        .collect();
    landed.sort_by_key(|(issue, _)| issue.id);
    landed
        .into_iter()
        .map(|(issue, commit)| format_row(issue, commit))
        .collect()
}

fn format_row(issue: &IssueRow, commit: &ParsedCommit) -> String {
    quoted_row(&[
        issue.id.to_string(),
        commit.date.to_string(),
        strip_quotes(&issue.title),
        label_or_code(&CATEGORIES, issue.category),
        label_or_code(&PRIORITIES, issue.priority),
        issue.component.clone(),
    ])
}

/// Report the code's label, or the bare code for values outside the
/// table (the tracker has retired codes that persist on old issues).
fn label_or_code(table: &LabelTable, code: i64) -> String {
    table
        .label(code)
        .map_or_else(|| code.to_string(), ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn issue(id: i64) -> IssueRow {
        IssueRow {
            id,
            created_at: 0,
            changed_at: 0,
            status_changed_at: 0,
            status: 2,
            priority: 400,
            category: 1,
            version: "10.0.x-dev".to_string(),
            title: format!("Issue {id}"),
            component: "base system".to_string(),
        }
    }

    fn commit(day: u32) -> ParsedCommit {
        ParsedCommit {
            date: NaiveDate::from_ymd_opt(2022, 7, day).unwrap(),
            message: "whatever".to_string(),
        }
    }

    #[test]
    fn test_landed_rows_drop_issues_without_commits() {
        let fixed = vec![issue(30), issue(10), issue(20)];
        let commits: HashMap<i64, ParsedCommit> =
            [(10, commit(1)), (30, commit(2))].into_iter().collect();

        let rows = landed_rows(&fixed, &commits);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("\"10\",\"2022-07-01\""));
        assert!(rows[1].starts_with("\"30\",\"2022-07-02\""));
    }

    #[test]
    fn test_format_row_maps_codes_and_strips_quotes() {
        let mut fixed = issue(7);
        fixed.title = "A \"quoted\" title".to_string();
        let row = format_row(&fixed, &commit(4));
        assert_eq!(
            row,
            "\"7\",\"2022-07-04\",\"A quoted title\",\"bug\",\"critical\",\"base system\""
        );
    }

    #[test]
    fn test_label_or_code_falls_back_to_code() {
        assert_eq!(label_or_code(&CATEGORIES, 1), "bug");
        assert_eq!(label_or_code(&CATEGORIES, 999), "999");
    }
}
