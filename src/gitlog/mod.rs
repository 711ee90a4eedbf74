//! Commit-log parsing for fix verification and contrib reporting.
//!
//! Runs `git log` over a project clone with an unambiguous
//! control-character format (unit separator between fields, record
//! separator between commits) so commit subjects cannot break parsing.
//! Primary-project history is keyed by issue id via the
//! `Issue #<id> ...` subject convention; any other repository is keyed
//! by commit hash with the full subject kept.
//!
//! The output is rebuilt on every invocation and never persisted.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::branch::{BranchFormat, sanitize_branch, validate_branch};
use crate::error::{MetricsError, Result};
use crate::metadata::{Project, branch_date};
use crate::model::ParsedCommit;
use crate::util::time::parse_date;

/// Unit separator between the hash, date, and subject fields.
const FIELD_SEP: char = '\u{1f}';
/// Record separator terminating each commit.
const RECORD_SEP: char = '\u{1e}';
/// Log format: hash, strict ISO author date, subject.
const LOG_FORMAT: &str = "--format=%H%x1f%aI%x1f%s%x1e";

/// Subject convention for primary-project commits. The id digits are
/// required; the message is whatever follows the first colon.
static ISSUE_SUBJECT_RE: Lazy<Regex> = Lazy::new(|| {
    // Regex is static and valid.
    Regex::new(r"^Issue #(\d+)[^:]*(?::(.*))?$").unwrap()
});

/// Parses one project's git history.
#[derive(Debug)]
pub struct CommitLogParser {
    project: &'static Project,
    repo_path: PathBuf,
}

impl CommitLogParser {
    #[must_use]
    pub fn new(project: &'static Project, repos_dir: &Path) -> Self {
        Self {
            project,
            repo_path: repos_dir.join(project.repo_dir),
        }
    }

    /// Commits on a release branch, keyed by issue id per the subject
    /// convention. Non-matching subjects are skipped; the first (most
    /// recent) commit per id wins.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBranchFormat` on a bad branch name, `GitCommand`
    /// when the subprocess fails, and `EmptyOrMalformedLog` when the
    /// output shape is wrong.
    pub fn issue_commits(
        &self,
        branch: &str,
        after: Option<NaiveDate>,
        before: Option<NaiveDate>,
    ) -> Result<HashMap<i64, ParsedCommit>> {
        let branch = validate_branch(branch, BranchFormat::Git)?;
        let (after, before) = self.resolve_window(&branch, after, before)?;
        let raw = self.run_log(&branch, after, before)?;
        parse_issue_log(&raw, &branch)
    }

    /// Every commit on an arbitrary branch, keyed by hash, in log order
    /// (newest first).
    ///
    /// # Errors
    ///
    /// Returns `InvalidGitBranch` on a bad branch name, `GitCommand`
    /// when the subprocess fails, and `EmptyOrMalformedLog` when the
    /// output shape is wrong.
    pub fn hash_commits(
        &self,
        branch: &str,
        after: Option<NaiveDate>,
        before: Option<NaiveDate>,
    ) -> Result<Vec<(String, ParsedCommit)>> {
        let branch = sanitize_branch(branch)?.to_string();
        let (after, before) = self.resolve_window(&branch, after, before)?;
        let raw = self.run_log(&branch, after, before)?;
        parse_hash_log(&raw, &branch)
    }

    /// Fill in the default date window: after falls back to the
    /// branch's known start date, before to the project's absorption
    /// date (history must not bleed past the merge point).
    fn resolve_window(
        &self,
        branch: &str,
        after: Option<NaiveDate>,
        before: Option<NaiveDate>,
    ) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
        let after = match after {
            Some(date) => Some(date),
            None => branch_date(branch)
                .map(|d| parse_date(d, "branch start"))
                .transpose()?,
        };
        let before = match before {
            Some(date) => Some(date),
            None => self
                .project
                .absorbed
                .map(|d| parse_date(d, "absorption"))
                .transpose()?,
        };
        Ok((after, before))
    }

    fn run_log(
        &self,
        branch: &str,
        after: Option<NaiveDate>,
        before: Option<NaiveDate>,
    ) -> Result<String> {
        let mut args: Vec<String> = vec!["log".to_string(), branch.to_string(), LOG_FORMAT.to_string()];
        if let Some(after) = after {
            args.push(format!("--after={}", after.format("%Y-%m-%d")));
        }
        if let Some(before) = before {
            args.push(format!("--before={}", before.format("%Y-%m-%d")));
        }

        debug!(
            repo = %self.repo_path.display(),
            args = %args.join(" "),
            "running git log"
        );

        let output = Command::new("git")
            .args(&args)
            .current_dir(&self.repo_path)
            .output()?;

        if !output.status.success() {
            return Err(MetricsError::GitCommand {
                args: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Split raw log output into (hash, date, subject) records.
///
/// Entirely empty output is a valid zero-commit log. Non-empty output
/// without a record separator, a record with the wrong field count, or
/// an unparseable date all mean the log format changed underneath us.
fn split_records<'r>(raw: &'r str, branch: &str) -> Result<Vec<(&'r str, NaiveDate, &'r str)>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    if !raw.contains(RECORD_SEP) {
        return Err(MetricsError::EmptyOrMalformedLog {
            branch: branch.to_string(),
        });
    }

    let mut records = Vec::new();
    for chunk in raw.split(RECORD_SEP) {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }
        let fields: Vec<&str> = chunk.split(FIELD_SEP).collect();
        let &[hash, stamp, subject] = fields.as_slice() else {
            return Err(MetricsError::EmptyOrMalformedLog {
                branch: branch.to_string(),
            });
        };
        let date = DateTime::parse_from_rfc3339(stamp)
            .map_err(|_| MetricsError::EmptyOrMalformedLog {
                branch: branch.to_string(),
            })?
            .date_naive();
        records.push((hash, date, subject));
    }
    Ok(records)
}

fn parse_issue_log(raw: &str, branch: &str) -> Result<HashMap<i64, ParsedCommit>> {
    let mut commits = HashMap::new();
    for (_, date, subject) in split_records(raw, branch)? {
        let Some(caps) = ISSUE_SUBJECT_RE.captures(subject) else {
            continue;
        };
        let Ok(id) = caps[1].parse::<i64>() else {
            continue;
        };
        let message = caps
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        // Log order is newest first; keep the most recent commit per id.
        commits.entry(id).or_insert(ParsedCommit { date, message });
    }
    Ok(commits)
}

fn parse_hash_log(raw: &str, branch: &str) -> Result<Vec<(String, ParsedCommit)>> {
    let records = split_records(raw, branch)?;
    Ok(records
        .into_iter()
        .map(|(hash, date, subject)| {
            (
                hash.to_string(),
                ParsedCommit {
                    date,
                    message: subject.to_string(),
                },
            )
        })
        .collect())
}
