//! CSV listing of contrib-project commits on their core-targeted
//! branches.

use chrono::NaiveDate;
use std::io::{self, Write};

use crate::cli::CommitsArgs;
use crate::config::Config;
use crate::error::{MetricsError, Result};
use crate::gitlog::CommitLogParser;
use crate::metadata::{branch_date, contrib_projects};
use crate::report::{quoted_row, strip_quotes, write_rows};
use crate::util::time::parse_date;

const HEADER: &str = "\"Project\",\"Date\",\"Commit ID\",\"Message\"";

/// The default window opens where the 9.4.x cycle did, the first cycle
/// these contrib projects targeted.
const DEFAULT_SINCE_BRANCH: &str = "9.4.x";

/// Execute the commits command.
///
/// # Errors
///
/// Returns `InvalidDate` for a bad `--since` value and git errors when
/// a repository cannot be read.
pub fn execute(args: &CommitsArgs, config: &Config) -> Result<()> {
    let since = match &args.since {
        Some(value) => parse_date(value, "since")?,
        None => default_since()?,
    };

    let mut rows = Vec::new();
    for project in contrib_projects() {
        let Some(branch) = project.branch else { continue };
        let parser = CommitLogParser::new(project, &config.repos_dir);
        // Newest-first log order within each project, registry order
        // across projects.
        for (hash, commit) in parser.hash_commits(branch, Some(since), None)? {
            rows.push(quoted_row(&[
                project.name.to_string(),
                commit.date.to_string(),
                hash,
                strip_quotes(&commit.message),
            ]));
        }
    }

    let stdout = io::stdout();
    write_rows(&mut stdout.lock(), HEADER, &rows)?;
    Ok(())
}

fn default_since() -> Result<NaiveDate> {
    let date = branch_date(DEFAULT_SINCE_BRANCH).ok_or_else(|| MetricsError::UnknownBranch {
        branch: DEFAULT_SINCE_BRANCH.to_string(),
    })?;
    parse_date(date, "since")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_since_is_the_94_branch_date() {
        assert_eq!(
            default_since().unwrap(),
            NaiveDate::from_ymd_opt(2021, 10, 29).unwrap()
        );
    }
}
