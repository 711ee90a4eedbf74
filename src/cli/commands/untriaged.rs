//! CSV listing of open critical bugs awaiting triage.

use chrono::Utc;
use std::io::{self, Write};

use crate::config::Config;
use crate::error::Result;
use crate::model::IssueRow;
use crate::query::IssueFilter;
use crate::report::{quoted_row, write_rows};
use crate::store::LocalStore;
use crate::util::time::days_since;

const HEADER: &str = "nid, title, component, age, last_update";

/// Execute the untriaged command.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or queried.
pub fn execute(config: &Config) -> Result<()> {
    let store = LocalStore::open(&config.db_path)?;
    let mut issues = IssueFilter::untriaged_critical_bugs()?
        .compile()?
        .run(store.connection())?;
    issues.sort_by_key(|issue| issue.id);

    let now = Utc::now().timestamp();
    let rows: Vec<String> = issues.iter().map(|issue| format_row(issue, now)).collect();

    let stdout = io::stdout();
    write_rows(&mut stdout.lock(), HEADER, &rows)?;
    Ok(())
}

/// One fully quoted CSV row: id, title, component, age in days, and
/// days since the last update.
fn format_row(issue: &IssueRow, now: i64) -> String {
    quoted_row(&[
        issue.id.to_string(),
        issue.title.clone(),
        issue.component.clone(),
        days_since(issue.created_at, now).to_string(),
        days_since(issue.changed_at, now).to_string(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_issue() -> IssueRow {
        IssueRow {
            id: 3_280_425,
            created_at: 1_000_000,
            changed_at: 1_345_600,
            status_changed_at: 0,
            status: 1,
            priority: 400,
            category: 1,
            version: "9.4.x-dev".to_string(),
            title: "Crash on save".to_string(),
            component: "base system".to_string(),
        }
    }

    #[test]
    fn test_format_row_quotes_and_ages() {
        // 10 days after creation, 6 days after the last change.
        let now = 1_000_000 + 10 * 86_400;
        let row = format_row(&sample_issue(), now);
        assert_eq!(row, "\"3280425\",\"Crash on save\",\"base system\",\"10\",\"6\"");
    }

    #[test]
    fn test_format_row_doubles_embedded_quotes() {
        let mut issue = sample_issue();
        issue.title = "Fix \"sticky\" forms".to_string();
        let row = format_row(&issue, issue.created_at);
        assert!(row.contains("\"Fix \"\"sticky\"\" forms\""));
    }
}
