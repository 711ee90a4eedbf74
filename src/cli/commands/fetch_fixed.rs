//! Fetch fixed-issue lists for a branch into the weekly cache.

use chrono::Utc;
use tracing::info;

use crate::branch::BranchPolicy;
use crate::cli::FetchFixedArgs;
use crate::config::Config;
use crate::error::Result;
use crate::fetch::{Completion, FetchCache, FixedIssueListRequest, HttpSource, PagedFetcher};
use crate::metadata::{CATEGORIES, FIELD_STATUS_CHANGED};
use crate::util::progress::{create_spinner, should_show_progress};
use crate::util::time::{day_start, parse_date};

/// Execute the fetch-fixed command.
///
/// Covers the whole co-released branch set, since a fix targeted at one
/// branch may have landed under any adjacent version. Fixed lists sort
/// by status change, so the fetch stops once it pages past the cutoff
/// instead of walking the branch's entire history.
///
/// # Errors
///
/// Returns branch-policy errors, label errors for unknown categories,
/// date-parse errors for `--since`, and any fatal fetch error.
pub fn execute(args: &FetchFixedArgs, config: &Config) -> Result<()> {
    let branches = BranchPolicy::default().branch_set(&args.branch)?;
    let categories = CATEGORIES.resolve(&args.types)?;
    let completion = match args.since.as_deref() {
        Some(since) => Completion::OlderThan {
            cutoff: day_start(parse_date(since, "since")?),
            field: FIELD_STATUS_CHANGED,
        },
        None => Completion::recent_activity(Utc::now()),
    };

    let source = HttpSource::new()?;
    let fetcher = PagedFetcher::new(&source, FetchCache::new(&config.cache_dir));

    for (name, category) in args.types.iter().zip(&categories) {
        let spinner = create_spinner(
            &format!(
                "Fetching fixed {name} issues for {} branches",
                branches.len()
            ),
            should_show_progress(),
        );
        let request = FixedIssueListRequest::new(branches.clone(), Some(*category));
        let results = fetcher.fetch(&request, completion)?;
        spinner.finish_and_clear();

        let total: usize = results.values().map(Vec::len).sum();
        info!(category = %name, issues = total, "cached fixed issue lists");
    }
    Ok(())
}
