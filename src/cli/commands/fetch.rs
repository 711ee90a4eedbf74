//! Fetch recently-active issue lists into the weekly cache.

use tracing::info;

use crate::branch::{BranchFormat, validate_branch};
use crate::cli::FetchArgs;
use crate::config::Config;
use crate::error::Result;
use crate::fetch::{Completion, FetchCache, HttpSource, IssueListRequest, PagedFetcher};
use crate::metadata::{ACTIVE_BRANCHES, CATEGORIES};
use crate::util::progress::{create_spinner, should_show_progress};

/// Execute the fetch command.
///
/// One request per category, each covering every requested branch.
/// These lists back the populate command and are fetched exhaustively;
/// sub-queries already in this week's full cache are skipped.
///
/// # Errors
///
/// Returns label errors for unknown categories, branch-format errors,
/// and any fatal fetch error (the partial cache keeps the progress).
pub fn execute(args: &FetchArgs, config: &Config) -> Result<()> {
    let branches = effective_branches(&args.branches)?;
    let categories = CATEGORIES.resolve(&args.types)?;

    let source = HttpSource::new()?;
    let fetcher = PagedFetcher::new(&source, FetchCache::new(&config.cache_dir));

    for (name, category) in args.types.iter().zip(&categories) {
        let spinner = create_spinner(
            &format!("Fetching {name} issues for {} branches", branches.len()),
            should_show_progress(),
        );
        let request = IssueListRequest::new(branches.clone(), Some(*category));
        let results = fetcher.fetch(&request, Completion::Exhaustive)?;
        spinner.finish_and_clear();

        let total: usize = results.values().map(Vec::len).sum();
        info!(category = %name, issues = total, "cached issue lists");
    }
    Ok(())
}

/// The branches to fetch: the explicit list when one was given, else
/// the active set, all validated to git form.
pub fn effective_branches(requested: &[String]) -> Result<Vec<String>> {
    if requested.is_empty() {
        return Ok(ACTIVE_BRANCHES.iter().map(ToString::to_string).collect());
    }
    requested
        .iter()
        .map(|branch| validate_branch(branch, BranchFormat::Git))
        .collect()
}
