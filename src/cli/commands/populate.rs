//! Load this week's cached fetch results into the local store.

use serde_json::Value;
use std::fs;
use tracing::{info, warn};

use crate::cli::PopulateArgs;
use crate::config::Config;
use crate::error::Result;
use crate::fetch::{FetchCache, HttpSource, IssueListRequest, PagedFetcher};
use crate::metadata::CATEGORIES;
use crate::model::IssueRecord;
use crate::store::{LocalStore, UpsertStats};

use super::fetch::effective_branches;

/// Execute the populate command.
///
/// Strictly cache-to-database: every (category, branch) sub-query must
/// already sit in this week's full cache, and nothing here touches the
/// network. A missing sub-query aborts with a pointer at the fetch
/// command rather than silently loading less than asked for.
///
/// # Errors
///
/// Returns `CacheMiss` for an unfetched sub-query, label and branch
/// errors for bad arguments, and database errors from the load itself.
pub fn execute(args: &PopulateArgs, config: &Config) -> Result<()> {
    let branches = effective_branches(&args.branches)?;
    let categories = CATEGORIES.resolve(&args.types)?;

    if let Some(parent) = config.db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut store = LocalStore::open(&config.db_path)?;
    if args.reset {
        info!("dropping and recreating tables");
        store.drop_schema()?;
        store.create_schema()?;
    } else if args.truncate {
        info!("truncating tables");
        store.truncate()?;
    }

    let source = HttpSource::new()?;
    let fetcher = PagedFetcher::new(&source, FetchCache::new(&config.cache_dir));

    let mut totals = UpsertStats::default();
    let mut skipped_total = 0;
    for (name, category) in args.types.iter().zip(&categories) {
        let request = IssueListRequest::new(branches.clone(), Some(*category));
        let results = fetcher.fetch_all_from_cache(&request)?;

        for branch in &branches {
            let (records, skipped) = decode_records(&results[branch.as_str()]);
            let stats = store.upsert_issue_batch(&records)?;
            info!(
                category = %name,
                branch = %branch,
                inserted = stats.inserted,
                ignored = stats.ignored,
                skipped,
                "loaded cached issues"
            );
            totals.inserted += stats.inserted;
            totals.ignored += stats.ignored;
            skipped_total += skipped;
        }
    }

    if skipped_total > 0 {
        warn!(skipped = skipped_total, "some cached items could not be decoded");
    }
    println!(
        "Loaded {} new issues ({} already present).",
        totals.inserted, totals.ignored
    );
    Ok(())
}

/// Decode cached items into issue records. Items without a usable
/// numeric id, or that are not objects at all, are counted and dropped;
/// one defective item must not abort a batch of thousands.
fn decode_records(items: &[Value]) -> (Vec<IssueRecord>, usize) {
    let mut records = Vec::with_capacity(items.len());
    let mut skipped = 0;
    for item in items {
        match serde_json::from_value::<IssueRecord>(item.clone()) {
            Ok(record) if record.id > 0 => records.push(record),
            Ok(_) => skipped += 1,
            Err(err) => {
                warn!(error = %err, "skipping undecodable issue item");
                skipped += 1;
            }
        }
    }
    (records, skipped)
}
