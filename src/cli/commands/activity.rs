//! Markdown contribution-credit report for one user: recent comments
//! bucketed by attributed organization, cross-checked against live
//! issue state and the tracker's credit field.

use chrono::{Duration, NaiveDate, Utc};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::cli::ActivityArgs;
use crate::config::Config;
use crate::error::{MetricsError, Result};
use crate::fetch::{
    Completion, FetchCache, HttpSource, PagedFetcher, SingleIssueRequest, UserCommentsRequest,
};
use crate::metadata::{org_name, user_id, FIXED_STATUSES, OPEN_STATUSES};
use crate::model::{CommentRecord, IssueState};
use crate::query::IssueFilter;
use crate::report::{bullet, section};
use crate::store::LocalStore;
use crate::util::progress::{create_spinner, should_show_progress};
use crate::util::time::{day_start, last_report_week, long_date, parse_date};

/// Execute the activity command.
///
/// The report frames the user's commented issues per organization the
/// comments were attributed to. Credit gating differs by section: a
/// fixed issue is only listed when the tracker credits the user on it,
/// an open issue is listed unconditionally (work in progress is work).
///
/// Issues fixed inside the window without an in-window comment carry no
/// attribution data, so they cannot be bucketed; they appear in a
/// trailing credited-only section instead, and only when the local
/// store is fresh enough to enumerate them.
///
/// # Errors
///
/// Returns `UnknownUser` for an unregistered username, `InvalidDate`
/// for bad window arguments, and fetch/store errors from the lookups.
pub fn execute(args: &ActivityArgs, config: &Config) -> Result<()> {
    let uid = user_id(&args.username).ok_or_else(|| MetricsError::UnknownUser {
        username: args.username.clone(),
    })?;
    let now = Utc::now();
    let (start, end) = resolve_window(args.start.as_deref(), args.end.as_deref(), now.date_naive())?;
    let (start_ts, end_ts) = (day_start(start), day_start(end));
    info!(username = %args.username, uid, %start, %end, "building credit report");

    let source = HttpSource::new()?;
    let fetcher = PagedFetcher::new(&source, FetchCache::new(&config.cache_dir));

    let spinner = create_spinner(
        &format!("Fetching recent comments by {}", args.username),
        should_show_progress(),
    );
    let results = fetcher.fetch(&UserCommentsRequest::new(uid), Completion::recent_comments(now))?;
    spinner.finish_and_clear();

    // Single sub-query; flatten rather than address it by key.
    let comments = decode_comments(results.into_values().flatten().collect());
    let buckets = bucket_comments(&comments, start_ts, end_ts);
    if buckets.by_org.is_empty() {
        info!("no attributed comments inside the window");
    }

    let store = LocalStore::open(&config.db_path)?;
    let fresh = store.max_changed_at()?.is_some_and(|ts| ts >= end_ts);
    let mut fetch_ids = buckets.commented.clone();
    if fresh {
        info!("local store is fresh, adding issues fixed inside the window");
        let filters = [
            IssueFilter::fixed_between(start_ts, end_ts)?,
            IssueFilter::closed_fixed_between(start_ts, end_ts)?,
        ];
        for filter in filters {
            for row in filter.compile()?.run(store.connection())? {
                if !fetch_ids.contains(&row.id) {
                    fetch_ids.push(row.id);
                }
            }
        }
    } else {
        eprintln!("The local issue database is not up to date.");
        eprintln!("To also list issues fixed during the window but commented on earlier, run:");
        eprintln!("    tm fetch");
        eprintln!("    tm populate");
        eprintln!("Note: this data is optional, and updating it can take hours.");
    }

    let states = if fetch_ids.is_empty() {
        HashMap::new()
    } else {
        let spinner = create_spinner(
            &format!("Fetching {} issue records", fetch_ids.len()),
            should_show_progress(),
        );
        let results = fetcher.fetch(&SingleIssueRequest::new(fetch_ids.clone()), Completion::Exhaustive)?;
        spinner.finish_and_clear();
        decode_states(results)
    };

    let mut supplement: Vec<i64> = fetch_ids
        .iter()
        .copied()
        .filter(|id| !buckets.commented.contains(id))
        .collect();
    supplement.sort_unstable();

    print!(
        "{}",
        render_report(&args.username, start, end, &buckets, &states, &supplement)
    );
    Ok(())
}

/// Resolve the reporting window. No dates: the most recent complete
/// Monday-to-Monday week. Start only: one week from the start. The
/// window is half-open, `[start, end)`.
fn resolve_window(
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate)> {
    let (start, end) = match (start, end) {
        (None, _) => last_report_week(today),
        (Some(start), None) => {
            let start = parse_date(start, "start")?;
            (start, start + Duration::days(7))
        }
        (Some(start), Some(end)) => (parse_date(start, "start")?, parse_date(end, "end")?),
    };
    if start >= end {
        return Err(anyhow::anyhow!("the start date must fall before the end date").into());
    }
    Ok((start, end))
}

fn decode_comments(items: Vec<Value>) -> Vec<CommentRecord> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(comment) => Some(comment),
            Err(err) => {
                warn!(error = %err, "skipping undecodable comment");
                None
            }
        })
        .collect()
}

/// Issues from in-window attributed comments, grouped by organization.
#[derive(Debug, Default)]
struct OrgBuckets {
    /// Organization id to issue ids, both in first-seen order.
    by_org: Vec<(i64, Vec<i64>)>,
    /// Every issue commented on inside the window, first-seen order.
    commented: Vec<i64>,
}

fn bucket_comments(comments: &[CommentRecord], start: i64, end: i64) -> OrgBuckets {
    let mut buckets = OrgBuckets::default();
    for comment in comments {
        if comment.created < start || comment.created >= end {
            continue;
        }
        let Some(node) = comment.node else { continue };
        for org in &comment.orgs {
            let index = match buckets.by_org.iter().position(|(id, _)| *id == org.id) {
                Some(index) => index,
                None => {
                    buckets.by_org.push((org.id, Vec::new()));
                    buckets.by_org.len() - 1
                }
            };
            let bucket = &mut buckets.by_org[index].1;
            if !bucket.contains(&node.id) {
                bucket.push(node.id);
            }
            if !buckets.commented.contains(&node.id) {
                buckets.commented.push(node.id);
            }
        }
    }
    buckets
}

/// Map single-issue results to issue states by id. Results that decode
/// badly are logged and dropped; one defective record must not sink the
/// whole report.
fn decode_states(results: HashMap<String, Vec<Value>>) -> HashMap<i64, IssueState> {
    let mut states = HashMap::with_capacity(results.len());
    for (key, items) in results {
        let Some(item) = items.into_iter().next() else {
            warn!(key, "empty single-issue result");
            continue;
        };
        match serde_json::from_value::<IssueState>(item) {
            Ok(state) if state.id > 0 => {
                states.insert(state.id, state);
            }
            Ok(_) => warn!(key, "issue record without an id"),
            Err(err) => warn!(key, error = %err, "skipping undecodable issue record"),
        }
    }
    states
}

fn render_report(
    username: &str,
    start: NaiveDate,
    end: NaiveDate,
    buckets: &OrgBuckets,
    states: &HashMap<i64, IssueState>,
    supplement: &[i64],
) -> String {
    let window = format!("{} through {}", long_date(start), long_date(end));
    let mut out = String::new();

    for (org_id, ids) in &buckets.by_org {
        let org = org_name(*org_id)
            .map_or_else(|| format!("organization {org_id}"), ToString::to_string);
        out.push_str(&format!(
            "# Issues attributed to {org} by {username} for {window}\n"
        ));

        out.push_str(&section("Fixed issues"));
        for state in ids.iter().filter_map(|id| states.get(id)) {
            if FIXED_STATUSES.contains(&state.status) && state.is_credited(username) {
                out.push_str(&bullet(&issue_item(state)));
                out.push('\n');
            }
        }

        out.push_str(&section("Open issues"));
        for state in ids.iter().filter_map(|id| states.get(id)) {
            if OPEN_STATUSES.contains(&state.status) {
                out.push_str(&bullet(&issue_item(state)));
                out.push('\n');
            }
        }
        out.push('\n');
    }

    let credited: Vec<&IssueState> = supplement
        .iter()
        .filter_map(|id| states.get(id))
        .filter(|state| state.is_credited(username))
        .collect();
    if !credited.is_empty() {
        out.push_str(&format!(
            "# Issues fixed from previous weeks credited to {username} for {window}\n\n"
        ));
        for state in credited {
            out.push_str(&bullet(&issue_item(state)));
            out.push('\n');
        }
    }
    out
}

fn issue_item(state: &IssueState) -> String {
    format!("[{}]({})", state.title, state.link())
}
