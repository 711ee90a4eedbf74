//! Request builders for the tracker's REST endpoints.
//!
//! A request is a set of named sub-query URLs; the fetcher caches and
//! paginates each sub-query independently, and downstream jobs address
//! results by the sub-query key.

use crate::metadata::{API_BASE, FIXED_STATUSES, PRIMARY_PROJECT_ID, STATUSES};

/// A named set of list-endpoint URLs to fetch.
pub trait Request {
    /// (key, URL) pairs in fetch order. Keys are stable across runs;
    /// they address cache lookups and error messages.
    fn urls(&self) -> Vec<(String, String)>;

    /// Short human label for logs and progress output.
    fn label(&self) -> String;
}

/// Open-issue lists for a set of branches, optionally narrowed to one
/// category. Keyed by branch.
#[derive(Debug, Clone)]
pub struct IssueListRequest {
    branches: Vec<String>,
    category: Option<i64>,
}

impl IssueListRequest {
    #[must_use]
    pub fn new(branches: Vec<String>, category: Option<i64>) -> Self {
        Self { branches, category }
    }
}

impl Request for IssueListRequest {
    fn urls(&self) -> Vec<(String, String)> {
        self.branches
            .iter()
            .map(|branch| {
                let mut url = format!(
                    "{API_BASE}/node.json?type=project_issue&field_project={PRIMARY_PROJECT_ID}"
                );
                if let Some(category) = self.category {
                    url.push_str(&format!("&field_issue_category={category}"));
                }
                url.push_str(&format!("&field_issue_version={branch}-dev"));
                (branch.clone(), url)
            })
            .collect()
    }

    fn label(&self) -> String {
        format!("issue lists for {} branches", self.branches.len())
    }
}

/// Fixed-issue lists for a set of branches. The API takes no value
/// arrays, so each (branch, fixed status) pair is its own sub-query,
/// keyed `"<branch>/<status label>"` so the two fixed statuses cannot
/// collide.
#[derive(Debug, Clone)]
pub struct FixedIssueListRequest {
    branches: Vec<String>,
    category: Option<i64>,
}

impl FixedIssueListRequest {
    #[must_use]
    pub fn new(branches: Vec<String>, category: Option<i64>) -> Self {
        Self { branches, category }
    }
}

impl Request for FixedIssueListRequest {
    fn urls(&self) -> Vec<(String, String)> {
        let fixed: Vec<(&str, i64)> = STATUSES
            .entries()
            .filter(|(_, code)| FIXED_STATUSES.contains(code))
            .collect();

        self.branches
            .iter()
            .flat_map(|branch| {
                fixed.iter().map(move |&(label, code)| {
                    let mut url = format!(
                        "{API_BASE}/node.json?type=project_issue&field_project={PRIMARY_PROJECT_ID}"
                    );
                    if let Some(category) = self.category {
                        url.push_str(&format!("&field_issue_category={category}"));
                    }
                    url.push_str(&format!(
                        "&field_issue_status={code}&field_issue_version={branch}-dev"
                    ));
                    (format!("{branch}/{label}"), url)
                })
            })
            .collect()
    }

    fn label(&self) -> String {
        format!("fixed issue lists for {} branches", self.branches.len())
    }
}

/// Full single-issue records, with extended credit data. Keyed by id.
#[derive(Debug, Clone)]
pub struct SingleIssueRequest {
    ids: Vec<i64>,
}

impl SingleIssueRequest {
    #[must_use]
    pub fn new(ids: Vec<i64>) -> Self {
        Self { ids }
    }
}

impl Request for SingleIssueRequest {
    fn urls(&self) -> Vec<(String, String)> {
        self.ids
            .iter()
            .map(|id| {
                (
                    id.to_string(),
                    format!("{API_BASE}/node/{id}.json?drupalorg_extra_credit=1"),
                )
            })
            .collect()
    }

    fn label(&self) -> String {
        format!("{} issue records", self.ids.len())
    }
}

/// A user's comments, newest first. Single sub-query.
#[derive(Debug, Clone)]
pub struct UserCommentsRequest {
    uid: i64,
}

impl UserCommentsRequest {
    #[must_use]
    pub const fn new(uid: i64) -> Self {
        Self { uid }
    }
}

impl Request for UserCommentsRequest {
    fn urls(&self) -> Vec<(String, String)> {
        vec![(
            "recent comments".to_string(),
            format!(
                "{API_BASE}/comment.json?author={}&sort=created&direction=DESC",
                self.uid
            ),
        )]
    }

    fn label(&self) -> String {
        format!("recent comments for uid {}", self.uid)
    }
}
