//! Core data types: issue and comment records as served by the REST
//! API, rows read back from the local store, and parsed commits.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Coerce a JSON value to an integer the way the remote API means it.
///
/// api-d7 serializes every number as a string, and absent-ish values
/// arrive as `null`, `false`, or `""` depending on the field.
#[must_use]
pub fn lenient_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn de_lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(lenient_i64(&value).unwrap_or(0))
}

/// Reference to another entity (term, node, organization) by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRef {
    pub id: i64,
}

/// Reference lists arrive as arrays of `{id, ...}` objects, or as
/// `false` when empty. Entries without a usable id are dropped.
fn de_ref_list<'de, D>(deserializer: D) -> Result<Vec<EntityRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .iter()
        .filter_map(|item| item.get("id").and_then(lenient_i64))
        .map(|id| EntityRef { id })
        .collect())
}

fn de_opt_ref<'de, D>(deserializer: D) -> Result<Option<EntityRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .get("id")
        .and_then(lenient_i64)
        .map(|id| EntityRef { id }))
}

/// Credit entries carry the credited username under `data` when the
/// extended-credit query parameter was set.
fn de_credit_usernames<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(entries) = value else {
        return Ok(Vec::new());
    };
    Ok(entries
        .iter()
        .filter_map(|entry| entry.pointer("/data/username").and_then(Value::as_str))
        .map(ToString::to_string)
        .collect())
}

/// One issue as served by the REST list endpoint.
///
/// Only the fields the local store ingests are modeled; everything else
/// in the payload is ignored. Missing numerics coerce to 0 and missing
/// strings to empty, matching what the store schema tolerates.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueRecord {
    #[serde(rename = "nid", default, deserialize_with = "de_lenient_i64")]
    pub id: i64,
    #[serde(rename = "created", default, deserialize_with = "de_lenient_i64")]
    pub created_at: i64,
    #[serde(rename = "changed", default, deserialize_with = "de_lenient_i64")]
    pub changed_at: i64,
    #[serde(
        rename = "field_issue_last_status_change",
        default,
        deserialize_with = "de_lenient_i64"
    )]
    pub status_changed_at: i64,
    #[serde(
        rename = "field_issue_status",
        default,
        deserialize_with = "de_lenient_i64"
    )]
    pub status: i64,
    #[serde(
        rename = "field_issue_priority",
        default,
        deserialize_with = "de_lenient_i64"
    )]
    pub priority: i64,
    #[serde(
        rename = "field_issue_category",
        default,
        deserialize_with = "de_lenient_i64"
    )]
    pub category: i64,
    #[serde(rename = "field_issue_version", default)]
    pub version: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "field_issue_component", default)]
    pub component: String,
    #[serde(
        rename = "taxonomy_vocabulary_9",
        default,
        deserialize_with = "de_ref_list"
    )]
    pub tags: Vec<EntityRef>,
}

/// One comment as served by the comment endpoint, reduced to the fields
/// the contribution-credit report uses.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentRecord {
    #[serde(default, deserialize_with = "de_lenient_i64")]
    pub created: i64,
    /// Organizations the comment's work was attributed to.
    #[serde(
        rename = "field_attribute_contribution_to",
        default,
        deserialize_with = "de_ref_list"
    )]
    pub orgs: Vec<EntityRef>,
    /// The issue the comment was posted on.
    #[serde(default, deserialize_with = "de_opt_ref")]
    pub node: Option<EntityRef>,
}

/// The slice of a full single-issue record the credit report needs.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueState {
    #[serde(rename = "nid", default, deserialize_with = "de_lenient_i64")]
    pub id: i64,
    #[serde(
        rename = "field_issue_status",
        default,
        deserialize_with = "de_lenient_i64"
    )]
    pub status: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(
        rename = "field_issue_credit",
        default,
        deserialize_with = "de_credit_usernames"
    )]
    pub credited: Vec<String>,
}

impl IssueState {
    /// Whether the tracker credits `username` on this issue.
    #[must_use]
    pub fn is_credited(&self, username: &str) -> bool {
        self.credited.iter().any(|name| name == username)
    }

    /// The issue's canonical URL, reconstructed when the payload lacks
    /// one.
    #[must_use]
    pub fn link(&self) -> String {
        if self.url.is_empty() {
            format!("https://www.drupal.org/node/{}", self.id)
        } else {
            self.url.clone()
        }
    }
}

/// One row of the `issues` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRow {
    pub id: i64,
    pub created_at: i64,
    pub changed_at: i64,
    pub status_changed_at: i64,
    pub status: i64,
    pub priority: i64,
    pub category: i64,
    pub version: String,
    pub title: String,
    pub component: String,
}

/// One commit pulled out of a git log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommit {
    /// Author date of the commit.
    pub date: NaiveDate,
    /// For the primary project, everything after the first colon of the
    /// subject; for other repositories, the full subject.
    pub message: String,
}
