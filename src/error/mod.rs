//! Error types and handling for `tracker_metrics`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Supports `anyhow` integration at the command layer
//! - Separates transient fetch failures (retried once) from fatal ones
//! - Provides recovery hints for user-facing errors

use thiserror::Error;

/// Primary error type for `tracker_metrics` operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    // === Branch Errors ===
    /// Branch string does not match the release-branch format.
    #[error("Invalid branch format: '{branch}'")]
    InvalidBranchFormat { branch: String },

    /// Branch is well-formed but outside the known release policy.
    #[error("Unknown release branch: '{branch}'")]
    UnknownBranch { branch: String },

    /// Branch name contains characters unsafe to pass to git.
    #[error("Invalid git branch name: '{branch}'")]
    InvalidGitBranch { branch: String },

    // === Fetch Errors ===
    /// A from-cache-only read found no full cache entry.
    #[error("No cached data for query '{query}'; run the fetch first")]
    CacheMiss { query: String },

    /// Server answered with a retryable status (429/503).
    #[error("Transient HTTP {status} from {url}")]
    TransientHttp { url: String, status: u16 },

    /// Server answered with a non-retryable error status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// Page body was not the expected JSON shape.
    #[error("Unparseable page from {url}: {reason}")]
    PageParse { url: String, reason: String },

    /// A multi-page fetch aborted; accumulated pages were saved.
    #[error("Fetch of '{query}' aborted at page {page} (partial results saved): {source}")]
    FetchAborted {
        query: String,
        page: u32,
        #[source]
        source: Box<MetricsError>,
    },

    /// The per-invocation page cap fired with pages still remaining.
    #[error("Fetch of '{query}' stopped at the {pages}-page cap (partial results saved)")]
    PageCapReached { query: String, pages: u32 },

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // === Filter Errors ===
    /// Both a changed range and a status-changed range were set.
    #[error("Conflicting date filters: changed and status-changed ranges are mutually exclusive")]
    ConflictingDateFilter,

    /// A single filter value list mixed labels and numeric codes.
    #[error("Filter '{field}' mixes labels and numeric codes")]
    MixedTypeFilter { field: String },

    /// A label had no entry in the metadata table for its field.
    #[error("Unknown {field} label: '{label}'")]
    UnknownLabel { field: String, label: String },

    // === Git Log Errors ===
    /// Log output was non-empty but carried no parseable records.
    #[error("Empty or malformed git log for branch '{branch}'")]
    EmptyOrMalformedLog { branch: String },

    /// The git subprocess itself failed.
    #[error("git {args} failed: {stderr}")]
    GitCommand { args: String, stderr: String },

    // === Registry Errors ===
    /// A date argument was not `YYYY-MM-DD`.
    #[error("Invalid {field} date: '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { field: String, value: String },

    /// Project name missing from the project registry.
    #[error("Unknown project: '{project}'")]
    UnknownProject { project: String },

    /// Username missing from the user registry.
    #[error("Unknown user: '{username}'")]
    UnknownUser { username: String },

    // === Configuration Errors ===
    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    // === Passthrough Errors ===
    /// `SQLite` database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Wrapped anyhow error from the command layer.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MetricsError {
    /// Is this a single-page failure worth one retry before aborting?
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::TransientHttp { .. } | Self::PageParse { .. } => true,
            Self::Http(err) => err.is_timeout() || err.is_connect() || err.is_body(),
            _ => false,
        }
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::CacheMiss { .. } => Some("Run: tm fetch (or tm fetch-fixed) before populating"),
            Self::FetchAborted { .. } | Self::PageCapReached { .. } => {
                Some("Re-run the same fetch to resume from the saved partial results")
            }
            Self::ConflictingDateFilter => {
                Some("Set either a changed range or a status-changed range, not both")
            }
            Self::MixedTypeFilter { .. } => {
                Some("Pass all labels or all numeric codes, not a mixture")
            }
            Self::UnknownBranch { .. } => {
                Some("Branch minors must exist under the release policy (e.g. 9.5.x, 11.x)")
            }
            _ => None,
        }
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        1
    }
}

/// Result type using `MetricsError`.
pub type Result<T> = std::result::Result<T, MetricsError>;
