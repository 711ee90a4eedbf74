//! Release metrics for drupal.org issue data and core git history.
//!
//! The crate aggregates two sources for reporting on a large open-source
//! project: the issue tracker's REST API (fetched page by page into a
//! weekly on-disk cache, then loaded into a local SQLite store) and git
//! history from local clones of the project's repositories. The reports
//! built on top serve release triage (untriaged criticals), fix audits
//! (which branches really received a fix), and contribution credit.
//!
//! # Architecture
//!
//! - [`metadata`]: immutable label/code tables, branch dates, and the
//!   project/user/organization registries, injected into components.
//! - [`branch`]: release-branch validation and the co-released branch
//!   policy ([`branch::BranchPolicy`]).
//! - [`fetch`]: resumable paginated REST fetching with full/partial
//!   caching ([`fetch::PagedFetcher`]).
//! - [`store`]: the local SQLite issue store ([`store::LocalStore`]).
//! - [`query`]: filter specifications compiled to parameterized SQL
//!   ([`query::IssueFilter`]).
//! - [`gitlog`]: `git log` invocation and subject parsing
//!   ([`gitlog::CommitLogParser`]).
//! - [`cli`] and [`report`]: the `tm` command surface and CSV/Markdown
//!   printers.
//!
//! Issue metadata alone is unreliable for "which branch got the fix":
//! backports land in several co-released branches and the version field
//! is set by hand. The branch policy therefore over-approximates, and
//! the fix reports intersect its answer with the commit log before
//! claiming anything.

pub mod branch;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod gitlog;
pub mod logging;
pub mod metadata;
pub mod model;
pub mod query;
pub mod report;
pub mod store;
pub mod util;

pub use error::{MetricsError, Result};
