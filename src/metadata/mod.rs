//! Static drupal.org metadata: label/code tables, branch dates, and the
//! project, user, and organization registries.
//!
//! The REST API and the issue database traffic in magic integers (status
//! codes, priority codes, taxonomy term ids). The tables here are the
//! single source for translating the short labels used on the command
//! line into those codes and back. All of it is immutable constant data;
//! components take references at construction rather than reaching for
//! globals mid-operation.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::error::{MetricsError, Result};

/// Base URL for the tracker's REST API.
pub const API_BASE: &str = "https://www.drupal.org/api-d7";

/// Substring substitutions that repair the API's `next` page URLs.
///
/// The service emits `next` pointers without the `.json` suffix, which
/// resolve to the HTML endpoint. Each pair is (defective, repaired).
pub const NEXT_URL_REWRITES: &[(&str, &str)] = &[
    ("/api-d7/node?", "/api-d7/node.json?"),
    ("/api-d7/comment?", "/api-d7/comment.json?"),
];

/// JSON field holding an issue's last status-change timestamp.
pub const FIELD_STATUS_CHANGED: &str = "field_issue_last_status_change";

/// JSON field holding a comment's creation timestamp.
pub const FIELD_CREATED: &str = "created";

/// A fixed label -> numeric code table for one filter field.
///
/// Lookup is linear; every table here has under twenty entries.
#[derive(Debug, Clone, Copy)]
pub struct LabelTable {
    field: &'static str,
    entries: &'static [(&'static str, i64)],
}

impl LabelTable {
    #[must_use]
    pub const fn new(field: &'static str, entries: &'static [(&'static str, i64)]) -> Self {
        Self { field, entries }
    }

    /// The filter field this table serves (used in error messages).
    #[must_use]
    pub const fn field(&self) -> &'static str {
        self.field
    }

    /// All (label, code) pairs in table order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, i64)> {
        self.entries.iter().copied()
    }

    /// Resolve a label to its numeric code.
    #[must_use]
    pub fn code(&self, label: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(name, _)| *name == label)
            .map(|(_, code)| *code)
    }

    /// Reverse lookup from code to label.
    #[must_use]
    pub fn label(&self, code: i64) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(name, _)| *name)
    }

    /// Resolve a value list to numeric codes.
    ///
    /// The list must be homogeneous: all short labels or all numeric
    /// codes. The first value fixes the interpretation; a list mixing
    /// the two is rejected rather than guessed at.
    ///
    /// # Errors
    ///
    /// Returns `MixedTypeFilter` when labels and codes are mixed, and
    /// `UnknownLabel` when a label has no entry in this table.
    pub fn resolve<S: AsRef<str>>(&self, values: &[S]) -> Result<Vec<i64>> {
        let Some(first) = values.first() else {
            return Ok(Vec::new());
        };
        let numeric = is_numeric(first.as_ref());
        let mut codes = Vec::with_capacity(values.len());
        for value in values {
            let value = value.as_ref();
            if is_numeric(value) != numeric {
                return Err(MetricsError::MixedTypeFilter {
                    field: self.field.to_string(),
                });
            }
            if numeric {
                codes.push(value.parse::<i64>().map_err(|_| {
                    MetricsError::UnknownLabel {
                        field: self.field.to_string(),
                        label: value.to_string(),
                    }
                })?);
            } else {
                codes.push(
                    self.code(value)
                        .ok_or_else(|| MetricsError::UnknownLabel {
                            field: self.field.to_string(),
                            label: value.to_string(),
                        })?,
                );
            }
        }
        Ok(codes)
    }
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// Issue status codes.
pub static STATUSES: LabelTable = LabelTable::new(
    "status",
    &[
        ("active", 1),
        ("nw", 13),
        ("nr", 8),
        ("rtbc", 14),
        ("postponed", 4),
        ("fixed", 2),
        ("closed_fixed", 7),
    ],
);

/// Issue priority codes.
pub static PRIORITIES: LabelTable = LabelTable::new(
    "priority",
    &[
        ("critical", 400),
        ("major", 300),
        ("normal", 200),
        ("minor", 100),
    ],
);

/// Issue category (type) codes.
pub static CATEGORIES: LabelTable = LabelTable::new(
    "category",
    &[("bug", 1), ("task", 2), ("plan", 5), ("feature", 3)],
);

/// Issue tag term ids from the issue vocabulary.
pub static TERMS: LabelTable = LabelTable::new(
    "term",
    &[
        ("triaged_critical", 197_921),
        ("triaged_major", 174_642),
        ("critical_triage_deferred", 197_925),
        ("major_triage_deferred", 197_926),
        ("major_current_state", 197_923),
        ("needs_major_current_state", 180_003),
        ("fm_review", 169_963),
        ("fefm_review", 186_449),
        ("pm_review", 170_004),
        ("rm_review", 171_496),
        ("js_review", 7_488),
        ("needs_rn", 187_468),
        ("vdc", 36_416),
        ("twig", 36_330),
        ("entity", 38_578),
        ("blocker", 38_080),
        ("api_first", 177_096),
    ],
);

/// The relevant open statuses, in triage display order.
pub const OPEN_STATUSES: &[i64] = &[1, 13, 8, 14, 4];

/// The two fixed statuses (fixed, closed-fixed).
pub const FIXED_STATUSES: &[i64] = &[2, 7];

/// Branches currently receiving issue traffic: the rolling main branch,
/// the stable and maintenance minors, and the next dev/major minors.
pub const ACTIVE_BRANCHES: &[&str] = &["11.x", "10.3.x", "11.1.x", "10.4.x", "11.0.x"];

/// Official start dates for each release branch, in ISO 8601.
pub const BRANCH_DATES: &[(&str, &str)] = &[
    ("8.0.x", "2011-03-08"),
    ("8.1.x", "2015-12-11"),
    ("8.2.x", "2016-03-02"),
    ("8.3.x", "2016-08-02"),
    ("8.4.x", "2017-01-27"),
    ("8.5.x", "2017-07-28"),
    ("8.6.x", "2018-01-12"),
    ("8.7.x", "2018-07-13"),
    ("8.8.x", "2019-03-07"),
    ("8.9.x", "2019-10-10"),
    ("9.0.x", "2019-10-10"),
    ("9.1.x", "2020-04-01"),
    ("9.2.x", "2020-10-16"),
    ("9.3.x", "2021-05-01"),
    ("9.4.x", "2021-10-29"),
    ("10.0.x", "2021-11-30"),
    ("9.5.x", "2022-04-29"),
    ("10.1.x", "2022-06-27"),
    ("11.x", "2023-05-09"),
    ("10.2.x", "2023-10-10"),
    ("10.3.x", "2024-02-21"),
    ("10.4.x", "2024-06-27"),
];

static BRANCH_DATE_MAP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| BRANCH_DATES.iter().copied().collect());

/// Official start date for a branch (`YYYY-MM-DD`), if recorded.
#[must_use]
pub fn branch_date(branch: &str) -> Option<&'static str> {
    BRANCH_DATE_MAP.get(branch).copied()
}

/// A project tracked on the remote service and/or mirrored as a local
/// git clone.
#[derive(Debug, Clone, Copy)]
pub struct Project {
    /// Machine name, as used on the command line and in report output.
    pub name: &'static str,
    /// Numeric project id on the tracker, when the project has one.
    pub tracker_id: Option<i64>,
    /// Directory name of the local clone under the repositories root.
    pub repo_dir: &'static str,
    /// Date the project's history was absorbed into the primary
    /// project, in ISO 8601. Log queries must not run past this point.
    pub absorbed: Option<&'static str>,
    /// The project's core-targeted development branch, for projects
    /// tracked by the contrib commit report.
    pub branch: Option<&'static str>,
}

/// Machine name of the primary project.
pub const PRIMARY_PROJECT: &str = "core";

/// Tracker id of the primary project.
pub const PRIMARY_PROJECT_ID: i64 = 3060;

/// The project registry.
pub const PROJECTS: &[Project] = &[
    Project {
        name: "core",
        tracker_id: Some(3060),
        repo_dir: "drupal",
        absorbed: None,
        branch: None,
    },
    Project {
        name: "automatic_updates",
        tracker_id: Some(2_997_874),
        repo_dir: "automatic_updates",
        absorbed: None,
        branch: Some("8.x-2.x"),
    },
    Project {
        name: "project_browser",
        tracker_id: Some(1_143_512),
        repo_dir: "project_browser",
        absorbed: None,
        branch: Some("1.0.x"),
    },
    Project {
        name: "ckeditor5",
        tracker_id: Some(3_159_840),
        repo_dir: "ckeditor5",
        absorbed: Some("2021-11-11"),
        branch: Some("1.0.x"),
    },
    Project {
        name: "composer-stager",
        tracker_id: None,
        repo_dir: "composer-stager",
        absorbed: None,
        branch: Some("develop"),
    },
    Project {
        name: "composer-integration",
        tracker_id: None,
        repo_dir: "composer-integration",
        absorbed: None,
        branch: Some("main"),
    },
    Project {
        name: "php-tuf",
        tracker_id: None,
        repo_dir: "php-tuf",
        absorbed: None,
        branch: Some("main"),
    },
    Project {
        name: "olivero",
        tracker_id: Some(3_083_133),
        repo_dir: "olivero",
        absorbed: Some("2020-10-16"),
        branch: Some("core-patch"),
    },
    Project {
        name: "claro",
        tracker_id: Some(3_020_054),
        repo_dir: "claro",
        absorbed: Some("2019-10-13"),
        branch: Some("8.x-2.x"),
    },
    Project {
        name: "jsonapi",
        tracker_id: Some(2_723_491),
        repo_dir: "jsonapi",
        absorbed: Some("2019-03-20"),
        branch: Some("8.x-2.x"),
    },
    Project {
        name: "decoupled_menus",
        tracker_id: Some(3_181_806),
        repo_dir: "decoupled_menus",
        absorbed: None,
        branch: None,
    },
    Project {
        name: "a11y_autocomplete",
        tracker_id: Some(3_196_355),
        repo_dir: "a11y_autocomplete",
        absorbed: None,
        branch: None,
    },
    Project {
        name: "once",
        tracker_id: Some(3_195_030),
        repo_dir: "once",
        absorbed: None,
        branch: None,
    },
];

/// Look up a project by machine name.
#[must_use]
pub fn project(name: &str) -> Option<&'static Project> {
    PROJECTS.iter().find(|p| p.name == name)
}

/// Projects carrying a core-targeted contrib branch, registry order.
pub fn contrib_projects() -> impl Iterator<Item = &'static Project> {
    PROJECTS
        .iter()
        .filter(|p| p.name != PRIMARY_PROJECT && p.branch.is_some())
}

/// Tracker user ids for usernames the reports are run for.
pub const USERS: &[(&str, i64)] = &[
    ("dries", 1),
    ("alexpott", 157_725),
    ("catch", 35_733),
    ("cilefen", 1_850_070),
    ("cottser", 1_167_326),
    ("devin", 290_182),
    ("alwaysworking", 1_602_706),
    ("effulgentsia", 78_040),
    ("gabor", 4_166),
    ("jessebeach", 748_566),
    ("larowlan", 395_439),
    ("lauriii", 1_078_742),
    ("moshe", 23),
    ("plach", 183_211),
    ("timplunkett", 241_634),
    ("webchick", 24_967),
    ("wim", 99_777),
    ("xjm", 65_776),
    ("yoroy", 41_502),
    ("system_message", 180_064),
];

/// Tracker organization ids for contribution attribution.
pub const ORGS: &[(&str, i64)] = &[
    ("HeroDevs", 3_379_320),
    ("Salsa Digital", 2_603_032),
    ("Zoocha", 2_377_277),
    ("OPTASY", 2_765_755),
];

/// Tracker uid for a username.
#[must_use]
pub fn user_id(username: &str) -> Option<i64> {
    USERS
        .iter()
        .find(|(name, _)| *name == username)
        .map(|(_, uid)| *uid)
}

/// Organization name for an attribution id.
#[must_use]
pub fn org_name(id: i64) -> Option<&'static str> {
    ORGS.iter()
        .find(|(_, org_id)| *org_id == id)
        .map(|(name, _)| *name)
}
