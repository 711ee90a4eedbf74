//! Release-branch validation and the fix-relevant branch policy.
//!
//! Release engineering lets several adjacent branches receive the same
//! commit in the same time window, and the branching policy itself has
//! shifted over the years (minor caps per major, the rolling `11.x`
//! main branch, triple-overlap windows around major cut-overs).
//! [`BranchPolicy::branch_set`] computes the over-approximated set of
//! branches that could plausibly carry a fix targeted at one branch.
//! The result is advisory; callers cross-check it against the commit
//! log before treating any branch as the true fix location.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{MetricsError, Result};

/// The rolling main-development branch.
pub const ROLLING_BRANCH: &str = "11.x";

/// The two spellings a release branch travels under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchFormat {
    /// Git branch form, e.g. `9.4.x`.
    Git,
    /// Issue-queue form, e.g. `9.4.x-dev`.
    Issue,
}

// Both patterns are static and valid.
static BRANCH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)\.([0-9]+)\.x(-dev)?$").unwrap());
static GIT_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_./-]+$").unwrap());

/// Validate a release-branch name and normalize it to the requested
/// format.
///
/// Accepts either spelling (`9.4.x` or `9.4.x-dev`); the rolling main
/// branch is special-cased in both spellings.
///
/// # Errors
///
/// Returns `InvalidBranchFormat` when the string is neither spelling.
pub fn validate_branch(branch: &str, format: BranchFormat) -> Result<String> {
    if branch == ROLLING_BRANCH || branch == "11.x-dev" {
        return Ok(match format {
            BranchFormat::Git => ROLLING_BRANCH.to_string(),
            BranchFormat::Issue => format!("{ROLLING_BRANCH}-dev"),
        });
    }
    let captures = BRANCH_RE
        .captures(branch)
        .ok_or_else(|| MetricsError::InvalidBranchFormat {
            branch: branch.to_string(),
        })?;
    let bare = format!("{}.{}.x", &captures[1], &captures[2]);
    Ok(match format {
        BranchFormat::Git => bare,
        BranchFormat::Issue => format!("{bare}-dev"),
    })
}

/// Allowlist check for arbitrary git branch names.
///
/// Contrib projects use branches like `8.x-2.x` or `feature/foo` that
/// the release-branch regex rejects. Rather than a monster regex over
/// everything git permits, only commonly used safe characters pass.
///
/// # Errors
///
/// Returns `InvalidGitBranch` when disallowed characters are present.
pub fn sanitize_branch(branch: &str) -> Result<&str> {
    if GIT_NAME_RE.is_match(branch) {
        Ok(branch)
    } else {
        Err(MetricsError::InvalidGitBranch {
            branch: branch.to_string(),
        })
    }
}

/// One era-spanning record of the release-branching policy.
#[derive(Debug, Clone, Copy)]
pub struct PolicyTable {
    /// The rolling main-development branch identifier.
    pub rolling: &'static str,
    /// Highest known minor per major version.
    pub minor_caps: &'static [(u32, u32)],
    /// Explicit historical overlaps: branch -> extra co-released
    /// branches, applied in order after the adjacency walk. Overlaps
    /// only ever add branches.
    pub overlaps: &'static [(&'static str, &'static [&'static str])],
}

/// The release policy as practiced, majors 8 through 11.
///
/// The overlap entries record the windows around major cut-overs where
/// a fix landed in branches of two majors at once.
pub const RELEASE_POLICY: PolicyTable = PolicyTable {
    rolling: ROLLING_BRANCH,
    minor_caps: &[(8, 9), (9, 5), (10, 5), (11, 5)],
    overlaps: &[
        ("8.7.x", &["9.0.x"]),
        ("8.8.x", &["9.0.x"]),
        ("8.9.x", &["9.0.x", "9.1.x", "9.2.x"]),
        ("9.0.x", &["8.7.x", "8.8.x", "8.9.x"]),
        ("9.1.x", &["8.9.x"]),
        ("9.2.x", &["8.9.x", "10.0.x"]),
        ("9.3.x", &["10.0.x"]),
        ("9.4.x", &["10.0.x"]),
        ("9.5.x", &["10.0.x", "10.1.x", "10.2.x"]),
        ("10.0.x", &["9.2.x", "9.3.x", "9.4.x", "9.5.x"]),
        ("10.1.x", &["9.5.x"]),
        ("10.2.x", &["9.5.x"]),
    ],
};

/// Computes fix-relevant branch sets under an injected policy table.
#[derive(Debug, Clone, Copy)]
pub struct BranchPolicy {
    table: &'static PolicyTable,
}

impl Default for BranchPolicy {
    fn default() -> Self {
        Self::new(&RELEASE_POLICY)
    }
}

impl BranchPolicy {
    #[must_use]
    pub const fn new(table: &'static PolicyTable) -> Self {
        Self { table }
    }

    /// Branches that could plausibly carry a fix targeted at `branch`.
    ///
    /// Starts from the branch itself, walks up to two adjacent minors
    /// in each direction within the major (bounded below by `.0` and
    /// above by the major's minor cap), then applies the overlap table
    /// in order. The result is deduplicated, preserves first-seen
    /// order, and always contains the input branch. The rolling branch
    /// has no adjacent minors and yields itself plus its overlaps.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBranchFormat` for unparseable input, and
    /// `UnknownBranch` when the major has no cap entry or the minor
    /// exceeds the cap.
    pub fn branch_set(&self, branch: &str) -> Result<Vec<String>> {
        let branch = validate_branch(branch, BranchFormat::Git)?;

        let mut set: Vec<String> = Vec::new();
        if branch == self.table.rolling {
            set.push(branch.clone());
        } else {
            let (major, minor) =
                split_branch(&branch).ok_or_else(|| MetricsError::UnknownBranch {
                    branch: branch.clone(),
                })?;
            let cap = self
                .minor_cap(major)
                .filter(|cap| minor <= *cap)
                .ok_or_else(|| MetricsError::UnknownBranch {
                    branch: branch.clone(),
                })?;

            set.push(branch.clone());
            for step in 1..=2u32 {
                if minor >= step {
                    push_unique(&mut set, format!("{major}.{}.x", minor - step));
                }
            }
            for step in 1..=2u32 {
                if minor + step <= cap {
                    push_unique(&mut set, format!("{major}.{}.x", minor + step));
                }
            }
        }

        for (key, extras) in self.table.overlaps {
            if *key == branch {
                for extra in *extras {
                    push_unique(&mut set, (*extra).to_string());
                }
            }
        }
        Ok(set)
    }

    fn minor_cap(&self, major: u32) -> Option<u32> {
        self.table
            .minor_caps
            .iter()
            .find(|(m, _)| *m == major)
            .map(|(_, cap)| *cap)
    }
}

fn split_branch(branch: &str) -> Option<(u32, u32)> {
    let captures = BRANCH_RE.captures(branch)?;
    let major = captures[1].parse().ok()?;
    let minor = captures[2].parse().ok()?;
    Some((major, minor))
}

fn push_unique(set: &mut Vec<String>, branch: String) {
    if !set.iter().any(|b| b == &branch) {
        set.push(branch);
    }
}
