//! Filter specifications and their compilation to SQL.
//!
//! `IssueFilterBuilder` resolves human input (labels or numeric codes,
//! branch names) into a frozen [`IssueFilter`]; `IssueFilter::compile`
//! turns that into one parameterized SELECT against the local store.
//! All label validation happens in the builder, so the compiler itself
//! trusts its input to be numeric and well-typed.

use rusqlite::{Connection, ToSql};
use std::fmt::Write as _;

use crate::branch::{BranchFormat, BranchPolicy, validate_branch};
use crate::error::{MetricsError, Result};
use crate::metadata::{CATEGORIES, FIXED_STATUSES, OPEN_STATUSES, PRIORITIES, STATUSES, TERMS};
use crate::model::IssueRow;

const SELECT_COLUMNS: &str = "SELECT issues.id, issues.created_at, issues.changed_at, \
     issues.status_changed_at, issues.status, issues.priority, issues.category, \
     issues.version, issues.title, issues.component FROM issues";

/// Half-open `[after, before)` timestamp window on one column.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub after: Option<i64>,
    pub before: Option<i64>,
}

impl TimeRange {
    const fn is_empty(&self) -> bool {
        self.after.is_none() && self.before.is_none()
    }
}

/// Builds an [`IssueFilter`], resolving labels to codes as values arrive.
///
/// Value lists must be homogeneous per field (all labels or all codes);
/// version lists accept either branch format and normalize to the issue
/// format (`9.4.x-dev`).
#[derive(Debug, Default, Clone)]
pub struct IssueFilterBuilder {
    categories: Vec<i64>,
    versions: Vec<String>,
    priorities: Vec<i64>,
    statuses: Option<Vec<i64>>,
    components: Vec<String>,
    terms: Vec<i64>,
    exclude_terms: bool,
    changed: TimeRange,
    status_changed: TimeRange,
}

impl IssueFilterBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns `MixedTypeFilter` or `UnknownLabel` on bad category values.
    pub fn categories<S: AsRef<str>>(mut self, values: &[S]) -> Result<Self> {
        self.categories = CATEGORIES.resolve(values)?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns `MixedTypeFilter` or `UnknownLabel` on bad priority values.
    pub fn priorities<S: AsRef<str>>(mut self, values: &[S]) -> Result<Self> {
        self.priorities = PRIORITIES.resolve(values)?;
        Ok(self)
    }

    /// Set explicit statuses. When never called, compilation defaults to
    /// the open set.
    ///
    /// # Errors
    ///
    /// Returns `MixedTypeFilter` or `UnknownLabel` on bad status values.
    pub fn statuses<S: AsRef<str>>(mut self, values: &[S]) -> Result<Self> {
        self.statuses = Some(STATUSES.resolve(values)?);
        Ok(self)
    }

    /// Restrict to issue versions. Accepts either branch format and
    /// stores the issue format the tracker uses.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBranchFormat` on a malformed branch name.
    pub fn versions<S: AsRef<str>>(mut self, values: &[S]) -> Result<Self> {
        let mut versions = Vec::with_capacity(values.len());
        for value in values {
            versions.push(validate_branch(value.as_ref(), BranchFormat::Issue)?);
        }
        self.versions = versions;
        Ok(self)
    }

    #[must_use]
    pub fn components<S: AsRef<str>>(mut self, values: &[S]) -> Self {
        self.components = values.iter().map(|v| v.as_ref().to_string()).collect();
        self
    }

    /// Restrict to issues carrying any of the given tags.
    ///
    /// # Errors
    ///
    /// Returns `MixedTypeFilter` or `UnknownLabel` on bad term values.
    pub fn include_terms<S: AsRef<str>>(mut self, values: &[S]) -> Result<Self> {
        self.terms = TERMS.resolve(values)?;
        self.exclude_terms = false;
        Ok(self)
    }

    /// Drop issues carrying any of the given tags.
    ///
    /// # Errors
    ///
    /// Returns `MixedTypeFilter` or `UnknownLabel` on bad term values.
    pub fn exclude_terms<S: AsRef<str>>(mut self, values: &[S]) -> Result<Self> {
        self.terms = TERMS.resolve(values)?;
        self.exclude_terms = true;
        Ok(self)
    }

    #[must_use]
    pub const fn changed_after(mut self, timestamp: i64) -> Self {
        self.changed.after = Some(timestamp);
        self
    }

    #[must_use]
    pub const fn changed_before(mut self, timestamp: i64) -> Self {
        self.changed.before = Some(timestamp);
        self
    }

    #[must_use]
    pub const fn status_changed_after(mut self, timestamp: i64) -> Self {
        self.status_changed.after = Some(timestamp);
        self
    }

    #[must_use]
    pub const fn status_changed_before(mut self, timestamp: i64) -> Self {
        self.status_changed.before = Some(timestamp);
        self
    }

    /// Freeze into an immutable filter. Conflicts surface at compile
    /// time, not here.
    #[must_use]
    pub fn build(self) -> IssueFilter {
        IssueFilter {
            categories: self.categories,
            versions: self.versions,
            priorities: self.priorities,
            statuses: self.statuses,
            components: self.components,
            terms: self.terms,
            exclude_terms: self.exclude_terms,
            changed: self.changed,
            status_changed: self.status_changed,
        }
    }
}

/// An immutable filter specification over the local issue store.
#[derive(Debug, Clone)]
pub struct IssueFilter {
    categories: Vec<i64>,
    versions: Vec<String>,
    priorities: Vec<i64>,
    statuses: Option<Vec<i64>>,
    components: Vec<String>,
    terms: Vec<i64>,
    exclude_terms: bool,
    changed: TimeRange,
    status_changed: TimeRange,
}

impl IssueFilter {
    /// Open critical bugs not yet triaged: category bug, priority
    /// critical, minus issues tagged as triaged or deferred.
    ///
    /// # Errors
    ///
    /// Does not fail with the built-in tables; the signature matches the
    /// other presets.
    pub fn untriaged_critical_bugs() -> Result<Self> {
        Ok(IssueFilterBuilder::new()
            .categories(&["bug"])?
            .priorities(&["critical"])?
            .exclude_terms(&["triaged_critical", "critical_triage_deferred"])?
            .build())
    }

    /// Issues fixed in `branch` or any branch that co-released fixes
    /// with it.
    ///
    /// # Errors
    ///
    /// Returns branch errors from `branch_set` and label errors from the
    /// category and priority values.
    pub fn fixed_in<S: AsRef<str>>(
        policy: &BranchPolicy,
        branch: &str,
        categories: &[S],
        priorities: &[S],
    ) -> Result<Self> {
        let branch_set = policy.branch_set(branch)?;
        Ok(IssueFilterBuilder::new()
            .versions(&branch_set)?
            .statuses(&["fixed", "closed_fixed"])?
            .categories(categories)?
            .priorities(priorities)?
            .build())
    }

    /// Issues whose status became fixed inside `[start, end)`.
    ///
    /// # Errors
    ///
    /// Does not fail with the built-in tables; the signature matches the
    /// other presets.
    pub fn fixed_between(start: i64, end: i64) -> Result<Self> {
        Ok(IssueFilterBuilder::new()
            .statuses(&["fixed"])?
            .status_changed_after(start)
            .status_changed_before(end)
            .build())
    }

    /// Issues whose status became closed-fixed inside `[start, end)`.
    ///
    /// # Errors
    ///
    /// Does not fail with the built-in tables; the signature matches the
    /// other presets.
    pub fn closed_fixed_between(start: i64, end: i64) -> Result<Self> {
        Ok(IssueFilterBuilder::new()
            .statuses(&["closed_fixed"])?
            .status_changed_after(start)
            .status_changed_before(end)
            .build())
    }

    /// Statuses to apply: the explicit set when one was given, else the
    /// open set.
    fn effective_statuses(&self) -> &[i64] {
        self.statuses.as_deref().unwrap_or(OPEN_STATUSES)
    }

    /// Compile to a parameterized SELECT.
    ///
    /// Parameters are pushed in placeholder order: include-join terms
    /// first, then value conditions, then date bounds, then each
    /// exclusion subquery's terms and conditions.
    ///
    /// # Errors
    ///
    /// Returns `ConflictingDateFilter` when both the changed and the
    /// status-changed window carry a bound.
    pub fn compile(&self) -> Result<CompiledQuery> {
        if !self.changed.is_empty() && !self.status_changed.is_empty() {
            return Err(MetricsError::ConflictingDateFilter);
        }

        let mut sql = String::from(SELECT_COLUMNS);
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if !self.terms.is_empty() && !self.exclude_terms {
            sql.push_str(" LEFT JOIN issue_terms ON issues.id = issue_terms.issue_id");
            push_in_clause(&mut sql, &mut params, "issue_terms.term_id", &self.terms);
        }

        sql.push_str(" WHERE 1=1");
        self.push_value_conditions(&mut sql, &mut params, "issues");

        push_range(&mut sql, &mut params, "issues.changed_at", self.changed);
        push_range(
            &mut sql,
            &mut params,
            "issues.status_changed_at",
            self.status_changed,
        );

        if self.exclude_terms {
            for &term in &self.terms {
                sql.push_str(
                    " AND issues.id NOT IN (SELECT i.id FROM issues i \
                     INNER JOIN issue_terms t ON i.id = t.issue_id AND t.term_id = ? \
                     WHERE 1=1",
                );
                params.push(Box::new(term));
                self.push_value_conditions(&mut sql, &mut params, "i");
                sql.push(')');
            }
        }

        Ok(CompiledQuery { sql, params })
    }

    /// The non-date conditions, shared between the outer query and the
    /// exclusion subqueries.
    fn push_value_conditions(
        &self,
        sql: &mut String,
        params: &mut Vec<Box<dyn ToSql>>,
        alias: &str,
    ) {
        push_in_clause(sql, params, &format!("{alias}.category"), &self.categories);
        push_in_clause(sql, params, &format!("{alias}.version"), &self.versions);
        push_in_clause(sql, params, &format!("{alias}.priority"), &self.priorities);
        push_in_clause(sql, params, &format!("{alias}.status"), self.effective_statuses());
        push_in_clause(sql, params, &format!("{alias}.component"), &self.components);
    }
}

/// A query string plus its ordered parameters.
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Box<dyn ToSql>>,
}

impl std::fmt::Debug for CompiledQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledQuery")
            .field("sql", &self.sql)
            .field("params", &format_args!("<{} params>", self.params.len()))
            .finish()
    }
}

impl CompiledQuery {
    /// Run against a store connection. Row order is whatever SQLite
    /// returns; callers must not assume one.
    ///
    /// # Errors
    ///
    /// Returns an error if preparation or execution fails.
    pub fn run(&self, conn: &Connection) -> Result<Vec<IssueRow>> {
        let mut stmt = conn.prepare(&self.sql)?;
        let param_refs: Vec<&dyn ToSql> = self.params.iter().map(AsRef::as_ref).collect();
        let rows = stmt
            .query_map(param_refs.as_slice(), issue_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

fn issue_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<IssueRow> {
    Ok(IssueRow {
        id: row.get(0)?,
        created_at: row.get(1)?,
        changed_at: row.get(2)?,
        status_changed_at: row.get(3)?,
        status: row.get(4)?,
        priority: row.get(5)?,
        category: row.get(6)?,
        version: row.get(7)?,
        title: row.get(8)?,
        component: row.get(9)?,
    })
}

/// Append ` AND column = ?` or ` AND column IN (...)`, pushing the
/// matching parameters. Empty value lists append nothing.
fn push_in_clause<T>(sql: &mut String, params: &mut Vec<Box<dyn ToSql>>, column: &str, values: &[T])
where
    T: ToSql + Clone + 'static,
{
    match values {
        [] => {}
        [single] => {
            let _ = write!(sql, " AND {column} = ?");
            params.push(Box::new(single.clone()));
        }
        _ => {
            let placeholders: Vec<String> = values.iter().map(|_| "?".to_string()).collect();
            let _ = write!(sql, " AND {column} IN ({})", placeholders.join(","));
            for value in values {
                params.push(Box::new(value.clone()));
            }
        }
    }
}

fn push_range(sql: &mut String, params: &mut Vec<Box<dyn ToSql>>, column: &str, range: TimeRange) {
    if let Some(after) = range.after {
        let _ = write!(sql, " AND {column} >= ?");
        params.push(Box::new(after));
    }
    if let Some(before) = range.before {
        let _ = write!(sql, " AND {column} < ?");
        params.push(Box::new(before));
    }
}
