//! Local SQLite store for fetched issue data.
//!
//! The store is a write-once cache of remote issue state: inserts use
//! `INSERT OR IGNORE`, so the first write for an issue id wins and
//! repeated `populate` runs are idempotent. Reports treat the contents
//! as eventually stale and re-fetch when freshness matters.

use rusqlite::{Connection, params};
use std::path::Path;

use crate::error::Result;
use crate::model::IssueRecord;

/// The complete SQL schema for the issue database.
pub const SCHEMA_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS issues (
        id INTEGER PRIMARY KEY,
        created_at INTEGER NOT NULL,
        changed_at INTEGER NOT NULL,
        status_changed_at INTEGER NOT NULL DEFAULT 0,
        status INTEGER NOT NULL,
        priority INTEGER NOT NULL,
        category INTEGER NOT NULL,
        version TEXT NOT NULL DEFAULT '',
        title TEXT NOT NULL DEFAULT '',
        component TEXT NOT NULL DEFAULT ''
    );

    CREATE INDEX IF NOT EXISTS idx_issues_status ON issues(status);
    CREATE INDEX IF NOT EXISTS idx_issues_changed_at ON issues(changed_at);
    CREATE INDEX IF NOT EXISTS idx_issues_version ON issues(version);

    CREATE TABLE IF NOT EXISTS issue_terms (
        issue_id INTEGER NOT NULL,
        term_id INTEGER NOT NULL,
        PRIMARY KEY (issue_id, term_id)
    );

    CREATE INDEX IF NOT EXISTS idx_issue_terms_term_id ON issue_terms(term_id);
";

/// Apply the schema to the database.
///
/// Idempotent: all statements use `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // WAL so a report can read while a populate run writes
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    Ok(())
}

/// Counts from one upsert batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpsertStats {
    pub inserted: usize,
    pub ignored: usize,
}

/// SQLite-backed issue store.
#[derive(Debug)]
pub struct LocalStore {
    conn: Connection,
}

impl LocalStore {
    /// Open (or create) the database at the given path and apply the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema
    /// application fails.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// The underlying connection, for running compiled queries.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Re-apply the schema (no-op on an intact database).
    ///
    /// # Errors
    ///
    /// Returns an error if schema application fails.
    pub fn create_schema(&self) -> Result<()> {
        apply_schema(&self.conn)
    }

    /// Drop both tables. Follow with [`Self::create_schema`] to rebuild.
    ///
    /// # Errors
    ///
    /// Returns an error if a DROP statement fails.
    pub fn drop_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "DROP TABLE IF EXISTS issue_terms;
             DROP TABLE IF EXISTS issues;",
        )?;
        Ok(())
    }

    /// Delete all rows, keeping the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if a DELETE statement fails.
    pub fn truncate(&self) -> Result<()> {
        self.conn.execute_batch(
            "DELETE FROM issue_terms;
             DELETE FROM issues;",
        )?;
        Ok(())
    }

    /// Insert a batch of issue records and their term associations.
    ///
    /// Runs inside one transaction. An id already present is left
    /// untouched (first write wins), as is an already-known
    /// (issue, term) pair.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails; the whole batch is
    /// rolled back.
    pub fn upsert_issue_batch(&mut self, records: &[IssueRecord]) -> Result<UpsertStats> {
        let tx = self.conn.transaction()?;
        let mut stats = UpsertStats::default();

        {
            let mut insert_issue = tx.prepare(
                "INSERT OR IGNORE INTO issues (
                    id, created_at, changed_at, status_changed_at,
                    status, priority, category, version, title, component
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )?;
            let mut insert_term = tx.prepare(
                "INSERT OR IGNORE INTO issue_terms (issue_id, term_id) VALUES (?, ?)",
            )?;

            for record in records {
                let rows = insert_issue.execute(params![
                    record.id,
                    record.created_at,
                    record.changed_at,
                    record.status_changed_at,
                    record.status,
                    record.priority,
                    record.category,
                    record.version,
                    record.title,
                    record.component,
                ])?;
                if rows == 0 {
                    stats.ignored += 1;
                } else {
                    stats.inserted += 1;
                }

                for term in &record.tags {
                    insert_term.execute(params![record.id, term.id])?;
                }
            }
        }

        tx.commit()?;
        Ok(stats)
    }

    /// Most recent `changed_at` across all issues, `None` when empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn max_changed_at(&self) -> Result<Option<i64>> {
        let max: Option<i64> =
            self.conn
                .query_row("SELECT MAX(changed_at) FROM issues", [], |row| row.get(0))?;
        Ok(max)
    }
}
