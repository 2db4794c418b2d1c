//! `SQLite` storage implementation.

use crate::error::{DeskError, Result};
use crate::model::{FilterTerm, Issue, IssueField, IssueFilter};
use crate::storage::IssueStore;
use crate::storage::schema::apply_schema;
use crate::util::id::ObjectId;
use crate::util::time::{format_millis, parse_timestamp};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::time::Duration;

const ISSUE_COLUMNS: &str = "id, issue_title, issue_text, created_by, assigned_to, status_text, \
                             open, created_on, updated_on";

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a connection to the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema application fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a connection with an optional busy timeout (ms).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema application fails.
    pub fn open_with_timeout(path: &Path, lock_timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;
        if let Some(timeout) = lock_timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        }
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

    fn issue_from_row(row: &rusqlite::Row) -> rusqlite::Result<Issue> {
        let id: String = row.get(0)?;
        Ok(Issue {
            id: ObjectId::parse(&id).ok_or_else(|| invalid_column(0, format!("bad id '{id}'")))?,
            issue_title: row.get(1)?,
            issue_text: row.get(2)?,
            created_by: row.get(3)?,
            assigned_to: row.get(4)?,
            status_text: row.get(5)?,
            open: row.get::<_, i64>(6)? != 0,
            created_on: stamp_from_row(row, 7)?,
            updated_on: stamp_from_row(row, 8)?,
        })
    }
}

fn stamp_from_row(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).ok_or_else(|| invalid_column(idx, format!("bad timestamp '{raw}'")))
}

fn invalid_column(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        Box::new(DeskError::Storage(message)),
    )
}

fn column_for(field: IssueField) -> &'static str {
    match field {
        IssueField::Id => "id",
        other => other.as_str(),
    }
}

impl IssueStore for SqliteStore {
    fn insert(&mut self, project: &str, issue: &Issue) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO projects (name, created_on) VALUES (?, ?)",
            params![project, format_millis(&issue.created_on)],
        )?;
        tx.execute(
            &format!("INSERT INTO issues (project, {ISSUE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"),
            params![
                project,
                issue.id.as_str(),
                issue.issue_title,
                issue.issue_text,
                issue.created_by,
                issue.assigned_to,
                issue.status_text,
                i32::from(issue.open),
                format_millis(&issue.created_on),
                format_millis(&issue.updated_on),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn find(&self, project: &str, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let mut sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE project = ?");
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(project.to_string())];

        for term in filter.terms() {
            match term {
                FilterTerm::Id(id) => {
                    sql.push_str(" AND id = ?");
                    params.push(Box::new(id.to_string()));
                }
                FilterTerm::Text(field, value) => {
                    sql.push_str(&format!(" AND {} = ?", column_for(field)));
                    params.push(Box::new(value));
                }
                FilterTerm::Open(open) => {
                    sql.push_str(" AND open = ?");
                    params.push(Box::new(i32::from(open)));
                }
                FilterTerm::Stamp(field, at) => {
                    sql.push_str(&format!(" AND {} = ?", column_for(field)));
                    params.push(Box::new(format_millis(&at)));
                }
                FilterTerm::Never => return Ok(Vec::new()),
            }
        }
        sql.push_str(" ORDER BY seq ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(AsRef::as_ref).collect();
        let issues = stmt
            .query_map(params_refs.as_slice(), Self::issue_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(issues)
    }

    fn get(&self, project: &str, id: &ObjectId) -> Result<Option<Issue>> {
        let issue = self
            .conn
            .query_row(
                &format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE project = ? AND id = ?"),
                params![project, id.as_str()],
                Self::issue_from_row,
            )
            .optional()?;
        Ok(issue)
    }

    fn replace(&mut self, project: &str, issue: &Issue) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE issues SET
                issue_title = ?, issue_text = ?, assigned_to = ?, status_text = ?,
                open = ?, updated_on = ?
             WHERE project = ? AND id = ?",
            params![
                issue.issue_title,
                issue.issue_text,
                issue.assigned_to,
                issue.status_text,
                i32::from(issue.open),
                format_millis(&issue.updated_on),
                project,
                issue.id.as_str(),
            ],
        )?;
        Ok(changed > 0)
    }

    fn remove(&mut self, project: &str, id: &ObjectId) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM issues WHERE project = ? AND id = ?",
            params![project, id.as_str()],
        )?;
        Ok(changed > 0)
    }

    fn count(&self, project: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM issues WHERE project = ?",
            [project],
            |row| row.get(0),
        )?;
        usize::try_from(count).map_err(|e| DeskError::Storage(e.to_string()))
    }

    fn projects(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM projects ORDER BY seq ASC")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn contains(&self, project: &str, id: &ObjectId) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT 1 FROM issues WHERE project = ? AND id = ?")?;
        Ok(stmt.exists(params![project, id.as_str()])?)
    }
}
