//! Database schema definitions.

use rusqlite::{Connection, Result};

pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the issue database.
pub const SCHEMA_SQL: &str = r"
    -- Projects, in order of first write
    CREATE TABLE IF NOT EXISTS projects (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        created_on TEXT NOT NULL
    );

    -- Issues; seq preserves insertion order within and across projects
    CREATE TABLE IF NOT EXISTS issues (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        project TEXT NOT NULL,
        id TEXT NOT NULL,
        issue_title TEXT NOT NULL,
        issue_text TEXT NOT NULL,
        created_by TEXT NOT NULL,
        assigned_to TEXT NOT NULL DEFAULT '',
        status_text TEXT NOT NULL DEFAULT '',
        open INTEGER NOT NULL DEFAULT 1,
        created_on TEXT NOT NULL,
        updated_on TEXT NOT NULL,
        UNIQUE (project, id),
        CHECK (length(trim(issue_title)) >= 1),
        CHECK (length(trim(issue_text)) >= 1),
        CHECK (length(trim(created_by)) >= 1),
        CHECK (updated_on >= created_on)
    );

    CREATE INDEX IF NOT EXISTS idx_issues_project_seq ON issues(project, seq);

    -- Metadata
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

/// Apply the schema to the database.
///
/// Idempotent: every statement uses `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO metadata (key, value) VALUES ('schema_version', ?)",
        [CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    // Set journal mode to WAL for concurrency
    conn.pragma_update(None, "journal_mode", "WAL")?;

    Ok(())
}
