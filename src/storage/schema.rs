//! Database schema definitions and version check.

use crate::error::{ErrorlyError, Result};
use rusqlite::Connection;

/// Recorded in `PRAGMA user_version`.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the errorly database.
///
/// Ids are the packed 64-bit snowflakes. NULL marks "no id" and the
/// active issue type.
pub const SCHEMA_SQL: &str = r"
    -- Projects
    CREATE TABLE IF NOT EXISTS projects (
        id INTEGER PRIMARY KEY,
        created_at TEXT NOT NULL,
        created_by_id INTEGER,
        display_name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        url TEXT NOT NULL DEFAULT '',
        archived INTEGER NOT NULL DEFAULT 0,
        private INTEGER NOT NULL DEFAULT 0,
        limited INTEGER NOT NULL DEFAULT 0,
        contributor_ids TEXT NOT NULL DEFAULT '[]',
        open_issues INTEGER NOT NULL DEFAULT 0,
        active_issues INTEGER NOT NULL DEFAULT 0,
        resolved_issues INTEGER NOT NULL DEFAULT 0,
        starred_issues INTEGER NOT NULL DEFAULT 0,
        CHECK (length(display_name) >= 1)
    );

    -- Issues
    CREATE TABLE IF NOT EXISTS issues (
        id INTEGER PRIMARY KEY,
        project_id INTEGER NOT NULL,
        starred INTEGER NOT NULL DEFAULT 0,
        type INTEGER,
        occurrences INTEGER NOT NULL DEFAULT 1,
        assignee_id INTEGER,
        error TEXT NOT NULL,
        function TEXT NOT NULL,
        checkpoint TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        traceback TEXT NOT NULL DEFAULT '',
        last_modified TEXT NOT NULL,
        created_at TEXT NOT NULL,
        created_by_id INTEGER,
        comment_count INTEGER NOT NULL DEFAULT 0,
        comments_locked INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
        CHECK (occurrences >= 1)
    );
    CREATE INDEX IF NOT EXISTS idx_issues_project_id ON issues(project_id);
    CREATE INDEX IF NOT EXISTS idx_issues_type ON issues(type);
    CREATE INDEX IF NOT EXISTS idx_issues_assignee_id ON issues(assignee_id);
    CREATE INDEX IF NOT EXISTS idx_issues_signature ON issues(project_id, error, function);

    -- Comments
    CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY,
        issue_id INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        created_by_id INTEGER,
        type INTEGER NOT NULL DEFAULT 0,
        content TEXT,
        issue_marked INTEGER,
        comments_locked INTEGER,
        FOREIGN KEY (issue_id) REFERENCES issues(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_comments_issue_id ON comments(issue_id);

    -- Webhooks
    CREATE TABLE IF NOT EXISTS webhooks (
        id INTEGER PRIMARY KEY,
        project_id INTEGER NOT NULL,
        url TEXT NOT NULL,
        secret TEXT NOT NULL DEFAULT '',
        type INTEGER NOT NULL DEFAULT 0,
        active INTEGER NOT NULL DEFAULT 1,
        failure_count INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        created_by_id INTEGER,
        FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
        CHECK (failure_count >= 0 AND failure_count <= 255)
    );
    CREATE INDEX IF NOT EXISTS idx_webhooks_project_id ON webhooks(project_id);
";

/// Apply the schema to the database.
///
/// Stamps fresh databases with [`CURRENT_SCHEMA_VERSION`].
///
/// # Errors
///
/// Returns `SchemaMismatch` if the database was written by a newer schema,
/// or a database error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    let found: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if found > CURRENT_SCHEMA_VERSION {
        return Err(ErrorlyError::SchemaMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found,
        });
    }

    conn.execute_batch(SCHEMA_SQL)?;

    if found < CURRENT_SCHEMA_VERSION {
        conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)?;
    }

    // Set journal mode to WAL for concurrency
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_apply_schema() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).expect("Failed to apply schema");

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for table in ["projects", "issues", "comments", "webhooks"] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }

        let version: i32 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION);

        let foreign_keys: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn test_apply_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        apply_schema(&conn).unwrap();
    }

    #[test]
    fn test_newer_schema_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION + 1)
            .unwrap();

        let err = apply_schema(&conn).unwrap_err();
        assert!(matches!(err, ErrorlyError::SchemaMismatch { found: 2, .. }));
    }
}
