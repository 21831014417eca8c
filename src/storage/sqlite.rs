//! `SQLite` storage implementation.

use crate::error::{ErrorlyError, Result};
use crate::model::{
    Comment, CommentKind, Issue, IssueType, PayloadKind, Project, ProjectSettings, Webhook,
};
use crate::query::{Predicate, QueryPlan, Value};
use crate::storage::schema::apply_schema;
use crate::storage::{CommentStore, IssueStore, ProjectStore, Transactional, WebhookStore};
use crate::util::id::Id;
use crate::util::time::{format_timestamp, parse_timestamp};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, ToSql, Transaction, TransactionBehavior};
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, trace};

const ISSUE_COLUMNS: &str = "id, project_id, starred, type, occurrences, assignee_id, error, \
     function, checkpoint, description, traceback, last_modified, created_at, created_by_id, \
     comment_count, comments_locked";

const PROJECT_COLUMNS: &str = "id, created_at, created_by_id, display_name, description, url, \
     archived, private, limited, contributor_ids, open_issues, active_issues, resolved_issues, \
     starred_issues";

const COMMENT_COLUMNS: &str =
    "id, issue_id, created_at, created_by_id, type, content, issue_marked, comments_locked";

const WEBHOOK_COLUMNS: &str =
    "id, project_id, url, secret, type, active, failure_count, created_at, created_by_id";

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open a connection to the database at the given path, creating it.
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
        debug!(path = %path.display(), "Opened database");
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

    fn issue_from_row(row: &Row) -> rusqlite::Result<Issue> {
        Ok(Issue {
            id: Id(row.get(0)?),
            project_id: Id(row.get(1)?),
            starred: row.get(2)?,
            issue_type: IssueType::from_code(row.get(3)?),
            occurrences: row.get(4)?,
            assignee_id: nullable_id(row, 5)?,
            error: row.get(6)?,
            function: row.get(7)?,
            checkpoint: row.get(8)?,
            description: row.get(9)?,
            traceback: row.get(10)?,
            last_modified: parse_timestamp(&row.get::<_, String>(11)?),
            created_at: parse_timestamp(&row.get::<_, String>(12)?),
            created_by_id: nullable_id(row, 13)?,
            comment_count: row.get(14)?,
            comments_locked: row.get(15)?,
        })
    }

    fn project_from_row(row: &Row) -> rusqlite::Result<Project> {
        let contributors: String = row.get(9)?;
        let contributor_ids = serde_json::from_str(&contributors)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e)))?;

        Ok(Project {
            id: Id(row.get(0)?),
            created_at: parse_timestamp(&row.get::<_, String>(1)?),
            created_by_id: nullable_id(row, 2)?,
            settings: ProjectSettings {
                display_name: row.get(3)?,
                description: row.get(4)?,
                url: row.get(5)?,
                archived: row.get(6)?,
                private: row.get(7)?,
                limited: row.get(8)?,
                contributor_ids,
            },
            open_issues: row.get(10)?,
            active_issues: row.get(11)?,
            resolved_issues: row.get(12)?,
            starred_issues: row.get(13)?,
        })
    }

    fn comment_from_row(row: &Row) -> rusqlite::Result<Comment> {
        Ok(Comment {
            id: Id(row.get(0)?),
            issue_id: Id(row.get(1)?),
            created_at: parse_timestamp(&row.get::<_, String>(2)?),
            created_by_id: nullable_id(row, 3)?,
            kind: CommentKind::from_code(row.get(4)?),
            content: row.get(5)?,
            issue_marked: row
                .get::<_, Option<i64>>(6)?
                .map(|code| IssueType::from_code(Some(code))),
            comments_locked: row.get(7)?,
        })
    }

    fn webhook_from_row(row: &Row) -> rusqlite::Result<Webhook> {
        Ok(Webhook {
            id: Id(row.get(0)?),
            project_id: Id(row.get(1)?),
            url: row.get(2)?,
            secret: row.get(3)?,
            payload_kind: PayloadKind::from_code(row.get(4)?),
            active: row.get(5)?,
            failure_count: row.get(6)?,
            created_at: parse_timestamp(&row.get::<_, String>(7)?),
            created_by_id: nullable_id(row, 8)?,
        })
    }
}

/// Read a nullable id column; NULL is `Id::NONE`.
fn nullable_id(row: &Row, idx: usize) -> rusqlite::Result<Id> {
    Ok(Id(row.get::<_, Option<i64>>(idx)?.unwrap_or(0)))
}

/// Persisted form of an issue-type comparison, `None` meaning NULL.
fn value_param(value: Value) -> Option<i64> {
    match value {
        Value::Bool(flag) => Some(i64::from(flag)),
        Value::Int(n) => Some(n),
        Value::Type(issue_type) => issue_type.code(),
    }
}

/// Append one predicate as SQL. Column names come from `Field` only.
fn push_predicate(sql: &mut String, params: &mut Vec<Box<dyn ToSql>>, predicate: &Predicate) {
    match predicate {
        Predicate::Equals { field, value } => match value_param(*value) {
            Some(param) => {
                let _ = write!(sql, "{} = ?", field.column());
                params.push(Box::new(param));
            }
            None => {
                let _ = write!(sql, "{} IS NULL", field.column());
            }
        },
        Predicate::IsNull { field } => {
            let _ = write!(sql, "{} IS NULL", field.column());
        }
        Predicate::AnyOf(inner) => {
            if inner.is_empty() {
                sql.push('0');
                return;
            }
            sql.push('(');
            for (i, alternative) in inner.iter().enumerate() {
                if i > 0 {
                    sql.push_str(" OR ");
                }
                push_predicate(sql, params, alternative);
            }
            sql.push(')');
        }
    }
}

/// `WHERE` clause shared by the count and page queries.
fn where_clause(project_id: Id, plan: &QueryPlan) -> (String, Vec<Box<dyn ToSql>>) {
    let mut sql = String::from(" WHERE project_id = ?");
    let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(project_id.get())];

    for predicate in &plan.predicates {
        sql.push_str(" AND ");
        push_predicate(&mut sql, &mut params, predicate);
    }

    (sql, params)
}

/// `ORDER BY` clause; newest id breaks remaining ties.
fn order_clause(plan: &QueryPlan) -> String {
    let keys: Vec<String> = plan
        .sort
        .iter()
        .map(|key| format!("{} {}", key.field.column(), key.direction.as_sql()))
        .chain(std::iter::once("id DESC".to_string()))
        .collect();
    format!(" ORDER BY {}", keys.join(", "))
}

fn to_sql_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl IssueStore for SqliteStorage {
    fn find_issue(&self, id: Id) -> Result<Option<Issue>> {
        let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?");
        let mut stmt = self.conn.prepare(&sql)?;
        let result = stmt.query_row([id.get()], Self::issue_from_row);

        match result {
            Ok(issue) => Ok(Some(issue)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn find_matching(&self, project_id: Id, plan: &QueryPlan) -> Result<(Vec<Issue>, usize)> {
        let (filter, mut params) = where_clause(project_id, plan);

        let count_sql = format!("SELECT COUNT(*) FROM issues{filter}");
        let params_refs: Vec<&dyn ToSql> = params.iter().map(AsRef::as_ref).collect();
        let total: i64 = self
            .conn
            .query_row(&count_sql, params_refs.as_slice(), |row| row.get(0))?;

        let mut sql = format!("SELECT {ISSUE_COLUMNS} FROM issues{filter}");
        sql.push_str(&order_clause(plan));
        sql.push_str(" LIMIT ? OFFSET ?");
        params.push(Box::new(to_sql_i64(plan.limit)));
        params.push(Box::new(to_sql_i64(plan.offset)));
        trace!(sql = %sql, "Issue page query");

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn ToSql> = params.iter().map(AsRef::as_ref).collect();
        let issues = stmt
            .query_map(params_refs.as_slice(), Self::issue_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok((issues, usize::try_from(total).unwrap_or(0)))
    }

    fn find_issue_by_signature(
        &self,
        project_id: Id,
        error: &str,
        function: &str,
    ) -> Result<Option<Issue>> {
        let sql = format!(
            "SELECT {ISSUE_COLUMNS} FROM issues
             WHERE project_id = ? AND error = ? AND function = ?
             ORDER BY id ASC LIMIT 1"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let result = stmt.query_row(
            rusqlite::params![project_id.get(), error, function],
            Self::issue_from_row,
        );

        match result {
            Ok(issue) => Ok(Some(issue)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn insert_issue(&self, issue: &Issue) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO issues ({ISSUE_COLUMNS})
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ),
            rusqlite::params![
                issue.id.get(),
                issue.project_id.get(),
                issue.starred,
                issue.issue_type.code(),
                issue.occurrences,
                issue.assignee_id.non_zero(),
                issue.error,
                issue.function,
                issue.checkpoint,
                issue.description,
                issue.traceback,
                format_timestamp(&issue.last_modified),
                format_timestamp(&issue.created_at),
                issue.created_by_id.non_zero(),
                issue.comment_count,
                issue.comments_locked,
            ],
        )?;
        Ok(())
    }

    fn update_issue(&self, issue: &Issue) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE issues SET
                starred = ?2, type = ?3, occurrences = ?4, assignee_id = ?5,
                checkpoint = ?6, description = ?7, traceback = ?8, last_modified = ?9,
                comment_count = ?10, comments_locked = ?11
             WHERE id = ?1",
            rusqlite::params![
                issue.id.get(),
                issue.starred,
                issue.issue_type.code(),
                issue.occurrences,
                issue.assignee_id.non_zero(),
                issue.checkpoint,
                issue.description,
                issue.traceback,
                format_timestamp(&issue.last_modified),
                issue.comment_count,
                issue.comments_locked,
            ],
        )?;
        if changed == 0 {
            return Err(ErrorlyError::IssueNotFound { id: issue.id });
        }
        Ok(())
    }
}

impl WebhookStore for SqliteStorage {
    fn find_webhook(&self, id: Id) -> Result<Option<Webhook>> {
        let sql = format!("SELECT {WEBHOOK_COLUMNS} FROM webhooks WHERE id = ?");
        let mut stmt = self.conn.prepare(&sql)?;
        let result = stmt.query_row([id.get()], Self::webhook_from_row);

        match result {
            Ok(webhook) => Ok(Some(webhook)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn webhooks_for_project(&self, project_id: Id) -> Result<Vec<Webhook>> {
        let sql =
            format!("SELECT {WEBHOOK_COLUMNS} FROM webhooks WHERE project_id = ? ORDER BY id ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let webhooks = stmt
            .query_map([project_id.get()], Self::webhook_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(webhooks)
    }

    fn insert_webhook(&self, webhook: &Webhook) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO webhooks ({WEBHOOK_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"),
            rusqlite::params![
                webhook.id.get(),
                webhook.project_id.get(),
                webhook.url,
                webhook.secret,
                webhook.payload_kind.code(),
                webhook.active,
                webhook.failure_count,
                format_timestamp(&webhook.created_at),
                webhook.created_by_id.non_zero(),
            ],
        )?;
        Ok(())
    }

    fn update_webhook(&self, webhook: &Webhook) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE webhooks SET url = ?2, secret = ?3, type = ?4, active = ?5, failure_count = ?6
             WHERE id = ?1",
            rusqlite::params![
                webhook.id.get(),
                webhook.url,
                webhook.secret,
                webhook.payload_kind.code(),
                webhook.active,
                webhook.failure_count,
            ],
        )?;
        if changed == 0 {
            return Err(ErrorlyError::WebhookNotFound { id: webhook.id });
        }
        Ok(())
    }
}

impl ProjectStore for SqliteStorage {
    fn find_project(&self, id: Id) -> Result<Option<Project>> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?");
        let mut stmt = self.conn.prepare(&sql)?;
        let result = stmt.query_row([id.get()], Self::project_from_row);

        match result {
            Ok(project) => Ok(Some(project)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn insert_project(&self, project: &Project) -> Result<()> {
        let settings = &project.settings;
        self.conn.execute(
            &format!(
                "INSERT INTO projects ({PROJECT_COLUMNS})
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ),
            rusqlite::params![
                project.id.get(),
                format_timestamp(&project.created_at),
                project.created_by_id.non_zero(),
                settings.display_name,
                settings.description,
                settings.url,
                settings.archived,
                settings.private,
                settings.limited,
                serde_json::to_string(&settings.contributor_ids)?,
                project.open_issues,
                project.active_issues,
                project.resolved_issues,
                project.starred_issues,
            ],
        )?;
        Ok(())
    }

    fn update_project(&self, project: &Project) -> Result<()> {
        let settings = &project.settings;
        let changed = self.conn.execute(
            "UPDATE projects SET
                display_name = ?2, description = ?3, url = ?4, archived = ?5, private = ?6,
                limited = ?7, contributor_ids = ?8, open_issues = ?9, active_issues = ?10,
                resolved_issues = ?11, starred_issues = ?12
             WHERE id = ?1",
            rusqlite::params![
                project.id.get(),
                settings.display_name,
                settings.description,
                settings.url,
                settings.archived,
                settings.private,
                settings.limited,
                serde_json::to_string(&settings.contributor_ids)?,
                project.open_issues,
                project.active_issues,
                project.resolved_issues,
                project.starred_issues,
            ],
        )?;
        if changed == 0 {
            return Err(ErrorlyError::ProjectNotFound { id: project.id });
        }
        Ok(())
    }
}

impl CommentStore for SqliteStorage {
    fn insert_comment(&self, comment: &Comment) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO comments ({COMMENT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"),
            rusqlite::params![
                comment.id.get(),
                comment.issue_id.get(),
                format_timestamp(&comment.created_at),
                comment.created_by_id.non_zero(),
                comment.kind.code(),
                comment.content,
                comment.issue_marked.and_then(IssueType::code),
                comment.comments_locked,
            ],
        )?;
        Ok(())
    }

    fn comments_for_issue(
        &self,
        issue_id: Id,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Comment>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE issue_id = ?
             ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let comments = stmt
            .query_map(
                rusqlite::params![issue_id.get(), to_sql_i64(limit), to_sql_i64(offset)],
                Self::comment_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(comments)
    }
}

impl Transactional for SqliteStorage {
    fn mutate<R, F>(&self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Self) -> Result<R>,
    {
        // Write lock held from the start
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        match f(self) {
            Ok(result) => {
                tx.commit()?;
                trace!(op, "Committed");
                Ok(result)
            }
            Err(err) => {
                // Dropping the transaction rolls it back
                debug!(op, error = %err, "Rolled back");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::compile;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use tempfile::TempDir;

    fn storage_with_project() -> (SqliteStorage, Project) {
        let storage = SqliteStorage::open_memory().unwrap();
        let project = Project::new(Id(1), "Welcomer", Id(100));
        storage.insert_project(&project).unwrap();
        (storage, project)
    }

    fn make_issue(id: i64, error: &str, issue_type: IssueType, starred: bool) -> Issue {
        let created_at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
            + ChronoDuration::minutes(id);
        Issue {
            issue_type,
            starred,
            created_at,
            last_modified: created_at,
            ..Issue::new(Id(id), Id(1), error, "handler()")
        }
    }

    #[test]
    fn test_issue_roundtrip_preserves_nulls() {
        let (storage, _) = storage_with_project();
        let issue = make_issue(10, "KeyError", IssueType::Active, false);
        storage.insert_issue(&issue).unwrap();

        let raw_type: Option<i64> = storage
            .conn
            .query_row("SELECT type FROM issues WHERE id = 10", [], |row| row.get(0))
            .unwrap();
        assert_eq!(raw_type, None);

        let loaded = storage.find_issue(Id(10)).unwrap().unwrap();
        assert_eq!(loaded, issue);
        assert!(storage.find_issue(Id(11)).unwrap().is_none());
    }

    #[test]
    fn test_find_by_signature() {
        let (storage, _) = storage_with_project();
        storage
            .insert_issue(&make_issue(10, "KeyError", IssueType::Open, false))
            .unwrap();

        let found = storage
            .find_issue_by_signature(Id(1), "KeyError", "handler()")
            .unwrap();
        assert_eq!(found.map(|i| i.id), Some(Id(10)));
        assert!(
            storage
                .find_issue_by_signature(Id(1), "KeyError", "other()")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_find_matching_filters_and_counts() {
        let (storage, _) = storage_with_project();
        for id in 1..=30 {
            let issue_type = if id % 3 == 0 {
                IssueType::Resolved
            } else {
                IssueType::Open
            };
            storage
                .insert_issue(&make_issue(id, "E", issue_type, false))
                .unwrap();
        }

        let plan = compile("is:resolved", Id::NONE).with_page(0);
        let (rows, total) = storage.find_matching(Id(1), &plan).unwrap();
        assert_eq!(total, 10);
        assert_eq!(rows.len(), 10);
        assert!(rows.iter().all(|i| i.issue_type == IssueType::Resolved));

        let (rows, total) = storage
            .find_matching(Id(1), &compile("", Id::NONE).with_page(1))
            .unwrap();
        assert_eq!(total, 30);
        assert_eq!(rows.len(), 5);
    }

    #[test]
    fn test_find_matching_starred_first_then_explicit_sort() {
        let (storage, _) = storage_with_project();
        let mut busy = make_issue(1, "busy", IssueType::Open, false);
        busy.occurrences = 50;
        storage.insert_issue(&busy).unwrap();
        storage
            .insert_issue(&make_issue(2, "starred", IssueType::Open, true))
            .unwrap();
        storage
            .insert_issue(&make_issue(3, "quiet", IssueType::Open, false))
            .unwrap();

        let plan = compile("sort:occurrences-desc", Id::NONE);
        let (rows, _) = storage.find_matching(Id(1), &plan).unwrap();
        let order: Vec<&str> = rows.iter().map(|i| i.error.as_str()).collect();
        assert_eq!(order, ["starred", "busy", "quiet"]);
    }

    #[test]
    fn test_find_matching_unassigned_matches_null() {
        let (storage, _) = storage_with_project();
        let mut assigned = make_issue(1, "assigned", IssueType::Open, false);
        assigned.assignee_id = Id(100);
        storage.insert_issue(&assigned).unwrap();
        storage
            .insert_issue(&make_issue(2, "free", IssueType::Open, false))
            .unwrap();

        let (rows, total) = storage
            .find_matching(Id(1), &compile("assignee:no", Id::NONE))
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].error, "free");

        let (rows, _) = storage
            .find_matching(Id(1), &compile("assigned:@me", Id(100)))
            .unwrap();
        assert_eq!(rows[0].error, "assigned");
    }

    #[test]
    fn test_find_matching_is_scoped_to_project() {
        let (storage, _) = storage_with_project();
        storage
            .insert_project(&Project::new(Id(2), "Other", Id(100)))
            .unwrap();
        let mut foreign = make_issue(1, "E", IssueType::Open, false);
        foreign.project_id = Id(2);
        storage.insert_issue(&foreign).unwrap();

        let (rows, total) = storage
            .find_matching(Id(1), &QueryPlan::default())
            .unwrap();
        assert!(rows.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn test_update_missing_rows_report_not_found() {
        let (storage, project) = storage_with_project();
        let err = storage
            .update_issue(&make_issue(99, "E", IssueType::Open, false))
            .unwrap_err();
        assert!(matches!(err, ErrorlyError::IssueNotFound { id: Id(99) }));

        let hook = Webhook::new(Id(5), project.id, "http://localhost/hook", PayloadKind::Generic);
        let err = storage.update_webhook(&hook).unwrap_err();
        assert!(matches!(err, ErrorlyError::WebhookNotFound { .. }));
    }

    #[test]
    fn test_project_roundtrip_with_contributors() {
        let (storage, mut project) = storage_with_project();
        project.settings.contributor_ids = vec![Id(200), Id(300)];
        project.open_issues = 4;
        storage.update_project(&project).unwrap();

        let loaded = storage.find_project(project.id).unwrap().unwrap();
        assert_eq!(loaded.settings.contributor_ids, vec![Id(200), Id(300)]);
        assert_eq!(loaded.open_issues, 4);
    }

    #[test]
    fn test_webhook_health_persists() {
        let (storage, project) = storage_with_project();
        let mut hook =
            Webhook::new(Id(5), project.id, "http://localhost/hook", PayloadKind::PlatformFormatted);
        hook.secret = "s3cret".to_string();
        storage.insert_webhook(&hook).unwrap();

        hook.failure_count = 5;
        hook.active = false;
        storage.update_webhook(&hook).unwrap();

        let hooks = storage.webhooks_for_project(project.id).unwrap();
        assert_eq!(hooks.len(), 1);
        assert_eq!(hooks[0].failure_count, 5);
        assert!(!hooks[0].active);
        assert_eq!(hooks[0].payload_kind, PayloadKind::PlatformFormatted);
    }

    #[test]
    fn test_comments_in_creation_order() {
        let (storage, _) = storage_with_project();
        storage
            .insert_issue(&make_issue(10, "E", IssueType::Open, false))
            .unwrap();

        let mut first = Comment::message(Id(20), Id(10), Id(100), "first");
        first.created_at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut marked = Comment::status_note(Id(21), Id(10), Id(100), IssueType::Resolved);
        marked.created_at = first.created_at + ChronoDuration::seconds(1);
        storage.insert_comment(&marked).unwrap();
        storage.insert_comment(&first).unwrap();

        let comments = storage.comments_for_issue(Id(10), 10, 0).unwrap();
        assert_eq!(comments, vec![first, marked]);
        assert_eq!(storage.comments_for_issue(Id(10), 10, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_open_file_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("errorly.db");
        {
            let storage = SqliteStorage::open(&path).unwrap();
            storage
                .insert_project(&Project::new(Id(1), "Persisted", Id::NONE))
                .unwrap();
        }
        let reopened = SqliteStorage::open_with_timeout(&path, Some(1_000)).unwrap();
        assert!(reopened.find_project(Id(1)).unwrap().is_some());
    }

    #[test]
    fn test_mutate_commits_on_success() {
        let (storage, mut project) = storage_with_project();
        project.open_issues = 3;
        storage
            .mutate("count", |store| store.update_project(&project))
            .unwrap();
        assert_eq!(storage.find_project(Id(1)).unwrap().unwrap().open_issues, 3);
    }

    #[test]
    fn test_mutate_rolls_back_earlier_writes_on_error() {
        let (storage, mut project) = storage_with_project();
        project.starred_issues = 1;
        let missing = make_issue(404, "Gone", IssueType::Open, true);

        let err = storage
            .mutate("star", |store| {
                store.update_project(&project)?;
                store.update_issue(&missing)
            })
            .unwrap_err();

        assert!(matches!(err, ErrorlyError::IssueNotFound { id } if id == Id(404)));
        assert_eq!(storage.find_project(Id(1)).unwrap().unwrap().starred_issues, 0);

        // The connection is usable again once the transaction is gone
        storage
            .mutate("retry", |store| store.update_project(&project))
            .unwrap();
        assert_eq!(storage.find_project(Id(1)).unwrap().unwrap().starred_issues, 1);
    }
}
