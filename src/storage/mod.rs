//! Persistence for projects, issues, comments and webhooks.
//!
//! The core services depend only on the store traits below;
//! [`SqliteStorage`] implements all of them on a single connection.

pub mod schema;
pub mod sqlite;

pub use sqlite::SqliteStorage;

use crate::error::Result;
use crate::model::{Comment, Issue, Project, Webhook};
use crate::query::QueryPlan;
use crate::util::id::Id;

/// Issue rows.
pub trait IssueStore {
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    fn find_issue(&self, id: Id) -> Result<Option<Issue>>;

    /// Issues of `project_id` matching every plan predicate, ordered by the
    /// plan's sort keys and windowed by its limit and offset.
    ///
    /// The returned count ignores limit and offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    fn find_matching(&self, project_id: Id, plan: &QueryPlan) -> Result<(Vec<Issue>, usize)>;

    /// The issue deduplicating `(error, function)` within a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    fn find_issue_by_signature(
        &self,
        project_id: Id,
        error: &str,
        function: &str,
    ) -> Result<Option<Issue>>;

    /// # Errors
    ///
    /// Returns an error if the insert fails (including duplicate ids).
    fn insert_issue(&self, issue: &Issue) -> Result<()>;

    /// # Errors
    ///
    /// Returns `IssueNotFound` if no row has the issue's id.
    fn update_issue(&self, issue: &Issue) -> Result<()>;
}

/// Webhook rows.
pub trait WebhookStore {
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    fn find_webhook(&self, id: Id) -> Result<Option<Webhook>>;

    /// All webhooks of a project, active or not, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    fn webhooks_for_project(&self, project_id: Id) -> Result<Vec<Webhook>>;

    /// # Errors
    ///
    /// Returns an error if the insert fails.
    fn insert_webhook(&self, webhook: &Webhook) -> Result<()>;

    /// Update a webhook by id.
    ///
    /// # Errors
    ///
    /// Returns `WebhookNotFound` if no row has the webhook's id.
    fn update_webhook(&self, webhook: &Webhook) -> Result<()>;
}

/// Project rows.
pub trait ProjectStore {
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    fn find_project(&self, id: Id) -> Result<Option<Project>>;

    /// # Errors
    ///
    /// Returns an error if the insert fails.
    fn insert_project(&self, project: &Project) -> Result<()>;

    /// # Errors
    ///
    /// Returns `ProjectNotFound` if no row has the project's id.
    fn update_project(&self, project: &Project) -> Result<()>;
}

/// Comment rows.
pub trait CommentStore {
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    fn insert_comment(&self, comment: &Comment) -> Result<()>;

    /// Comments of an issue, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    fn comments_for_issue(&self, issue_id: Id, limit: usize, offset: usize)
    -> Result<Vec<Comment>>;
}

/// Groups several store writes so they persist together or not at all.
pub trait Transactional {
    /// Run `f` inside a write transaction, committing only if it returns `Ok`.
    ///
    /// `op` names the action in logs.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or an error if the transaction cannot be
    /// opened or committed. Either way nothing `f` wrote is kept.
    fn mutate<R, F>(&self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Self) -> Result<R>;
}
