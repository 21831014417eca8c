//! Issue actions.
//!
//! Every action persists its effect, keeps the project's cached counters in
//! step, and returns the [`WebhookEvent`] the caller hands to
//! [`WebhookDispatcher::notify`](crate::webhook::WebhookDispatcher::notify).
//! Each action's writes run in one transaction: on error nothing is stored
//! and the caller's `Project` and `Issue` are left as they were.
//! Status transitions are never validated: any type may follow any other.

use crate::error::{ErrorlyError, Result};
use crate::model::{Comment, Issue, IssueType, Project, User};
use crate::storage::{CommentStore, IssueStore, ProjectStore, Transactional};
use crate::util::id::{Id, IdGenerator};
use crate::webhook::WebhookEvent;
use chrono::Utc;
use tracing::{debug, info};

/// An incoming error report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportRequest {
    pub error: String,
    pub function: String,
    pub checkpoint: String,
    pub description: String,
    pub traceback: String,
    /// Kept only if a project contributor.
    pub assignee_id: Id,
    pub lock_comments: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutcome {
    pub issue: Issue,
    /// `false` when an existing issue was incremented.
    pub created: bool,
    /// `Some(IssueCreate)` for new issues only.
    pub event: Option<WebhookEvent>,
}

pub struct IssueService<'a, S> {
    store: &'a S,
    ids: &'a IdGenerator,
}

impl<'a, S> IssueService<'a, S>
where
    S: IssueStore + ProjectStore + CommentStore + Transactional,
{
    #[must_use]
    pub const fn new(store: &'a S, ids: &'a IdGenerator) -> Self {
        Self { store, ids }
    }

    /// Load a project and one of its issues.
    ///
    /// # Errors
    ///
    /// Returns `ProjectNotFound`, or `IssueNotFound` when the issue is
    /// missing or belongs to another project.
    pub fn load(&self, project_id: Id, issue_id: Id) -> Result<(Project, Issue)> {
        let project = self
            .store
            .find_project(project_id)?
            .ok_or(ErrorlyError::ProjectNotFound { id: project_id })?;
        let issue = self
            .store
            .find_issue(issue_id)?
            .filter(|issue| issue.project_id == project.id)
            .ok_or(ErrorlyError::IssueNotFound { id: issue_id })?;
        Ok((project, issue))
    }

    /// Create an issue, or count another occurrence of a known one.
    ///
    /// Issues are deduplicated on `(error, function)`. On a repeat report,
    /// only the original reporter may change the assignee or lock state.
    ///
    /// # Errors
    ///
    /// Returns `ProjectArchived`, a validation error for a blank `error` or
    /// `function`, or a storage error.
    pub fn report(
        &self,
        project: &mut Project,
        request: ReportRequest,
        actor: &User,
    ) -> Result<ReportOutcome> {
        if project.settings.archived {
            return Err(ErrorlyError::ProjectArchived { id: project.id });
        }
        if request.error.trim().is_empty() {
            return Err(ErrorlyError::validation("error", "cannot be empty"));
        }
        if request.function.trim().is_empty() {
            return Err(ErrorlyError::validation("function", "cannot be empty"));
        }

        let now = Utc::now();
        let contributor_assignee = project
            .is_contributor(request.assignee_id)
            .then_some(request.assignee_id);

        let (outcome, counted) = self.store.mutate("report", |store| {
            if let Some(mut issue) =
                store.find_issue_by_signature(project.id, &request.error, &request.function)?
            {
                issue.occurrences += 1;
                issue.last_modified = now;
                if actor.id == issue.created_by_id {
                    if let Some(assignee) = contributor_assignee {
                        issue.assignee_id = assignee;
                    }
                    if let Some(locked) = request.lock_comments {
                        issue.comments_locked = locked;
                    }
                }
                store.update_issue(&issue)?;
                let outcome = ReportOutcome {
                    issue,
                    created: false,
                    event: None,
                };
                return Ok((outcome, None));
            }

            let issue = Issue {
                assignee_id: contributor_assignee.unwrap_or(Id::NONE),
                checkpoint: request.checkpoint,
                description: request.description,
                traceback: request.traceback,
                last_modified: now,
                created_at: now,
                created_by_id: actor.id,
                comments_locked: request.lock_comments.unwrap_or(false),
                ..Issue::new(self.ids.next(), project.id, request.error, request.function)
            };
            store.insert_issue(&issue)?;
            let mut counted = project.clone();
            counted.count_issue(issue.issue_type);
            store.update_project(&counted)?;

            let outcome = ReportOutcome {
                event: Some(WebhookEvent::IssueCreate {
                    issue: issue.clone(),
                    author: actor.clone(),
                }),
                issue,
                created: true,
            };
            Ok((outcome, Some(counted)))
        })?;

        match counted {
            Some(counted) => {
                *project = counted;
                info!(issue_id = %outcome.issue.id, project_id = %project.id, "Opened issue");
            }
            None => debug!(
                issue_id = %outcome.issue.id,
                occurrences = outcome.issue.occurrences,
                "Counted repeat occurrence"
            ),
        }
        Ok(outcome)
    }

    /// # Errors
    ///
    /// Returns a storage error. `project` and `issue` are left unchanged.
    pub fn star(
        &self,
        project: &mut Project,
        issue: &mut Issue,
        starred: bool,
        actor: &User,
    ) -> Result<WebhookEvent> {
        let (next_project, next_issue) = self.store.mutate("star", |store| {
            let mut next_project = project.clone();
            if issue.starred != starred {
                if starred {
                    next_project.starred_issues += 1;
                } else {
                    next_project.starred_issues -= 1;
                }
                store.update_project(&next_project)?;
            }
            let mut next_issue = issue.clone();
            next_issue.starred = starred;
            Self::touch(store, &mut next_issue)?;
            Ok((next_project, next_issue))
        })?;
        *project = next_project;
        *issue = next_issue;

        Ok(WebhookEvent::IssueStarred {
            issue: issue.clone(),
            author: actor.clone(),
        })
    }

    /// Assign to `assignee`, or clear the assignee with `None`.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn assign(
        &self,
        issue: &mut Issue,
        assignee: Option<User>,
        actor: &User,
    ) -> Result<WebhookEvent> {
        *issue = self.store.mutate("assign", |store| {
            let mut next = issue.clone();
            next.assignee_id = assignee.as_ref().map_or(Id::NONE, |user| user.id);
            Self::touch(store, &mut next)?;
            Ok(next)
        })?;

        Ok(WebhookEvent::IssueAssigned {
            issue: issue.clone(),
            assignee,
            author: actor.clone(),
        })
    }

    /// Lock or unlock comments, leaving a note on the issue.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn lock_comments(
        &self,
        issue: &mut Issue,
        locked: bool,
        actor: &User,
    ) -> Result<WebhookEvent> {
        *issue = self.store.mutate("lock_comments", |store| {
            let mut next = issue.clone();
            next.comments_locked = locked;
            store.insert_comment(&Comment::lock_note(self.ids.next(), next.id, actor.id, locked))?;
            next.comment_count += 1;
            Self::touch(store, &mut next)?;
            Ok(next)
        })?;

        Ok(WebhookEvent::IssueLocked {
            issue: issue.clone(),
            author: actor.clone(),
        })
    }

    /// Change the issue type, leaving a note on the issue.
    ///
    /// # Errors
    ///
    /// Returns a storage error. `project` and `issue` are left unchanged.
    pub fn mark_status(
        &self,
        project: &mut Project,
        issue: &mut Issue,
        issue_type: IssueType,
        actor: &User,
    ) -> Result<WebhookEvent> {
        let (next_project, next_issue) = self.store.mutate("mark_status", |store| {
            let mut next_project = project.clone();
            let mut next_issue = issue.clone();
            next_project.uncount_issue(next_issue.issue_type);
            next_issue.issue_type = issue_type;
            next_project.count_issue(issue_type);
            store.update_project(&next_project)?;

            store.insert_comment(&Comment::status_note(
                self.ids.next(),
                next_issue.id,
                actor.id,
                issue_type,
            ))?;
            next_issue.comment_count += 1;
            Self::touch(store, &mut next_issue)?;
            Ok((next_project, next_issue))
        })?;
        *project = next_project;
        *issue = next_issue;

        Ok(WebhookEvent::IssueMarkStatus {
            issue: issue.clone(),
            author: actor.clone(),
        })
    }

    /// Post a message on an issue.
    ///
    /// # Errors
    ///
    /// Returns `ProjectArchived`, `CommentsLocked`, a validation error for
    /// blank content, or a storage error.
    pub fn comment(
        &self,
        project: &Project,
        issue: &mut Issue,
        content: &str,
        actor: &User,
    ) -> Result<(Comment, WebhookEvent)> {
        if project.settings.archived {
            return Err(ErrorlyError::ProjectArchived { id: project.id });
        }
        if issue.comments_locked {
            return Err(ErrorlyError::CommentsLocked { id: issue.id });
        }
        let content = content.trim();
        if content.is_empty() {
            return Err(ErrorlyError::validation("content", "cannot be empty"));
        }

        let comment = Comment::message(self.ids.next(), issue.id, actor.id, content);
        *issue = self.store.mutate("comment", |store| {
            store.insert_comment(&comment)?;
            let mut next = issue.clone();
            next.comment_count += 1;
            Self::touch(store, &mut next)?;
            Ok(next)
        })?;

        let event = WebhookEvent::IssueComment {
            issue: issue.clone(),
            comment: comment.clone(),
            author: actor.clone(),
        };
        Ok((comment, event))
    }

    fn touch(store: &S, issue: &mut Issue) -> Result<()> {
        issue.last_modified = Utc::now();
        store.update_issue(issue)
    }
}
