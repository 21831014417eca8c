//! Events fanned out to webhooks.

use crate::model::{Comment, Issue, User};
use serde::Serialize;
use std::fmt;

/// Event tag, serialized as the envelope `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TestWebhook,
    IssueCreate,
    IssueComment,
    IssueStarred,
    IssueAssigned,
    IssueLocked,
    IssueMarkStatus,
}

impl EventKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TestWebhook => "test_webhook",
            Self::IssueCreate => "issue_create",
            Self::IssueComment => "issue_comment",
            Self::IssueStarred => "issue_starred",
            Self::IssueAssigned => "issue_assigned",
            Self::IssueLocked => "issue_locked",
            Self::IssueMarkStatus => "issue_mark_status",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that happened in a project.
///
/// Each variant carries the issue state *after* the action, plus the acting
/// user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    TestWebhook,
    IssueCreate {
        issue: Issue,
        author: User,
    },
    IssueComment {
        issue: Issue,
        comment: Comment,
        author: User,
    },
    /// `issue.starred` tells a star from an unstar.
    IssueStarred {
        issue: Issue,
        author: User,
    },
    /// `assignee` is `None` when the assignee was cleared.
    IssueAssigned {
        issue: Issue,
        assignee: Option<User>,
        author: User,
    },
    /// `issue.comments_locked` tells a lock from an unlock.
    IssueLocked {
        issue: Issue,
        author: User,
    },
    IssueMarkStatus {
        issue: Issue,
        author: User,
    },
}

impl WebhookEvent {
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::TestWebhook => EventKind::TestWebhook,
            Self::IssueCreate { .. } => EventKind::IssueCreate,
            Self::IssueComment { .. } => EventKind::IssueComment,
            Self::IssueStarred { .. } => EventKind::IssueStarred,
            Self::IssueAssigned { .. } => EventKind::IssueAssigned,
            Self::IssueLocked { .. } => EventKind::IssueLocked,
            Self::IssueMarkStatus { .. } => EventKind::IssueMarkStatus,
        }
    }

    #[must_use]
    pub const fn issue(&self) -> Option<&Issue> {
        match self {
            Self::TestWebhook => None,
            Self::IssueCreate { issue, .. }
            | Self::IssueComment { issue, .. }
            | Self::IssueStarred { issue, .. }
            | Self::IssueAssigned { issue, .. }
            | Self::IssueLocked { issue, .. }
            | Self::IssueMarkStatus { issue, .. } => Some(issue),
        }
    }

    /// The acting user.
    #[must_use]
    pub const fn author(&self) -> Option<&User> {
        match self {
            Self::TestWebhook => None,
            Self::IssueCreate { author, .. }
            | Self::IssueComment { author, .. }
            | Self::IssueStarred { author, .. }
            | Self::IssueAssigned { author, .. }
            | Self::IssueLocked { author, .. }
            | Self::IssueMarkStatus { author, .. } => Some(author),
        }
    }

    #[must_use]
    pub const fn comment(&self) -> Option<&Comment> {
        match self {
            Self::IssueComment { comment, .. } => Some(comment),
            _ => None,
        }
    }

    #[must_use]
    pub const fn assignee(&self) -> Option<&User> {
        match self {
            Self::IssueAssigned { assignee, .. } => assignee.as_ref(),
            _ => None,
        }
    }
}
