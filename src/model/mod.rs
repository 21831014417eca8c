//! Core data types for `errorly`.
//!
//! This module defines the entities the core services operate on:
//! - `Project` - Owns issues and webhooks
//! - `Issue` - A deduplicated error report (`error` + `function`)
//! - `IssueType` - Issue lifecycle states
//! - `Comment` - User comments and system notes on an issue
//! - `Webhook` - An outbound notification endpoint
//! - `User` - Acting users referenced by events

use crate::error::ErrorlyError;
use crate::util::id::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Issue lifecycle state.
///
/// Any transition between states is legal; callers drive them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    /// Not fixed and not assigned yet.
    #[default]
    Active,
    /// Assigned but not fixed yet.
    Open,
    /// Likely incorrect or a false positive.
    Invalid,
    /// Fixed.
    Resolved,
}

impl IssueType {
    pub const ALL: [Self; 4] = [Self::Active, Self::Open, Self::Invalid, Self::Resolved];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Open => "open",
            Self::Invalid => "invalid",
            Self::Resolved => "resolved",
        }
    }

    /// Persisted column value. `Active` is stored as NULL.
    #[must_use]
    pub const fn code(self) -> Option<i64> {
        match self {
            Self::Active => None,
            Self::Open => Some(1),
            Self::Invalid => Some(2),
            Self::Resolved => Some(3),
        }
    }

    /// Inverse of [`IssueType::code`]. Unknown codes read as `Active`.
    #[must_use]
    pub const fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(1) => Self::Open,
            Some(2) => Self::Invalid,
            Some(3) => Self::Resolved,
            _ => Self::Active,
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueType {
    type Err = ErrorlyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "open" => Ok(Self::Open),
            "invalid" => Ok(Self::Invalid),
            "resolved" => Ok(Self::Resolved),
            other => Err(ErrorlyError::validation(
                "type",
                format!("unknown issue type '{other}' (active, open, invalid, resolved)"),
            )),
        }
    }
}

/// A user as referenced by events and messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct User {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub avatar: String,
}

impl User {
    #[must_use]
    pub fn new(id: Id, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            avatar: String::new(),
        }
    }
}

/// Project-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ProjectSettings {
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    /// Link to a project-appropriate URL. Hidden when blank.
    #[serde(default)]
    pub url: String,
    /// No new issues can be reported while archived.
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub private: bool,
    /// Only contributors may report issues.
    #[serde(default)]
    pub limited: bool,
    #[serde(default)]
    pub contributor_ids: Vec<Id>,
}

/// A project owning issues and webhooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: Id,
    pub created_at: DateTime<Utc>,
    pub created_by_id: Id,
    pub settings: ProjectSettings,

    // Cached counters, maintained on issue events
    pub open_issues: i64,
    pub active_issues: i64,
    pub resolved_issues: i64,
    pub starred_issues: i64,
}

impl Project {
    #[must_use]
    pub fn new(id: Id, display_name: impl Into<String>, created_by_id: Id) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            created_by_id,
            settings: ProjectSettings {
                display_name: display_name.into(),
                ..ProjectSettings::default()
            },
            open_issues: 0,
            active_issues: 0,
            resolved_issues: 0,
            starred_issues: 0,
        }
    }

    /// The project creator and listed contributors.
    #[must_use]
    pub fn is_contributor(&self, user_id: Id) -> bool {
        !user_id.is_none()
            && (user_id == self.created_by_id || self.settings.contributor_ids.contains(&user_id))
    }

    /// Adjust cached counters for an issue entering `issue_type`.
    pub const fn count_issue(&mut self, issue_type: IssueType) {
        match issue_type {
            IssueType::Active => self.active_issues += 1,
            IssueType::Open => self.open_issues += 1,
            IssueType::Resolved => self.resolved_issues += 1,
            IssueType::Invalid => {}
        }
    }

    /// Adjust cached counters for an issue leaving `issue_type`.
    pub const fn uncount_issue(&mut self, issue_type: IssueType) {
        match issue_type {
            IssueType::Active => self.active_issues -= 1,
            IssueType::Open => self.open_issues -= 1,
            IssueType::Resolved => self.resolved_issues -= 1,
            IssueType::Invalid => {}
        }
    }
}

/// A deduplicated error report.
///
/// Identity within a project is the `(error, function)` pair; repeated
/// reports increment `occurrences` instead of creating new rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: Id,
    pub project_id: Id,

    pub starred: bool,

    #[serde(rename = "type")]
    pub issue_type: IssueType,
    /// Always at least 1.
    pub occurrences: i64,
    /// `Id::NONE` when unassigned.
    pub assignee_id: Id,

    pub error: String,
    pub function: String,
    pub checkpoint: String,
    pub description: String,
    pub traceback: String,

    pub last_modified: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub created_by_id: Id,

    pub comment_count: i64,
    pub comments_locked: bool,
}

impl Issue {
    /// A first occurrence of `error` in `function`.
    #[must_use]
    pub fn new(id: Id, project_id: Id, error: impl Into<String>, function: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            project_id,
            starred: false,
            issue_type: IssueType::Open,
            occurrences: 1,
            assignee_id: Id::NONE,
            error: error.into(),
            function: function.into(),
            checkpoint: String::new(),
            description: String::new(),
            traceback: String::new(),
            last_modified: now,
            created_at: now,
            created_by_id: Id::NONE,
            comment_count: 0,
            comments_locked: false,
        }
    }
}

/// What a comment row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommentKind {
    /// A regular user message.
    #[default]
    Message,
    /// The issue status changed; see `issue_marked`.
    IssueMarked,
    /// Comments were locked or unlocked; see `comments_locked`.
    CommentsLocked,
}

impl CommentKind {
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Message => 0,
            Self::IssueMarked => 1,
            Self::CommentsLocked => 2,
        }
    }

    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            1 => Self::IssueMarked,
            2 => Self::CommentsLocked,
            _ => Self::Message,
        }
    }
}

/// A comment or system note on an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Id,
    pub issue_id: Id,
    pub created_at: DateTime<Utc>,
    pub created_by_id: Id,
    #[serde(rename = "type")]
    pub kind: CommentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_marked: Option<IssueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments_locked: Option<bool>,
}

impl Comment {
    #[must_use]
    pub fn message(id: Id, issue_id: Id, author: Id, content: impl Into<String>) -> Self {
        Self {
            id,
            issue_id,
            created_at: Utc::now(),
            created_by_id: author,
            kind: CommentKind::Message,
            content: Some(content.into()),
            issue_marked: None,
            comments_locked: None,
        }
    }

    #[must_use]
    pub fn status_note(id: Id, issue_id: Id, author: Id, marked: IssueType) -> Self {
        Self {
            kind: CommentKind::IssueMarked,
            content: None,
            issue_marked: Some(marked),
            ..Self::message(id, issue_id, author, String::new())
        }
    }

    #[must_use]
    pub fn lock_note(id: Id, issue_id: Id, author: Id, locked: bool) -> Self {
        Self {
            kind: CommentKind::CommentsLocked,
            content: None,
            comments_locked: Some(locked),
            ..Self::message(id, issue_id, author, String::new())
        }
    }
}

/// How a webhook's payload is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    /// The native event envelope, shaped like a REST response.
    #[default]
    Generic,
    /// A rich chat-platform message (title, url, description, author).
    PlatformFormatted,
}

impl PayloadKind {
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Generic => 0,
            Self::PlatformFormatted => 1,
        }
    }

    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        if code == 1 {
            Self::PlatformFormatted
        } else {
            Self::Generic
        }
    }
}

/// An outbound notification endpoint owned by a project.
///
/// `active` and `failure_count` are mutated only by the dispatcher after a
/// delivery attempt (and by an operator re-enabling the hook).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    pub id: Id,
    pub project_id: Id,
    pub url: String,
    /// HMAC key for the signature header. Empty disables signing.
    #[serde(default, skip_serializing)]
    pub secret: String,
    #[serde(rename = "type")]
    pub payload_kind: PayloadKind,
    pub active: bool,
    pub failure_count: u8,
    pub created_at: DateTime<Utc>,
    pub created_by_id: Id,
}

impl Webhook {
    #[must_use]
    pub fn new(id: Id, project_id: Id, url: impl Into<String>, payload_kind: PayloadKind) -> Self {
        Self {
            id,
            project_id,
            url: url.into(),
            secret: String::new(),
            payload_kind,
            active: true,
            failure_count: 0,
            created_at: Utc::now(),
            created_by_id: Id::NONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_type_codes_roundtrip() {
        for issue_type in IssueType::ALL {
            assert_eq!(IssueType::from_code(issue_type.code()), issue_type);
        }
        assert_eq!(IssueType::Active.code(), None);
    }

    #[test]
    fn test_issue_type_parse() {
        assert_eq!("Resolved".parse::<IssueType>().unwrap(), IssueType::Resolved);
        assert!("fixed".parse::<IssueType>().is_err());
    }

    #[test]
    fn test_issue_type_serializes_snake_case() {
        let json = serde_json::to_string(&IssueType::Invalid).unwrap();
        assert_eq!(json, "\"invalid\"");
    }

    #[test]
    fn test_new_issue_is_first_open_occurrence() {
        let issue = Issue::new(Id(10), Id(1), "KeyError", "main()");
        assert_eq!(issue.occurrences, 1);
        assert_eq!(issue.issue_type, IssueType::Open);
        assert!(issue.assignee_id.is_none());
    }

    #[test]
    fn test_project_contributors() {
        let mut project = Project::new(Id(1), "Welcomer", Id(100));
        project.settings.contributor_ids.push(Id(200));

        assert!(project.is_contributor(Id(100)));
        assert!(project.is_contributor(Id(200)));
        assert!(!project.is_contributor(Id(300)));
        assert!(!project.is_contributor(Id::NONE));
    }

    #[test]
    fn test_project_counters() {
        let mut project = Project::new(Id(1), "Welcomer", Id(100));
        project.count_issue(IssueType::Open);
        project.uncount_issue(IssueType::Open);
        project.count_issue(IssueType::Resolved);
        project.count_issue(IssueType::Invalid);

        assert_eq!(project.open_issues, 0);
        assert_eq!(project.resolved_issues, 1);
        assert_eq!(project.active_issues, 0);
    }

    #[test]
    fn test_system_comments() {
        let note = Comment::lock_note(Id(5), Id(4), Id(3), true);
        assert_eq!(note.kind, CommentKind::CommentsLocked);
        assert_eq!(note.comments_locked, Some(true));
        assert!(note.content.is_none());

        let marked = Comment::status_note(Id(6), Id(4), Id(3), IssueType::Resolved);
        assert_eq!(CommentKind::from_code(marked.kind.code()), CommentKind::IssueMarked);
        assert_eq!(marked.issue_marked, Some(IssueType::Resolved));
    }
}
