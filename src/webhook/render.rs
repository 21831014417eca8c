//! What an event says.
//!
//! [`render`] turns an event into a presentation-neutral [`RichMessage`], or
//! `None` when the event must not notify anyone.

use crate::model::{Issue, Project, User};
use crate::util::truncate_chars;
use crate::webhook::event::WebhookEvent;
use serde::Serialize;

/// Longest description carried by a message, before the `...` marker.
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
    pub icon_url: String,
}

impl From<&User> for EmbedAuthor {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            icon_url: user.avatar.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichEmbed {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub author: EmbedAuthor,
}

/// A chat-style message: plain content, a single embed, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct RichMessage {
    pub content: Option<String>,
    pub embed: Option<RichEmbed>,
}

/// Render `event` for `project`, linking under `base_url`.
///
/// Returns `None` for events that must not notify: un-starring an issue.
#[must_use]
pub fn render(project: &Project, event: &WebhookEvent, base_url: &str) -> Option<RichMessage> {
    let embed = |issue: &Issue, author: &User, title: String, description: Option<String>| {
        RichMessage {
            content: None,
            embed: Some(RichEmbed {
                title: format!("[{}] {title}", project.settings.display_name),
                url: issue_url(base_url, project, issue),
                description,
                author: EmbedAuthor::from(author),
            }),
        }
    };

    let message = match event {
        WebhookEvent::TestWebhook => RichMessage {
            content: Some("Test Webhook".to_string()),
            embed: None,
        },
        WebhookEvent::IssueCreate { issue, author } => embed(
            issue,
            author,
            format!("Issue opened: {}", issue.error),
            excerpt(&issue.description),
        ),
        WebhookEvent::IssueComment {
            issue,
            comment,
            author,
        } => embed(
            issue,
            author,
            format!("New comment on issue: {}", issue.error),
            comment.content.as_deref().and_then(excerpt),
        ),
        WebhookEvent::IssueStarred { issue, author } => {
            if !issue.starred {
                return None;
            }
            embed(
                issue,
                author,
                format!("New star added to {}", issue.error),
                None,
            )
        }
        WebhookEvent::IssueAssigned {
            issue,
            assignee,
            author,
        } => {
            let title = match assignee {
                Some(assignee) => format!("Issue {} assigned to {}", issue.error, assignee.name),
                None => format!("Issue {} has been unassigned", issue.error),
            };
            embed(issue, author, title, None)
        }
        WebhookEvent::IssueLocked { issue, author } => {
            let state = if issue.comments_locked {
                "locked"
            } else {
                "unlocked"
            };
            embed(
                issue,
                author,
                format!("Issue {} has been {state}", issue.error),
                None,
            )
        }
        WebhookEvent::IssueMarkStatus { issue, author } => embed(
            issue,
            author,
            format!("Issue {} has been marked {}", issue.error, issue.issue_type),
            None,
        ),
    };

    Some(message)
}

/// `<base>/project/<project id>/issue/<issue id>`
#[must_use]
pub fn issue_url(base_url: &str, project: &Project, issue: &Issue) -> String {
    format!(
        "{}/project/{}/issue/{}",
        base_url.trim_end_matches('/'),
        project.id,
        issue.id
    )
}

fn excerpt(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(truncate_chars(text, MAX_DESCRIPTION_CHARS))
    }
}
