//! Request bodies.
//!
//! Generic webhooks receive the event envelope, shaped like the REST API's
//! response objects. Platform webhooks receive the rendered message in the
//! chat-platform layout (`content` plus an `embeds` array).

use crate::model::{Comment, Issue, Project, User};
use crate::util::id::Id;
use crate::webhook::event::{EventKind, WebhookEvent};
use crate::webhook::render::{RichEmbed, RichMessage};
use serde::Serialize;

/// Public view of a project; settings like contributors stay private.
#[derive(Debug, Serialize)]
pub struct ProjectSummary<'a> {
    pub id: Id,
    pub name: &'a str,
    pub description: &'a str,
    pub archived: bool,
    pub private: bool,
    pub open_issues: i64,
    pub active_issues: i64,
    pub resolved_issues: i64,
}

impl<'a> From<&'a Project> for ProjectSummary<'a> {
    fn from(project: &'a Project) -> Self {
        Self {
            id: project.id,
            name: &project.settings.display_name,
            description: &project.settings.description,
            archived: project.settings.archived,
            private: project.settings.private,
            open_issues: project.open_issues,
            active_issues: project.active_issues,
            resolved_issues: project.resolved_issues,
        }
    }
}

/// The generic event envelope.
#[derive(Debug, Serialize)]
pub struct EventEnvelope<'a> {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub project: ProjectSummary<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<&'a Issue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<&'a Comment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<&'a User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<&'a User>,
}

#[must_use]
pub fn generic_body<'a>(project: &'a Project, event: &'a WebhookEvent) -> EventEnvelope<'a> {
    EventEnvelope {
        kind: event.kind(),
        project: ProjectSummary::from(project),
        issue: event.issue(),
        comment: event.comment(),
        assignee: event.assignee(),
        author: event.author(),
    }
}

/// Chat-platform message body.
#[derive(Debug, Serialize)]
pub struct PlatformMessage<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<&'a str>,
    pub embeds: Vec<&'a RichEmbed>,
}

#[must_use]
pub fn platform_body(message: &RichMessage) -> PlatformMessage<'_> {
    PlatformMessage {
        content: message.content.as_deref(),
        embeds: message.embed.iter().collect(),
    }
}
