//! Command implementations.

pub mod id;
pub mod init;
pub mod issue;
pub mod project;
pub mod search;
pub mod webhook;

use crate::config::Config;
use crate::error::{ErrorlyError, Result};
use crate::model::{Project, User};
use crate::storage::{ProjectStore, SqliteStorage};
use crate::util::id::Id;
use crate::webhook::{DeliveryReport, WebhookDispatcher, WebhookEvent};
use serde::Serialize;

/// Resolved settings shared by every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: Config,
    pub json: bool,
    pub actor: User,
}

impl CommandContext {
    #[must_use]
    pub const fn new(config: Config, json: bool, actor: User) -> Self {
        Self {
            config,
            json,
            actor,
        }
    }

    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_storage(&self) -> Result<SqliteStorage> {
        SqliteStorage::open(&self.config.database)
    }

    /// Deliver an event to the project's webhooks over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or webhook
    /// health cannot be persisted.
    pub fn notify(
        &self,
        storage: &SqliteStorage,
        project: &Project,
        event: &WebhookEvent,
    ) -> Result<DeliveryReport> {
        let transport = self.config.transport()?;
        WebhookDispatcher::new(storage, transport, self.config.url.as_str()).notify(project, event)
    }

    /// Print `value` as pretty JSON, or `text` otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }
}

/// # Errors
///
/// Returns `ProjectNotFound` if no project has this id.
pub fn require_project(storage: &SqliteStorage, id: Id) -> Result<Project> {
    storage
        .find_project(id)?
        .ok_or(ErrorlyError::ProjectNotFound { id })
}

/// One-line webhook summary for text output.
#[must_use]
pub fn delivery_summary(report: &DeliveryReport) -> String {
    let mut line = format!(
        "webhooks: {} delivered, {} failed",
        report.delivered, report.failed
    );
    if report.suppressed > 0 {
        line.push_str(&format!(", {} suppressed", report.suppressed));
    }
    if report.disabled > 0 {
        line.push_str(&format!(", {} disabled", report.disabled));
    }
    line
}
