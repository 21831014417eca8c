//! Error types and handling for `errorly`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Supports `anyhow` integration for wrapped collaborator errors
//! - Provides recovery hints for operator-facing errors
//! - Query parse problems are never errors: the compiler drops them
//! - Webhook delivery failures live in `webhook::DeliveryError` and never
//!   reach callers of `WebhookDispatcher::notify`

use crate::util::id::Id;
use thiserror::Error;

/// Primary error type for `errorly` operations.
#[derive(Error, Debug)]
pub enum ErrorlyError {
    // === Storage Errors ===
    /// `SQLite` database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database schema version doesn't match expected.
    #[error("Schema version mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: i32, found: i32 },

    // === Lookup Errors ===
    /// Project with the specified ID was not found.
    #[error("Project not found: {id}")]
    ProjectNotFound { id: Id },

    /// Issue with the specified ID was not found in the project.
    #[error("Issue not found: {id}")]
    IssueNotFound { id: Id },

    /// Webhook with the specified ID was not found.
    #[error("Webhook not found: {id}")]
    WebhookNotFound { id: Id },

    // === Domain Errors ===
    /// The project is archived and does not accept new issues.
    #[error("Project {id} is archived")]
    ProjectArchived { id: Id },

    /// Comments on the issue have been locked.
    #[error("Comments are locked on issue {id}")]
    CommentsLocked { id: Id },

    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    // === Identifier Errors ===
    /// Shard id does not fit in the 13-bit shard field.
    #[error("Shard id {shard} out of range (max {max})")]
    InvalidShard { shard: u16, max: u16 },

    // === Configuration Errors ===
    /// Configuration file or environment error.
    #[error("Configuration error: {0}")]
    Config(String),

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ErrorlyError {
    /// Can the operator fix this without code changes?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ProjectNotFound { .. }
                | Self::IssueNotFound { .. }
                | Self::WebhookNotFound { .. }
                | Self::ProjectArchived { .. }
                | Self::CommentsLocked { .. }
                | Self::Validation { .. }
                | Self::InvalidShard { .. }
                | Self::Config(_)
        )
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::ProjectNotFound { .. } => Some("Create one with: errorly project create <NAME>"),
            Self::WebhookNotFound { .. } => Some("List webhooks with: errorly webhook list"),
            Self::ProjectArchived { .. } => Some("Unarchive the project before reporting issues"),
            Self::CommentsLocked { .. } => Some("Unlock with: errorly issue unlock"),
            Self::InvalidShard { .. } => Some("Use a shard id between 0 and 8191"),
            Self::SchemaMismatch { .. } => Some("Run: errorly init"),
            Self::Config(_) => Some("Check errorly.yaml and ERRORLY_* environment variables"),
            _ => None,
        }
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        1
    }

    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type using `ErrorlyError`.
pub type Result<T> = std::result::Result<T, ErrorlyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ErrorlyError::IssueNotFound { id: Id(42) };
        assert_eq!(err.to_string(), "Issue not found: 42");
    }

    #[test]
    fn test_validation_error() {
        let err = ErrorlyError::validation("error", "cannot be empty");
        assert_eq!(err.to_string(), "Validation failed: error: cannot be empty");
    }

    #[test]
    fn test_user_recoverable() {
        assert!(ErrorlyError::ProjectArchived { id: Id(1) }.is_user_recoverable());

        let not_recoverable = ErrorlyError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(1),
            None,
        ));
        assert!(!not_recoverable.is_user_recoverable());
    }

    #[test]
    fn test_suggestion() {
        let err = ErrorlyError::InvalidShard {
            shard: 9000,
            max: 8191,
        };
        assert_eq!(err.suggestion(), Some("Use a shard id between 0 and 8191"));
        assert_eq!(ErrorlyError::Config("bad".into()).exit_code(), 1);
    }
}
