#![allow(dead_code)]

use errorly::model::{Issue, IssueType};
use errorly::util::id::Id;
use chrono::{DateTime, Duration, TimeZone, Utc};

/// Fixed base time so ordering by `last_modified` is deterministic.
pub fn base_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_735_689_600, 0).unwrap() // 2025-01-01 00:00:00 UTC
}

pub struct IssueBuilder {
    issue: Issue,
}

impl IssueBuilder {
    pub fn new(id: i64, project_id: Id, error: &str) -> Self {
        let mut issue = Issue::new(Id(id), project_id, error, "handler()");
        issue.created_at = base_time();
        issue.last_modified = base_time();
        Self { issue }
    }

    pub fn with_type(mut self, t: IssueType) -> Self {
        self.issue.issue_type = t;
        self
    }

    pub fn starred(mut self) -> Self {
        self.issue.starred = true;
        self
    }

    pub fn with_occurrences(mut self, n: i64) -> Self {
        self.issue.occurrences = n;
        self
    }

    pub fn assigned_to(mut self, user: Id) -> Self {
        self.issue.assignee_id = user;
        self
    }

    pub fn created_by(mut self, user: Id) -> Self {
        self.issue.created_by_id = user;
        self
    }

    pub fn locked(mut self) -> Self {
        self.issue.comments_locked = true;
        self
    }

    pub fn modified_after(mut self, seconds: i64) -> Self {
        self.issue.last_modified = base_time() + Duration::seconds(seconds);
        self
    }

    pub fn build(self) -> Issue {
        self.issue
    }
}
