//! Paged issue search over a project.

use crate::error::Result;
use crate::model::Issue;
use crate::query::{PAGE_SIZE, compile};
use crate::storage::IssueStore;
use crate::util::id::Id;
use serde::Serialize;
use tracing::debug;

/// One window of matching issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchPage {
    pub issues: Vec<Issue>,
    /// Matching issues across all pages.
    pub total: usize,
    pub page: i64,
    pub page_size: usize,
}

impl SearchPage {
    /// No further page holds matches.
    #[must_use]
    pub fn is_last_page(&self) -> bool {
        let page = usize::try_from(self.page.max(0)).unwrap_or(usize::MAX);
        page.saturating_add(1).saturating_mul(self.page_size) >= self.total
    }
}

/// Compiles queries and runs them against an [`IssueStore`].
#[derive(Debug)]
pub struct IssueSearchEngine<'a, S> {
    store: &'a S,
}

impl<'a, S: IssueStore> IssueSearchEngine<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Search a project's issues as `caller` (`Id::NONE` when anonymous).
    ///
    /// Negative pages read page 0.
    ///
    /// # Errors
    ///
    /// Returns storage errors unchanged.
    pub fn search(&self, project_id: Id, query: &str, page: i64, caller: Id) -> Result<SearchPage> {
        let plan = compile(query, caller).with_page(page);
        let (issues, total) = self.store.find_matching(project_id, &plan)?;

        debug!(
            project_id = %project_id,
            page,
            returned = issues.len(),
            total,
            "Issue search"
        );

        Ok(SearchPage {
            issues,
            total,
            page,
            page_size: PAGE_SIZE,
        })
    }
}
