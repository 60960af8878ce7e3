use async_trait::async_trait;

use crate::domain::ticket::{IssueType, Ticket};
use crate::error::AppResult;

#[async_trait]
pub trait IssueTrackerService: Send + Sync {
    /// Issue type and summary of a single issue.
    async fn fetch_issue(&self, key: &str) -> AppResult<Ticket>;
    async fn fetch_issue_types(&self) -> AppResult<Vec<IssueType>>;
    /// Status category, plus the assignee when `include_assignee` is set.
    async fn fetch_status(&self, key: &str, include_assignee: bool) -> AppResult<Ticket>;
    async fn fetch_status_bulk(
        &self,
        keys: &[String],
        include_assignee: bool,
    ) -> AppResult<Vec<Ticket>>;
}
