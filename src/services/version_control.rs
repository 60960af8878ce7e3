use async_trait::async_trait;

use crate::domain::branch::BranchName;
use crate::error::AppResult;

/// Git operations used by the workflows. Every call returns the combined
/// stdout/stderr of the command on success.
#[async_trait]
pub trait VersionControlService: Send + Sync {
    async fn has_branch(&self, branch: &str) -> bool;
    async fn checkout(&self, branch: &BranchName, create: bool) -> AppResult<String>;
    /// Fails when the working tree has uncommitted changes.
    async fn ensure_clean(&self) -> AppResult<()>;
    async fn local_branches(&self) -> AppResult<Vec<String>>;
    async fn fetch_prune(&self) -> AppResult<String>;
    async fn delete_local(&self, branch: &str) -> AppResult<String>;
    async fn delete_remote(&self, remote: &str, branch: &str) -> AppResult<String>;
    async fn push(&self, remote: &str, branch: &BranchName) -> AppResult<String>;
}
