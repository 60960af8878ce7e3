use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("version control error: {message}")]
    VersionControl { message: String, output: String },
    #[error("issue tracker error: {0}")]
    IssueTracker(String),
    #[error("no ticket key found in branch {0:?}")]
    KeyNotFound(String),
    #[error("issue type {0:?} is not mapped to a branch type")]
    UnmappedIssueType(String),
    #[error("no local branch is associated with a Jira issue")]
    NoManagedBranches,
    #[error("no associated Jira issues in DONE status")]
    NothingToDelete,
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl AppError {
    pub fn version_control(message: impl Into<String>) -> Self {
        Self::VersionControl {
            message: message.into(),
            output: String::new(),
        }
    }

    /// Terminal conditions that describe a clean repository rather than a failure.
    pub fn is_expected_outcome(&self) -> bool {
        matches!(self, Self::NoManagedBranches | Self::NothingToDelete)
    }
}

pub type AppResult<T> = Result<T, AppError>;
