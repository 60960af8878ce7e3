use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::branch::BranchName;
use crate::error::{AppError, AppResult};
use crate::services::VersionControlService;

pub struct GitCli {
    workspace_root: PathBuf,
}

impl GitCli {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }

    async fn run(&self, args: &[&str]) -> AppResult<String> {
        let command_line = format!("git {}", args.join(" "));
        debug!(command = %command_line, "running git");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workspace_root)
            .output()
            .await
            .map_err(|err| AppError::version_control(format!("failed to run {command_line}: {err}")))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(AppError::VersionControl {
                message: format!("{command_line} exited with {}", output.status),
                output: combined,
            });
        }
        Ok(combined)
    }
}

/// Branch names from `git branch` output, without the current-branch marker.
pub fn parse_branch_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| line.trim_start_matches(['*', '+']).trim())
        .filter(|line| !line.is_empty() && !line.starts_with('('))
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl VersionControlService for GitCli {
    async fn has_branch(&self, branch: &str) -> bool {
        let exists = self.run(&["branch", "--contains", branch]).await.is_ok();
        debug!(branch, exists, "checked local branch");
        exists
    }

    async fn checkout(&self, branch: &BranchName, create: bool) -> AppResult<String> {
        if branch.as_str().is_empty() {
            return Err(AppError::version_control("branch name cannot be empty"));
        }
        if create {
            self.run(&["checkout", "-b", branch.as_str()]).await
        } else {
            self.run(&["checkout", branch.as_str()]).await
        }
    }

    async fn ensure_clean(&self) -> AppResult<()> {
        let status = self.run(&["status", "-s"]).await?;
        if status.trim().is_empty() {
            Ok(())
        } else {
            Err(AppError::VersionControl {
                message: "current branch has uncommitted changes".to_string(),
                output: status,
            })
        }
    }

    async fn local_branches(&self) -> AppResult<Vec<String>> {
        let raw = self.run(&["branch"]).await?;
        Ok(parse_branch_list(&raw))
    }

    async fn fetch_prune(&self) -> AppResult<String> {
        self.run(&["fetch", "-p"]).await
    }

    async fn delete_local(&self, branch: &str) -> AppResult<String> {
        self.run(&["branch", "-D", branch]).await
    }

    async fn delete_remote(&self, remote: &str, branch: &str) -> AppResult<String> {
        self.run(&["push", "-d", remote, branch]).await
    }

    async fn push(&self, remote: &str, branch: &BranchName) -> AppResult<String> {
        self.run(&["push", "-u", remote, branch.as_str()]).await
    }
}
