use std::sync::Arc;

use tracing::info;

use crate::context::AppContext;
use crate::domain::branch::BranchName;
use crate::error::{AppError, AppResult};
use crate::workflow::reconcile::{
    DeletionReport, FetchLimits, ReconciliationEngine, ReconciliationInput, ReconciliationResult,
    decide, delete_branches,
};
use crate::workflow::stage::{CleanProgress, CleanStage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanScope {
    Local,
    All,
}

#[derive(Debug, Clone)]
pub struct CleanArgs {
    pub scope: CleanScope,
    pub assignee: Option<String>,
}

pub struct CleanOutcome {
    pub statuses: ReconciliationResult,
    pub report: DeletionReport,
}

/// Deletes branches whose Jira issue is done. Configuration is validated
/// before any git or network call.
pub async fn clean_branches(ctx: &AppContext, args: CleanArgs) -> AppResult<CleanOutcome> {
    let default_branch = ctx
        .config
        .default_branch
        .clone()
        .ok_or_else(|| AppError::Configuration("branch.default is not set".to_string()))?;
    let remote = match args.scope {
        CleanScope::Local => None,
        CleanScope::All => Some(ctx.config.default_remote.clone().ok_or_else(|| {
            AppError::Configuration("branch.origin is not set".to_string())
        })?),
    };

    let vcs = ctx.version_control.as_ref();

    let fetched = vcs.fetch_prune().await?;
    if !fetched.trim().is_empty() {
        info!(output = fetched.trim(), "fetched and pruned");
    }

    vcs.ensure_clean().await?;

    let exists = vcs.has_branch(&default_branch).await;
    let checkout = vcs.checkout(&BranchName(default_branch), !exists).await?;
    info!(output = checkout.trim(), "checked out default branch");

    let input = ReconciliationInput {
        local_branches: vcs.local_branches().await?,
        assignee: args.assignee,
        remote,
    };

    let engine = ReconciliationEngine::new(Arc::clone(&ctx.issue_tracker), FetchLimits::default());
    let mut progress = CleanProgress::new();
    let statuses = engine.reconcile_with_progress(&input, &mut progress).await?;

    progress.advance(CleanStage::Deciding);
    let selected = progress.check(decide(&statuses))?;

    progress.advance(CleanStage::Deleting);
    let report = delete_branches(vcs, &selected, input.remote.as_deref()).await;
    progress.advance(CleanStage::Done);

    Ok(CleanOutcome { statuses, report })
}
