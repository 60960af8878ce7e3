use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::domain::branch::extract_ticket_key;
use crate::domain::ticket::{StatusCategory, Ticket};
use crate::error::{AppError, AppResult};
use crate::services::{IssueTrackerService, VersionControlService};
use crate::workflow::rate_gate::RateGate;
use crate::workflow::stage::{CleanProgress, CleanStage};

pub const BATCH_SIZE: usize = 100;
pub const REQUESTS_PER_SECOND: u32 = 5;
pub const MAX_IN_FLIGHT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    /// Key count at which the engine switches to bulk fetches, and the size of each batch.
    pub batch_size: usize,
    /// Issuance rate of bulk requests.
    pub requests_per_second: u32,
    /// Concurrent single-issue lookups below the batch threshold. This bounds
    /// outstanding requests only, not their rate.
    pub max_in_flight: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            batch_size: BATCH_SIZE,
            requests_per_second: REQUESTS_PER_SECOND,
            max_in_flight: MAX_IN_FLIGHT,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReconciliationInput {
    pub local_branches: Vec<String>,
    pub assignee: Option<String>,
    pub remote: Option<String>,
}

/// Branch name to the status category of its ticket.
pub type ReconciliationResult = BTreeMap<String, StatusCategory>;

pub struct ReconciliationEngine {
    source: Arc<dyn IssueTrackerService>,
    limits: FetchLimits,
    gate: Arc<RateGate>,
}

impl ReconciliationEngine {
    /// Must be called from within a Tokio runtime; the engine owns its rate gate.
    pub fn new(source: Arc<dyn IssueTrackerService>, limits: FetchLimits) -> Self {
        let limits = FetchLimits {
            batch_size: limits.batch_size.max(1),
            requests_per_second: limits.requests_per_second.max(1),
            max_in_flight: limits.max_in_flight.max(1),
        };
        Self {
            source,
            gate: Arc::new(RateGate::per_second(limits.requests_per_second)),
            limits,
        }
    }

    pub async fn reconcile(&self, input: &ReconciliationInput) -> AppResult<ReconciliationResult> {
        self.reconcile_with_progress(input, &mut CleanProgress::new())
            .await
    }

    pub async fn reconcile_with_progress(
        &self,
        input: &ReconciliationInput,
        progress: &mut CleanProgress,
    ) -> AppResult<ReconciliationResult> {
        progress.advance(CleanStage::Extracting);
        let pairs = progress.check(extract_keys(&input.local_branches))?;

        progress.advance(CleanStage::Fetching);
        let assignee = input
            .assignee
            .as_deref()
            .map(str::trim)
            .filter(|assignee| !assignee.is_empty());
        let keys: BTreeSet<String> = pairs.values().cloned().collect();
        let tickets = self.fetch_statuses(&keys, assignee.is_some()).await;

        progress.advance(CleanStage::Filtering);
        Ok(pair_statuses(&pairs, &tickets, assignee))
    }

    /// Current status of every key. Keys whose lookup failed are absent.
    pub async fn fetch_statuses(
        &self,
        keys: &BTreeSet<String>,
        include_assignee: bool,
    ) -> HashMap<String, Ticket> {
        if keys.len() < self.limits.batch_size {
            self.fetch_individually(keys, include_assignee).await
        } else {
            let keys: Vec<String> = keys.iter().cloned().collect();
            self.fetch_in_batches(keys, include_assignee).await
        }
    }

    async fn fetch_individually(
        &self,
        keys: &BTreeSet<String>,
        include_assignee: bool,
    ) -> HashMap<String, Ticket> {
        stream::iter(keys)
            .map(|key| async move {
                match self.source.fetch_status(key, include_assignee).await {
                    Ok(ticket) => Some((key.clone(), ticket)),
                    Err(err) => {
                        warn!(key = %key, error = %err, "failed to fetch issue status");
                        None
                    }
                }
            })
            .buffer_unordered(self.limits.max_in_flight)
            .filter_map(|fetched| async move { fetched })
            .collect()
            .await
    }

    async fn fetch_in_batches(
        &self,
        keys: Vec<String>,
        include_assignee: bool,
    ) -> HashMap<String, Ticket> {
        let mut workers = JoinSet::new();

        for (index, chunk) in keys.chunks(self.limits.batch_size).enumerate() {
            let source = Arc::clone(&self.source);
            let gate = Arc::clone(&self.gate);
            let batch = chunk.to_vec();
            workers.spawn(async move {
                gate.acquire().await;
                debug!(batch = index, size = batch.len(), "requesting issue status batch");
                match source.fetch_status_bulk(&batch, include_assignee).await {
                    Ok(tickets) => tickets,
                    Err(err) => {
                        warn!(batch = index, size = batch.len(), error = %err, "failed to fetch issue status batch");
                        Vec::new()
                    }
                }
            });
        }

        let mut batches = Vec::with_capacity(workers.len());
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(tickets) => batches.push(tickets),
                Err(err) => warn!(error = %err, "issue status batch worker did not finish"),
            }
        }

        batches
            .into_iter()
            .flatten()
            .map(|ticket| (ticket.key.clone(), ticket))
            .collect()
    }
}

/// Branch name to ticket key for every branch created by this tool.
pub fn extract_keys(branches: &[String]) -> AppResult<BTreeMap<String, String>> {
    let mut pairs = BTreeMap::new();
    for branch in branches {
        let branch = branch.trim().trim_start_matches(['*', '+']).trim_start();
        match extract_ticket_key(branch) {
            Ok(key) => {
                info!(%branch, %key, "paired branch with issue");
                pairs.insert(branch.to_string(), key);
            }
            Err(err) => debug!(error = %err, "skipping branch"),
        }
    }

    if pairs.is_empty() {
        return Err(AppError::NoManagedBranches);
    }
    Ok(pairs)
}

fn pair_statuses(
    pairs: &BTreeMap<String, String>,
    tickets: &HashMap<String, Ticket>,
    assignee: Option<&str>,
) -> ReconciliationResult {
    let mut result = ReconciliationResult::new();
    for (branch, key) in pairs {
        let Some(ticket) = tickets.get(key) else {
            debug!(%branch, %key, "no status fetched for issue");
            continue;
        };
        let Some(status) = &ticket.status else {
            debug!(%branch, %key, "issue has no status category");
            continue;
        };
        if let Some(assignee) = assignee {
            if let Err(reason) = check_assignee(ticket, assignee) {
                debug!(%branch, %reason, "skipping branch");
                continue;
            }
        }

        info!(%branch, status = %status.name, "paired branch with status");
        result.insert(branch.clone(), status.clone());
    }
    result
}

fn check_assignee(ticket: &Ticket, assignee: &str) -> Result<(), String> {
    let username = ticket.assignee_username().ok_or_else(|| {
        format!(
            "assignee email {:?} of issue {} is missing or invalid",
            ticket.assignee_email.as_deref().unwrap_or_default(),
            ticket.key
        )
    })?;
    if username != assignee {
        return Err(format!(
            "issue {} has assignee {username:?} but looking for {assignee:?}",
            ticket.key
        ));
    }
    Ok(())
}

/// Branches whose ticket reached the done category, in name order.
pub fn decide(result: &ReconciliationResult) -> AppResult<Vec<String>> {
    let selected: Vec<String> = result
        .iter()
        .filter(|(_, status)| status.is_done())
        .map(|(branch, _)| branch.clone())
        .collect();

    if selected.is_empty() {
        return Err(AppError::NothingToDelete);
    }
    Ok(selected)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionFailure {
    pub branch: String,
    /// Set when the failed deletion targeted the remote.
    pub remote: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionReport {
    pub deleted_local: Vec<String>,
    pub deleted_remote: Vec<String>,
    pub failures: Vec<DeletionFailure>,
}

/// Deletes every branch locally, and on `remote` when given. A failure on one
/// branch never stops the others.
pub async fn delete_branches(
    vcs: &dyn VersionControlService,
    branches: &[String],
    remote: Option<&str>,
) -> DeletionReport {
    let mut report = DeletionReport::default();

    for branch in branches {
        match vcs.delete_local(branch).await {
            Ok(output) => {
                info!(%branch, output = output.trim(), "deleted local branch");
                report.deleted_local.push(branch.clone());
            }
            Err(err) => {
                error!(%branch, error = %err, output = command_output(&err), "failed to delete local branch");
                report.failures.push(DeletionFailure {
                    branch: branch.clone(),
                    remote: None,
                    error: err.to_string(),
                });
            }
        }

        let Some(remote) = remote else {
            continue;
        };
        match vcs.delete_remote(remote, branch).await {
            Ok(output) => {
                info!(%remote, %branch, output = output.trim(), "deleted remote branch");
                report.deleted_remote.push(branch.clone());
            }
            Err(err) => {
                error!(%remote, %branch, error = %err, output = command_output(&err), "failed to delete remote branch");
                report.failures.push(DeletionFailure {
                    branch: branch.clone(),
                    remote: Some(remote.to_string()),
                    error: err.to_string(),
                });
            }
        }
    }

    report
}

fn command_output(err: &AppError) -> &str {
    match err {
        AppError::VersionControl { output, .. } => output.trim(),
        _ => "",
    }
}
