//! In-memory service doubles shared by the workflow tests.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::context::AppContext;
use crate::domain::branch::BranchName;
use crate::domain::mapping::TypeMapping;
use crate::domain::ticket::{IssueType, StatusCategory, Ticket};
use crate::error::{AppError, AppResult};
use crate::services::{IssueTrackerService, VersionControlService};

pub fn status(id: i64) -> StatusCategory {
    let name = match id {
        3 => "done",
        4 => "indeterminate",
        _ => "new",
    };
    StatusCategory {
        id,
        name: name.to_string(),
    }
}

pub fn ticket(key: &str, status_id: i64, assignee: Option<&str>) -> Ticket {
    Ticket {
        key: key.to_string(),
        status: Some(status(status_id)),
        assignee_email: assignee.map(str::to_string),
        ..Ticket::default()
    }
}

#[derive(Default)]
pub struct FakeTracker {
    tickets: HashMap<String, Ticket>,
    issue_types: Vec<IssueType>,
    failing: HashSet<String>,
    latency: Duration,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    pub single_calls: Mutex<Vec<String>>,
    pub bulk_calls: Mutex<Vec<(Instant, Vec<String>)>>,
}

impl FakeTracker {
    pub fn with_tickets(tickets: impl IntoIterator<Item = Ticket>) -> Self {
        Self {
            tickets: tickets.into_iter().map(|t| (t.key.clone(), t)).collect(),
            ..Self::default()
        }
    }

    pub fn with_issue_types(mut self, types: Vec<IssueType>) -> Self {
        self.issue_types = types;
        self
    }

    /// Requests touching `key` fail, including whole batches containing it.
    pub fn failing(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    /// Every single-issue lookup sleeps for `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn single_call_count(&self) -> usize {
        self.single_calls.lock().unwrap().len()
    }

    pub fn bulk_batches(&self) -> Vec<(Instant, Vec<String>)> {
        self.bulk_calls.lock().unwrap().clone()
    }

    fn lookup(&self, key: &str) -> AppResult<Ticket> {
        if self.failing.contains(key) {
            return Err(AppError::IssueTracker(format!("{key}: Jira responded with 500")));
        }
        self.tickets
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::IssueTracker(format!("Issue {key} does not exist")))
    }
}

#[async_trait]
impl IssueTrackerService for FakeTracker {
    async fn fetch_issue(&self, key: &str) -> AppResult<Ticket> {
        self.lookup(key)
    }

    async fn fetch_issue_types(&self) -> AppResult<Vec<IssueType>> {
        Ok(self.issue_types.clone())
    }

    async fn fetch_status(&self, key: &str, include_assignee: bool) -> AppResult<Ticket> {
        self.single_calls.lock().unwrap().push(key.to_string());
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let mut ticket = self.lookup(key)?;
        if !include_assignee {
            ticket.assignee_email = None;
        }
        Ok(ticket)
    }

    async fn fetch_status_bulk(
        &self,
        keys: &[String],
        include_assignee: bool,
    ) -> AppResult<Vec<Ticket>> {
        self.bulk_calls
            .lock()
            .unwrap()
            .push((Instant::now(), keys.to_vec()));
        if keys.iter().any(|key| self.failing.contains(key)) {
            return Err(AppError::IssueTracker("bulkfetch: Jira responded with 500".to_string()));
        }
        Ok(keys
            .iter()
            .filter_map(|key| self.tickets.get(key).cloned())
            .map(|mut ticket| {
                if !include_assignee {
                    ticket.assignee_email = None;
                }
                ticket
            })
            .collect())
    }
}

#[derive(Default)]
pub struct FakeGit {
    branches: Vec<String>,
    existing: HashSet<String>,
    failing_deletes: HashSet<String>,
    dirty: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeGit {
    pub fn with_branches(branches: &[&str]) -> Self {
        Self {
            branches: branches.iter().map(|b| b.to_string()).collect(),
            existing: branches.iter().map(|b| b.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing_delete(mut self, branch: &str) -> Self {
        self.failing_deletes.insert(branch.to_string());
        self
    }

    pub fn dirty(mut self) -> Self {
        self.dirty = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn deletion_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with("branch -D") || call.starts_with("push -d"))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl VersionControlService for FakeGit {
    async fn has_branch(&self, branch: &str) -> bool {
        self.existing.contains(branch)
    }

    async fn checkout(&self, branch: &BranchName, create: bool) -> AppResult<String> {
        let flag = if create { "-b " } else { "" };
        self.record(format!("checkout {flag}{branch}"));
        Ok(format!("Switched to branch '{branch}'"))
    }

    async fn ensure_clean(&self) -> AppResult<()> {
        self.record("status -s".to_string());
        if self.dirty {
            return Err(AppError::version_control(
                "current branch has uncommitted changes",
            ));
        }
        Ok(())
    }

    async fn local_branches(&self) -> AppResult<Vec<String>> {
        self.record("branch".to_string());
        Ok(self.branches.clone())
    }

    async fn fetch_prune(&self) -> AppResult<String> {
        self.record("fetch -p".to_string());
        Ok(String::new())
    }

    async fn delete_local(&self, branch: &str) -> AppResult<String> {
        self.record(format!("branch -D {branch}"));
        if self.failing_deletes.contains(branch) {
            return Err(AppError::VersionControl {
                message: format!("git branch -D {branch} exited with 1"),
                output: format!("error: branch '{branch}' not found."),
            });
        }
        Ok(format!("Deleted branch {branch}"))
    }

    async fn delete_remote(&self, remote: &str, branch: &str) -> AppResult<String> {
        self.record(format!("push -d {remote} {branch}"));
        Ok(format!("To {remote}\n - [deleted] {branch}"))
    }

    async fn push(&self, remote: &str, branch: &BranchName) -> AppResult<String> {
        self.record(format!("push -u {remote} {branch}"));
        Ok(String::new())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        jira_host: Some("example.atlassian.net".to_string()),
        jira_auth: None,
        jira_email: Some("me@co.com".to_string()),
        jira_token: Some("token".to_string()),
        default_branch: Some("develop".to_string()),
        default_remote: Some("origin".to_string()),
        exclude_phrases: vec!["android".to_string(), "mobile".to_string()],
        type_mapping: TypeMapping::default(),
        workspace_root: PathBuf::from("/repo"),
    }
}

pub fn context(config: AppConfig, git: Arc<FakeGit>, tracker: Arc<FakeTracker>) -> AppContext {
    AppContext::new(config, git, tracker)
}
