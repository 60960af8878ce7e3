use tracing::{info, warn};

use crate::context::AppContext;
use crate::domain::branch::{BranchName, BranchType, NameSynthesizer};
use crate::domain::ticket::{IssueType, Ticket};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct CreateArgs {
    pub issue_key: String,
    /// Branch type name or alias overriding the mapped issue type.
    pub branch_type: Option<String>,
    pub push: bool,
}

pub struct CreateOutcome {
    pub ticket: Ticket,
    pub branch: BranchName,
    pub pushed_to: Option<String>,
}

pub async fn create_branch(ctx: &AppContext, args: CreateArgs) -> AppResult<CreateOutcome> {
    let issue_key = args.issue_key.trim();
    if issue_key.is_empty() {
        return Err(AppError::Configuration(
            "issue key must not be empty".to_string(),
        ));
    }

    let override_type = args
        .branch_type
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .map(BranchType::parse)
        .transpose()?;

    let remote = if args.push {
        Some(ctx.config.default_remote.clone().ok_or_else(|| {
            AppError::Configuration("branch.origin is not set".to_string())
        })?)
    } else {
        None
    };

    if ctx.config.exclude_phrases.is_empty() {
        warn!("branch.exclude is not set");
    }
    let synthesizer = NameSynthesizer::new(&ctx.config.exclude_phrases)?;

    let ticket = ctx.issue_tracker.fetch_issue(issue_key).await?;

    let branch_type = match override_type {
        Some(branch_type) => branch_type,
        None => resolve_type(ctx, &ticket),
    };

    let branch = synthesizer.build(branch_type, &ticket.key, &ticket.summary);

    let vcs = ctx.version_control.as_ref();
    let exists = vcs.has_branch(branch.as_str()).await;
    let output = vcs.checkout(&branch, !exists).await?;
    info!(%branch, output = output.trim(), "checked out branch");

    if let Some(remote) = &remote {
        let output = vcs.push(remote, &branch).await?;
        info!(%remote, %branch, output = output.trim(), "pushed branch");
    }

    Ok(CreateOutcome {
        ticket,
        branch,
        pushed_to: remote,
    })
}

fn resolve_type(ctx: &AppContext, ticket: &Ticket) -> BranchType {
    if ctx.config.type_mapping.is_empty() {
        warn!("no issue type mapping configured, creating branch without a type");
        return BranchType::None;
    }
    match ctx.config.type_mapping.resolve(&ticket.type_id) {
        Ok(branch_type) => branch_type,
        Err(err) => {
            warn!(key = %ticket.key, error = %err, "creating branch without a type");
            BranchType::None
        }
    }
}

pub struct IssueTypeReport {
    pub mapped: Vec<(IssueType, BranchType)>,
    pub ignored: Vec<IssueType>,
}

/// Jira issue types split by whether the configured mapping covers them.
pub async fn list_issue_types(ctx: &AppContext) -> AppResult<IssueTypeReport> {
    let issue_types = ctx.issue_tracker.fetch_issue_types().await?;
    let (mapped, ignored) = ctx.config.type_mapping.partition(&issue_types);
    Ok(IssueTypeReport {
        mapped: mapped
            .into_iter()
            .map(|(issue_type, tag)| (issue_type.clone(), tag))
            .collect(),
        ignored: ignored.into_iter().cloned().collect(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::domain::mapping::TypeMapping;
    use crate::workflow::fakes::{FakeGit, FakeTracker, context, test_config};

    fn issue(key: &str, type_id: &str, summary: &str) -> Ticket {
        Ticket {
            key: key.to_string(),
            type_id: type_id.to_string(),
            summary: summary.to_string(),
            ..Ticket::default()
        }
    }

    fn mapped_config() -> crate::config::AppConfig {
        let mut table = BTreeMap::new();
        table.insert("fix".to_string(), vec!["10004".to_string()]);
        table.insert("feat".to_string(), vec!["10001".to_string()]);
        let mut config = test_config();
        config.type_mapping = TypeMapping::from_table(&table).unwrap();
        config
    }

    fn args(key: &str, branch_type: Option<&str>, push: bool) -> CreateArgs {
        CreateArgs {
            issue_key: key.to_string(),
            branch_type: branch_type.map(str::to_string),
            push,
        }
    }

    #[tokio::test]
    async fn creates_branch_from_mapped_type() {
        let git = Arc::new(FakeGit::default());
        let tracker = Arc::new(FakeTracker::with_tickets([issue(
            "TST-101",
            "10004",
            "[Android] \"MY\" (super)_branchSummary",
        )]));
        let ctx = context(mapped_config(), git.clone(), tracker);

        let outcome = create_branch(&ctx, args("TST-101", None, false))
            .await
            .unwrap();

        assert_eq!(outcome.branch.as_str(), "fix/TST-101_my-super-branch-summary");
        assert_eq!(git.calls(), vec!["checkout -b fix/TST-101_my-super-branch-summary"]);
        assert_eq!(outcome.pushed_to, None);
    }

    #[tokio::test]
    async fn override_wins_over_mapping() {
        let git = Arc::new(FakeGit::default());
        let tracker = Arc::new(FakeTracker::with_tickets([issue(
            "TST-7",
            "10004",
            "Speed up HTTPClient",
        )]));
        let ctx = context(mapped_config(), git.clone(), tracker);

        let outcome = create_branch(&ctx, args("TST-7", Some("p"), true))
            .await
            .unwrap();

        assert_eq!(outcome.branch.as_str(), "perf/TST-7_speed-up-http-client");
        assert_eq!(outcome.pushed_to.as_deref(), Some("origin"));
        assert_eq!(
            git.calls(),
            vec![
                "checkout -b perf/TST-7_speed-up-http-client",
                "push -u origin perf/TST-7_speed-up-http-client",
            ]
        );
    }

    #[tokio::test]
    async fn unmapped_type_creates_untyped_branch() {
        let git = Arc::new(FakeGit::default());
        let tracker = Arc::new(FakeTracker::with_tickets([issue("TST-8", "10000", "Epic work")]));
        let ctx = context(mapped_config(), git, tracker);

        let outcome = create_branch(&ctx, args("TST-8", None, false)).await.unwrap();

        assert_eq!(outcome.branch.as_str(), "TST-8_epic-work");
    }

    #[tokio::test]
    async fn unknown_override_fails_before_network() {
        let git = Arc::new(FakeGit::default());
        let tracker = Arc::new(FakeTracker::default());
        let ctx = context(mapped_config(), git.clone(), tracker);

        let result = create_branch(&ctx, args("TST-9", Some("feature"), false)).await;

        assert!(matches!(result, Err(AppError::Configuration(_))));
        assert!(git.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_issue_propagates() {
        let git = Arc::new(FakeGit::default());
        let tracker = Arc::new(FakeTracker::default());
        let ctx = context(mapped_config(), git.clone(), tracker);

        let result = create_branch(&ctx, args("TST-404", None, false)).await;

        assert!(matches!(result, Err(AppError::IssueTracker(_))));
        assert!(git.calls().is_empty());
    }

    #[tokio::test]
    async fn reports_issue_type_coverage() {
        let tracker = Arc::new(FakeTracker::default().with_issue_types(vec![
            IssueType {
                id: "10004".to_string(),
                name: "Bug".to_string(),
            },
            IssueType {
                id: "10000".to_string(),
                name: "Epic".to_string(),
            },
        ]));
        let ctx = context(mapped_config(), Arc::new(FakeGit::default()), tracker);

        let report = list_issue_types(&ctx).await.unwrap();

        assert_eq!(report.mapped.len(), 1);
        assert_eq!(report.mapped[0].1, BranchType::Fix);
        assert_eq!(report.ignored[0].name, "Epic");
    }
}
