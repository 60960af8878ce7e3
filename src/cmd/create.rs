use clap::Args;
use owo_colors::OwoColorize;

use crate::context::AppContext;
use crate::error::AppResult;
use crate::workflow::create::{CreateArgs, create_branch};

#[derive(Args, Debug, Clone)]
pub struct CreateCommandArgs {
    /// Jira issue key, e.g. TST-101.
    pub issue: String,
    /// Branch type (or alias) to use instead of the configured mapping.
    #[arg(short = 't', long = "type")]
    pub branch_type: Option<String>,
    /// Push the new branch to the configured remote.
    #[arg(short, long)]
    pub push: bool,
}

pub async fn run(ctx: &AppContext, args: CreateCommandArgs) -> AppResult<()> {
    let outcome = create_branch(
        ctx,
        CreateArgs {
            issue_key: args.issue,
            branch_type: args.branch_type,
            push: args.push,
        },
    )
    .await?;

    println!("{} {}", outcome.ticket.key.bold(), outcome.ticket.summary);
    println!("Branch ready: {}", outcome.branch.green());
    if let Some(remote) = &outcome.pushed_to {
        println!("Pushed to {remote}");
    }
    Ok(())
}
