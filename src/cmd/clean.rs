use clap::{Args, ValueEnum};
use owo_colors::OwoColorize;

use crate::context::AppContext;
use crate::error::AppResult;
use crate::workflow::clean::{CleanArgs, CleanScope, clean_branches};

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ScopeArg {
    /// Delete local branches only.
    Local,
    /// Delete local branches and their remote counterparts.
    All,
}

#[derive(Args, Debug, Clone)]
pub struct CleanCommandArgs {
    #[arg(value_enum)]
    pub scope: ScopeArg,
    /// Only consider issues assigned to this user (email username).
    #[arg(short, long)]
    pub assignee: Option<String>,
}

pub async fn run(ctx: &AppContext, args: CleanCommandArgs) -> AppResult<()> {
    let scope = match args.scope {
        ScopeArg::Local => CleanScope::Local,
        ScopeArg::All => CleanScope::All,
    };
    let outcome = clean_branches(
        ctx,
        CleanArgs {
            scope,
            assignee: args.assignee,
        },
    )
    .await?;

    for (branch, status) in &outcome.statuses {
        if status.is_done() {
            println!("{:<12} {branch}", status.name.green());
        } else {
            println!("{:<12} {branch}", status.name.dimmed());
        }
    }

    let report = &outcome.report;
    println!();
    println!("Deleted {} local branch(es)", report.deleted_local.len());
    if scope == CleanScope::All {
        println!("Deleted {} remote branch(es)", report.deleted_remote.len());
    }
    for failure in &report.failures {
        let target = match &failure.remote {
            Some(remote) => format!("{remote}/{}", failure.branch),
            None => failure.branch.clone(),
        };
        eprintln!("{} {target}: {}", "failed".red(), failure.error);
    }
    Ok(())
}
