mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
mod workflow;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cmd::clean::{self as clean_cmd, CleanCommandArgs};
use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::create::{self as create_cmd, CreateCommandArgs};
use crate::config::{AppConfig, config_file_path};
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::infra::git::GitCli;
use crate::infra::jira::JiraClient;

#[derive(Parser)]
#[command(name = "twig", author, version, about = "Git branches named after Jira issues")]
struct Cli {
    /// Path to the config file (defaults to the user config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create (or switch to) the branch for a Jira issue.
    Create(CreateCommandArgs),
    /// Delete branches whose Jira issue is done.
    Clean(CleanCommandArgs),
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(error) = run(cli).await {
        if error.is_expected_outcome() {
            println!("{error}");
            return;
        }
        eprintln!("{} {error}", "Error:".red().bold());
        if let AppError::VersionControl { output, .. } = &error {
            if !output.trim().is_empty() {
                eprintln!("{}", output.trim_end());
            }
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => config_file_path()?,
    };
    debug!(path = %config_path.display(), "using config file");

    match cli.command {
        Commands::Config(args) => {
            config_cmd::run(args.command, &config_path, || load_context(&config_path)).await
        }
        Commands::Create(args) => create_cmd::run(&load_context(&config_path)?, args).await,
        Commands::Clean(args) => clean_cmd::run(&load_context(&config_path)?, args).await,
    }
}

fn load_context(config_path: &Path) -> AppResult<AppContext> {
    let cwd = std::env::current_dir()?;
    let config = AppConfig::load(config_path, &cwd)?;

    if config.jira_host.is_none() {
        eprintln!("Warning: Jira host not configured; issue lookups will fail.");
    }
    if config.jira_token.is_none() {
        eprintln!("Warning: Jira token not configured; issue lookups will fail.");
    }

    let git = Arc::new(GitCli::new(config.workspace_root.clone()));
    let issue_tracker = Arc::new(JiraClient::new(
        config.jira_host.clone(),
        config.auth_mode(),
        config.jira_email.clone(),
        config.jira_token.clone(),
    ));

    Ok(AppContext::new(config, git, issue_tracker))
}
