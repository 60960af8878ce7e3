use std::io::{self, Write};
use std::path::Path;

use clap::{Args, Subcommand};
use owo_colors::OwoColorize;

use crate::config::{CONFIG_KEYS, StoredConfig};
use crate::context::AppContext;
use crate::domain::branch::BranchType;
use crate::error::AppResult;
use crate::workflow::create::list_issue_types;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the stored configuration (secrets masked).
    Show,
    /// Print a single value, e.g. `branch.default` or `mapping.fix`.
    Get { key: String },
    /// Store a single value; an empty value clears it. Lists are comma separated.
    Set { key: String, value: String },
    /// List the Jira issue types and the branch type each maps to.
    Types,
}

/// `load_context` is only invoked by subcommands that talk to Jira.
pub async fn run(
    command: ConfigCommand,
    path: &Path,
    load_context: impl FnOnce() -> AppResult<AppContext>,
) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(path),
        ConfigCommand::Show => run_show(path),
        ConfigCommand::Get { key } => {
            let cfg = StoredConfig::load_from(path)?;
            println!("{}", cfg.get(&key)?);
            Ok(())
        }
        ConfigCommand::Set { key, value } => {
            let mut cfg = StoredConfig::load_from(path)?;
            cfg.set(&key, &value)?;
            cfg.save_to(path)
        }
        ConfigCommand::Types => run_types(&load_context()?).await,
    }
}

fn run_init(path: &Path) -> AppResult<()> {
    let mut cfg = StoredConfig::load_from(path)?;

    println!("Configuring twig.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!("Lists and issue type ids are comma separated.");
    println!();

    apply_prompt(&mut cfg, "Jira host (e.g., company.atlassian.net)", "project.host", false)?;
    apply_prompt(&mut cfg, "Auth type (basic/bearer)", "project.auth", false)?;
    apply_prompt(&mut cfg, "Jira email (basic auth)", "project.email", false)?;
    apply_prompt(&mut cfg, "Jira API token", "project.token", true)?;
    apply_prompt(&mut cfg, "Default branch", "branch.default", false)?;
    apply_prompt(&mut cfg, "Remote name", "branch.origin", false)?;
    apply_prompt(&mut cfg, "Phrases to drop from summaries", "branch.exclude", false)?;

    println!();
    println!("Map Jira issue type ids to branch types (see `twig config types`).");
    for tag in BranchType::all() {
        let key = format!("mapping.{tag}");
        apply_prompt(&mut cfg, &format!("Issue type ids for {tag}"), &key, false)?;
    }

    cfg.save_to(path)?;
    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show(path: &Path) -> AppResult<()> {
    let cfg = StoredConfig::load_from(path)?;

    println!("Configuration file: {}", path.display());
    for key in CONFIG_KEYS {
        let value = cfg.get(key)?;
        let shown = if *key == "project.token" {
            mask_secret(&value)
        } else {
            display_value(&value)
        };
        println!("{key}: {shown}");
    }
    for (tag, ids) in &cfg.mapping {
        println!("mapping.{tag}: {}", ids.join(","));
    }
    Ok(())
}

async fn run_types(ctx: &AppContext) -> AppResult<()> {
    let report = list_issue_types(ctx).await?;

    for (issue_type, tag) in &report.mapped {
        println!(
            "{:>8}  {:<24} {}",
            issue_type.id,
            issue_type.name,
            tag.green()
        );
    }
    for issue_type in &report.ignored {
        println!(
            "{:>8}  {:<24} {}",
            issue_type.id,
            issue_type.name,
            "unmapped".dimmed()
        );
    }
    Ok(())
}

fn apply_prompt(cfg: &mut StoredConfig, field: &str, key: &str, secret: bool) -> AppResult<()> {
    let current = cfg.get(key)?;
    let current = Some(current.as_str()).filter(|value| !value.is_empty());
    match prompt(field, current, secret)? {
        PromptAction::Keep => {}
        PromptAction::Clear => cfg.set(key, "")?,
        PromptAction::Set(value) => {
            if let Err(err) = cfg.set(key, &value) {
                eprintln!("{} {err}", "Skipped:".yellow());
            }
        }
    }
    Ok(())
}

fn prompt(field: &str, current: Option<&str>, secret: bool) -> AppResult<PromptAction> {
    let mut stdout = io::stdout();

    match (current, secret) {
        (Some(_), true) => write!(stdout, "{field} [****] (Enter to keep, '-' to clear): ")?,
        (Some(value), false) => {
            write!(stdout, "{field} [{value}] (Enter to keep, '-' to clear): ")?
        }
        (None, _) => write!(stdout, "{field} (Enter to skip): ")?,
    }
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(parse_answer(&input))
}

fn parse_answer(input: &str) -> PromptAction {
    match input.trim() {
        "" => PromptAction::Keep,
        "-" => PromptAction::Clear,
        value => PromptAction::Set(value.to_string()),
    }
}

fn display_value(value: &str) -> String {
    if value.is_empty() {
        "<not set>".to_string()
    } else {
        value.to_string()
    }
}

fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    match chars.len() {
        0 => "<not set>".to_string(),
        len if len > 6 => {
            let prefix: String = chars[..3].iter().collect();
            let suffix: String = chars[len - 3..].iter().collect();
            format!("{prefix}***{suffix}")
        }
        _ => "***".to_string(),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum PromptAction {
    Keep,
    Clear,
    Set(String),
}
