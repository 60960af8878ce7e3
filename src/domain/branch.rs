use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{AppError, AppResult};

const TYPE_SEPARATOR: &str = "/";
const KEY_SEPARATOR: &str = "_";
const WORD_SEPARATOR: &str = "-";

static ACRONYM_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").unwrap());
static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());
static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+").unwrap());
// Matches KEY-123_ as written by `NameSynthesizer::build`.
static TICKET_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z]+-[0-9]+_").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BranchType {
    None,
    Build,
    Chore,
    Ci,
    Docs,
    Feat,
    Fix,
    Perf,
    Refactor,
    Revert,
    Style,
    Test,
}

/// Canonical name and short aliases of every tag, used in both directions.
const BRANCH_TYPES: &[(BranchType, &str, &[&str])] = &[
    (BranchType::Build, "build", &["b"]),
    (BranchType::Chore, "chore", &["ch"]),
    (BranchType::Ci, "ci", &[]),
    (BranchType::Docs, "docs", &["d"]),
    (BranchType::Feat, "feat", &["ft"]),
    (BranchType::Fix, "fix", &["fx"]),
    (BranchType::Perf, "perf", &["p"]),
    (BranchType::Refactor, "refactor", &["rf"]),
    (BranchType::Revert, "revert", &["rv"]),
    (BranchType::Style, "style", &["s"]),
    (BranchType::Test, "test", &["t"]),
];

impl BranchType {
    pub fn as_str(&self) -> &'static str {
        BRANCH_TYPES
            .iter()
            .find(|(tag, _, _)| tag == self)
            .map(|(_, name, _)| *name)
            .unwrap_or("")
    }

    pub fn all() -> impl Iterator<Item = BranchType> {
        BRANCH_TYPES.iter().map(|(tag, _, _)| *tag)
    }

    /// Resolves a canonical name or alias. Unknown input is an error, never a default.
    pub fn parse(value: &str) -> AppResult<Self> {
        let needle = value.trim().to_lowercase();
        BRANCH_TYPES
            .iter()
            .find(|(_, name, aliases)| *name == needle || aliases.contains(&needle.as_str()))
            .map(|(tag, _, _)| *tag)
            .ok_or_else(|| AppError::Configuration(format!("unsupported branch type {value:?}")))
    }
}

impl fmt::Display for BranchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchName(pub String);

impl BranchName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turns a ticket summary into a branch name. Exclusion patterns are compiled
/// once from configuration and reused for every build.
#[derive(Debug, Clone)]
pub struct NameSynthesizer {
    exclusions: Vec<Regex>,
}

impl NameSynthesizer {
    pub fn new(exclude_phrases: &[String]) -> AppResult<Self> {
        let exclusions = exclude_phrases
            .iter()
            .map(|phrase| phrase.trim())
            .filter(|phrase| !phrase.is_empty())
            .map(|phrase| {
                let escaped = regex::escape(phrase);
                Regex::new(&format!(r"(?i)(\[{escaped}\]|\({escaped}\))")).map_err(|err| {
                    AppError::Configuration(format!("invalid exclude phrase {phrase:?}: {err}"))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self { exclusions })
    }

    pub fn build(&self, tag: BranchType, ticket_key: &str, summary: &str) -> BranchName {
        debug!(ticket = ticket_key, branch_type = %tag, "building branch name");

        let summary = self.strip_excluded(summary);
        let summary = camel_to_kebab(&summary);
        let summary = sanitize(&summary);

        let mut name = String::new();
        if tag != BranchType::None {
            name.push_str(tag.as_str());
            name.push_str(TYPE_SEPARATOR);
        }
        name.push_str(ticket_key.trim());
        name.push_str(KEY_SEPARATOR);
        name.push_str(&summary);

        BranchName(name)
    }

    fn strip_excluded(&self, summary: &str) -> String {
        let stripped = self
            .exclusions
            .iter()
            .fold(summary.to_string(), |acc, re| re.replace_all(&acc, "").into_owned());
        let stripped = stripped.trim().to_string();
        debug!(%stripped, "excluded phrases removed");
        stripped
    }
}

/// Splits acronym and camel-case boundaries with `-`.
pub fn camel_to_kebab(input: &str) -> String {
    let first = ACRONYM_BOUNDARY.replace_all(input, "${1}-${2}");
    let kebab = CAMEL_BOUNDARY.replace_all(&first, "${1}-${2}").into_owned();
    debug!(%kebab, "camel case split");
    kebab
}

/// Lowercases and collapses every run outside `[a-z0-9]` into a single `-`.
pub fn sanitize(input: &str) -> String {
    let lowered = input.to_lowercase();
    let collapsed = NON_ALPHANUMERIC.replace_all(&lowered, WORD_SEPARATOR);
    let trimmed = collapsed.strip_prefix(WORD_SEPARATOR).unwrap_or(&collapsed);
    let trimmed = trimmed.strip_suffix(WORD_SEPARATOR).unwrap_or(trimmed);
    trimmed.to_string()
}

pub fn extract_ticket_key(branch: &str) -> AppResult<String> {
    let found = TICKET_KEY
        .find(branch)
        .map(|m| m.as_str().trim_end_matches(KEY_SEPARATOR).to_string())
        .ok_or_else(|| AppError::KeyNotFound(branch.to_string()))?;
    debug!(branch, key = %found, "ticket key extracted");
    Ok(found)
}
