use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::branch::BranchType;
use crate::domain::mapping::TypeMapping;
use crate::error::{AppError, AppResult};

const CONFIG_DIR_NAME: &str = "twig";
const CONFIG_FILE_NAME: &str = "twig.toml";

pub const CONFIG_KEYS: &[&str] = &[
    "project.host",
    "project.auth",
    "project.email",
    "project.token",
    "branch.default",
    "branch.origin",
    "branch.exclude",
];

pub fn config_directory() -> AppResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME))
        .ok_or_else(|| {
            AppError::Configuration("unable to determine the user config directory".to_string())
        })
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Basic,
    Bearer,
}

impl AuthMode {
    pub fn parse(value: &str) -> AppResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "basic" => Ok(AuthMode::Basic),
            "bearer" => Ok(AuthMode::Bearer),
            other => Err(AppError::Configuration(format!(
                "unsupported auth type {other:?}, expected \"basic\" or \"bearer\""
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Basic => "basic",
            AuthMode::Bearer => "bearer",
        }
    }
}

/// On-disk layout of `twig.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(default)]
    pub project: ProjectSettings,
    #[serde(default)]
    pub branch: BranchSettings,
    #[serde(default)]
    pub mapping: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl StoredConfig {
    /// A missing file yields the default configuration.
    pub fn load_from(path: &Path) -> AppResult<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).map_err(|err| {
                AppError::Configuration(format!("invalid config file {}: {err}", path.display()))
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = toml::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to write config: {err}")))?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> AppResult<String> {
        let value = match key {
            "project.host" => self.project.host.clone().unwrap_or_default(),
            "project.auth" => self.project.auth.clone().unwrap_or_default(),
            "project.email" => self.project.email.clone().unwrap_or_default(),
            "project.token" => self.project.token.clone().unwrap_or_default(),
            "branch.default" => self.branch.default.clone().unwrap_or_default(),
            "branch.origin" => self.branch.origin.clone().unwrap_or_default(),
            "branch.exclude" => self.branch.exclude.join(","),
            other => {
                let tag = mapping_key(other)?;
                self.mapping
                    .get(tag.as_str())
                    .map(|ids| ids.join(","))
                    .unwrap_or_default()
            }
        };
        Ok(value)
    }

    /// Sets `section.name` to `value`; an empty value clears the key. List
    /// values are comma separated.
    pub fn set(&mut self, key: &str, value: &str) -> AppResult<()> {
        let scalar = non_empty(value);
        match key {
            "project.host" => self.project.host = scalar,
            "project.auth" => {
                if let Some(auth) = &scalar {
                    AuthMode::parse(auth)?;
                }
                self.project.auth = scalar.map(|auth| auth.to_lowercase());
            }
            "project.email" => self.project.email = scalar,
            "project.token" => self.project.token = scalar,
            "branch.default" => self.branch.default = scalar,
            "branch.origin" => self.branch.origin = scalar,
            "branch.exclude" => self.branch.exclude = split_list(value),
            other => {
                let tag = mapping_key(other)?;
                let ids = split_list(value);
                if ids.is_empty() {
                    self.mapping.remove(tag.as_str());
                } else {
                    let mut candidate = self.mapping.clone();
                    candidate.insert(tag.as_str().to_string(), ids);
                    TypeMapping::from_table(&candidate)?;
                    self.mapping = candidate;
                }
            }
        }
        Ok(())
    }
}

fn mapping_key(key: &str) -> AppResult<BranchType> {
    key.strip_prefix("mapping.")
        .and_then(|name| BranchType::parse(name).ok())
        .ok_or_else(|| AppError::Configuration(format!("unknown config key {key:?}")))
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jira_host: Option<String>,
    pub jira_auth: Option<AuthMode>,
    pub jira_email: Option<String>,
    pub jira_token: Option<String>,
    pub default_branch: Option<String>,
    pub default_remote: Option<String>,
    pub exclude_phrases: Vec<String>,
    pub type_mapping: TypeMapping,
    pub workspace_root: PathBuf,
}

impl AppConfig {
    pub fn load(config_path: &Path, workspace_hint: &Path) -> AppResult<Self> {
        let stored = StoredConfig::load_from(config_path)?;
        Self::from_stored(stored, workspace_hint, |name| env::var(name).ok())
    }

    /// Builds the runtime view; `TWIG_*` variables from `lookup` win over the file.
    pub fn from_stored(
        stored: StoredConfig,
        workspace_hint: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> AppResult<Self> {
        let pick = |var: &str, stored: Option<String>| {
            lookup(var)
                .and_then(|value| non_empty(&value))
                .or_else(|| stored.and_then(|value| non_empty(&value)))
        };

        let jira_auth = pick("TWIG_AUTH", stored.project.auth)
            .map(|auth| AuthMode::parse(&auth))
            .transpose()?;

        Ok(Self {
            jira_host: pick("TWIG_HOST", stored.project.host),
            jira_auth,
            jira_email: pick("TWIG_EMAIL", stored.project.email),
            jira_token: pick("TWIG_TOKEN", stored.project.token),
            default_branch: stored.branch.default.and_then(|v| non_empty(&v)),
            default_remote: stored.branch.origin.and_then(|v| non_empty(&v)),
            exclude_phrases: stored.branch.exclude,
            type_mapping: TypeMapping::from_table(&stored.mapping)?,
            workspace_root: workspace_hint.to_path_buf(),
        })
    }

    /// Explicit auth mode, otherwise basic when an email is configured.
    pub fn auth_mode(&self) -> AuthMode {
        self.jira_auth.unwrap_or(if self.jira_email.is_some() {
            AuthMode::Basic
        } else {
            AuthMode::Bearer
        })
    }
}
