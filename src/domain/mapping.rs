use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::domain::branch::BranchType;
use crate::domain::ticket::IssueType;
use crate::error::{AppError, AppResult};

/// Placeholder id written by `config init` for tags the user left unmapped.
const UNMAPPED_ID: &str = "0";

/// Jira issue-type id to branch type, as configured under `[mapping]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMapping {
    entries: HashMap<String, BranchType>,
}

impl TypeMapping {
    pub fn from_table(table: &BTreeMap<String, Vec<String>>) -> AppResult<Self> {
        let mut entries = HashMap::new();

        for (tag_name, ids) in table {
            let tag = BranchType::parse(tag_name).map_err(|_| {
                AppError::Configuration(format!("mapping: unknown branch type {tag_name:?}"))
            })?;

            for id in ids.iter().map(|id| id.trim()) {
                if id.is_empty() || id == UNMAPPED_ID {
                    continue;
                }
                if !id.chars().all(|c| c.is_ascii_digit()) {
                    return Err(AppError::Configuration(format!(
                        "mapping: issue type id {id:?} for {tag_name:?} is not numeric"
                    )));
                }
                if let Some(previous) = entries.insert(id.to_string(), tag) {
                    if previous != tag {
                        return Err(AppError::Configuration(format!(
                            "mapping: issue type id {id} is mapped to both {previous} and {tag}"
                        )));
                    }
                }
            }
        }

        debug!(entries = entries.len(), "issue type mapping parsed");
        Ok(Self { entries })
    }

    pub fn resolve(&self, type_id: &str) -> AppResult<BranchType> {
        self.entries
            .get(type_id)
            .copied()
            .ok_or_else(|| AppError::UnmappedIssueType(type_id.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Splits the tracker's issue types into mapped pairs and ignored types.
    pub fn partition<'a>(
        &self,
        issue_types: &'a [IssueType],
    ) -> (Vec<(&'a IssueType, BranchType)>, Vec<&'a IssueType>) {
        let mut mapped = Vec::new();
        let mut ignored = Vec::new();
        for issue_type in issue_types {
            match self.resolve(&issue_type.id) {
                Ok(tag) => mapped.push((issue_type, tag)),
                Err(_) => ignored.push(issue_type),
            }
        }
        (mapped, ignored)
    }
}
