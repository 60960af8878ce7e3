/// Jira status category id of the "Done" bucket.
pub const DONE_STATUS_ID: i64 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCategory {
    pub id: i64,
    pub name: String,
}

impl StatusCategory {
    pub fn is_done(&self) -> bool {
        self.id == DONE_STATUS_ID
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueType {
    pub id: String,
    pub name: String,
}

/// Snapshot of a Jira issue. Fields that were not requested are left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ticket {
    pub key: String,
    pub type_id: String,
    pub summary: String,
    pub status: Option<StatusCategory>,
    pub assignee_email: Option<String>,
}

impl Ticket {
    /// Local part of the assignee email, if the email is present and well formed.
    pub fn assignee_username(&self) -> Option<&str> {
        let email = self.assignee_email.as_deref()?;
        let (local, _) = email.split_once('@')?;
        Some(local.trim())
    }
}
