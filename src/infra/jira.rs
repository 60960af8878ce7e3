use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use reqwest::{
    Client, RequestBuilder,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info};

use crate::config::AuthMode;
use crate::domain::ticket::{IssueType, StatusCategory, Ticket};
use crate::error::{AppError, AppResult};
use crate::services::IssueTrackerService;

pub struct JiraClient {
    http: Client,
    host: Option<String>,
    auth: AuthMode,
    email: Option<String>,
    token: Option<String>,
}

impl JiraClient {
    pub fn new(
        host: Option<String>,
        auth: AuthMode,
        email: Option<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            host,
            auth,
            email,
            token,
        }
    }

    fn api_base(&self) -> AppResult<String> {
        let host = self
            .host
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Jira host not configured".to_string()))?
            .trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            Ok(format!("{host}/rest/api/2"))
        } else {
            Ok(format!("https://{host}/rest/api/2"))
        }
    }

    fn auth_header(&self) -> AppResult<String> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Jira API token not configured".to_string()))?;
        match self.auth {
            AuthMode::Basic => {
                let email = self.email.as_deref().ok_or_else(|| {
                    AppError::Configuration("Jira email is required for basic auth".to_string())
                })?;
                let encoded = BASE64_STANDARD.encode(format!("{email}:{token}"));
                Ok(format!("Basic {encoded}"))
            }
            AuthMode::Bearer => Ok(format!("Bearer {token}")),
        }
    }

    fn request(&self, builder: RequestBuilder) -> AppResult<RequestBuilder> {
        Ok(builder
            .header(AUTHORIZATION, self.auth_header()?)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json; charset=UTF-8"))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &str,
        builder: RequestBuilder,
    ) -> AppResult<T> {
        info!(operation, auth = self.auth.as_str(), "sending Jira request");

        let response = self
            .request(builder)?
            .send()
            .await
            .map_err(|err| AppError::IssueTracker(format!("{operation}: failed to call Jira: {err}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            AppError::IssueTracker(format!("{operation}: failed to read Jira response: {err}"))
        })?;
        debug!(operation, %status, %body, "Jira response");

        if !status.is_success() {
            let message = match serde_json::from_str::<JiraErrorResponse>(&body) {
                Ok(payload) if !payload.error_messages.is_empty() => {
                    payload.error_messages.join("\n")
                }
                _ => body,
            };
            return Err(AppError::IssueTracker(format!(
                "{operation}: Jira responded with {status}: {message}"
            )));
        }

        serde_json::from_str(&body).map_err(|err| {
            AppError::IssueTracker(format!(
                "{operation}: failed to parse Jira response ({status}): {err}"
            ))
        })
    }

    fn status_fields(include_assignee: bool) -> Vec<&'static str> {
        if include_assignee {
            vec!["status", "assignee"]
        } else {
            vec!["status"]
        }
    }
}

#[async_trait]
impl IssueTrackerService for JiraClient {
    async fn fetch_issue(&self, key: &str) -> AppResult<Ticket> {
        let url = format!("{}/issue/{}", self.api_base()?, key.trim());
        let builder = self
            .http
            .get(url)
            .query(&[("fields", "issuetype,summary")]);
        let issue: JiraIssue = self.send("get issue", builder).await?;
        Ok(issue.into())
    }

    async fn fetch_issue_types(&self) -> AppResult<Vec<IssueType>> {
        let url = format!("{}/issuetype", self.api_base()?);
        let types: Vec<JiraIssueType> = self.send("get issue types", self.http.get(url)).await?;
        Ok(types.into_iter().map(IssueType::from).collect())
    }

    async fn fetch_status(&self, key: &str, include_assignee: bool) -> AppResult<Ticket> {
        let url = format!("{}/issue/{}", self.api_base()?, key.trim());
        let fields = Self::status_fields(include_assignee).join(",");
        let builder = self.http.get(url).query(&[("fields", fields)]);
        let issue: JiraIssue = self.send("get issue status", builder).await?;
        Ok(issue.into())
    }

    async fn fetch_status_bulk(
        &self,
        keys: &[String],
        include_assignee: bool,
    ) -> AppResult<Vec<Ticket>> {
        let url = format!("{}/issue/bulkfetch", self.api_base()?);
        let body = JiraBulkFetchRequest {
            fields: Self::status_fields(include_assignee),
            issue_ids_or_keys: keys,
        };
        let builder = self.http.post(url).json(&body);
        let payload: JiraBulkFetchResponse = self.send("get issue status bulk", builder).await?;
        Ok(payload.issues.into_iter().map(Ticket::from).collect())
    }
}

#[derive(Serialize)]
struct JiraBulkFetchRequest<'a> {
    fields: Vec<&'static str>,
    #[serde(rename = "issueIdsOrKeys")]
    issue_ids_or_keys: &'a [String],
}

#[derive(Deserialize)]
struct JiraBulkFetchResponse {
    #[serde(default)]
    issues: Vec<JiraIssue>,
}

#[derive(Deserialize)]
struct JiraIssue {
    key: String,
    #[serde(default)]
    fields: JiraIssueFields,
}

#[derive(Deserialize, Default)]
struct JiraIssueFields {
    #[serde(rename = "issuetype")]
    issue_type: Option<JiraIssueType>,
    summary: Option<String>,
    status: Option<JiraStatus>,
    assignee: Option<JiraAssignee>,
}

#[derive(Deserialize)]
struct JiraIssueType {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct JiraStatus {
    #[serde(rename = "statusCategory")]
    category: JiraStatusCategory,
}

#[derive(Deserialize)]
struct JiraStatusCategory {
    id: i64,
    #[serde(default)]
    key: String,
}

#[derive(Deserialize)]
struct JiraAssignee {
    #[serde(rename = "emailAddress")]
    email: Option<String>,
}

#[derive(Deserialize)]
struct JiraErrorResponse {
    #[serde(rename = "errorMessages", default)]
    error_messages: Vec<String>,
}

impl From<JiraIssueType> for IssueType {
    fn from(value: JiraIssueType) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

impl From<JiraIssue> for Ticket {
    fn from(issue: JiraIssue) -> Self {
        let fields = issue.fields;
        Self {
            key: issue.key,
            type_id: fields.issue_type.map(|t| t.id).unwrap_or_default(),
            summary: fields.summary.unwrap_or_default(),
            status: fields.status.map(|s| StatusCategory {
                id: s.category.id,
                name: s.category.key,
            }),
            assignee_email: fields.assignee.and_then(|a| a.email),
        }
    }
}
