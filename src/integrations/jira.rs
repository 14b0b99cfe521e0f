//! JIRA Integration Adapter
//!
//! [`JiraAdapter`] talks to the Jira REST API (v2, which still accepts
//! assignment by user name). [`JiraGateway`] combines it with the local issue
//! cache to provide the engine's [`IssueGateway`].

use super::gateway::{ImportCandidates, IssueGateway};
use super::retry::{with_retry, RetryConfig};
use crate::config::JiraConnection;
use crate::model::{IssueStatus, IssueUser, RemoteIssue};
use crate::store::IssueCacheWriter;
use crate::sync::metrics;
use crate::ui::{Notification, Notifier};
use crate::{Result, SyncError};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Per-request timeout for search/query operations (large result sets)
const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);
/// Per-request timeout for single issue fetches
const GET_TIMEOUT: Duration = Duration::from_secs(10);
/// Per-request timeout for write operations
const WRITE_TIMEOUT: Duration = Duration::from_secs(15);

/// Fields requested for every issue fetch
const ISSUE_FIELDS: &str = "summary,status,assignee,updated";

/// Used when the project configures no import query
pub const DEFAULT_AUTO_IMPORT_JQL: &str =
    "assignee = currentUser() AND resolution = Unresolved ORDER BY updatedDate DESC";

const MAX_IMPORT_RESULTS: u32 = 100;

/// JIRA issue as returned by the REST API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraIssue {
    pub id: String,
    pub key: String,
    pub fields: JiraFields,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraFields {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub status: Option<JiraStatus>,
    #[serde(default)]
    pub assignee: Option<JiraUser>,
    #[serde(default)]
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraStatus {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraUser {
    pub name: String,
    #[serde(rename = "displayName", default)]
    pub display_name: String,
    #[serde(rename = "emailAddress", default)]
    pub email: Option<String>,
}

impl From<JiraIssue> for RemoteIssue {
    fn from(issue: JiraIssue) -> Self {
        RemoteIssue {
            id: issue.id,
            key: issue.key,
            summary: issue.fields.summary,
            status: issue.fields.status.map(|s| IssueStatus { name: s.name }),
            assignee: issue.fields.assignee.map(|u| IssueUser {
                display_name: if u.display_name.is_empty() {
                    u.name.clone()
                } else {
                    u.display_name
                },
                name: u.name,
            }),
            updated: issue.fields.updated,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraTransition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub to: Option<JiraStatus>,
}

#[derive(Debug, Clone, Deserialize)]
struct JiraTransitionsResponse {
    transitions: Vec<JiraTransition>,
}

#[derive(Debug, Clone, Serialize)]
struct JiraTransitionRequest {
    transition: JiraTransitionId,
}

#[derive(Debug, Clone, Serialize)]
struct JiraTransitionId {
    id: String,
}

#[derive(Debug, Clone, Serialize)]
struct JiraAssigneeRequest<'a> {
    name: &'a str,
}

/// Worklog entry to post against an issue
#[derive(Debug, Clone, Serialize)]
pub struct JiraWorklog {
    /// Jira timestamp format, e.g. `2024-01-31T09:00:00.000+0000`
    pub started: String,
    #[serde(rename = "timeSpentSeconds")]
    pub time_spent_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl JiraWorklog {
    pub fn new(started: chrono::DateTime<chrono::Utc>, time_spent: Duration) -> Self {
        Self {
            started: started.format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string(),
            time_spent_seconds: time_spent.as_secs(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        let comment = comment.into();
        if !comment.trim().is_empty() {
            self.comment = Some(comment);
        }
        self
    }
}

/// JIRA REST API client
pub struct JiraAdapter {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
    retry: RetryConfig,
}

impl JiraAdapter {
    /// Create a new JIRA adapter
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(connection: &JiraConnection) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let base_url = format!("{}/rest/api/2", connection.url.trim_end_matches('/'));

        Ok(Self {
            client,
            base_url,
            auth_token: connection.token(),
            retry: RetryConfig::default(),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Map non-success statuses onto errors
    async fn check(response: Response, action: &str, target: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SyncError::Integration(
                "JIRA authentication failed".to_string(),
            )),
            StatusCode::NOT_FOUND => Err(SyncError::IssueNotFound(target.to_string())),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60);
                Err(SyncError::RateLimited(retry_after))
            }
            status => {
                let error_body = response.text().await.unwrap_or_default();
                Err(SyncError::Integration(format!(
                    "JIRA {} failed: HTTP {}: {}",
                    action, status, error_body
                )))
            }
        }
    }

    async fn fetch_issue(&self, issue_id: &str) -> Result<JiraIssue> {
        let url = format!("{}/issue/{}", self.base_url, issue_id);
        debug!(issue_id = %issue_id, "Fetching JIRA issue");

        let request = self.client.get(&url).query(&[("fields", ISSUE_FIELDS)]);
        let response = self.authorize(request).timeout(GET_TIMEOUT).send().await?;
        let response = Self::check(response, "fetch", issue_id).await?;
        Ok(response.json().await?)
    }

    /// Get a single issue by id or key
    pub async fn get_issue(&self, issue_id: &str) -> Result<RemoteIssue> {
        let issue = with_retry(&self.retry, "jira.get_issue", || self.fetch_issue(issue_id)).await?;
        Ok(issue.into())
    }

    async fn search_once(&self, jql: &str, max_results: u32) -> Result<serde_json::Value> {
        let url = format!("{}/search", self.base_url);
        let params = [
            ("jql", jql.to_string()),
            ("maxResults", max_results.to_string()),
            ("fields", ISSUE_FIELDS.to_string()),
        ];
        debug!(jql = %jql, max_results, "Searching JIRA issues");

        let request = self.client.get(&url).query(&params);
        let response = self.authorize(request).timeout(SEARCH_TIMEOUT).send().await?;
        let response = Self::check(response, "search", jql).await?;
        Ok(response.json().await?)
    }

    /// Search with JQL, keeping the raw response so its shape can be checked
    pub async fn search(&self, jql: &str, max_results: u32) -> Result<serde_json::Value> {
        with_retry(&self.retry, "jira.search", || self.search_once(jql, max_results)).await
    }

    /// Issues matching `jql`, or `Malformed` if the response has no issue list
    pub async fn find_auto_import_issues(&self, jql: &str) -> Result<ImportCandidates> {
        let response = self.search(jql, MAX_IMPORT_RESULTS).await?;
        Ok(parse_search_issues(response))
    }

    /// Get available transitions for an issue
    pub async fn get_transitions(&self, issue_id: &str) -> Result<Vec<JiraTransition>> {
        let url = format!("{}/issue/{}/transitions", self.base_url, issue_id);
        let response = self
            .authorize(self.client.get(&url))
            .timeout(GET_TIMEOUT)
            .send()
            .await?;
        let response = Self::check(response, "transitions", issue_id).await?;
        let result: JiraTransitionsResponse = response.json().await?;
        Ok(result.transitions)
    }

    /// Transition an issue to a new status
    pub async fn transition_issue(&self, issue_id: &str, transition_id: &str) -> Result<()> {
        let url = format!("{}/issue/{}/transitions", self.base_url, issue_id);
        let body = JiraTransitionRequest {
            transition: JiraTransitionId {
                id: transition_id.to_string(),
            },
        };

        info!(issue_id = %issue_id, transition_id = %transition_id, "Transitioning JIRA issue");

        let response = self
            .authorize(self.client.post(&url).json(&body))
            .timeout(WRITE_TIMEOUT)
            .send()
            .await?;
        Self::check(response, "transition", issue_id).await?;
        Ok(())
    }

    /// Assign an issue to a user by login name
    pub async fn update_assignee(&self, issue_id: &str, user_name: &str) -> Result<()> {
        let url = format!("{}/issue/{}/assignee", self.base_url, issue_id);

        info!(issue_id = %issue_id, user_name = %user_name, "Assigning JIRA issue");

        let response = self
            .authorize(self.client.put(&url).json(&JiraAssigneeRequest { name: user_name }))
            .timeout(WRITE_TIMEOUT)
            .send()
            .await?;
        Self::check(response, "assign", issue_id).await?;
        Ok(())
    }

    /// Post a worklog entry
    pub async fn add_worklog(&self, issue_id: &str, worklog: &JiraWorklog) -> Result<()> {
        let url = format!("{}/issue/{}/worklog", self.base_url, issue_id);

        info!(
            issue_id = %issue_id,
            seconds = worklog.time_spent_seconds,
            "Adding JIRA worklog"
        );

        let response = self
            .authorize(self.client.post(&url).json(worklog))
            .timeout(WRITE_TIMEOUT)
            .send()
            .await?;
        Self::check(response, "worklog", issue_id).await?;
        Ok(())
    }
}

/// Extract issues from a search response body
fn parse_search_issues(response: serde_json::Value) -> ImportCandidates {
    let Some(items) = response.get("issues").and_then(|v| v.as_array()) else {
        return ImportCandidates::Malformed;
    };

    let issues = items
        .iter()
        .filter_map(|item| match serde_json::from_value::<JiraIssue>(item.clone()) {
            Ok(issue) => Some(RemoteIssue::from(issue)),
            Err(e) => {
                warn!(error = %e, "Skipping unparseable JIRA issue in search result");
                None
            }
        })
        .collect();
    ImportCandidates::Issues(issues)
}

/// [`IssueGateway`] backed by the Jira REST API and the local issue cache
pub struct JiraGateway {
    adapter: Arc<JiraAdapter>,
    cache: Arc<dyn IssueCacheWriter>,
    notifier: Arc<dyn Notifier>,
    import_jql: String,
}

impl JiraGateway {
    pub fn new(
        adapter: Arc<JiraAdapter>,
        cache: Arc<dyn IssueCacheWriter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            adapter,
            cache,
            notifier,
            import_jql: DEFAULT_AUTO_IMPORT_JQL.to_string(),
        }
    }

    /// Use a custom JQL for backlog import (blank queries are ignored)
    pub fn with_import_jql(mut self, jql: Option<String>) -> Self {
        if let Some(jql) = jql.filter(|q| !q.trim().is_empty()) {
            self.import_jql = jql;
        }
        self
    }

    pub fn adapter(&self) -> &Arc<JiraAdapter> {
        &self.adapter
    }
}

/// Whether a freshly fetched issue differs from the cached copy
fn has_changed(current: Option<&RemoteIssue>, fresh: &RemoteIssue) -> bool {
    match current {
        None => true,
        Some(current) => current.updated != fresh.updated || current.updated.is_none(),
    }
}

#[async_trait]
impl IssueGateway for JiraGateway {
    async fn refresh_issue(
        &self,
        issue_id: &str,
        current: Option<&RemoteIssue>,
        force_update: bool,
        show_dialog_on_diff: bool,
    ) -> Result<()> {
        let fresh = self.adapter.get_issue(issue_id).await.inspect_err(|_| {
            metrics::record_gateway_call("refresh_issue", "error");
        })?;
        metrics::record_gateway_call("refresh_issue", "ok");

        let changed = has_changed(current, &fresh);
        if !changed && !force_update {
            debug!(issue_id = %issue_id, "Issue unchanged, cache kept");
            return Ok(());
        }

        let key = fresh.key.clone();
        self.cache.upsert_issue(fresh).await?;

        if changed && show_dialog_on_diff {
            self.notifier.notify(
                Notification::info(format!("Jira: Issue {} was updated", key)).with_icon("jira"),
            );
        }
        Ok(())
    }

    async fn update_assignee(&self, issue_id: &str, user_name: &str) -> Result<()> {
        let result = self.adapter.update_assignee(issue_id, user_name).await;
        metrics::record_gateway_call("update_assignee", outcome(&result));
        result
    }

    async fn transition_issue(&self, issue_id: &str, transition_id: &str) -> Result<()> {
        let result = self.adapter.transition_issue(issue_id, transition_id).await;
        metrics::record_gateway_call("transition_issue", outcome(&result));
        result
    }

    async fn find_auto_import_candidates(&self) -> Result<ImportCandidates> {
        let result = self.adapter.find_auto_import_issues(&self.import_jql).await;
        metrics::record_gateway_call("find_auto_import_candidates", outcome(&result));
        result
    }

    async fn load_missing_issue(&self, issue_id: &str) -> Result<()> {
        let result = self.adapter.get_issue(issue_id).await;
        metrics::record_gateway_call("load_missing_issue", outcome(&result));
        self.cache.upsert_issue(result?).await
    }
}

fn outcome<T>(result: &Result<T>) -> &'static str {
    if result.is_ok() {
        "ok"
    } else {
        "error"
    }
}
