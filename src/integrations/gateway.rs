//! Remote issue gateway seam
//!
//! Everything the sync engine asks of the remote tracker goes through
//! [`IssueGateway`]. Failures are returned to the caller and never retried at
//! this level.

use crate::model::RemoteIssue;
use crate::Result;
use async_trait::async_trait;

/// Result of looking up auto-import candidates
#[derive(Debug, Clone, PartialEq)]
pub enum ImportCandidates {
    /// A proper list of issues
    Issues(Vec<RemoteIssue>),
    /// The remote answered with something that is not a list
    Malformed,
}

impl ImportCandidates {
    pub fn is_malformed(&self) -> bool {
        matches!(self, ImportCandidates::Malformed)
    }
}

impl From<Vec<RemoteIssue>> for ImportCandidates {
    fn from(issues: Vec<RemoteIssue>) -> Self {
        ImportCandidates::Issues(issues)
    }
}

/// Operations on the remote issue tracker
#[async_trait]
pub trait IssueGateway: Send + Sync {
    /// Re-fetch an issue and update the cache.
    ///
    /// `force_update` bypasses the "is the cached copy still fresh" check.
    /// `show_dialog_on_diff` tells the user when the remote copy changed.
    async fn refresh_issue(
        &self,
        issue_id: &str,
        current: Option<&RemoteIssue>,
        force_update: bool,
        show_dialog_on_diff: bool,
    ) -> Result<()>;

    /// Assign the issue to `user_name`
    async fn update_assignee(&self, issue_id: &str, user_name: &str) -> Result<()>;

    /// Apply a workflow transition
    async fn transition_issue(&self, issue_id: &str, transition_id: &str) -> Result<()>;

    /// Issues that should be imported into the backlog
    async fn find_auto_import_candidates(&self) -> Result<ImportCandidates>;

    /// Fetch an issue the cache has no data for
    async fn load_missing_issue(&self, issue_id: &str) -> Result<()>;
}
