//! Backlog importer
//!
//! Pulls auto-import candidates from the gateway and creates a backlog task
//! for every issue no task links to yet.

use super::context::{Collaborators, SyncComponent};
use super::events::SyncEvent;
use super::metrics;
use crate::integrations::ImportCandidates;
use crate::model::{IssueType, RemoteIssue};
use crate::ui::Notification;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashSet;

/// Issues imported by one pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    pub imported: Vec<RemoteIssue>,
}

impl ImportSummary {
    pub fn count(&self) -> usize {
        self.imported.len()
    }

    /// Singular wording for one issue, a count for several, nothing for none
    pub fn notification(&self) -> Option<Notification> {
        let message = match self.imported.as_slice() {
            [] => return None,
            [issue] => format!(
                "Jira: Imported issue \"{}\" from Jira to backlog",
                issue.task_title()
            ),
            issues => format!("Jira: Imported {} new issues from Jira to backlog", issues.len()),
        };
        Some(Notification::info(message).with_icon("cloud_download").subtle())
    }
}

/// Candidates whose id is neither linked already nor repeated earlier in the
/// list, in remote order
pub fn select_new_issues(candidates: Vec<RemoteIssue>, existing_ids: &[String]) -> Vec<RemoteIssue> {
    let mut seen: HashSet<String> = existing_ids.iter().cloned().collect();
    candidates
        .into_iter()
        .filter(|issue| seen.insert(issue.id.clone()))
        .collect()
}

/// Run one import pass
pub async fn import_new_issues(collab: &Collaborators) -> Result<ImportSummary> {
    let candidates = match collab.gateway.find_auto_import_candidates().await? {
        ImportCandidates::Issues(issues) => issues,
        ImportCandidates::Malformed => {
            tracing::debug!("Import candidates were not a list, nothing to import");
            return Ok(ImportSummary::default());
        }
    };

    let existing = collab.tasks.all_issue_ids(IssueType::Jira).await?;
    let to_add = select_new_issues(candidates, &existing);
    tracing::debug!(existing = existing.len(), new = to_add.len(), "Backlog import diff");

    let mut summary = ImportSummary::default();
    for issue in to_add {
        match collab
            .tasks
            .add_with_issue(issue.task_title(), IssueType::Jira, &issue, true)
            .await
        {
            Ok(task_id) => {
                tracing::info!(issue = %issue.key, task_id = %task_id, "Imported issue to backlog");
                summary.imported.push(issue);
            }
            Err(e) => tracing::warn!(issue = %issue.key, error = %e, "Failed to import issue"),
        }
    }

    metrics::record_issues_imported(summary.count());
    Ok(summary)
}

pub struct BacklogImporter {
    collab: Collaborators,
}

impl BacklogImporter {
    pub fn new(collab: Collaborators) -> Self {
        Self { collab }
    }
}

#[async_trait]
impl SyncComponent for BacklogImporter {
    fn name(&self) -> &'static str {
        "backlog_importer"
    }

    async fn handle(&mut self, event: SyncEvent) {
        if !matches!(event, SyncEvent::BacklogImportRequested) {
            return;
        }
        if self.collab.state.snapshot().enabled_config().is_none() {
            tracing::debug!("Integration disabled, backlog import skipped");
            return;
        }

        match import_new_issues(&self.collab).await {
            Ok(summary) => {
                if let Some(notification) = summary.notification() {
                    self.collab.notify(notification);
                }
            }
            Err(e) => tracing::warn!(error = %e, "Backlog import failed"),
        }
    }
}
