//! Sync-to-storage bridge
//!
//! Writes the whole issue cache for the active project after every task or
//! issue mutation.

use super::context::{Collaborators, SyncComponent};
use super::events::SyncEvent;
use crate::model::IssueType;
use crate::{Result, SyncError};
use async_trait::async_trait;

pub struct StorageBridge {
    collab: Collaborators,
}

impl StorageBridge {
    pub fn new(collab: Collaborators) -> Self {
        Self { collab }
    }
}

/// Save the last-active stamp and the issue cache of the active project
///
/// Fails with [`SyncError::NoActiveProject`] when no project is active; the
/// write is not attempted.
pub async fn persist_issue_state(collab: &Collaborators) -> Result<()> {
    let snapshot = collab.state.snapshot();
    let project_id = snapshot.project_id.as_deref().ok_or(SyncError::NoActiveProject)?;

    collab.persistence.save_last_active().await?;
    collab
        .persistence
        .save_issues_for_project(project_id, IssueType::Jira, &snapshot.issues)
        .await
}

#[async_trait]
impl SyncComponent for StorageBridge {
    fn name(&self) -> &'static str {
        "storage_bridge"
    }

    async fn handle(&mut self, event: SyncEvent) {
        if !event.requires_persist() {
            return;
        }

        match persist_issue_state(&self.collab).await {
            Ok(()) => tracing::debug!(trigger = event.kind(), "Issue state persisted"),
            Err(SyncError::NoActiveProject) => {
                tracing::error!(trigger = event.kind(), "No current project id, issue state not saved");
            }
            Err(e) => {
                tracing::warn!(trigger = event.kind(), error = %e, "Failed to persist issue state");
            }
        }
    }
}
