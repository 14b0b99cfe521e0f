//! Core data model
//!
//! Remote issues as cached locally, local tasks, and the snapshot every
//! decision point reads from.

mod ids;
mod issue;
mod task;

pub use ids::TaskId;
pub use issue::{IssueCache, IssueStatus, IssueUser, RemoteIssue};
pub use task::{IssueType, LocalState, Task, TaskChanges, TaskState};

use crate::config::IntegrationConfig;

/// One atomic read of the host state taken before a decision is made
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub project_id: Option<String>,
    pub config: Option<IntegrationConfig>,
    pub issues: IssueCache,
    pub tasks: TaskState,
}

impl Snapshot {
    /// The integration config, only when it exists and is enabled
    pub fn enabled_config(&self) -> Option<&IntegrationConfig> {
        self.config.as_ref().filter(|cfg| cfg.is_enabled)
    }

    pub fn issue(&self, id: &str) -> Option<&RemoteIssue> {
        self.issues.get(id)
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// The current task (or its parent) when it is a linked task
    pub fn linked_current_task_or_parent(&self) -> Option<&Task> {
        self.tasks.current_task_or_parent().filter(|t| t.is_linked())
    }
}
