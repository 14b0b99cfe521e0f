//! Worklog trigger
//!
//! When a task is completed, decide whether to ask the user to log work and
//! against which issue. A sub-task may log against its parent's issue.

use super::context::{Collaborators, SyncComponent};
use super::events::SyncEvent;
use crate::config::IntegrationConfig;
use crate::model::{Snapshot, Task, TaskChanges, TaskId, TaskState};
use async_trait::async_trait;

/// Where a worklog prompt should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorklogDecision {
    /// The completed task logs against its own issue
    OwnIssue { task: Task, issue_id: String },
    /// A completed sub-task logs against its parent's issue
    ParentIssue { task: Task, issue_id: String },
    NoAction,
}

pub fn decide(
    config: &IntegrationConfig,
    tasks: &TaskState,
    task_id: &TaskId,
    changes: &TaskChanges,
) -> WorklogDecision {
    if !changes.completes() {
        return WorklogDecision::NoAction;
    }
    let Some(task) = tasks.get(task_id) else {
        return WorklogDecision::NoAction;
    };
    let delegates = config.is_add_worklog_on_sub_task_done;

    // A delegating sub-task never logs against its own issue
    let parent_issue = task
        .parent_id
        .as_ref()
        .and_then(|id| tasks.get(id))
        .and_then(|parent| parent.jira_issue_id());
    if let Some(issue_id) = parent_issue.filter(|_| delegates) {
        return WorklogDecision::ParentIssue {
            task: task.clone(),
            issue_id: issue_id.to_string(),
        };
    }

    match task.jira_issue_id() {
        Some(issue_id) if config.is_worklog_enabled && !(delegates && task.has_sub_tasks()) => {
            WorklogDecision::OwnIssue {
                task: task.clone(),
                issue_id: issue_id.to_string(),
            }
        }
        _ => WorklogDecision::NoAction,
    }
}

pub struct WorklogTrigger {
    collab: Collaborators,
}

impl WorklogTrigger {
    pub fn new(collab: Collaborators) -> Self {
        Self { collab }
    }

    fn open_prompt(&self, snapshot: &Snapshot, task: Task, issue_id: &str) {
        let Some(issue) = snapshot.issue(issue_id).cloned() else {
            tracing::warn!(issue_id = %issue_id, task_id = %task.id, "No issue data for worklog");
            return;
        };

        tracing::info!(issue = %issue.key, task_id = %task.id, "Opening worklog prompt");
        let prompter = self.collab.prompter.clone();
        tokio::spawn(async move {
            if let Err(e) = prompter.open_worklog(&issue, &task).await {
                tracing::warn!(issue = %issue.key, error = %e, "Worklog prompt failed");
            }
        });
    }
}

#[async_trait]
impl SyncComponent for WorklogTrigger {
    fn name(&self) -> &'static str {
        "worklog_trigger"
    }

    async fn handle(&mut self, event: SyncEvent) {
        let SyncEvent::TaskUpdated { task_id, changes } = event else {
            return;
        };
        let snapshot = self.collab.state.snapshot();
        let Some(config) = snapshot.enabled_config() else {
            return;
        };

        match decide(config, &snapshot.tasks, &task_id, &changes) {
            WorklogDecision::OwnIssue { task, issue_id }
            | WorklogDecision::ParentIssue { task, issue_id } => {
                self.open_prompt(&snapshot, task, &issue_id)
            }
            WorklogDecision::NoAction => {}
        }
    }
}
