//! Local task records and lifecycle states

use super::ids::TaskId;
use super::issue::IssueCache;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Issue provider a task is linked to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    Jira,
    Git,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Jira => "JIRA",
            IssueType::Git => "GIT",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local lifecycle state that drives remote status transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocalState {
    /// Task was set as the current task
    InProgress,
    /// Task was marked complete
    Done,
}

impl LocalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocalState::InProgress => "IN_PROGRESS",
            LocalState::Done => "DONE",
        }
    }
}

impl fmt::Display for LocalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A local task record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub parent_id: Option<TaskId>,
    #[serde(default)]
    pub sub_task_ids: Vec<TaskId>,
    #[serde(default)]
    pub issue_id: Option<String>,
    #[serde(default)]
    pub issue_type: Option<IssueType>,
    #[serde(default)]
    pub is_done: bool,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            parent_id: None,
            sub_task_ids: Vec::new(),
            issue_id: None,
            issue_type: None,
            is_done: false,
        }
    }

    /// Link the task to a remote issue of the given provider
    pub fn with_issue(mut self, issue_type: IssueType, issue_id: impl Into<String>) -> Self {
        self.issue_type = Some(issue_type);
        self.issue_id = Some(issue_id.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<TaskId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_sub_tasks(mut self, ids: impl IntoIterator<Item = TaskId>) -> Self {
        self.sub_task_ids = ids.into_iter().collect();
        self
    }

    pub fn done(mut self) -> Self {
        self.is_done = true;
        self
    }

    /// The remote issue id when this is a Jira-linked task
    pub fn jira_issue_id(&self) -> Option<&str> {
        match self.issue_type {
            Some(IssueType::Jira) => self.issue_id.as_deref(),
            _ => None,
        }
    }

    pub fn is_linked(&self) -> bool {
        self.jira_issue_id().is_some()
    }

    pub fn has_sub_tasks(&self) -> bool {
        !self.sub_task_ids.is_empty()
    }
}

/// Change-set carried by a task update event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl TaskChanges {
    pub fn mark_done() -> Self {
        Self {
            is_done: Some(true),
            ..Default::default()
        }
    }

    /// True if the change-set sets the completion flag
    pub fn completes(&self) -> bool {
        self.is_done == Some(true)
    }
}

/// Snapshot of the task store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskState {
    #[serde(default)]
    pub ids: Vec<TaskId>,
    #[serde(default)]
    pub entities: HashMap<TaskId, Task>,
    /// Backlog order, head first
    #[serde(default)]
    pub backlog_ids: Vec<TaskId>,
    #[serde(default)]
    pub current_task_id: Option<TaskId>,
}

impl TaskState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut state = Self::new();
        for task in tasks {
            state.insert(task);
        }
        state
    }

    pub fn insert(&mut self, task: Task) {
        if !self.entities.contains_key(&task.id) {
            self.ids.push(task.id.clone());
        }
        self.entities.insert(task.id.clone(), task);
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.entities.get(id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Task> {
        self.ids.iter().filter_map(|id| self.entities.get(id))
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.current_task_id.as_ref().and_then(|id| self.get(id))
    }

    /// The current task's parent if it has one, otherwise the current task
    pub fn current_task_or_parent(&self) -> Option<&Task> {
        let current = self.current_task()?;
        match current.parent_id.as_ref() {
            Some(parent_id) => self.get(parent_id),
            None => Some(current),
        }
    }

    /// Issue ids referenced by tasks of the given provider
    pub fn issue_ids(&self, issue_type: IssueType) -> Vec<String> {
        self.all()
            .filter(|t| t.issue_type == Some(issue_type))
            .filter_map(|t| t.issue_id.clone())
            .collect()
    }

    /// Linked tasks whose issue is absent from the cache
    pub fn tasks_with_missing_issue_data(&self, issues: &IssueCache) -> Vec<Task> {
        self.all()
            .filter(|t| t.jira_issue_id().is_some_and(|id| !issues.contains(id)))
            .cloned()
            .collect()
    }
}
