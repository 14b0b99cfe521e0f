//! In-memory host store
//!
//! Holds tasks, the issue cache, the active project and its integration
//! config. Every mutation publishes the matching [`SyncEvent`] on the bus so
//! the engine reacts exactly as it would to the host application's own store.

use super::{IssueCacheWriter, StateSnapshot, TaskStore};
use crate::config::IntegrationConfig;
use crate::model::{IssueCache, IssueType, RemoteIssue, Snapshot, Task, TaskChanges, TaskId, TaskState};
use crate::sync::{EventBus, SyncEvent};
use crate::{Result, SyncError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Store backed by a lock-protected [`Snapshot`]
pub struct MemoryStore {
    state: RwLock<Snapshot>,
    /// Tasks moved to the archive; still count as imported
    archived: RwLock<Vec<Task>>,
    bus: EventBus,
    next_task: AtomicU64,
}

impl MemoryStore {
    pub fn new(bus: EventBus) -> Self {
        Self {
            state: RwLock::new(Snapshot::default()),
            archived: RwLock::new(Vec::new()),
            bus,
            next_task: AtomicU64::new(1),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_task_id(&self) -> TaskId {
        let n = self.next_task.fetch_add(1, Ordering::Relaxed);
        TaskId::new(format!("t{}-{}", chrono::Utc::now().timestamp_millis(), n))
    }

    /// Replace the whole project state and announce the load
    pub fn load_project(
        &self,
        project_id: impl Into<String>,
        config: IntegrationConfig,
        issues: IssueCache,
        tasks: TaskState,
    ) {
        let missing = {
            let mut state = self.write();
            state.project_id = Some(project_id.into());
            state.config = Some(config);
            state.issues = issues;
            state.tasks = tasks;
            state.tasks.tasks_with_missing_issue_data(&state.issues)
        };

        self.bus.send_event(SyncEvent::IssueStateLoaded);
        self.bus.send_event(SyncEvent::ProjectDataLoaded);
        if !missing.is_empty() {
            self.bus.send_event(SyncEvent::MissingIssueData(missing));
        }
    }

    /// Clear the active project (persistence writes will fail until reset)
    pub fn clear_project(&self) {
        self.write().project_id = None;
    }

    pub fn set_config(&self, config: IntegrationConfig) {
        self.write().config = Some(config);
        self.bus.send_event(SyncEvent::IssueProviderConfigUpdated);
    }

    pub fn add_task(&self, task: Task) {
        let id = task.id.clone();
        {
            let mut state = self.write();
            if let Some(parent_id) = task.parent_id.clone() {
                if let Some(parent) = state.tasks.entities.get_mut(&parent_id) {
                    if !parent.sub_task_ids.contains(&id) {
                        parent.sub_task_ids.push(id.clone());
                    }
                }
            }
            state.tasks.insert(task);
        }
        self.bus.send_event(SyncEvent::TaskAdded(id));
    }

    pub fn update_task(&self, id: &TaskId, changes: TaskChanges) -> Result<()> {
        {
            let mut state = self.write();
            let task = state
                .tasks
                .entities
                .get_mut(id)
                .ok_or_else(|| SyncError::Storage(format!("Unknown task: {}", id)))?;
            if let Some(is_done) = changes.is_done {
                task.is_done = is_done;
            }
            if let Some(ref title) = changes.title {
                task.title = title.clone();
            }
        }
        self.bus.send_event(SyncEvent::TaskUpdated {
            task_id: id.clone(),
            changes,
        });
        Ok(())
    }

    pub fn set_current_task(&self, id: Option<TaskId>) {
        self.write().tasks.current_task_id = id.clone();
        self.bus.send_event(SyncEvent::CurrentTaskSet(id));
    }

    /// Move tasks to the archive
    pub fn archive_tasks(&self, ids: &[TaskId]) {
        let mut moved = Vec::new();
        {
            let mut state = self.write();
            for id in ids {
                if let Some(task) = state.tasks.entities.remove(id) {
                    moved.push(task);
                }
            }
            state.tasks.ids.retain(|id| !ids.contains(id));
            state.tasks.backlog_ids.retain(|id| !ids.contains(id));
        }
        self.archived
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend(moved);
        self.bus.send_event(SyncEvent::TasksArchived(ids.to_vec()));
    }

    pub fn delete_task(&self, id: &TaskId) {
        {
            let mut state = self.write();
            state.tasks.entities.remove(id);
            state.tasks.ids.retain(|existing| existing != id);
            state.tasks.backlog_ids.retain(|existing| existing != id);
            if state.tasks.current_task_id.as_ref() == Some(id) {
                state.tasks.current_task_id = None;
            }
        }
        self.bus.send_event(SyncEvent::TaskDeleted(id.clone()));
    }

    pub fn update_issue(&self, issue: RemoteIssue) {
        let id = issue.id.clone();
        self.write().issues.upsert(issue);
        self.bus.send_event(SyncEvent::IssueUpdated(id));
    }

    pub fn delete_issue(&self, id: &str) {
        self.write().issues.remove(id);
        self.bus.send_event(SyncEvent::IssueDeleted(id.to_string()));
    }
}

impl StateSnapshot for MemoryStore {
    fn snapshot(&self) -> Snapshot {
        self.read().clone()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn all_issue_ids(&self, issue_type: IssueType) -> Result<Vec<String>> {
        let mut ids = self.read().tasks.issue_ids(issue_type);
        let archived = self.archived.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        ids.extend(
            archived
                .iter()
                .filter(|t| t.issue_type == Some(issue_type))
                .filter_map(|t| t.issue_id.clone()),
        );
        Ok(ids)
    }

    async fn add_with_issue(
        &self,
        title: String,
        issue_type: IssueType,
        issue: &RemoteIssue,
        to_backlog: bool,
    ) -> Result<TaskId> {
        let id = self.next_task_id();
        let task = Task::new(id.clone(), title).with_issue(issue_type, issue.id.clone());
        {
            let mut state = self.write();
            state.issues.upsert(issue.clone());
            state.tasks.insert(task);
            if to_backlog {
                state.tasks.backlog_ids.insert(0, id.clone());
            }
        }
        tracing::debug!(task_id = %id, issue_id = %issue.id, "Added task for issue");
        self.bus.send_event(SyncEvent::TaskAdded(id.clone()));
        Ok(id)
    }
}

#[async_trait]
impl IssueCacheWriter for MemoryStore {
    async fn upsert_issue(&self, issue: RemoteIssue) -> Result<()> {
        let id = issue.id.clone();
        self.write().issues.upsert(issue);
        self.bus.send_event(SyncEvent::IssueUpserted(id));
        Ok(())
    }
}
