//! Typed application event stream
//!
//! Host store mutations, project lifecycle events and the engine's own
//! backlog-import trigger all travel over one broadcast [`EventBus`]. Each sync
//! component holds its own receiver and filters the kinds it cares about.

use crate::model::{Task, TaskChanges, TaskId};
use tokio::sync::broadcast;

/// Default event channel capacity (1000 events)
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Events observed (and, for backlog import, emitted) by the sync engine
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Project related data finished loading
    ProjectDataLoaded,

    /// The project's issue provider config changed
    IssueProviderConfigUpdated,

    /// The issue feature state was loaded from storage
    IssueStateLoaded,

    TaskAdded(TaskId),
    TaskDeleted(TaskId),
    TaskRestored(TaskId),
    TasksArchived(Vec<TaskId>),

    /// A task changed
    TaskUpdated { task_id: TaskId, changes: TaskChanges },

    /// The current (active) task changed
    CurrentTaskSet(Option<TaskId>),

    IssueAdded(String),
    IssueDeleted(String),
    IssueUpdated(String),
    IssueUpserted(String),
    IssuesAdded(Vec<String>),
    IssuesDeleted(Vec<String>),

    /// Ask the backlog importer to run
    BacklogImportRequested,

    /// Linked tasks whose issue data is absent from the cache
    MissingIssueData(Vec<Task>),
}

impl SyncEvent {
    /// Events that (re-)arm the polling loops
    pub fn rearms_polling(&self) -> bool {
        matches!(
            self,
            SyncEvent::ProjectDataLoaded
                | SyncEvent::IssueProviderConfigUpdated
                | SyncEvent::IssueStateLoaded
        )
    }

    /// Task and issue mutations after which the issue cache is persisted
    pub fn requires_persist(&self) -> bool {
        matches!(
            self,
            SyncEvent::TaskAdded(_)
                | SyncEvent::TaskDeleted(_)
                | SyncEvent::TaskRestored(_)
                | SyncEvent::TasksArchived(_)
                | SyncEvent::IssueAdded(_)
                | SyncEvent::IssueDeleted(_)
                | SyncEvent::IssueUpdated(_)
                | SyncEvent::IssueUpserted(_)
                | SyncEvent::IssuesAdded(_)
                | SyncEvent::IssuesDeleted(_)
        )
    }

    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            SyncEvent::ProjectDataLoaded => "project_data_loaded",
            SyncEvent::IssueProviderConfigUpdated => "issue_provider_config_updated",
            SyncEvent::IssueStateLoaded => "issue_state_loaded",
            SyncEvent::TaskAdded(_) => "task_added",
            SyncEvent::TaskDeleted(_) => "task_deleted",
            SyncEvent::TaskRestored(_) => "task_restored",
            SyncEvent::TasksArchived(_) => "tasks_archived",
            SyncEvent::TaskUpdated { .. } => "task_updated",
            SyncEvent::CurrentTaskSet(_) => "current_task_set",
            SyncEvent::IssueAdded(_) => "issue_added",
            SyncEvent::IssueDeleted(_) => "issue_deleted",
            SyncEvent::IssueUpdated(_) => "issue_updated",
            SyncEvent::IssueUpserted(_) => "issue_upserted",
            SyncEvent::IssuesAdded(_) => "issues_added",
            SyncEvent::IssuesDeleted(_) => "issues_deleted",
            SyncEvent::BacklogImportRequested => "backlog_import_requested",
            SyncEvent::MissingIssueData(_) => "missing_issue_data",
        }
    }
}

/// Broadcast bus shared by the host store and the engine's components
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SyncEvent>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Get an event subscriber
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }

    /// Send an event, logging if dropped or if the channel is filling up
    pub fn send_event(&self, event: SyncEvent) {
        let kind = event.kind();
        match self.tx.send(event) {
            Ok(_) => {
                let len = self.tx.len();
                if len > self.capacity * 80 / 100 {
                    tracing::warn!(
                        current = len,
                        capacity = self.capacity,
                        threshold_pct = 80,
                        "Event channel nearing capacity"
                    );
                }
            }
            Err(_) => {
                tracing::debug!(kind, "Event sent but no receivers subscribed");
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CHANNEL_CAPACITY)
    }
}
