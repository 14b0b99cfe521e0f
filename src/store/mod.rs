//! Host store seams
//!
//! The task store and issue cache belong to the host application. The sync
//! engine reads them through [`StateSnapshot`] (one atomic snapshot per
//! decision) and mutates them only through [`TaskStore`] and
//! [`IssueCacheWriter`], which apply changes with the store's own mechanism.

mod memory;

pub use memory::MemoryStore;

use crate::model::{IssueType, RemoteIssue, Snapshot, TaskId};
use crate::Result;
use async_trait::async_trait;

/// Read-only access to the latest host state
pub trait StateSnapshot: Send + Sync {
    fn snapshot(&self) -> Snapshot;
}

/// Task operations the engine needs
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Issue ids already represented by tasks of the given provider,
    /// including archived tasks
    async fn all_issue_ids(&self, issue_type: IssueType) -> Result<Vec<String>>;

    /// Create a task linked to `issue`. With `to_backlog` the task goes to
    /// the head of the backlog instead of being scheduled.
    async fn add_with_issue(
        &self,
        title: String,
        issue_type: IssueType,
        issue: &RemoteIssue,
        to_backlog: bool,
    ) -> Result<TaskId>;
}

/// Write access to the issue cache
#[async_trait]
pub trait IssueCacheWriter: Send + Sync {
    async fn upsert_issue(&self, issue: RemoteIssue) -> Result<()>;
}
