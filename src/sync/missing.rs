//! Missing issue data reloader
//!
//! The host store reports linked tasks whose issue is absent from the cache.
//! Reload those issues, at most once per throttle window.

use super::context::{Collaborators, SyncComponent};
use super::events::SyncEvent;
use super::throttle::Throttle;
use crate::model::Task;
use crate::ui::Notification;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashSet;
use std::time::Duration;

pub struct MissingIssueReloader {
    collab: Collaborators,
    throttle: Throttle,
}

/// Issue ids of the linked tasks in a batch
pub fn missing_issue_ids(tasks: &[Task]) -> Vec<String> {
    let mut seen = HashSet::new();
    tasks
        .iter()
        .filter_map(|t| t.jira_issue_id())
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

impl MissingIssueReloader {
    pub fn new(collab: Collaborators, throttle_window: Duration) -> Self {
        Self {
            collab,
            throttle: Throttle::new(throttle_window),
        }
    }
}

#[async_trait]
impl SyncComponent for MissingIssueReloader {
    fn name(&self) -> &'static str {
        "missing_issue_reloader"
    }

    async fn handle(&mut self, event: SyncEvent) {
        let SyncEvent::MissingIssueData(tasks) = event else {
            return;
        };
        if self.collab.state.snapshot().enabled_config().is_none() {
            return;
        }

        let issue_ids = missing_issue_ids(&tasks);
        if issue_ids.is_empty() || !self.throttle.try_fire() {
            return;
        }

        tracing::warn!(?issue_ids, "Tasks with missing issue data found");
        self.collab.notify(
            Notification::warning("Jira: Tasks with missing issue data found. Reloading")
                .with_icon("jira")
                .subtle(),
        );

        let gateway = &self.collab.gateway;
        let loads = issue_ids.iter().map(|id| async move {
            if let Err(e) = gateway.load_missing_issue(id).await {
                tracing::warn!(issue_id = %id, error = %e, "Failed to load missing issue");
            }
        });
        join_all(loads).await;
    }
}
