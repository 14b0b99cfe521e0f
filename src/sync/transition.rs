//! Transition reconciler
//!
//! Maps local lifecycle events onto remote workflow transitions:
//!
//! | Local event              | State         |
//! |--------------------------|---------------|
//! | linked task set current  | `IN_PROGRESS` |
//! | linked task marked done  | `DONE`        |
//!
//! Events are handled one after the other; a prompt blocks later events
//! until it is answered.

use super::context::{Collaborators, SyncComponent};
use super::events::SyncEvent;
use super::metrics;
use crate::config::{IntegrationConfig, TransitionPolicy};
use crate::model::{LocalState, RemoteIssue, Snapshot, TaskChanges, TaskId};
use crate::ui::Notification;
use crate::{Result, SyncError};
use async_trait::async_trait;
use std::time::Duration;

/// What the configured policy asks for, given the issue's current status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionPlan {
    DoNothing,
    Ask,
    /// Fixed transition without an id (or no policy at all)
    InvalidConfig,
    /// The issue already has the target status
    AlreadyInStatus,
    Transition { id: String, name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Skipped,
    Prompted,
    /// Invalid config was reported and the prompt shown instead
    FellBack,
    Unchanged,
    Transitioned,
}

impl TransitionOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            TransitionOutcome::Skipped => "skipped",
            TransitionOutcome::Prompted => "prompted",
            TransitionOutcome::FellBack => "fell_back",
            TransitionOutcome::Unchanged => "unchanged",
            TransitionOutcome::Transitioned => "transitioned",
        }
    }
}

pub fn plan(config: &IntegrationConfig, state: LocalState, issue: &RemoteIssue) -> TransitionPlan {
    match config.transition_config.policy_for(state) {
        Some(TransitionPolicy::DoNotTransition) => TransitionPlan::DoNothing,
        Some(TransitionPolicy::AlwaysAsk) => TransitionPlan::Ask,
        Some(TransitionPolicy::FixedTransition { id: Some(id), name }) if !id.is_empty() => {
            if issue.status_name() == Some(name.as_str()) {
                TransitionPlan::AlreadyInStatus
            } else {
                TransitionPlan::Transition {
                    id: id.clone(),
                    name: name.clone(),
                }
            }
        }
        Some(TransitionPolicy::FixedTransition { .. }) | None => TransitionPlan::InvalidConfig,
    }
}

/// Apply the configured policy for `state` to `issue`
pub async fn reconcile(
    collab: &Collaborators,
    config: &IntegrationConfig,
    state: LocalState,
    issue: &RemoteIssue,
    fallback_delay: Duration,
) -> Result<TransitionOutcome> {
    let outcome = match plan(config, state, issue) {
        TransitionPlan::DoNothing => TransitionOutcome::Skipped,
        TransitionPlan::AlreadyInStatus => {
            tracing::debug!(issue = %issue.key, state = %state, "Issue already in target status");
            TransitionOutcome::Unchanged
        }
        TransitionPlan::Ask => {
            collab.prompter.open_transition(issue, state).await?;
            TransitionOutcome::Prompted
        }
        TransitionPlan::InvalidConfig => {
            let err = SyncError::InvalidTransitionConfig { local_state: state };
            tracing::warn!(issue = %issue.key, error = %err, "Falling back to transition prompt");
            collab.notify(Notification::error("Jira: No valid transition configured"));
            tokio::time::sleep(fallback_delay).await;
            collab.prompter.open_transition(issue, state).await?;
            TransitionOutcome::FellBack
        }
        TransitionPlan::Transition { id, name } => {
            collab.gateway.transition_issue(&issue.id, &id).await?;
            tracing::info!(issue = %issue.key, status = %name, "Issue transitioned");
            collab.notify(
                Notification::success(format!("Jira: Set issue {} to {}", issue.key, name)).subtle(),
            );
            collab
                .gateway
                .refresh_issue(&issue.id, Some(issue), true, false)
                .await?;
            TransitionOutcome::Transitioned
        }
    };

    metrics::record_transition(outcome.as_str());
    Ok(outcome)
}

pub struct TransitionReconciler {
    collab: Collaborators,
    fallback_delay: Duration,
}

impl TransitionReconciler {
    pub fn new(collab: Collaborators, fallback_delay: Duration) -> Self {
        Self {
            collab,
            fallback_delay,
        }
    }

    /// Issue of the current task (or its parent), for `IN_PROGRESS`
    fn started_issue(snapshot: &Snapshot) -> Option<&RemoteIssue> {
        let issue_id = snapshot.linked_current_task_or_parent()?.jira_issue_id()?;
        lookup(snapshot, issue_id)
    }

    /// Issue of a linked task that was just completed, for `DONE`
    fn completed_issue<'a>(
        snapshot: &'a Snapshot,
        task_id: &TaskId,
        changes: &TaskChanges,
    ) -> Option<&'a RemoteIssue> {
        if !changes.completes() {
            return None;
        }
        let task = snapshot.task(task_id).filter(|t| t.is_done)?;
        lookup(snapshot, task.jira_issue_id()?)
    }
}

fn lookup<'a>(snapshot: &'a Snapshot, issue_id: &str) -> Option<&'a RemoteIssue> {
    let issue = snapshot.issue(issue_id);
    if issue.is_none() {
        tracing::warn!(issue_id = %issue_id, "No issue data for transition");
    }
    issue
}

#[async_trait]
impl SyncComponent for TransitionReconciler {
    fn name(&self) -> &'static str {
        "transition_reconciler"
    }

    async fn handle(&mut self, event: SyncEvent) {
        if !matches!(
            event,
            SyncEvent::CurrentTaskSet(Some(_)) | SyncEvent::TaskUpdated { .. }
        ) {
            return;
        }

        let snapshot = self.collab.state.snapshot();
        let Some(config) = snapshot
            .enabled_config()
            .filter(|cfg| cfg.is_transition_issues_enabled)
        else {
            return;
        };

        let (state, issue) = match event {
            SyncEvent::TaskUpdated {
                ref task_id,
                ref changes,
            } => (
                LocalState::Done,
                Self::completed_issue(&snapshot, task_id, changes),
            ),
            _ => (LocalState::InProgress, Self::started_issue(&snapshot)),
        };
        let Some(issue) = issue else {
            return;
        };

        match reconcile(&self.collab, config, state, issue, self.fallback_delay).await {
            Ok(outcome) => {
                tracing::debug!(issue = %issue.key, state = %state, outcome = outcome.as_str(), "Transition handled");
            }
            Err(e) => {
                metrics::record_transition("failed");
                tracing::warn!(issue = %issue.key, state = %state, error = %e, "Transition failed");
            }
        }
    }
}
