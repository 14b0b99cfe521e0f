//! Reassignment checker
//!
//! When a linked task becomes current (or its issue changes), offer to
//! assign the issue to the configured user if someone else, or nobody,
//! holds it.

use super::context::{Collaborators, SyncComponent};
use super::events::SyncEvent;
use super::metrics;
use super::throttle::Throttle;
use crate::config::{is_email, IntegrationConfig};
use crate::model::RemoteIssue;
use crate::ui::Notification;
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const CONFIRM_OK_LABEL: &str = "Do it!";

const EMAIL_USER_NAME_WARNING: &str = "Jira: Unable to reassign ticket to yourself, because you didn't specify a username. Please visit the settings.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReassignDecision {
    /// The configured name looks like an email address and cannot be used
    EmailIdentity,
    AlreadyAssigned,
    /// Ask whether to assign `user_name`
    Ask { user_name: String },
}

pub fn assess(config: &IntegrationConfig, issue: &RemoteIssue) -> ReassignDecision {
    let user_name = config.current_user_name();
    if is_email(user_name) {
        return ReassignDecision::EmailIdentity;
    }
    match issue.assignee {
        Some(ref assignee) if assignee.name == user_name => ReassignDecision::AlreadyAssigned,
        _ => ReassignDecision::Ask {
            user_name: user_name.to_string(),
        },
    }
}

pub fn confirm_message(issue: &RemoteIssue) -> String {
    let holder = issue
        .assignee
        .as_ref()
        .map(|a| a.display_name.as_str())
        .unwrap_or("nobody");
    format!(
        "\"{}\" is currently assigned to {}. Do you want to assign it to yourself?",
        issue.summary, holder
    )
}

/// Ask, and on confirmation assign and force-refresh the issue
///
/// Returns whether the issue was reassigned.
pub async fn reassign_workflow(
    collab: &Collaborators,
    issue: &RemoteIssue,
    user_name: &str,
) -> Result<bool> {
    let confirmed = collab
        .prompter
        .open_confirm(&confirm_message(issue), CONFIRM_OK_LABEL)
        .await?;
    metrics::record_reassign_prompt(confirmed);
    if !confirmed {
        tracing::debug!(issue = %issue.key, "Reassignment declined");
        return Ok(false);
    }

    collab.gateway.update_assignee(&issue.id, user_name).await?;
    tracing::info!(issue = %issue.key, user_name = %user_name, "Issue reassigned");
    collab
        .gateway
        .refresh_issue(&issue.id, Some(issue), true, false)
        .await?;
    Ok(true)
}

pub struct ReassignmentChecker {
    collab: Collaborators,
    throttle: Throttle,
    pending: Option<JoinHandle<()>>,
}

impl ReassignmentChecker {
    pub fn new(collab: Collaborators, throttle_window: Duration) -> Self {
        Self {
            collab,
            throttle: Throttle::new(throttle_window),
            pending: None,
        }
    }

    fn start_workflow(&mut self, issue: RemoteIssue, user_name: String) {
        if let Some(previous) = self.pending.take() {
            previous.abort();
        }
        let collab = self.collab.clone();
        self.pending = Some(tokio::spawn(async move {
            if let Err(e) = reassign_workflow(&collab, &issue, &user_name).await {
                tracing::warn!(issue = %issue.key, error = %e, "Reassignment failed");
            }
        }));
    }
}

impl Drop for ReassignmentChecker {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

#[async_trait]
impl SyncComponent for ReassignmentChecker {
    fn name(&self) -> &'static str {
        "reassignment_checker"
    }

    async fn handle(&mut self, event: SyncEvent) {
        if !matches!(event, SyncEvent::CurrentTaskSet(_) | SyncEvent::IssueUpdated(_)) {
            return;
        }

        let snapshot = self.collab.state.snapshot();
        let Some(config) = snapshot
            .enabled_config()
            .filter(|cfg| cfg.is_check_to_re_assign_ticket_on_task_start)
        else {
            return;
        };
        let Some(issue_id) = snapshot
            .linked_current_task_or_parent()
            .and_then(|task| task.jira_issue_id())
        else {
            return;
        };

        let Some(issue) = snapshot.issue(issue_id) else {
            tracing::warn!(issue_id = %issue_id, "No issue data for reassignment check");
            return;
        };

        if !self.throttle.try_fire() {
            tracing::debug!(trigger = event.kind(), "Reassignment check throttled");
            return;
        }

        match assess(config, issue) {
            ReassignDecision::EmailIdentity => {
                self.collab
                    .notify(Notification::warning(EMAIL_USER_NAME_WARNING).with_icon("jira"));
            }
            ReassignDecision::AlreadyAssigned => {
                tracing::debug!(issue = %issue.key, "Issue already assigned to current user");
            }
            ReassignDecision::Ask { user_name } => self.start_workflow(issue.clone(), user_name),
        }
    }
}
