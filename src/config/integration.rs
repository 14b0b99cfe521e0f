//! Per-project Jira integration settings
//!
//! The shape mirrors what the host application stores per project; this crate
//! only ever reads it.

use crate::model::LocalState;
use serde::{Deserialize, Serialize};

/// How a local lifecycle state maps to a remote status change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTransitionPolicy", into = "RawTransitionPolicy")]
pub enum TransitionPolicy {
    /// Never touch the remote status
    DoNotTransition,
    /// Ask the user which transition to apply
    AlwaysAsk,
    /// Apply a fixed transition. Without an id the policy is unusable.
    FixedTransition { id: Option<String>, name: String },
}

impl TransitionPolicy {
    pub fn fixed(id: impl Into<String>, name: impl Into<String>) -> Self {
        TransitionPolicy::FixedTransition {
            id: Some(id.into()),
            name: name.into(),
        }
    }
}

/// Wire shape: `"DO_NOT"`, `"ALWAYS_ASK"` or `{ "id": ..., "name": ... }`
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawTransitionPolicy {
    Keyword(String),
    Fixed {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: String,
    },
}

impl TryFrom<RawTransitionPolicy> for TransitionPolicy {
    type Error = String;

    fn try_from(raw: RawTransitionPolicy) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawTransitionPolicy::Keyword(keyword) => match keyword.as_str() {
                "DO_NOT" => Ok(TransitionPolicy::DoNotTransition),
                "ALWAYS_ASK" => Ok(TransitionPolicy::AlwaysAsk),
                other => Err(format!("unknown transition option '{}'", other)),
            },
            RawTransitionPolicy::Fixed { id, name } => Ok(TransitionPolicy::FixedTransition {
                id: id.filter(|id| !id.trim().is_empty()),
                name,
            }),
        }
    }
}

impl From<TransitionPolicy> for RawTransitionPolicy {
    fn from(policy: TransitionPolicy) -> Self {
        match policy {
            TransitionPolicy::DoNotTransition => RawTransitionPolicy::Keyword("DO_NOT".into()),
            TransitionPolicy::AlwaysAsk => RawTransitionPolicy::Keyword("ALWAYS_ASK".into()),
            TransitionPolicy::FixedTransition { id, name } => {
                RawTransitionPolicy::Fixed { id, name }
            }
        }
    }
}

fn default_policy() -> Option<TransitionPolicy> {
    Some(TransitionPolicy::AlwaysAsk)
}

/// Transition policy per local lifecycle state
///
/// A `null` entry is kept as `None` and treated like a fixed transition
/// without an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionConfig {
    #[serde(rename = "IN_PROGRESS", default = "default_policy")]
    pub in_progress: Option<TransitionPolicy>,
    #[serde(rename = "DONE", default = "default_policy")]
    pub done: Option<TransitionPolicy>,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            in_progress: default_policy(),
            done: default_policy(),
        }
    }
}

impl TransitionConfig {
    pub fn policy_for(&self, state: LocalState) -> Option<&TransitionPolicy> {
        match state {
            LocalState::InProgress => self.in_progress.as_ref(),
            LocalState::Done => self.done.as_ref(),
        }
    }

    pub fn set(&mut self, state: LocalState, policy: Option<TransitionPolicy>) {
        match state {
            LocalState::InProgress => self.in_progress = policy,
            LocalState::Done => self.done = policy,
        }
    }
}

/// Jira integration configuration for one project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntegrationConfig {
    pub is_enabled: bool,
    pub is_auto_poll_tickets: bool,
    pub is_auto_add_to_backlog: bool,
    pub is_worklog_enabled: bool,
    /// Delegate worklog prompts to sub-task completion
    pub is_add_worklog_on_sub_task_done: bool,
    pub is_check_to_re_assign_ticket_on_task_start: bool,
    pub is_transition_issues_enabled: bool,
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_assignee_name: Option<String>,
    pub transition_config: TransitionConfig,
    /// JQL used to find issues to import into the backlog
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_add_backlog_jql_query: Option<String>,
}

impl IntegrationConfig {
    /// An enabled config with every automation switched off
    pub fn enabled(user_name: impl Into<String>) -> Self {
        Self {
            is_enabled: true,
            user_name: user_name.into(),
            ..Default::default()
        }
    }

    /// Name used for assignment: the explicit assignee name, else the login
    pub fn current_user_name(&self) -> &str {
        self.user_assignee_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.user_name)
    }

    pub fn polls_changes(&self) -> bool {
        self.is_enabled && self.is_auto_poll_tickets
    }

    pub fn polls_backlog(&self) -> bool {
        self.is_enabled && self.is_auto_add_to_backlog
    }
}
