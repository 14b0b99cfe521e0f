//! User-facing collaborators
//!
//! The sync engine never renders anything itself. It hands notifications to a
//! [`Notifier`] and asks a [`Prompter`] for decisions that need a human.

mod terminal;

pub use terminal::TerminalPrompter;

use crate::model::{LocalState, RemoteIssue, Task};
use crate::Result;
use async_trait::async_trait;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// A toast-style notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub icon: Option<String>,
    /// Subtle notifications are informational and may be shown unobtrusively
    pub subtle: bool,
}

impl Notification {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity,
            icon: None,
            subtle: false,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn subtle(mut self) -> Self {
        self.subtle = true;
        self
    }
}

/// Displays notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Asks the user for decisions
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Ask a yes/no question. `Ok(true)` means confirmed.
    async fn open_confirm(&self, message: &str, ok_label: &str) -> Result<bool>;

    /// Let the user pick (and apply) a transition for `issue`
    async fn open_transition(&self, issue: &RemoteIssue, local_state: LocalState) -> Result<()>;

    /// Let the user log work for `task` against `issue`
    async fn open_worklog(&self, issue: &RemoteIssue, task: &Task) -> Result<()>;
}

/// Notifier that writes to the tracing log
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        let icon = notification.icon.as_deref().unwrap_or("jira");
        match notification.severity {
            Severity::Error => {
                tracing::error!(icon, subtle = notification.subtle, "{}", notification.message)
            }
            Severity::Warning => {
                tracing::warn!(icon, subtle = notification.subtle, "{}", notification.message)
            }
            Severity::Info | Severity::Success => {
                tracing::info!(icon, subtle = notification.subtle, "{}", notification.message)
            }
        }
    }
}
