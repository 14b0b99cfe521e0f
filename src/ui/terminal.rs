//! Interactive terminal prompts
//!
//! dialoguer blocks the calling thread, so every prompt runs on the blocking
//! pool. Transition and worklog prompts talk to Jira directly once the user
//! has decided.

use super::Prompter;
use crate::integrations::{JiraAdapter, JiraWorklog};
use crate::model::{LocalState, RemoteIssue, Task};
use crate::{Result, SyncError};
use async_trait::async_trait;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use std::sync::Arc;
use std::time::Duration;

/// [`Prompter`] that asks on the controlling terminal
pub struct TerminalPrompter {
    adapter: Arc<JiraAdapter>,
}

impl TerminalPrompter {
    pub fn new(adapter: Arc<JiraAdapter>) -> Self {
        Self { adapter }
    }
}

/// Run a dialoguer interaction on the blocking pool
async fn interact<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&ColorfulTheme) -> dialoguer::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&ColorfulTheme::default()))
        .await
        .map_err(|e| SyncError::Prompt(format!("Prompt task failed: {}", e)))?
        .map_err(|e| SyncError::Prompt(e.to_string()))
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn open_confirm(&self, message: &str, ok_label: &str) -> Result<bool> {
        let prompt = format!("{} [{}]", message, ok_label);
        interact(move |theme| {
            Confirm::with_theme(theme)
                .with_prompt(prompt)
                .default(false)
                .interact()
        })
        .await
    }

    async fn open_transition(&self, issue: &RemoteIssue, local_state: LocalState) -> Result<()> {
        let transitions = self.adapter.get_transitions(&issue.id).await?;
        if transitions.is_empty() {
            tracing::warn!(issue = %issue.key, "No transitions available");
            return Ok(());
        }

        let mut labels: Vec<String> = transitions
            .iter()
            .map(|t| match t.to {
                Some(ref to) if to.name != t.name => format!("{} -> {}", t.name, to.name),
                _ => t.name.clone(),
            })
            .collect();
        labels.push("Don't transition".to_string());

        let prompt = format!(
            "{} is now {}. Current status: {}. Pick a transition",
            issue.key,
            local_state,
            issue.status_name().unwrap_or("unknown")
        );
        let skip = labels.len() - 1;
        let choice = interact(move |theme| {
            Select::with_theme(theme)
                .with_prompt(prompt)
                .items(labels.as_slice())
                .default(skip)
                .interact_opt()
        })
        .await?;

        match choice.and_then(|i| transitions.get(i)) {
            Some(transition) => {
                self.adapter
                    .transition_issue(&issue.id, &transition.id)
                    .await?;
                tracing::info!(issue = %issue.key, transition = %transition.name, "Issue transitioned");
            }
            None => tracing::debug!(issue = %issue.key, "Transition skipped"),
        }
        Ok(())
    }

    async fn open_worklog(&self, issue: &RemoteIssue, task: &Task) -> Result<()> {
        let prompt = format!("Time spent on \"{}\" for {} (e.g. 1h 30m)", task.title, issue.key);
        let spent = interact(move |theme| {
            Input::<String>::with_theme(theme)
                .with_prompt(prompt)
                .allow_empty(true)
                .validate_with(|input: &String| -> std::result::Result<(), &'static str> {
                    if input.trim().is_empty() || parse_time_spent(input).is_some() {
                        Ok(())
                    } else {
                        Err("Use a duration like 1h 30m, 45m or 2h")
                    }
                })
                .interact_text()
        })
        .await?;

        let Some(time_spent) = parse_time_spent(&spent) else {
            tracing::debug!(issue = %issue.key, "Worklog skipped");
            return Ok(());
        };

        let comment = interact(|theme| {
            Input::<String>::with_theme(theme)
                .with_prompt("Comment (optional)")
                .allow_empty(true)
                .interact_text()
        })
        .await?;

        let started = chrono::Utc::now()
            - chrono::Duration::from_std(time_spent).unwrap_or_else(|_| chrono::Duration::zero());
        let worklog = JiraWorklog::new(started, time_spent).with_comment(comment);
        self.adapter.add_worklog(&issue.id, &worklog).await
    }
}

/// Parse Jira-style durations: `1h 30m`, `45m`, `2h`, `1d`, `90` (minutes)
pub fn parse_time_spent(input: &str) -> Option<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(minutes) = input.parse::<u64>() {
        return (minutes > 0).then(|| Duration::from_secs(minutes * 60));
    }

    let mut total = 0u64;
    for part in input.split_whitespace() {
        let (value, unit) = part.split_at(part.char_indices().last()?.0);
        let value: u64 = value.parse().ok()?;
        total += match unit {
            "w" => value * 5 * 8 * 3600,
            "d" => value * 8 * 3600,
            "h" => value * 3600,
            "m" => value * 60,
            "s" => value,
            _ => return None,
        };
    }
    (total > 0).then(|| Duration::from_secs(total))
}
