//! Polling scheduler
//!
//! Two timer loops, re-armed whenever project data, the provider config or
//! the issue state is (re)loaded:
//!
//! - **changes**: force-refresh every cached issue
//! - **backlog**: ask the backlog importer to run
//!
//! Re-arming aborts the previous timers first, so a loop whose config flag
//! was switched off stays silent until the next qualifying event.

use super::context::{Collaborators, SyncComponent};
use super::events::{EventBus, SyncEvent};
use super::metrics;
use crate::ui::Notification;
use async_trait::async_trait;
use futures::future::join_all;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Initial delay and steady-state period of one polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTiming {
    pub initial_delay: Duration,
    pub interval: Duration,
}

impl PollTiming {
    pub fn new(initial_delay: Duration, interval: Duration) -> Self {
        Self {
            initial_delay,
            interval,
        }
    }
}

pub struct PollScheduler {
    collab: Collaborators,
    bus: EventBus,
    changes_timing: PollTiming,
    backlog_timing: PollTiming,
    changes: Option<JoinHandle<()>>,
    backlog: Option<JoinHandle<()>>,
}

impl PollScheduler {
    pub fn new(
        collab: Collaborators,
        bus: EventBus,
        changes_timing: PollTiming,
        backlog_timing: PollTiming,
    ) -> Self {
        Self {
            collab,
            bus,
            changes_timing,
            backlog_timing,
            changes: None,
            backlog: None,
        }
    }

    fn stop(&mut self) {
        for handle in [self.changes.take(), self.backlog.take()].into_iter().flatten() {
            handle.abort();
        }
    }

    /// Abort running loops and start the ones the current config asks for
    pub fn rearm(&mut self) {
        self.stop();

        let snapshot = self.collab.state.snapshot();
        let Some(config) = snapshot.enabled_config() else {
            tracing::debug!("Integration disabled, polling stopped");
            return;
        };

        if config.polls_changes() {
            let collab = self.collab.clone();
            self.changes = Some(spawn_loop(self.changes_timing, "changes", move || {
                let collab = collab.clone();
                async move {
                    poll_changes(&collab).await;
                }
            }));
        }

        if config.polls_backlog() {
            let bus = self.bus.clone();
            self.backlog = Some(spawn_loop(self.backlog_timing, "backlog", move || {
                bus.send_event(SyncEvent::BacklogImportRequested);
                async {}
            }));
        }

        tracing::info!(
            changes = self.changes.is_some(),
            backlog = self.backlog.is_some(),
            "Polling re-armed"
        );
    }

    pub fn is_polling_changes(&self) -> bool {
        self.changes.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn is_polling_backlog(&self) -> bool {
        self.backlog.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[async_trait]
impl SyncComponent for PollScheduler {
    fn name(&self) -> &'static str {
        "poll_scheduler"
    }

    async fn handle(&mut self, event: SyncEvent) {
        if event.rearms_polling() {
            self.rearm();
        }
    }
}

fn spawn_loop<F, Fut>(timing: PollTiming, name: &'static str, mut on_tick: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + timing.initial_delay, timing.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            tracing::debug!(poll = name, "Poll tick");
            metrics::record_poll_tick(name);
            on_tick().await;
        }
    })
}

/// Force-refresh every cached issue without a diff dialog
///
/// Returns the number of issues polled.
pub async fn poll_changes(collab: &Collaborators) -> usize {
    let snapshot = &collab.state.snapshot();
    let issue_ids = &snapshot.issues.ids;
    if issue_ids.is_empty() {
        return 0;
    }

    collab.notify(
        Notification::info(format!("Jira: Polling Changes for {} issues", issue_ids.len()))
            .with_icon("jira")
            .subtle(),
    );

    let refreshes = issue_ids.iter().map(|id| async move {
        let current = snapshot.issue(id);
        if let Err(e) = collab.gateway.refresh_issue(id, current, true, false).await {
            tracing::warn!(issue_id = %id, error = %e, "Failed to refresh issue");
        }
    });
    join_all(refreshes).await;

    issue_ids.len()
}
