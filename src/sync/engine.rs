//! Sync engine runtime
//!
//! Subscribes every sync component to the event bus and runs each on its own
//! tokio task. [`SyncEngine::run`] keeps the engine alive until a shutdown
//! command or SIGTERM/SIGINT arrives.

use super::backlog::BacklogImporter;
use super::context::{drive, Collaborators, SyncComponent};
use super::events::{EventBus, SyncEvent, DEFAULT_EVENT_CHANNEL_CAPACITY};
use super::metrics;
use super::missing::MissingIssueReloader;
use super::persist::StorageBridge;
use super::poller::{poll_changes, PollScheduler, PollTiming};
use super::reassign::ReassignmentChecker;
use super::transition::TransitionReconciler;
use super::worklog::WorklogTrigger;
use crate::{Result, SyncError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Delay before the first change poll (8 seconds)
pub const DEFAULT_CHANGES_INITIAL_DELAY: Duration = Duration::from_secs(8);

/// Delay before the first backlog poll (12 seconds)
pub const DEFAULT_BACKLOG_INITIAL_DELAY: Duration = Duration::from_secs(12);

/// Steady-state poll interval (5 minutes)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Minimum gap between reassignment checks (15 seconds)
pub const DEFAULT_REASSIGN_THROTTLE: Duration = Duration::from_secs(15);

/// Minimum gap between missing-data reloads (60 seconds)
pub const DEFAULT_MISSING_DATA_THROTTLE: Duration = Duration::from_secs(60);

/// Pause between the invalid-transition error and the fallback prompt
pub const DEFAULT_TRANSITION_FALLBACK_DELAY: Duration = Duration::from_secs(2);

/// Sync engine timings
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub changes_initial_delay: Duration,
    pub backlog_initial_delay: Duration,
    pub poll_interval: Duration,
    pub reassign_throttle: Duration,
    pub missing_data_throttle: Duration,
    pub transition_fallback_delay: Duration,

    /// Event broadcast channel capacity (default 1000)
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            changes_initial_delay: DEFAULT_CHANGES_INITIAL_DELAY,
            backlog_initial_delay: DEFAULT_BACKLOG_INITIAL_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            reassign_throttle: DEFAULT_REASSIGN_THROTTLE,
            missing_data_throttle: DEFAULT_MISSING_DATA_THROTTLE,
            transition_fallback_delay: DEFAULT_TRANSITION_FALLBACK_DELAY,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the steady-state poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the initial delays of the change and backlog polls
    pub fn with_initial_delays(mut self, changes: Duration, backlog: Duration) -> Self {
        self.changes_initial_delay = changes;
        self.backlog_initial_delay = backlog;
        self
    }

    pub fn with_reassign_throttle(mut self, window: Duration) -> Self {
        self.reassign_throttle = window;
        self
    }

    pub fn with_missing_data_throttle(mut self, window: Duration) -> Self {
        self.missing_data_throttle = window;
        self
    }

    pub fn with_transition_fallback_delay(mut self, delay: Duration) -> Self {
        self.transition_fallback_delay = delay;
        self
    }

    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }

    /// A bus sized for this engine
    pub fn event_bus(&self) -> EventBus {
        EventBus::new(self.event_channel_capacity)
    }

    fn changes_timing(&self) -> PollTiming {
        PollTiming::new(self.changes_initial_delay, self.poll_interval)
    }

    fn backlog_timing(&self) -> PollTiming {
        PollTiming::new(self.backlog_initial_delay, self.poll_interval)
    }
}

/// Commands that can be sent to a running engine
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Stop the engine
    Shutdown,

    /// Run a backlog import now
    ImportNow,

    /// Run one change poll now
    PollNow,
}

/// Result of handling a command
enum CommandResult {
    Continue,
    Stop,
}

/// The reactive sync engine
pub struct SyncEngine {
    config: EngineConfig,
    collab: Collaborators,
    bus: EventBus,
    command_tx: mpsc::Sender<EngineCommand>,
    command_rx: Option<mpsc::Receiver<EngineCommand>>,
    components: Vec<JoinHandle<()>>,
}

impl SyncEngine {
    pub fn new(config: EngineConfig, collab: Collaborators, bus: EventBus) -> Self {
        let (command_tx, command_rx) = mpsc::channel(10);
        Self {
            config,
            collab,
            bus,
            command_tx,
            command_rx: Some(command_rx),
            components: Vec::new(),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Get a command sender
    pub fn command_sender(&self) -> mpsc::Sender<EngineCommand> {
        self.command_tx.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.components.is_empty()
    }

    fn spawn<C: SyncComponent>(&mut self, component: C) {
        let rx = self.bus.subscribe();
        self.components.push(tokio::spawn(drive(component, rx)));
    }

    /// Subscribe and spawn every component
    ///
    /// Events published before this call are not seen by the engine.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        let collab = self.collab.clone();
        let config = self.config.clone();
        self.spawn(PollScheduler::new(
            collab.clone(),
            self.bus.clone(),
            config.changes_timing(),
            config.backlog_timing(),
        ));
        self.spawn(StorageBridge::new(collab.clone()));
        self.spawn(BacklogImporter::new(collab.clone()));
        self.spawn(WorklogTrigger::new(collab.clone()));
        self.spawn(ReassignmentChecker::new(collab.clone(), config.reassign_throttle));
        self.spawn(TransitionReconciler::new(
            collab.clone(),
            config.transition_fallback_delay,
        ));
        self.spawn(MissingIssueReloader::new(collab, config.missing_data_throttle));

        metrics::set_health_status(true);
        tracing::info!(components = self.components.len(), "Sync engine started");
    }

    /// Abort every component task and wait for them to finish
    pub async fn stop(&mut self) {
        for handle in &self.components {
            handle.abort();
        }
        for handle in self.components.drain(..) {
            let _ = handle.await;
        }
        metrics::set_health_status(false);
        tracing::info!("Sync engine stopped");
    }

    async fn handle_command(&mut self, cmd: EngineCommand) -> CommandResult {
        tracing::debug!(?cmd, "Engine command");
        match cmd {
            EngineCommand::Shutdown => return CommandResult::Stop,
            EngineCommand::ImportNow => self.bus.send_event(SyncEvent::BacklogImportRequested),
            EngineCommand::PollNow => {
                let polled = poll_changes(&self.collab).await;
                tracing::info!(polled, "Manual change poll finished");
            }
        }
        CommandResult::Continue
    }

    /// Start the engine and run until shutdown
    pub async fn run(&mut self) -> Result<()> {
        let mut command_rx = self
            .command_rx
            .take()
            .ok_or_else(|| SyncError::Config("Engine already running".to_string()))?;

        self.start();

        let signal = shutdown_signal();
        tokio::pin!(signal);

        let result = loop {
            tokio::select! {
                Some(cmd) = command_rx.recv() => {
                    if let CommandResult::Stop = self.handle_command(cmd).await {
                        tracing::info!("Shutdown requested");
                        break Ok(());
                    }
                }
                received = &mut signal => {
                    match received {
                        Ok(name) => {
                            tracing::info!(signal = name, "Received signal, initiating graceful shutdown");
                            break Ok(());
                        }
                        Err(e) => break Err(e),
                    }
                }
            }
        };

        self.stop().await;
        result
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        for handle in &self.components {
            handle.abort();
        }
    }
}

/// Resolves with the name of the first termination signal received
#[cfg(unix)]
async fn shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| SyncError::Other(format!("Failed to set up SIGTERM handler: {}", e)))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| SyncError::Other(format!("Failed to set up SIGINT handler: {}", e)))?;

    tokio::select! {
        _ = sigterm.recv() => Ok("SIGTERM"),
        _ = sigint.recv() => Ok("SIGINT"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl-C")
}
