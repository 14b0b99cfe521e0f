//! Reactive Jira sync engine
//!
//! Host store mutations and project lifecycle events arrive on the
//! [`EventBus`]. Each component owns a receiver, filters the events it cares
//! about, takes one [`Snapshot`](crate::model::Snapshot) of the host state and
//! then acts:
//!
//! | Component                 | Reacts to                                  |
//! |---------------------------|--------------------------------------------|
//! | [`PollScheduler`]         | project/config/issue-state loaded          |
//! | [`StorageBridge`]         | task and issue mutations                   |
//! | [`BacklogImporter`]       | backlog import requested                   |
//! | [`WorklogTrigger`]        | task updated (completed)                   |
//! | [`ReassignmentChecker`]   | current task set, issue updated            |
//! | [`TransitionReconciler`]  | current task set, task updated (completed) |
//! | [`MissingIssueReloader`]  | missing issue data                         |
//!
//! [`SyncEngine`] wires them together.

pub mod backlog;
mod context;
mod engine;
mod events;
pub mod metrics;
mod missing;
mod persist;
mod poller;
pub mod reassign;
mod throttle;
pub mod transition;
pub mod worklog;

pub use backlog::{import_new_issues, BacklogImporter, ImportSummary};
pub use context::{drive, Collaborators, SyncComponent};
pub use engine::{
    EngineCommand, EngineConfig, SyncEngine, DEFAULT_BACKLOG_INITIAL_DELAY,
    DEFAULT_CHANGES_INITIAL_DELAY, DEFAULT_MISSING_DATA_THROTTLE, DEFAULT_POLL_INTERVAL,
    DEFAULT_REASSIGN_THROTTLE, DEFAULT_TRANSITION_FALLBACK_DELAY,
};
pub use events::{EventBus, SyncEvent, DEFAULT_EVENT_CHANNEL_CAPACITY};
pub use missing::MissingIssueReloader;
pub use persist::{persist_issue_state, StorageBridge};
pub use poller::{poll_changes, PollScheduler, PollTiming};
pub use reassign::ReassignmentChecker;
pub use throttle::Throttle;
pub use transition::{TransitionOutcome, TransitionReconciler};
pub use worklog::{WorklogDecision, WorklogTrigger};
