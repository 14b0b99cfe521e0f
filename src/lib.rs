//! jirasync - Reactive Jira synchronization engine
//!
//! Keeps a local task list consistent with a Jira project. Local task and
//! issue mutations arrive as events; the engine polls Jira for changes,
//! imports new issues into the backlog, asks for worklogs when tasks are
//! completed, offers reassignment when a task is started, and transitions
//! remote issues to match the local lifecycle.
//!
//! # Architecture
//!
//! - **model**: Remote issues, local tasks, state snapshots
//! - **config**: Integration config, config file, validation
//! - **store**: Host store seams and the in-memory store
//! - **storage**: Issue cache persistence
//! - **integrations**: Issue gateway, Jira REST adapter, retry
//! - **ui**: Notification and prompt collaborators
//! - **sync**: Event bus and the sync components

pub mod config;
pub mod error;
pub mod integrations;
pub mod logging;
pub mod model;
pub mod storage;
pub mod store;
pub mod sync;
pub mod ui;

pub use error::{Result, SyncError};
