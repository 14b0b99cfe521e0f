//! Configuration system
//!
//! Loads ~/.config/jirasync/config.yaml with:
//! - The Jira connection (URL, token environment variable)
//! - The active project id and data directory
//! - Per-project integration behavior (polling, worklog, reassignment, transitions)

mod integration;
mod sync_config;
pub mod validation;

pub use integration::{IntegrationConfig, TransitionConfig, TransitionPolicy};
pub use sync_config::{JiraConnection, JiraSyncConfig};
pub use validation::{
    is_email, validate_config, validate_config_result, validate_integration, ValidationError,
};
