//! Configuration validation
//!
//! Validates jirasync configuration for correctness:
//! - Valid Jira URL and non-empty project id
//! - A usable user name when the integration is enabled
//! - Fixed transitions carry an id
//! - Email-shaped user names are flagged when reassignment is enabled

use super::integration::{IntegrationConfig, TransitionPolicy};
use super::sync_config::JiraSyncConfig;
use crate::model::LocalState;
use crate::SyncError;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid");
}

/// Syntactic email check used to detect a misconfigured user name.
///
/// This is a heuristic, not an identity check.
pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a complete configuration file
pub fn validate_config(config: &JiraSyncConfig) -> ValidationResult {
    let mut errors = Vec::new();

    let url = &config.jira.url;
    if !url.starts_with("http://") && !url.starts_with("https://") {
        errors.push(ValidationError::new(
            "jira.url",
            format!("Invalid JIRA URL: {}", url),
        ));
    }

    if let Some(ref project_id) = config.project_id {
        if project_id.trim().is_empty() {
            errors.push(ValidationError::new("projectId", "Project id cannot be empty"));
        }
    }

    if let Some(ref env_var) = config.jira.token_env {
        if std::env::var(env_var.trim_start_matches('$')).is_err() {
            tracing::warn!(
                env_var = %env_var,
                "Token environment variable not set (this may be intentional if set at runtime)"
            );
        }
    }

    if let Err(mut integration_errors) = validate_integration(&config.integration) {
        errors.append(&mut integration_errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the integration settings of one project
pub fn validate_integration(cfg: &IntegrationConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if !cfg.is_enabled {
        return Ok(());
    }

    if cfg.user_name.trim().is_empty() {
        errors.push(ValidationError::new(
            "integration.userName",
            "User name cannot be empty when the integration is enabled",
        ));
    }

    if cfg.is_check_to_re_assign_ticket_on_task_start && is_email(cfg.current_user_name()) {
        errors.push(ValidationError::new(
            "integration.userAssigneeName",
            "Reassignment needs a plain username, not an email address",
        ));
    }

    if cfg.is_transition_issues_enabled {
        for state in [LocalState::InProgress, LocalState::Done] {
            let field = format!("integration.transitionConfig.{}", state);
            match cfg.transition_config.policy_for(state) {
                None => errors.push(ValidationError::new(field, "No transition configured")),
                Some(TransitionPolicy::FixedTransition { id: None, name }) => {
                    errors.push(ValidationError::new(
                        field,
                        format!("Transition '{}' has no id", name),
                    ))
                }
                Some(_) => {}
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate configuration and return a Result
pub fn validate_config_result(config: &JiraSyncConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        SyncError::Config(format!(
            "Configuration validation failed:\n  - {}",
            messages.join("\n  - ")
        ))
    })
}
