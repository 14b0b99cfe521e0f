//! Error types for jirasync
//!
//! Defines the error enum covering failure modes of the sync engine and its
//! collaborators. Uses thiserror for ergonomic error handling.

use crate::model::LocalState;
use thiserror::Error;

/// Result type alias for jirasync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Error type for jirasync operations
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage/persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Network/HTTP errors
    #[error("Network error: {0}")]
    Network(String),

    /// Issue tracker integration errors
    #[error("Integration error: {0}")]
    Integration(String),

    /// Prompt (dialog) errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// A persistence write happened while no project was active
    #[error("No current project id")]
    NoActiveProject,

    /// The transition configured for a local state is unusable
    #[error("No valid transition configured for {local_state}")]
    InvalidTransitionConfig { local_state: LocalState },

    /// Issue not found in the local cache or remotely
    #[error("Issue not found: {0}")]
    IssueNotFound(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),

    /// Anyhow errors (for more context)
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),

    /// Rate limited (retry-after duration in seconds)
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

impl crate::integrations::retry::RetryableError for SyncError {
    fn retry_decision(&self) -> crate::integrations::retry::RetryDecision {
        use crate::integrations::retry::RetryDecision;
        use std::time::Duration;

        match self {
            SyncError::Network(_) => RetryDecision::Retry,
            SyncError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    RetryDecision::Retry
                } else if let Some(status) = e.status() {
                    match status.as_u16() {
                        429 => RetryDecision::RetryAfter(Duration::from_secs(60)),
                        500..=599 => RetryDecision::Retry,
                        _ => RetryDecision::NoRetry,
                    }
                } else {
                    RetryDecision::Retry
                }
            }
            SyncError::RateLimited(secs) => RetryDecision::RetryAfter(Duration::from_secs(*secs)),
            SyncError::Integration(msg) => {
                if msg.contains("Rate limited") || msg.contains("rate limit") {
                    let secs = extract_retry_after(msg).unwrap_or(60);
                    RetryDecision::RetryAfter(Duration::from_secs(secs))
                } else if msg.contains("timeout") || msg.contains("connection") {
                    RetryDecision::Retry
                } else {
                    RetryDecision::NoRetry
                }
            }
            SyncError::Config(_)
            | SyncError::Storage(_)
            | SyncError::Prompt(_)
            | SyncError::NoActiveProject
            | SyncError::InvalidTransitionConfig { .. }
            | SyncError::IssueNotFound(_)
            | SyncError::Io(_)
            | SyncError::Json(_)
            | SyncError::Yaml(_)
            | SyncError::Other(_)
            | SyncError::Anyhow(_) => RetryDecision::NoRetry,
        }
    }
}

/// Extract retry-after seconds from an error message
fn extract_retry_after(msg: &str) -> Option<u64> {
    let msg_lower = msg.to_lowercase();
    let pos = msg_lower.find("retry after")?;
    let num_str: String = msg[pos + 11..]
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    num_str.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::retry::{RetryDecision, RetryableError};
    use std::time::Duration;

    #[test]
    fn test_extract_retry_after() {
        assert_eq!(extract_retry_after("Rate limited, retry after 42 seconds"), Some(42));
        assert_eq!(extract_retry_after("Retry After: 7"), Some(7));
        assert_eq!(extract_retry_after("something else"), None);
    }

    #[test]
    fn test_retry_classification() {
        assert_eq!(
            SyncError::Network("reset".into()).retry_decision(),
            RetryDecision::Retry
        );
        assert_eq!(
            SyncError::RateLimited(5).retry_decision(),
            RetryDecision::RetryAfter(Duration::from_secs(5))
        );
        assert_eq!(
            SyncError::Integration("Rate limited, retry after 30 seconds".into()).retry_decision(),
            RetryDecision::RetryAfter(Duration::from_secs(30))
        );
        assert_eq!(SyncError::NoActiveProject.retry_decision(), RetryDecision::NoRetry);
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = SyncError::InvalidTransitionConfig {
            local_state: LocalState::Done,
        };
        assert_eq!(err.to_string(), "No valid transition configured for DONE");
    }
}
