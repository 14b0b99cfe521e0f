//! jirasync configuration file handling
//!
//! Loads and saves `~/.config/jirasync/config.yaml`.

use super::integration::IntegrationConfig;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Connection settings for the Jira instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraConnection {
    /// Jira instance URL
    pub url: String,

    /// Environment variable holding the API token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
}

impl JiraConnection {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token_env: None,
        }
    }

    pub fn with_token_env(mut self, env_var: impl Into<String>) -> Self {
        self.token_env = Some(env_var.into());
        self
    }

    /// Resolve the token from the configured environment variable
    pub fn token(&self) -> Option<String> {
        self.token_env
            .as_ref()
            .and_then(|env_var| std::env::var(env_var.trim_start_matches('$')).ok())
    }
}

fn default_data_dir() -> PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("jirasync");
    path
}

/// Complete configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraSyncConfig {
    /// Active project; persistence writes are keyed by it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// Directory holding persisted issue caches
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Jira connection
    pub jira: JiraConnection,

    /// Integration behavior
    #[serde(default)]
    pub integration: IntegrationConfig,
}

impl JiraSyncConfig {
    pub fn new(jira: JiraConnection) -> Self {
        Self {
            project_id: None,
            data_dir: default_data_dir(),
            jira,
            integration: IntegrationConfig::default(),
        }
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_integration(mut self, integration: IntegrationConfig) -> Self {
        self.integration = integration;
        self
    }

    /// Load configuration from the default path
    pub fn load_default() -> Result<Self> {
        Self::load(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::SyncError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading jirasync configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            project_id = ?config.project_id,
            enabled = config.integration.is_enabled,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving jirasync configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/jirasync/config.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("jirasync");
        path.push("config.yaml");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransitionPolicy;
    use crate::model::LocalState;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.yaml");

        let mut integration = IntegrationConfig::enabled("jdoe");
        integration
            .transition_config
            .set(LocalState::Done, Some(TransitionPolicy::fixed("31", "Done")));
        let config = JiraSyncConfig::new(
            JiraConnection::new("https://jira.example.com").with_token_env("JIRA_TOKEN"),
        )
        .with_project_id("inbox")
        .with_integration(integration);

        config.save(&path).unwrap();
        let loaded = JiraSyncConfig::load(&path).unwrap();

        assert_eq!(loaded.project_id.as_deref(), Some("inbox"));
        assert_eq!(loaded.jira, config.jira);
        assert_eq!(loaded.integration, config.integration);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = JiraSyncConfig::load(temp_dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(crate::SyncError::Config(_))));
    }

    #[test]
    fn test_yaml_shape() {
        let yaml = r#"
projectId: work
jira:
  url: https://jira.example.com
  tokenEnv: JIRA_TOKEN
integration:
  isEnabled: true
  isAutoAddToBacklog: true
  userName: jdoe
  transitionConfig:
    IN_PROGRESS: DO_NOT
    DONE: ALWAYS_ASK
"#;
        let config: JiraSyncConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.integration.polls_backlog());
        assert_eq!(
            config.integration.transition_config.in_progress,
            Some(TransitionPolicy::DoNotTransition)
        );
        assert!(config.data_dir.ends_with("jirasync"));
    }
}
