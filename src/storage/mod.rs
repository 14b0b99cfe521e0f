//! Storage layer
//!
//! Persists the issue cache per project and the last-active timestamp.
//! [`JsonFilePersistence`] lays data out as:
//!
//! ```text
//! <data_dir>/
//!   last_active                 RFC 3339 timestamp
//!   projects/<project>/JIRA.json
//! ```

use crate::model::{IssueCache, IssueType};
use crate::{Result, SyncError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Save/load interface for the issue feature state
#[async_trait]
pub trait IssuePersistence: Send + Sync {
    async fn save_issues_for_project(
        &self,
        project_id: &str,
        issue_type: IssueType,
        issues: &IssueCache,
    ) -> Result<()>;

    async fn save_last_active(&self) -> Result<()>;

    /// Load a project's issue cache; empty if nothing was saved yet
    async fn load_issues_for_project(
        &self,
        project_id: &str,
        issue_type: IssueType,
    ) -> Result<IssueCache>;
}

/// JSON files under a data directory
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    root: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn issues_path(&self, project_id: &str, issue_type: IssueType) -> Result<PathBuf> {
        if project_id.is_empty()
            || project_id.contains(['/', '\\'])
            || project_id == "."
            || project_id == ".."
        {
            return Err(SyncError::Storage(format!(
                "Invalid project id for storage: {:?}",
                project_id
            )));
        }
        Ok(self
            .root
            .join("projects")
            .join(project_id)
            .join(format!("{}.json", issue_type)))
    }

    fn last_active_path(&self) -> PathBuf {
        self.root.join("last_active")
    }

    /// Read the last-active timestamp, if one was saved
    pub async fn last_active(&self) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
        let path = self.last_active_path();
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).await?;
        let stamp = chrono::DateTime::parse_from_rfc3339(content.trim())
            .map_err(|e| SyncError::Storage(format!("Invalid last_active timestamp: {}", e)))?;
        Ok(Some(stamp.with_timezone(&chrono::Utc)))
    }
}

/// Write through a temp file so readers never see a partial file
async fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl IssuePersistence for JsonFilePersistence {
    async fn save_issues_for_project(
        &self,
        project_id: &str,
        issue_type: IssueType,
        issues: &IssueCache,
    ) -> Result<()> {
        let path = self.issues_path(project_id, issue_type)?;
        let json = serde_json::to_vec_pretty(issues)?;
        write_atomic(&path, &json).await?;

        tracing::debug!(
            project_id = %project_id,
            issue_type = %issue_type,
            issues = issues.len(),
            path = %path.display(),
            "Saved issue cache"
        );
        Ok(())
    }

    async fn save_last_active(&self) -> Result<()> {
        let stamp = chrono::Utc::now().to_rfc3339();
        write_atomic(&self.last_active_path(), stamp.as_bytes()).await
    }

    async fn load_issues_for_project(
        &self,
        project_id: &str,
        issue_type: IssueType,
    ) -> Result<IssueCache> {
        let path = self.issues_path(project_id, issue_type)?;
        if !fs::try_exists(&path).await? {
            return Ok(IssueCache::new());
        }

        let content = fs::read_to_string(&path).await?;
        let cache: IssueCache = serde_json::from_str(&content)?;
        tracing::info!(
            project_id = %project_id,
            issues = cache.len(),
            "Loaded issue cache"
        );
        Ok(cache)
    }
}
