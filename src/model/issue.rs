//! Remote issue representation and the local issue cache

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Status of a remote issue (only the name is consumed)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueStatus {
    pub name: String,
}

/// A remote user, as referenced by an issue's assignee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueUser {
    /// Login name, used for assignment
    pub name: String,
    pub display_name: String,
}

/// A remote issue as held in the local cache, keyed uniquely by `id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteIssue {
    pub id: String,
    pub key: String,
    pub summary: String,
    #[serde(default)]
    pub status: Option<IssueStatus>,
    #[serde(default)]
    pub assignee: Option<IssueUser>,
    /// Remote last-modified stamp, used to detect changes on refresh
    #[serde(default)]
    pub updated: Option<String>,
}

impl RemoteIssue {
    pub fn new(id: impl Into<String>, key: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            summary: summary.into(),
            status: None,
            assignee: None,
            updated: None,
        }
    }

    pub fn with_status(mut self, name: impl Into<String>) -> Self {
        self.status = Some(IssueStatus { name: name.into() });
        self
    }

    pub fn with_assignee(mut self, name: impl Into<String>, display_name: impl Into<String>) -> Self {
        self.assignee = Some(IssueUser {
            name: name.into(),
            display_name: display_name.into(),
        });
        self
    }

    pub fn with_updated(mut self, updated: impl Into<String>) -> Self {
        self.updated = Some(updated.into());
        self
    }

    pub fn status_name(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.name.as_str())
    }

    /// Title used for a task created from this issue: `"<key> <summary>"`
    pub fn task_title(&self) -> String {
        format!("{} {}", self.key, self.summary)
    }
}

/// Local cache of remote issues (the persisted issue feature state)
///
/// `ids` keeps insertion order; `entities` holds the data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueCache {
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub entities: HashMap<String, RemoteIssue>,
}

impl IssueCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_issues(issues: impl IntoIterator<Item = RemoteIssue>) -> Self {
        let mut cache = Self::new();
        for issue in issues {
            cache.upsert(issue);
        }
        cache
    }

    pub fn get(&self, id: &str) -> Option<&RemoteIssue> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// Insert or replace an issue. Returns true if it was new.
    pub fn upsert(&mut self, issue: RemoteIssue) -> bool {
        let is_new = !self.entities.contains_key(&issue.id);
        if is_new {
            self.ids.push(issue.id.clone());
        }
        self.entities.insert(issue.id.clone(), issue);
        is_new
    }

    pub fn remove(&mut self, id: &str) -> Option<RemoteIssue> {
        self.ids.retain(|existing| existing != id);
        self.entities.remove(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
