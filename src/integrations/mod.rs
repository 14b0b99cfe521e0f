//! External Integrations
//!
//! The remote issue tracker side of the sync engine.
//!
//! - [`IssueGateway`]: the seam the sync components call
//! - [`JiraAdapter`]: REST client for Jira
//! - [`JiraGateway`]: gateway over the adapter and the local issue cache
//! - [`retry`]: backoff for idempotent reads

pub mod gateway;
pub mod jira;
pub mod retry;

pub use gateway::{ImportCandidates, IssueGateway};
pub use jira::{
    JiraAdapter, JiraFields, JiraGateway, JiraIssue, JiraStatus, JiraTransition, JiraUser,
    JiraWorklog, DEFAULT_AUTO_IMPORT_JQL,
};
pub use retry::{with_retry, RetryConfig, RetryDecision, RetryableError};
