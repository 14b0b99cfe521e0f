//! Collaborators shared by the sync components and the per-component loop

use super::events::SyncEvent;
use crate::integrations::IssueGateway;
use crate::storage::IssuePersistence;
use crate::store::{StateSnapshot, TaskStore};
use crate::ui::{Notification, Notifier, Prompter};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

/// Everything outside the engine that a component may talk to
#[derive(Clone)]
pub struct Collaborators {
    pub state: Arc<dyn StateSnapshot>,
    pub tasks: Arc<dyn TaskStore>,
    pub gateway: Arc<dyn IssueGateway>,
    pub persistence: Arc<dyn IssuePersistence>,
    pub prompter: Arc<dyn Prompter>,
    pub notifier: Arc<dyn Notifier>,
}

impl Collaborators {
    pub fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }
}

/// A sync component reacting to its slice of the event stream
#[async_trait]
pub trait SyncComponent: Send + 'static {
    fn name(&self) -> &'static str;

    /// Handle one event. Events reach a component in emission order and the
    /// next one is not delivered until this returns.
    async fn handle(&mut self, event: SyncEvent);
}

/// Feed a component from its own receiver until the bus closes
pub async fn drive<C: SyncComponent>(mut component: C, mut rx: broadcast::Receiver<SyncEvent>) {
    let name = component.name();
    tracing::debug!(component = name, "Sync component started");

    loop {
        match rx.recv().await {
            Ok(event) => component.handle(event).await,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(component = name, skipped, "Component lagged behind event stream");
            }
            Err(RecvError::Closed) => break,
        }
    }

    tracing::debug!(component = name, "Sync component stopped");
}
