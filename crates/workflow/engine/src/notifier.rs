//! Notification sink
//!
//! Delivery is someone else's problem. The orchestrator hands over
//! notifications after a commit and never fails a request because the
//! sink did.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use workflow_types::{Notification, NotificationType, UserId, WorkflowId};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification sink unavailable: {0}")]
    Unavailable(String),
}

/// Receiver of orchestrator-emitted notifications
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Record or deliver a notification
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError>;

    /// Whether a notification of `kind` for (workflow, user) exists at or after `since`
    async fn sent_since(
        &self,
        workflow_id: &WorkflowId,
        user_id: &UserId,
        kind: NotificationType,
        since: DateTime<Utc>,
    ) -> Result<bool, NotifyError>;

    /// Notifications addressed to a user, newest first
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Notification>, NotifyError>;
}

/// Notification log kept in memory
#[derive(Debug, Default)]
pub struct InMemoryNotifier {
    log: RwLock<Vec<Notification>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.log.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.log.read().await.is_empty()
    }

    pub async fn all(&self) -> Vec<Notification> {
        self.log.read().await.clone()
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        tracing::debug!(
            workflow_id = %notification.workflow_id,
            user_id = %notification.user_id,
            kind = ?notification.notification_type,
            "Notification recorded"
        );
        self.log.write().await.push(notification);
        Ok(())
    }

    async fn sent_since(
        &self,
        workflow_id: &WorkflowId,
        user_id: &UserId,
        kind: NotificationType,
        since: DateTime<Utc>,
    ) -> Result<bool, NotifyError> {
        let log = self.log.read().await;
        Ok(log.iter().any(|n| {
            &n.workflow_id == workflow_id
                && &n.user_id == user_id
                && n.notification_type == kind
                && n.created_at >= since
        }))
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Notification>, NotifyError> {
        let log = self.log.read().await;
        let mut mine: Vec<Notification> =
            log.iter().filter(|n| &n.user_id == user_id).cloned().collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mine)
    }
}
