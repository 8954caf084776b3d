//! Notifications emitted by the orchestrator

use crate::{NotificationId, UserId, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a notification is about
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Assignment,
    Deadline,
    StatusChange,
}

/// A message addressed to one user about one workflow
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub workflow_id: WorkflowId,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        workflow_id: WorkflowId,
        user_id: UserId,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: NotificationId::generate(),
            workflow_id,
            user_id,
            title: title.into(),
            message: message.into(),
            notification_type,
            created_at: Utc::now(),
        }
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}
