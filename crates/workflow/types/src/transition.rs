//! The transition ledger: append-only audit entries for every state change
//!
//! The ledger is the only record of a workflow's history. Restoring an
//! archived workflow reads it backwards to recover the pre-archive status.

use crate::{StatusItemId, TransitionId, UserId, WorkflowId, WorkflowStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of change a transition records
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionType {
    Creation,
    StepChange,
    StatusChange,
    Assignment,
}

impl TransitionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionType::Creation => "creation",
            TransitionType::StepChange => "step_change",
            TransitionType::StatusChange => "status_change",
            TransitionType::Assignment => "assignment",
        }
    }
}

/// One immutable ledger entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub id: TransitionId,
    pub workflow_id: WorkflowId,
    /// Position in the workflow's ledger, assigned by the store on commit
    pub sequence: u64,
    pub transition_type: TransitionType,
    pub from_step: Option<u32>,
    pub to_step: Option<u32>,
    pub from_status: Option<WorkflowStatus>,
    pub to_status: Option<WorkflowStatus>,
    pub from_user: Option<UserId>,
    pub to_user: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_custom_status: Option<StatusItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_custom_status: Option<StatusItemId>,
    #[serde(default)]
    pub comments: String,
    /// Who caused the change
    pub actor: UserId,
    pub timestamp: DateTime<Utc>,
}

impl Transition {
    fn blank(
        workflow_id: WorkflowId,
        transition_type: TransitionType,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransitionId::generate(),
            workflow_id,
            sequence: 0,
            transition_type,
            from_step: None,
            to_step: None,
            from_status: None,
            to_status: None,
            from_user: None,
            to_user: None,
            from_custom_status: None,
            to_custom_status: None,
            comments: String::new(),
            actor,
            timestamp: now,
        }
    }

    /// Workflow started: null → step 1, → in_progress
    pub fn creation(
        workflow_id: WorkflowId,
        assignee: UserId,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        let mut t = Self::blank(workflow_id, TransitionType::Creation, actor, now);
        t.to_step = Some(1);
        t.to_status = Some(WorkflowStatus::InProgress);
        t.to_user = Some(assignee);
        t
    }

    /// Step pointer moved and ownership handed over
    pub fn step_change(
        workflow_id: WorkflowId,
        from_step: u32,
        to_step: u32,
        from_user: Option<UserId>,
        to_user: UserId,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        let mut t = Self::blank(workflow_id, TransitionType::StepChange, actor, now);
        t.from_step = Some(from_step);
        t.to_step = Some(to_step);
        t.from_status = Some(WorkflowStatus::InProgress);
        t.to_status = Some(WorkflowStatus::InProgress);
        t.from_user = from_user;
        t.to_user = Some(to_user);
        t
    }

    /// Lifecycle status changed
    pub fn status_change(
        workflow_id: WorkflowId,
        step: u32,
        from_status: WorkflowStatus,
        to_status: WorkflowStatus,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        let mut t = Self::blank(workflow_id, TransitionType::StatusChange, actor, now);
        t.from_step = Some(step);
        t.to_step = Some(step);
        t.from_status = Some(from_status);
        t.to_status = Some(to_status);
        t
    }

    /// Holder of the current step replaced in place
    pub fn reassignment(
        workflow_id: WorkflowId,
        step: u32,
        from_user: UserId,
        to_user: UserId,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        let mut t = Self::blank(workflow_id, TransitionType::Assignment, actor, now);
        t.from_step = Some(step);
        t.to_step = Some(step);
        t.from_user = Some(from_user);
        t.to_user = Some(to_user);
        t
    }

    pub fn with_users(mut self, from_user: Option<UserId>, to_user: Option<UserId>) -> Self {
        self.from_user = from_user;
        self.to_user = to_user;
        self
    }

    pub fn with_custom_status(
        mut self,
        from: Option<StatusItemId>,
        to: Option<StatusItemId>,
    ) -> Self {
        self.from_custom_status = from;
        self.to_custom_status = to;
        self
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = comments.into();
        self
    }
}

/// Status a workflow had right before it was last archived.
///
/// Scans newest-first for a `status_change` into `archived`. `transitions`
/// must be in ledger order.
pub fn pre_archive_status(transitions: &[Transition]) -> Option<WorkflowStatus> {
    transitions
        .iter()
        .rev()
        .find(|t| {
            t.transition_type == TransitionType::StatusChange
                && t.to_status == Some(WorkflowStatus::Archived)
        })
        .and_then(|t| t.from_status)
}
