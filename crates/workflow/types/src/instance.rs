//! Workflow instances: running executions of workflow templates
//!
//! A Workflow tracks which step of its template is current, its lifecycle
//! status and derived progress. Instances are never deleted; they end up
//! `completed`/`canceled` and may then be archived.

use crate::{
    StatusItemId, StatusTemplateId, TeamId, TemplateId, UserId, Visibility, WorkflowError,
    WorkflowId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Lifecycle Status ─────────────────────────────────────────────────

/// The lifecycle status of a workflow
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Steps are being worked on
    #[default]
    InProgress,
    /// Temporarily halted; no step may move
    Paused,
    /// Finished (organically or forced)
    Completed,
    /// Abandoned
    Canceled,
    /// Hidden from default listings; restorable
    Archived,
}

/// Orchestrator operations gated by lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleOperation {
    Advance,
    AssignStep,
    CompleteStep,
    ChangeStatus,
    SetCustomStatus,
    Archive,
    Restore,
}

impl LifecycleOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleOperation::Advance => "advance",
            LifecycleOperation::AssignStep => "assign a step of",
            LifecycleOperation::CompleteStep => "complete a step of",
            LifecycleOperation::ChangeStatus => "change the status of",
            LifecycleOperation::SetCustomStatus => "set the custom status of",
            LifecycleOperation::Archive => "archive",
            LifecycleOperation::Restore => "restore",
        }
    }
}

impl WorkflowStatus {
    pub const ALL: [WorkflowStatus; 5] = [
        WorkflowStatus::InProgress,
        WorkflowStatus::Paused,
        WorkflowStatus::Completed,
        WorkflowStatus::Canceled,
        WorkflowStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::InProgress => "in_progress",
            WorkflowStatus::Paused => "paused",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Canceled => "canceled",
            WorkflowStatus::Archived => "archived",
        }
    }

    /// Completed or canceled: the step pointer no longer moves
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStatus::Completed | WorkflowStatus::Canceled)
    }

    /// Transition table: which operations are legal from this status
    pub fn permits(&self, operation: LifecycleOperation) -> bool {
        use LifecycleOperation::*;
        match self {
            WorkflowStatus::InProgress => match operation {
                Advance | AssignStep | CompleteStep | ChangeStatus | SetCustomStatus => true,
                Archive | Restore => false,
            },
            WorkflowStatus::Paused => match operation {
                ChangeStatus | SetCustomStatus => true,
                Advance | AssignStep | CompleteStep | Archive | Restore => false,
            },
            WorkflowStatus::Completed | WorkflowStatus::Canceled => match operation {
                ChangeStatus | SetCustomStatus | Archive => true,
                Advance | AssignStep | CompleteStep | Restore => false,
            },
            WorkflowStatus::Archived => match operation {
                ChangeStatus | Restore => true,
                Advance | AssignStep | CompleteStep | SetCustomStatus | Archive => false,
            },
        }
    }

    /// Fail with `InvalidStateTransition` unless `operation` is legal
    pub fn ensure_permits(&self, operation: LifecycleOperation) -> Result<(), WorkflowError> {
        if self.permits(operation) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidStateTransition {
                operation: operation.as_str(),
                status: self.as_str().to_string(),
            })
        }
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkflowStatus {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkflowStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| WorkflowError::InvalidStatus(s.to_string()))
    }
}

// ── Priority ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

// ── Workflow ─────────────────────────────────────────────────────────

/// A running instance of a workflow template
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub template_id: TemplateId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
    pub status: WorkflowStatus,
    pub visibility: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    pub created_by: UserId,
    /// 1-based pointer into the template steps
    pub current_step: u32,
    /// Step count of the template when this workflow started
    pub total_steps: u32,
    /// 0..=100
    pub progress_percentage: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_template_id: Option<StatusTemplateId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_status: Option<StatusItemId>,
    /// Incremented on every committed change
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Workflow {
    /// Create a workflow positioned at step 1, in progress, with zero progress
    pub fn new(
        template_id: TemplateId,
        title: impl Into<String>,
        created_by: UserId,
        total_steps: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: WorkflowId::generate(),
            template_id,
            title: title.into(),
            description: String::new(),
            priority: Priority::default(),
            status: WorkflowStatus::InProgress,
            visibility: Visibility::default(),
            deadline: None,
            team_id: None,
            created_by,
            current_step: 1,
            total_steps,
            progress_percentage: 0,
            status_template_id: None,
            custom_status: None,
            revision: 0,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_team(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }

    pub fn is_final_step(&self) -> bool {
        self.current_step >= self.total_steps
    }

    /// Move the pointer to the next step and recompute progress
    pub fn advance_pointer(&mut self) {
        self.current_step = (self.current_step + 1).min(self.total_steps);
        self.progress_percentage = progress_for(self.current_step, self.total_steps);
    }

    /// Set lifecycle status; completion forces progress to 100
    pub fn set_status(&mut self, status: WorkflowStatus, now: DateTime<Utc>) {
        self.status = status;
        match status {
            WorkflowStatus::Completed => {
                self.progress_percentage = 100;
                self.completed_at = Some(now);
            }
            WorkflowStatus::InProgress | WorkflowStatus::Paused => {
                self.completed_at = None;
            }
            WorkflowStatus::Canceled | WorkflowStatus::Archived => {}
        }
    }

    /// Stamp a change about to be committed
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.revision += 1;
    }
}

/// `floor(step / total * 100)`, clamped to 0..=100
pub fn progress_for(step: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    ((u64::from(step) * 100) / u64::from(total)).min(100) as u8
}
