//! Request and response records exchanged with the orchestrator

use crate::analytics::DeadlineSignals;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use workflow_types::{
    Priority, StatusTemplateId, TeamId, TemplateId, UserId, Visibility, Workflow, WorkflowStatus,
};

/// Input for starting a workflow
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewWorkflow {
    pub template_id: TemplateId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub team_id: Option<TeamId>,
    /// Holder of step 1; the creator when absent
    #[serde(default)]
    pub assignee: Option<UserId>,
    #[serde(default)]
    pub status_template_id: Option<StatusTemplateId>,
}

impl NewWorkflow {
    pub fn new(template_id: TemplateId, title: impl Into<String>) -> Self {
        Self {
            template_id,
            title: title.into(),
            description: String::new(),
            priority: Priority::default(),
            visibility: Visibility::default(),
            deadline: None,
            team_id: None,
            assignee: None,
            status_template_id: None,
        }
    }

    pub fn assigned_to(mut self, assignee: UserId) -> Self {
        self.assignee = Some(assignee);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_team(mut self, team: TeamId) -> Self {
        self.team_id = Some(team);
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status_template(mut self, id: StatusTemplateId) -> Self {
        self.status_template_id = Some(id);
        self
    }
}

/// A workflow plus the fields derived from its template, holder and deadline
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowView {
    #[serde(flatten)]
    pub workflow: Workflow,
    pub template_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step_name: Option<String>,
    /// Holder of the active assignment for the current step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_assignee: Option<UserId>,
    #[serde(flatten)]
    pub deadline: DeadlineSignals,
}

impl WorkflowView {
    pub fn total_steps(&self) -> u32 {
        self.workflow.total_steps
    }
}

/// Listing filters; every field narrows the result
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowFilter {
    pub status: Option<WorkflowStatus>,
    pub team: Option<TeamId>,
    /// Current-step holder
    pub assignee: Option<UserId>,
    pub visibility: Option<Visibility>,
    pub template_id: Option<TemplateId>,
    pub created_by: Option<UserId>,
    pub overdue_only: bool,
    pub include_archived: bool,
}

impl WorkflowFilter {
    pub fn matches(&self, view: &WorkflowView) -> bool {
        let wf = &view.workflow;

        if wf.status == WorkflowStatus::Archived
            && !self.include_archived
            && self.status != Some(WorkflowStatus::Archived)
        {
            return false;
        }
        if self.status.is_some_and(|s| s != wf.status) {
            return false;
        }
        if self.team.as_ref().is_some_and(|t| wf.team_id.as_ref() != Some(t)) {
            return false;
        }
        if self
            .assignee
            .as_ref()
            .is_some_and(|a| view.current_assignee.as_ref() != Some(a))
        {
            return false;
        }
        if self.visibility.is_some_and(|v| v != wf.visibility) {
            return false;
        }
        if self.template_id.as_ref().is_some_and(|t| &wf.template_id != t) {
            return false;
        }
        if self.created_by.as_ref().is_some_and(|c| &wf.created_by != c) {
            return false;
        }
        !self.overdue_only || view.deadline.overdue
    }
}
