//! Step assignments: who is responsible for a step of a workflow

use crate::{AssignmentId, UserId, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sub-status of an assignment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    #[default]
    InProgress,
    Completed,
    Pending,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::InProgress => "in_progress",
            AssignmentStatus::Completed => "completed",
            AssignmentStatus::Pending => "pending",
        }
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The holder of one step of one workflow
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub workflow_id: WorkflowId,
    pub step_number: u32,
    pub assigned_to: UserId,
    pub status: AssignmentStatus,
    pub start_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<DateTime<Utc>>,
}

impl Assignment {
    /// Open an in-progress assignment starting at `now`
    pub fn open(
        workflow_id: WorkflowId,
        step_number: u32,
        assigned_to: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AssignmentId::generate(),
            workflow_id,
            step_number,
            assigned_to,
            status: AssignmentStatus::InProgress,
            start_date: now,
            completion_date: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::InProgress
    }

    pub fn is_completed(&self) -> bool {
        self.status == AssignmentStatus::Completed
    }

    /// Close the assignment; keeps the first completion date
    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.status = AssignmentStatus::Completed;
        if self.completion_date.is_none() {
            self.completion_date = Some(now);
        }
    }
}

/// The active assignment for `step` among a workflow's assignments
pub fn active_for_step(assignments: &[Assignment], step: u32) -> Option<&Assignment> {
    assignments
        .iter()
        .find(|a| a.step_number == step && a.is_active())
}

/// Most recently started assignment for `step`, active or not
pub fn latest_for_step(assignments: &[Assignment], step: u32) -> Option<&Assignment> {
    assignments
        .iter()
        .filter(|a| a.step_number == step)
        .max_by_key(|a| a.start_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_complete() {
        let now = Utc::now();
        let mut a = Assignment::open(WorkflowId::new("w"), 1, UserId::new("ana"), now);
        assert!(a.is_active());
        assert!(a.completion_date.is_none());

        a.complete(now);
        assert!(a.is_completed());
        let first = a.completion_date;
        a.complete(now + chrono::Duration::hours(1));
        assert_eq!(a.completion_date, first);
    }

    #[test]
    fn test_step_lookups() {
        let now = Utc::now();
        let wf = WorkflowId::new("w");
        let mut first = Assignment::open(wf.clone(), 1, UserId::new("ana"), now);
        first.complete(now);
        let second = Assignment::open(
            wf.clone(),
            2,
            UserId::new("bruno"),
            now + chrono::Duration::seconds(1),
        );
        let list = vec![first.clone(), second.clone()];

        assert!(active_for_step(&list, 1).is_none());
        assert_eq!(active_for_step(&list, 2).unwrap().assigned_to, UserId::new("bruno"));
        assert_eq!(latest_for_step(&list, 1).unwrap().id, first.id);
        assert!(latest_for_step(&list, 3).is_none());
    }
}
