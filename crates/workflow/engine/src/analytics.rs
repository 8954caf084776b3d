//! Deadline and workload analytics
//!
//! Everything here is derived on read and never stored.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use workflow_types::{UserId, Workflow, WorkflowStatus};

const MILLIS_PER_DAY: i64 = 86_400_000;

// ── Deadlines ────────────────────────────────────────────────────────

/// Derived deadline fields of a workflow
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineSignals {
    pub overdue: bool,
    pub near_deadline: bool,
    /// Whole days until the deadline, negative once it has passed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
}

/// Signed day count from `now` to `deadline`.
///
/// Time left rounds up to whole days. Time overdue counts completed days,
/// but never less than one, so any passed deadline reads as negative.
pub fn days_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (deadline - now).num_milliseconds();
    if millis < 0 {
        return (millis / MILLIS_PER_DAY).min(-1);
    }
    let days = millis / MILLIS_PER_DAY;
    if millis % MILLIS_PER_DAY > 0 {
        days + 1
    } else {
        days
    }
}

/// Compute deadline signals at `now`.
///
/// Only workflows still being worked on (in progress or paused) can be
/// overdue or near their deadline; `days_remaining` is reported regardless.
pub fn deadline_signals(
    workflow: &Workflow,
    now: DateTime<Utc>,
    near_deadline_days: i64,
) -> DeadlineSignals {
    let Some(deadline) = workflow.deadline else {
        return DeadlineSignals::default();
    };

    let open = matches!(
        workflow.status,
        WorkflowStatus::InProgress | WorkflowStatus::Paused
    );
    let overdue = open && deadline < now;
    let near_deadline =
        open && !overdue && deadline - now <= Duration::days(near_deadline_days);

    DeadlineSignals {
        overdue,
        near_deadline,
        days_remaining: Some(days_until(deadline, now)),
    }
}

// ── Workload ─────────────────────────────────────────────────────────

/// Active assignment load of one user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWorkload {
    pub user_id: UserId,
    pub active_assignments: usize,
    /// Capped at 100
    pub workload_percentage: u8,
    /// Uses the uncapped count
    pub overloaded: bool,
}

/// Workload for `active` in-progress assignments against `threshold`
pub fn workload(user_id: UserId, active: usize, threshold: u32) -> UserWorkload {
    let threshold = threshold as usize;
    let workload_percentage = if threshold == 0 {
        if active > 0 {
            100
        } else {
            0
        }
    } else {
        (active.saturating_mul(100) / threshold).min(100) as u8
    };

    UserWorkload {
        user_id,
        active_assignments: active,
        workload_percentage,
        overloaded: active > threshold,
    }
}

// ── Stats ────────────────────────────────────────────────────────────

/// Aggregate counts over a set of workflows
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStats {
    pub total: usize,
    pub by_status: BTreeMap<WorkflowStatus, usize>,
    pub overdue: usize,
    pub near_deadline: usize,
    /// Mean progress of in-progress workflows, 0 when there are none
    pub average_progress: f64,
}

impl WorkflowStats {
    pub fn collect<'a>(
        workflows: impl IntoIterator<Item = &'a Workflow>,
        now: DateTime<Utc>,
        near_deadline_days: i64,
    ) -> Self {
        let mut stats = WorkflowStats {
            by_status: WorkflowStatus::ALL.iter().map(|s| (*s, 0)).collect(),
            ..Default::default()
        };
        let mut progress_sum = 0u64;
        let mut in_progress = 0u64;

        for workflow in workflows {
            stats.total += 1;
            *stats.by_status.entry(workflow.status).or_default() += 1;

            let signals = deadline_signals(workflow, now, near_deadline_days);
            if signals.overdue {
                stats.overdue += 1;
            }
            if signals.near_deadline {
                stats.near_deadline += 1;
            }
            if workflow.status == WorkflowStatus::InProgress {
                in_progress += 1;
                progress_sum += u64::from(workflow.progress_percentage);
            }
        }

        if in_progress > 0 {
            stats.average_progress = progress_sum as f64 / in_progress as f64;
        }
        stats
    }
}
