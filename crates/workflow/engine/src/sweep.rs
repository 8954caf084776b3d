//! Deadline sweep: periodic reminders for workflows near or past due
//!
//! The sweep reads existing notifications before writing new ones, so two
//! overlapping runs could both decide a reminder is missing. A run-lock
//! makes a second concurrent run return immediately instead.

use crate::analytics::days_until;
use crate::notifier::NotificationSink;
use crate::storage::WorkflowStore;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use workflow_types::{
    latest_for_step, Notification, NotificationType, UserId, Workflow, WorkflowResult,
    WorkflowStatus,
};

/// Counters from one sweep pass
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// In-progress workflows inside the deadline window
    pub examined: usize,
    pub notified: usize,
    /// Recipients already reminded today
    pub skipped_duplicate: usize,
    pub failed: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SweepOutcome {
    Completed(SweepReport),
    /// Another sweep held the run-lock
    Skipped,
}

/// Scans in-progress workflows and reminds creator and holder of deadlines
pub struct DeadlineSweep {
    store: Arc<dyn WorkflowStore>,
    notifier: Arc<dyn NotificationSink>,
    /// Deadlines at most this many days ahead are reminded
    window_days: i64,
    run_lock: Mutex<()>,
}

impl DeadlineSweep {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        notifier: Arc<dyn NotificationSink>,
        window_days: i64,
    ) -> Self {
        Self {
            store,
            notifier,
            window_days,
            run_lock: Mutex::new(()),
        }
    }

    pub async fn run(&self) -> WorkflowResult<SweepOutcome> {
        self.run_at(Utc::now()).await
    }

    /// Run one pass as of `now`
    pub async fn run_at(&self, now: DateTime<Utc>) -> WorkflowResult<SweepOutcome> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            tracing::info!("Deadline sweep already running, skipping");
            return Ok(SweepOutcome::Skipped);
        };

        let day_start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let horizon = now + Duration::days(self.window_days);
        let mut report = SweepReport::default();

        for workflow in self.store.list_workflows().await? {
            if workflow.status != WorkflowStatus::InProgress {
                continue;
            }
            let Some(deadline) = workflow.deadline else {
                continue;
            };
            if deadline > horizon {
                continue;
            }
            report.examined += 1;

            for recipient in self.recipients(&workflow).await? {
                match self
                    .notifier
                    .sent_since(&workflow.id, &recipient, NotificationType::Deadline, day_start)
                    .await
                {
                    Ok(true) => {
                        report.skipped_duplicate += 1;
                        continue;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!(
                            workflow_id = %workflow.id,
                            user_id = %recipient,
                            error = %e,
                            "Deadline dedup check failed"
                        );
                        report.failed += 1;
                        continue;
                    }
                }

                let notice = deadline_notice(&workflow, deadline, recipient.clone(), now);
                match self.notifier.notify(notice).await {
                    Ok(()) => report.notified += 1,
                    Err(e) => {
                        tracing::warn!(
                            workflow_id = %workflow.id,
                            user_id = %recipient,
                            error = %e,
                            "Deadline notification dropped"
                        );
                        report.failed += 1;
                    }
                }
            }
        }

        tracing::info!(
            examined = report.examined,
            notified = report.notified,
            skipped_duplicate = report.skipped_duplicate,
            failed = report.failed,
            "Deadline sweep finished"
        );
        Ok(SweepOutcome::Completed(report))
    }

    /// Creator and the current step's latest holder, once each
    async fn recipients(&self, workflow: &Workflow) -> WorkflowResult<Vec<UserId>> {
        let assignments = self.store.assignments_for_workflow(&workflow.id).await?;
        let mut recipients = vec![workflow.created_by.clone()];
        if let Some(holder) = latest_for_step(&assignments, workflow.current_step) {
            if holder.assigned_to != workflow.created_by {
                recipients.push(holder.assigned_to.clone());
            }
        }
        Ok(recipients)
    }
}

fn deadline_notice(
    workflow: &Workflow,
    deadline: DateTime<Utc>,
    recipient: UserId,
    now: DateTime<Utc>,
) -> Notification {
    let days = days_until(deadline, now);
    let (title, message) = if deadline < now {
        (
            "Deadline passed",
            format!("'{}' is {} day(s) overdue", workflow.title, -days),
        )
    } else {
        (
            "Deadline approaching",
            format!("'{}' is due in {} day(s)", workflow.title, days),
        )
    };
    Notification::new(
        workflow.id.clone(),
        recipient,
        NotificationType::Deadline,
        title,
        message,
    )
    .at(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{NewTemplate, TemplateCatalog};
    use crate::directory::InMemoryDirectory;
    use crate::notifier::InMemoryNotifier;
    use crate::storage::InMemoryWorkflowStore;
    use crate::view::NewWorkflow;
    use crate::{EngineConfig, WorkflowOrchestrator};
    use chrono::TimeZone;
    use workflow_types::User;

    struct Fixture {
        orchestrator: WorkflowOrchestrator,
        sweep: DeadlineSweep,
        notifier: Arc<InMemoryNotifier>,
        template_id: workflow_types::TemplateId,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryWorkflowStore::new());
        let directory = Arc::new(InMemoryDirectory::with_users([
            User::new("ana", "Ana"),
            User::new("bruno", "Bruno"),
        ]));
        let notifier = Arc::new(InMemoryNotifier::new());
        let catalog = TemplateCatalog::new(store.clone(), directory.clone());
        let template_id = catalog
            .create_template(
                NewTemplate::new("Claims").step("Intake").step("Pay"),
                &UserId::new("ana"),
            )
            .await
            .unwrap()
            .id;

        Fixture {
            orchestrator: WorkflowOrchestrator::new(
                store.clone(),
                directory,
                notifier.clone(),
                EngineConfig::default(),
            ),
            sweep: DeadlineSweep::new(store, notifier.clone(), 3),
            notifier,
            template_id,
        }
    }

    async fn start(f: &Fixture, title: &str, deadline: DateTime<Utc>, assignee: &str) {
        f.orchestrator
            .create_workflow(
                NewWorkflow::new(f.template_id.clone(), title)
                    .with_deadline(deadline)
                    .assigned_to(UserId::new(assignee)),
                &UserId::new("ana"),
            )
            .await
            .unwrap();
    }

    fn deadline_notices(all: Vec<Notification>) -> Vec<Notification> {
        all.into_iter()
            .filter(|n| n.notification_type == NotificationType::Deadline)
            .collect()
    }

    #[tokio::test]
    async fn test_notifies_creator_and_holder_once_per_day() {
        let f = fixture().await;
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        start(&f, "Late", now - Duration::days(1), "bruno").await;
        start(&f, "Soon", now + Duration::days(2), "ana").await;
        start(&f, "Far", now + Duration::days(10), "bruno").await;

        let first = f.sweep.run_at(now).await.unwrap();
        assert_eq!(
            first,
            SweepOutcome::Completed(SweepReport {
                examined: 2,
                notified: 3,
                skipped_duplicate: 0,
                failed: 0,
            })
        );

        let later_same_day = f.sweep.run_at(now + Duration::hours(5)).await.unwrap();
        let SweepOutcome::Completed(report) = later_same_day else {
            panic!("sweep should not be skipped");
        };
        assert_eq!(report.notified, 0);
        assert_eq!(report.skipped_duplicate, 3);

        let next_day = f.sweep.run_at(now + Duration::days(1)).await.unwrap();
        let SweepOutcome::Completed(report) = next_day else {
            panic!("sweep should not be skipped");
        };
        assert_eq!(report.notified, 3);

        assert_eq!(deadline_notices(f.notifier.all().await).len(), 6);
    }

    #[tokio::test]
    async fn test_overdue_message() {
        let f = fixture().await;
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        start(&f, "Late", now - Duration::days(2), "ana").await;

        f.sweep.run_at(now).await.unwrap();
        let notices = deadline_notices(f.notifier.all().await);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "Deadline passed");
        assert!(notices[0].message.contains("2 day(s) overdue"));
    }

    #[tokio::test]
    async fn test_holder_still_reminded_after_finishing_step() {
        let f = fixture().await;
        let now = Utc::now();
        start(&f, "Late", now - Duration::days(1), "bruno").await;
        let wf = f
            .orchestrator
            .list_workflows(&UserId::new("ana"), &Default::default())
            .await
            .unwrap()
            .remove(0)
            .workflow;
        f.orchestrator
            .complete_step(&wf.id, 1, "done", &UserId::new("bruno"))
            .await
            .unwrap();

        f.sweep.run_at(now).await.unwrap();
        let mut recipients: Vec<String> = deadline_notices(f.notifier.all().await)
            .into_iter()
            .map(|n| n.user_id.to_string())
            .collect();
        recipients.sort();
        assert_eq!(recipients, vec!["ana".to_string(), "bruno".to_string()]);
    }

    #[tokio::test]
    async fn test_paused_workflows_ignored() {
        let f = fixture().await;
        let now = Utc::now();
        start(&f, "Late", now - Duration::days(1), "ana").await;
        let wf = f
            .orchestrator
            .list_workflows(&UserId::new("ana"), &Default::default())
            .await
            .unwrap()
            .remove(0)
            .workflow;
        f.orchestrator
            .update_workflow_status(&wf.id, WorkflowStatus::Paused, "", &UserId::new("ana"))
            .await
            .unwrap();

        let outcome = f.sweep.run_at(now).await.unwrap();
        assert_eq!(outcome, SweepOutcome::Completed(SweepReport::default()));
    }

    #[tokio::test]
    async fn test_overlapping_run_skipped() {
        let f = fixture().await;
        let _held = f.sweep.run_lock.try_lock().unwrap();
        assert_eq!(f.sweep.run().await.unwrap(), SweepOutcome::Skipped);
    }
}
