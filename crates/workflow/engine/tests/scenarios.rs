//! End-to-end behaviour of the orchestrator over the in-memory stack

use chrono::{Duration, Utc};
use std::sync::Arc;
use workflow_engine::*;
use workflow_types::*;

struct Harness {
    orchestrator: WorkflowOrchestrator,
    catalog: TemplateCatalog,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryWorkflowStore::new());
    let directory = Arc::new(InMemoryDirectory::with_users([
        User::new("a", "Alice").in_team("ops"),
        User::new("b", "Bruno").in_team("ops"),
        User::new("c", "Carla"),
        User::new("x", "Xavier"),
    ]));
    Harness {
        catalog: TemplateCatalog::new(store.clone(), directory.clone()),
        orchestrator: WorkflowOrchestrator::new(
            store,
            directory,
            Arc::new(InMemoryNotifier::new()),
            EngineConfig::default(),
        ),
    }
}

fn user(id: &str) -> UserId {
    UserId::new(id)
}

async fn three_step_template(h: &Harness) -> TemplateId {
    h.catalog
        .create_template(
            NewTemplate::new("Onboarding")
                .step("Collect documents")
                .step("Review")
                .step("Sign off"),
            &user("a"),
        )
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn three_step_workflow_runs_to_completion() {
    let h = harness();
    let template_id = three_step_template(&h).await;
    let a = user("a");

    let wf = h
        .orchestrator
        .create_workflow(NewWorkflow::new(template_id, "New hire"), &a)
        .await
        .unwrap();

    let wf = h
        .orchestrator
        .advance_to_next_step(&wf.id, Some(user("b")), "docs in", &a)
        .await
        .unwrap();
    assert_eq!(wf.current_step, 2);
    assert_eq!(wf.progress_percentage, 66);

    let wf = h
        .orchestrator
        .advance_to_next_step(&wf.id, Some(user("c")), "reviewed", &user("b"))
        .await
        .unwrap();
    assert_eq!(wf.current_step, 3);

    let wf = h
        .orchestrator
        .advance_to_next_step(&wf.id, None, "signed", &user("c"))
        .await
        .unwrap();
    assert_eq!(wf.status, WorkflowStatus::Completed);
    assert_eq!(wf.progress_percentage, 100);
    assert_eq!(wf.current_step, 3);

    let assignments = h.orchestrator.get_assignments(&wf.id, &a).await.unwrap();
    assert_eq!(assignments.len(), 3);
    assert!(assignments.iter().all(Assignment::is_completed));
    let holders: Vec<_> = assignments.iter().map(|x| x.assigned_to.clone()).collect();
    assert_eq!(holders, vec![user("a"), user("b"), user("c")]);

    let ledger = h.orchestrator.get_transitions(&wf.id, &a).await.unwrap();
    let kinds: Vec<_> = ledger.iter().map(|t| t.transition_type).collect();
    assert_eq!(
        kinds,
        vec![
            TransitionType::Creation,
            TransitionType::StepChange,
            TransitionType::StepChange,
            TransitionType::StatusChange,
        ]
    );
    let last = ledger.last().unwrap();
    assert_eq!(last.from_status, Some(WorkflowStatus::InProgress));
    assert_eq!(last.to_status, Some(WorkflowStatus::Completed));
    assert_eq!(last.to_user, None);
}

#[tokio::test]
async fn advancing_a_completed_workflow_is_rejected() {
    let h = harness();
    let template_id = h
        .catalog
        .create_template(NewTemplate::new("One").step("Only"), &user("a"))
        .await
        .unwrap()
        .id;
    let wf = h
        .orchestrator
        .create_workflow(NewWorkflow::new(template_id, "Single"), &user("a"))
        .await
        .unwrap();
    h.orchestrator
        .advance_to_next_step(&wf.id, None, "", &user("a"))
        .await
        .unwrap();

    let again = h
        .orchestrator
        .advance_to_next_step(&wf.id, None, "", &user("a"))
        .await;
    assert!(matches!(
        again,
        Err(WorkflowError::InvalidStateTransition { .. })
    ));
}

#[tokio::test]
async fn assigning_to_current_holder_is_a_noop() {
    let h = harness();
    let template_id = three_step_template(&h).await;
    let wf = h
        .orchestrator
        .create_workflow(
            NewWorkflow::new(template_id, "Hire").assigned_to(user("b")),
            &user("a"),
        )
        .await
        .unwrap();

    let before = h.orchestrator.get_transitions(&wf.id, &user("a")).await.unwrap();
    let same = h
        .orchestrator
        .assign_step(&wf.id, 1, &user("b"), "", &user("a"))
        .await
        .unwrap();
    let after = h.orchestrator.get_transitions(&wf.id, &user("a")).await.unwrap();

    assert_eq!(before.len(), after.len());
    assert_eq!(same.revision, wf.revision);
}

#[tokio::test]
async fn overdue_deadline_is_reported() {
    let h = harness();
    let template_id = three_step_template(&h).await;
    let wf = h
        .orchestrator
        .create_workflow(
            NewWorkflow::new(template_id, "Late").with_deadline(Utc::now() - Duration::days(2)),
            &user("a"),
        )
        .await
        .unwrap();

    let view = h.orchestrator.get_workflow(&wf.id, &user("a")).await.unwrap();
    assert!(view.deadline.overdue);
    assert!(!view.deadline.near_deadline);
    assert_eq!(view.deadline.days_remaining, Some(-2));

    let overdue = h
        .orchestrator
        .list_workflows(
            &user("a"),
            &WorkflowFilter {
                overdue_only: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(overdue.len(), 1);

    let stats = h.orchestrator.get_stats(&user("a")).await.unwrap();
    assert_eq!(stats.overdue, 1);
}

#[tokio::test]
async fn repeated_status_update_is_idempotent() {
    let h = harness();
    let template_id = three_step_template(&h).await;
    let a = user("a");
    let wf = h
        .orchestrator
        .create_workflow(NewWorkflow::new(template_id, "Hire"), &a)
        .await
        .unwrap();

    let first = h
        .orchestrator
        .update_workflow_status(&wf.id, WorkflowStatus::Paused, "hold", &a)
        .await
        .unwrap();
    let second = h
        .orchestrator
        .update_workflow_status(&wf.id, WorkflowStatus::Paused, "hold", &a)
        .await
        .unwrap();

    assert_eq!(first.revision, second.revision);
    assert_eq!(second.status, WorkflowStatus::Paused);
    let ledger = h.orchestrator.get_transitions(&wf.id, &a).await.unwrap();
    assert_eq!(ledger.len(), 2);
}

#[tokio::test]
async fn unknown_status_string_is_invalid_status() {
    let parsed = "finished".parse::<WorkflowStatus>();
    assert!(matches!(parsed, Err(WorkflowError::InvalidStatus(_))));
}

#[tokio::test]
async fn restore_returns_pre_archive_status() {
    let h = harness();
    let template_id = three_step_template(&h).await;
    let a = user("a");

    for terminal in [WorkflowStatus::Completed, WorkflowStatus::Canceled] {
        let wf = h
            .orchestrator
            .create_workflow(NewWorkflow::new(template_id.clone(), "Hire"), &a)
            .await
            .unwrap();
        h.orchestrator
            .update_workflow_status(&wf.id, terminal, "", &a)
            .await
            .unwrap();
        let archived = h.orchestrator.archive_workflow(&wf.id, "", &a).await.unwrap();
        assert_eq!(archived.status, WorkflowStatus::Archived);

        let restored = h.orchestrator.restore_workflow(&wf.id, "", &a).await.unwrap();
        assert_eq!(restored.status, terminal);

        let ledger = h.orchestrator.get_transitions(&wf.id, &a).await.unwrap();
        let last = ledger.last().unwrap();
        assert_eq!(last.from_status, Some(WorkflowStatus::Archived));
        assert_eq!(last.to_status, Some(terminal));
    }
}

#[tokio::test]
async fn restore_after_status_archive_reopens_in_progress() {
    let h = harness();
    let template_id = three_step_template(&h).await;
    let a = user("a");
    let wf = h
        .orchestrator
        .create_workflow(
            NewWorkflow::new(template_id, "Hire").assigned_to(user("b")),
            &a,
        )
        .await
        .unwrap();

    h.orchestrator
        .update_workflow_status(&wf.id, WorkflowStatus::Archived, "", &a)
        .await
        .unwrap();
    let restored = h.orchestrator.restore_workflow(&wf.id, "", &a).await.unwrap();
    assert_eq!(restored.status, WorkflowStatus::InProgress);

    let view = h.orchestrator.get_workflow(&wf.id, &a).await.unwrap();
    assert_eq!(view.current_assignee, Some(user("b")));
    let active = h
        .orchestrator
        .get_assignments(&wf.id, &a)
        .await
        .unwrap()
        .into_iter()
        .filter(Assignment::is_active)
        .count();
    assert_eq!(active, 1);
}

#[tokio::test]
async fn restricted_workflow_visible_to_former_holder_only() {
    let h = harness();
    let template_id = three_step_template(&h).await;
    let a = user("a");
    let wf = h
        .orchestrator
        .create_workflow(
            NewWorkflow::new(template_id, "Secret")
                .with_visibility(Visibility::Restricted)
                .assigned_to(user("b")),
            &a,
        )
        .await
        .unwrap();

    h.orchestrator
        .assign_step(&wf.id, 1, &user("c"), "", &a)
        .await
        .unwrap();

    assert!(h.orchestrator.get_workflow(&wf.id, &user("b")).await.is_ok());
    assert!(h.orchestrator.get_workflow(&wf.id, &user("c")).await.is_ok());
    assert!(matches!(
        h.orchestrator.get_workflow(&wf.id, &user("x")).await,
        Err(WorkflowError::NotFound { .. })
    ));

    let listed = h
        .orchestrator
        .list_workflows(&user("x"), &WorkflowFilter::default())
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn team_visibility_follows_membership() {
    let h = harness();
    let template_id = three_step_template(&h).await;
    h.orchestrator
        .create_workflow(
            NewWorkflow::new(template_id, "Ops task")
                .with_visibility(Visibility::Team)
                .with_team(TeamId::new("ops")),
            &user("a"),
        )
        .await
        .unwrap();

    let for_member = h
        .orchestrator
        .list_workflows(&user("b"), &WorkflowFilter::default())
        .await
        .unwrap();
    let for_outsider = h
        .orchestrator
        .list_workflows(&user("c"), &WorkflowFilter::default())
        .await
        .unwrap();
    assert_eq!(for_member.len(), 1);
    assert!(for_outsider.is_empty());
}

#[tokio::test]
async fn listing_is_newest_first_and_filters_by_assignee() {
    let h = harness();
    let template_id = three_step_template(&h).await;
    for (title, holder) in [("first", "b"), ("second", "c"), ("third", "b")] {
        h.orchestrator
            .create_workflow(
                NewWorkflow::new(template_id.clone(), title).assigned_to(user(holder)),
                &user("a"),
            )
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let mine = h
        .orchestrator
        .list_workflows(
            &user("a"),
            &WorkflowFilter {
                assignee: Some(user("b")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let titles: Vec<_> = mine.iter().map(|v| v.workflow.title.as_str()).collect();
    assert_eq!(titles, vec!["third", "first"]);
}
