//! Invariants that must hold under any sequence of orchestrator calls

use proptest::prelude::*;
use std::sync::Arc;
use workflow_engine::analytics::workload;
use workflow_engine::*;
use workflow_types::*;

const USERS: [&str; 3] = ["u1", "u2", "u3"];

#[derive(Clone, Debug)]
enum Op {
    Advance(Option<usize>),
    Assign(u32, usize),
    Complete(u32),
    Status(usize),
    Archive,
    Restore,
}

fn op_strategy() -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(
        prop_oneof![
            proptest::option::of(0..USERS.len()).prop_map(Op::Advance),
            (1u32..5, 0..USERS.len()).prop_map(|(step, user)| Op::Assign(step, user)),
            (1u32..5).prop_map(Op::Complete),
            (0..WorkflowStatus::ALL.len()).prop_map(Op::Status),
            Just(Op::Archive),
            Just(Op::Restore),
        ],
        0..40,
    )
}

proptest! {
    #[test]
    fn property_step_pointer_and_single_holder(steps in 1usize..5, ops in op_strategy()) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");

        rt.block_on(async move {
            let store = Arc::new(InMemoryWorkflowStore::new());
            let directory = Arc::new(InMemoryDirectory::with_users(
                USERS
                    .iter()
                    .map(|id| User::new(*id, *id))
                    .chain([User::new("boss", "Boss").with_role(Role::Admin)]),
            ));
            let catalog = TemplateCatalog::new(store.clone(), directory.clone());
            let orchestrator = WorkflowOrchestrator::new(
                store,
                directory,
                Arc::new(InMemoryNotifier::new()),
                EngineConfig::default(),
            );
            let boss = UserId::new("boss");

            let mut input = NewTemplate::new("Prop");
            for n in 0..steps {
                input = input.step(format!("S{}", n + 1));
            }
            let template = catalog.create_template(input, &boss).await.expect("template");
            let wf = orchestrator
                .create_workflow(
                    NewWorkflow::new(template.id, "P").assigned_to(UserId::new(USERS[0])),
                    &boss,
                )
                .await
                .expect("workflow");

            for op in ops {
                let result = match op {
                    Op::Advance(next) => {
                        let next = next.map(|i| UserId::new(USERS[i]));
                        orchestrator.advance_to_next_step(&wf.id, next, "", &boss).await
                    }
                    Op::Assign(step, user) => {
                        orchestrator
                            .assign_step(&wf.id, step, &UserId::new(USERS[user]), "", &boss)
                            .await
                    }
                    Op::Complete(step) => orchestrator.complete_step(&wf.id, step, "", &boss).await,
                    Op::Status(i) => {
                        orchestrator
                            .update_workflow_status(&wf.id, WorkflowStatus::ALL[i], "", &boss)
                            .await
                    }
                    Op::Archive => orchestrator.archive_workflow(&wf.id, "", &boss).await,
                    Op::Restore => orchestrator.restore_workflow(&wf.id, "", &boss).await,
                };
                if let Err(e) = &result {
                    assert!(e.is_user_error(), "server-side failure: {e}");
                }

                let view = orchestrator.get_workflow(&wf.id, &boss).await.expect("view");
                let current = &view.workflow;
                assert!(current.current_step >= 1);
                assert!(current.current_step <= current.total_steps);
                assert_eq!(current.total_steps as usize, steps);
                if current.status == WorkflowStatus::Completed {
                    assert_eq!(current.progress_percentage, 100);
                }

                let assignments = orchestrator.get_assignments(&wf.id, &boss).await.expect("assignments");
                let active: Vec<_> = assignments.iter().filter(|a| a.is_active()).collect();
                assert!(active.len() <= 1, "more than one active assignment");
                for a in &active {
                    assert_eq!(a.step_number, current.current_step);
                }
                if current.status == WorkflowStatus::InProgress {
                    assert!(latest_for_step(&assignments, current.current_step).is_some());
                }

                let ledger = orchestrator.get_transitions(&wf.id, &boss).await.expect("ledger");
                for (i, t) in ledger.iter().enumerate() {
                    assert_eq!(t.sequence, i as u64);
                }
            }
        });
    }

    #[test]
    fn property_workload_monotonic_and_capped(a in 0usize..40, b in 0usize..40, threshold in 1u32..20) {
        let (low, high) = (a.min(b), a.max(b));
        let low_load = workload(UserId::new("u"), low, threshold);
        let high_load = workload(UserId::new("u"), high, threshold);

        prop_assert!(low_load.workload_percentage <= high_load.workload_percentage);
        prop_assert!(high_load.workload_percentage <= 100);
        prop_assert_eq!(high_load.overloaded, high > threshold as usize);
        prop_assert_eq!(low_load.overloaded, low > threshold as usize);
    }
}
