//! In-memory storage implementation
//!
//! All tables sit behind one lock so a commit is observed entirely or
//! not at all.

use super::traits::*;
use super::unit_of_work::UnitOfWork;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use workflow_types::{
    Assignment, StatusTemplate, StatusTemplateId, TemplateId, Transition, UserId, Workflow,
    WorkflowId, WorkflowTemplate,
};

#[derive(Debug, Default)]
struct Tables {
    templates: HashMap<TemplateId, WorkflowTemplate>,
    status_templates: HashMap<StatusTemplateId, StatusTemplate>,
    workflows: HashMap<WorkflowId, Workflow>,
    /// Per workflow, in creation order
    assignments: HashMap<WorkflowId, Vec<Assignment>>,
    /// Per workflow, in sequence order
    transitions: HashMap<WorkflowId, Vec<Transition>>,
}

impl Tables {
    fn check(&self, unit: &UnitOfWork) -> StorageResult<()> {
        for expectation in &unit.expectations {
            let found = self
                .workflows
                .get(&expectation.workflow_id)
                .map(|w| w.revision);
            if found != expectation.revision {
                return Err(StorageError::RevisionConflict {
                    workflow_id: expectation.workflow_id.clone(),
                    expected: expectation.revision,
                    found,
                });
            }
        }

        let staged: HashSet<&WorkflowId> = unit.workflows.iter().map(|w| &w.id).collect();
        let known = |id: &WorkflowId| staged.contains(id) || self.workflows.contains_key(id);

        for workflow in &unit.workflows {
            if !self.templates.contains_key(&workflow.template_id)
                && !unit.templates.iter().any(|t| t.id == workflow.template_id)
            {
                return Err(StorageError::InvalidData(format!(
                    "workflow {} references unknown template {}",
                    workflow.id, workflow.template_id
                )));
            }
        }
        for assignment in &unit.assignments {
            if !known(&assignment.workflow_id) {
                return Err(StorageError::InvalidData(format!(
                    "assignment {} references unknown workflow {}",
                    assignment.id, assignment.workflow_id
                )));
            }
        }
        for transition in &unit.transitions {
            if !known(&transition.workflow_id) {
                return Err(StorageError::InvalidData(format!(
                    "transition {} references unknown workflow {}",
                    transition.id, transition.workflow_id
                )));
            }
        }
        Ok(())
    }

    fn apply(&mut self, unit: UnitOfWork) {
        for template in unit.templates {
            self.templates.insert(template.id.clone(), template);
        }
        for template in unit.status_templates {
            self.status_templates.insert(template.id.clone(), template);
        }
        for workflow in unit.workflows {
            self.workflows.insert(workflow.id.clone(), workflow);
        }
        for assignment in unit.assignments {
            let rows = self
                .assignments
                .entry(assignment.workflow_id.clone())
                .or_default();
            match rows.iter_mut().find(|a| a.id == assignment.id) {
                Some(existing) => *existing = assignment,
                None => rows.push(assignment),
            }
        }
        for mut transition in unit.transitions {
            let ledger = self
                .transitions
                .entry(transition.workflow_id.clone())
                .or_default();
            transition.sequence = ledger.len() as u64;
            ledger.push(transition);
        }
    }
}

/// In-memory storage for development and testing
#[derive(Debug, Default)]
pub struct InMemoryWorkflowStore {
    tables: RwLock<Tables>,
}

impl InMemoryWorkflowStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkflowStore for InMemoryWorkflowStore {}

#[async_trait]
impl TemplateStorage for InMemoryWorkflowStore {
    async fn get_template(&self, id: &TemplateId) -> StorageResult<Option<WorkflowTemplate>> {
        let tables = self.tables.read().await;
        Ok(tables.templates.get(id).cloned())
    }

    async fn list_templates(&self) -> StorageResult<Vec<WorkflowTemplate>> {
        let tables = self.tables.read().await;
        let mut templates: Vec<_> = tables.templates.values().cloned().collect();
        templates.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(templates)
    }

    async fn template_in_use(&self, id: &TemplateId) -> StorageResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.workflows.values().any(|w| &w.template_id == id))
    }

    async fn get_status_template(
        &self,
        id: &StatusTemplateId,
    ) -> StorageResult<Option<StatusTemplate>> {
        let tables = self.tables.read().await;
        Ok(tables.status_templates.get(id).cloned())
    }

    async fn list_status_templates(&self) -> StorageResult<Vec<StatusTemplate>> {
        let tables = self.tables.read().await;
        let mut templates: Vec<_> = tables.status_templates.values().cloned().collect();
        templates.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(templates)
    }
}

#[async_trait]
impl WorkflowStorage for InMemoryWorkflowStore {
    async fn get_workflow(&self, id: &WorkflowId) -> StorageResult<Option<Workflow>> {
        let tables = self.tables.read().await;
        Ok(tables.workflows.get(id).cloned())
    }

    async fn list_workflows(&self) -> StorageResult<Vec<Workflow>> {
        let tables = self.tables.read().await;
        Ok(tables.workflows.values().cloned().collect())
    }
}

#[async_trait]
impl AssignmentStorage for InMemoryWorkflowStore {
    async fn assignments_for_workflow(&self, id: &WorkflowId) -> StorageResult<Vec<Assignment>> {
        let tables = self.tables.read().await;
        Ok(tables.assignments.get(id).cloned().unwrap_or_default())
    }

    async fn active_assignments_for_user(&self, user: &UserId) -> StorageResult<Vec<Assignment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .assignments
            .values()
            .flatten()
            .filter(|a| &a.assigned_to == user && a.is_active())
            .cloned()
            .collect())
    }

    async fn workflows_held_by(&self, user: &UserId) -> StorageResult<HashSet<WorkflowId>> {
        let tables = self.tables.read().await;
        let current = tables
            .assignments
            .values()
            .flatten()
            .filter(|a| &a.assigned_to == user)
            .map(|a| a.workflow_id.clone());
        let historical = tables
            .transitions
            .values()
            .flatten()
            .filter(|t| t.from_user.as_ref() == Some(user) || t.to_user.as_ref() == Some(user))
            .map(|t| t.workflow_id.clone());
        Ok(current.chain(historical).collect())
    }
}

#[async_trait]
impl TransitionStorage for InMemoryWorkflowStore {
    async fn transitions_for_workflow(&self, id: &WorkflowId) -> StorageResult<Vec<Transition>> {
        let tables = self.tables.read().await;
        Ok(tables.transitions.get(id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl CommitStorage for InMemoryWorkflowStore {
    async fn commit(&self, unit: UnitOfWork) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        tables.check(&unit)?;
        tables.apply(unit);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn seeded_template() -> WorkflowTemplate {
        WorkflowTemplate::new("Tickets", UserId::new("owner"))
            .with_step("Triage", "")
            .with_step("Resolve", "")
    }

    async fn store_with_workflow() -> (InMemoryWorkflowStore, Workflow) {
        let store = InMemoryWorkflowStore::new();
        let template = seeded_template();
        let mut workflow = Workflow::new(template.id.clone(), "Ticket 7", UserId::new("ana"), 2);
        workflow.touch(Utc::now());

        let mut unit = UnitOfWork::new();
        unit.put_template(template)
            .expect_absent(workflow.id.clone())
            .put_workflow(workflow.clone())
            .put_assignment(Assignment::open(
                workflow.id.clone(),
                1,
                UserId::new("ana"),
                Utc::now(),
            ))
            .append_transition(Transition::creation(
                workflow.id.clone(),
                UserId::new("ana"),
                UserId::new("ana"),
                Utc::now(),
            ));
        store.commit(unit).await.unwrap();
        (store, workflow)
    }

    #[tokio::test]
    async fn test_commit_applies_everything() {
        let (store, workflow) = store_with_workflow().await;

        assert!(store.get_workflow(&workflow.id).await.unwrap().is_some());
        assert_eq!(store.assignments_for_workflow(&workflow.id).await.unwrap().len(), 1);
        assert_eq!(store.transitions_for_workflow(&workflow.id).await.unwrap().len(), 1);
        assert!(store.template_in_use(&workflow.template_id).await.unwrap());
        assert_eq!(
            store
                .active_assignments_for_user(&UserId::new("ana"))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_conflicting_commit_applies_nothing() {
        let (store, workflow) = store_with_workflow().await;

        let mut stale = workflow.clone();
        stale.title = "Renamed".into();
        stale.touch(Utc::now());

        let mut unit = UnitOfWork::new();
        unit.expect_revision(workflow.id.clone(), 0)
            .put_workflow(stale)
            .append_transition(Transition::status_change(
                workflow.id.clone(),
                1,
                workflow.status,
                workflow.status,
                UserId::new("ana"),
                Utc::now(),
            ));

        let result = store.commit(unit).await;
        assert!(matches!(result, Err(StorageError::RevisionConflict { .. })));

        let stored = store.get_workflow(&workflow.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Ticket 7");
        assert_eq!(store.transitions_for_workflow(&workflow.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_creation_twice_conflicts() {
        let (store, workflow) = store_with_workflow().await;
        let mut unit = UnitOfWork::new();
        unit.expect_absent(workflow.id.clone()).put_workflow(workflow);
        assert!(store.commit(unit).await.is_err());
    }

    #[tokio::test]
    async fn test_orphan_rows_rejected() {
        let store = InMemoryWorkflowStore::new();
        let mut unit = UnitOfWork::new();
        unit.put_assignment(Assignment::open(
            WorkflowId::new("ghost"),
            1,
            UserId::new("ana"),
            Utc::now(),
        ));
        assert!(matches!(
            store.commit(unit).await,
            Err(StorageError::InvalidData(_))
        ));
    }

    #[tokio::test]
    async fn test_transition_sequence_and_assignment_upsert() {
        let (store, workflow) = store_with_workflow().await;
        let mut assignment = store.assignments_for_workflow(&workflow.id).await.unwrap()[0].clone();
        assignment.complete(Utc::now());

        let mut unit = UnitOfWork::new();
        unit.put_assignment(assignment).append_transition(Transition::status_change(
            workflow.id.clone(),
            1,
            workflow.status,
            workflow.status,
            UserId::new("ana"),
            Utc::now(),
        ));
        store.commit(unit).await.unwrap();

        let assignments = store.assignments_for_workflow(&workflow.id).await.unwrap();
        assert_eq!(assignments.len(), 1);
        assert!(assignments[0].is_completed());

        let ledger = store.transitions_for_workflow(&workflow.id).await.unwrap();
        let sequences: Vec<u64> = ledger.iter().map(|t| t.sequence).collect();
        assert_eq!(sequences, vec![0, 1]);

        let held = store.workflows_held_by(&UserId::new("ana")).await.unwrap();
        assert!(held.contains(&workflow.id));
    }
}
