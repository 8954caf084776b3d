//! Unit of work: the staged effects of one orchestrator operation

use workflow_types::{
    Assignment, StatusTemplate, Transition, Workflow, WorkflowId, WorkflowTemplate,
};

/// Optimistic precondition on a workflow row
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevisionExpectation {
    pub workflow_id: WorkflowId,
    /// `None` means the workflow must not exist yet
    pub revision: Option<u64>,
}

/// Rows to write together
#[derive(Clone, Debug, Default)]
pub struct UnitOfWork {
    pub expectations: Vec<RevisionExpectation>,
    pub templates: Vec<WorkflowTemplate>,
    pub status_templates: Vec<StatusTemplate>,
    pub workflows: Vec<Workflow>,
    pub assignments: Vec<Assignment>,
    pub transitions: Vec<Transition>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the stored workflow to still be at `revision`
    pub fn expect_revision(&mut self, workflow_id: WorkflowId, revision: u64) -> &mut Self {
        self.expectations.push(RevisionExpectation {
            workflow_id,
            revision: Some(revision),
        });
        self
    }

    /// Require the workflow not to exist yet
    pub fn expect_absent(&mut self, workflow_id: WorkflowId) -> &mut Self {
        self.expectations.push(RevisionExpectation {
            workflow_id,
            revision: None,
        });
        self
    }

    pub fn put_template(&mut self, template: WorkflowTemplate) -> &mut Self {
        self.templates.push(template);
        self
    }

    pub fn put_status_template(&mut self, template: StatusTemplate) -> &mut Self {
        self.status_templates.push(template);
        self
    }

    pub fn put_workflow(&mut self, workflow: Workflow) -> &mut Self {
        self.workflows.push(workflow);
        self
    }

    pub fn put_assignment(&mut self, assignment: Assignment) -> &mut Self {
        self.assignments.push(assignment);
        self
    }

    pub fn append_transition(&mut self, transition: Transition) -> &mut Self {
        self.transitions.push(transition);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
            && self.status_templates.is_empty()
            && self.workflows.is_empty()
            && self.assignments.is_empty()
            && self.transitions.is_empty()
    }
}
