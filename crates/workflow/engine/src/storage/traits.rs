//! Storage trait definitions
//!
//! Reads are point queries returning plain collections. The only write
//! path is [`CommitStorage::commit`], which applies a whole
//! [`UnitOfWork`] or nothing.

use super::unit_of_work::UnitOfWork;
use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;
use workflow_types::{
    Assignment, StatusTemplate, StatusTemplateId, TemplateId, Transition, UserId, Workflow,
    WorkflowError, WorkflowId, WorkflowTemplate,
};

/// Storage-specific errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// An expected revision did not match: someone else committed first
    #[error("Revision conflict on workflow {workflow_id}: expected {expected:?}, found {found:?}")]
    RevisionConflict {
        workflow_id: WorkflowId,
        expected: Option<u64>,
        found: Option<u64>,
    },

    /// A staged row references something that does not exist
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Backend unavailable
    #[error("Connection error: {0}")]
    Connection(String),
}

impl From<StorageError> for WorkflowError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::RevisionConflict { .. } => WorkflowError::Conflict(err.to_string()),
            StorageError::InvalidData(_) | StorageError::Connection(_) => {
                WorkflowError::Storage(err.to_string())
            }
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Combined storage trait
pub trait WorkflowStore:
    TemplateStorage + WorkflowStorage + AssignmentStorage + TransitionStorage + CommitStorage
{
}

/// Templates and status templates
#[async_trait]
pub trait TemplateStorage: Send + Sync {
    /// Get a template by ID
    async fn get_template(&self, id: &TemplateId) -> StorageResult<Option<WorkflowTemplate>>;

    /// List all templates
    async fn list_templates(&self) -> StorageResult<Vec<WorkflowTemplate>>;

    /// Whether any workflow references the template
    async fn template_in_use(&self, id: &TemplateId) -> StorageResult<bool>;

    /// Get a status template by ID
    async fn get_status_template(
        &self,
        id: &StatusTemplateId,
    ) -> StorageResult<Option<StatusTemplate>>;

    /// List all status templates
    async fn list_status_templates(&self) -> StorageResult<Vec<StatusTemplate>>;
}

/// Running workflow instances
#[async_trait]
pub trait WorkflowStorage: Send + Sync {
    /// Get a workflow by ID
    async fn get_workflow(&self, id: &WorkflowId) -> StorageResult<Option<Workflow>>;

    /// List all workflows, archived included
    async fn list_workflows(&self) -> StorageResult<Vec<Workflow>>;
}

/// Step assignments
#[async_trait]
pub trait AssignmentStorage: Send + Sync {
    /// All assignments of a workflow in creation order
    async fn assignments_for_workflow(&self, id: &WorkflowId) -> StorageResult<Vec<Assignment>>;

    /// In-progress assignments held by a user across all workflows
    async fn active_assignments_for_user(&self, user: &UserId) -> StorageResult<Vec<Assignment>>;

    /// Workflows on which the user holds or has held any assignment.
    ///
    /// Reassignment rewrites the holder in place, so former holders are
    /// recovered from the ledger's from/to users as well.
    async fn workflows_held_by(&self, user: &UserId) -> StorageResult<HashSet<WorkflowId>>;
}

/// The transition ledger
#[async_trait]
pub trait TransitionStorage: Send + Sync {
    /// Ledger of a workflow in sequence order
    async fn transitions_for_workflow(&self, id: &WorkflowId) -> StorageResult<Vec<Transition>>;
}

/// Atomic writes
#[async_trait]
pub trait CommitStorage: Send + Sync {
    /// Apply every staged row, or none if any expectation fails
    async fn commit(&self, unit: UnitOfWork) -> StorageResult<()>;
}
