//! Error taxonomy for workflow operations
//!
//! Each variant carries a stable code so clients can tell validation
//! failures apart from server-side integrity faults.

use thiserror::Error;

/// Result type alias for workflow operations
pub type WorkflowResult<T> = std::result::Result<T, WorkflowError>;

/// Errors raised by the catalog, orchestrator and stores
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// A template, workflow, user, step or status item does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Operation is illegal for the current lifecycle status
    #[error("cannot {operation} a workflow in status '{status}'")]
    InvalidStateTransition {
        operation: &'static str,
        status: String,
    },

    /// Step number outside 1..=total
    #[error("step {step} is out of range (1..={total})")]
    InvalidStep { step: u32, total: u32 },

    /// Step exists but is not the current one
    #[error("step {requested} is not the current step ({current})")]
    NotCurrentStep { requested: u32, current: u32 },

    /// Expected active assignment is missing: a prior write was torn
    #[error("inconsistent workflow state: {0}")]
    InconsistentState(String),

    /// Template cannot start a workflow (no steps)
    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    /// Unknown lifecycle status value
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// Bad input
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Actor is not allowed to mutate this workflow
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Concurrent modification detected at commit time
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage backend failure
    #[error("storage error: {0}")]
    Storage(String),
}

impl WorkflowError {
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        WorkflowError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::NotFound { .. } => "NOT_FOUND",
            WorkflowError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            WorkflowError::InvalidStep { .. } => "INVALID_STEP",
            WorkflowError::NotCurrentStep { .. } => "NOT_CURRENT_STEP",
            WorkflowError::InconsistentState(_) => "INCONSISTENT_STATE",
            WorkflowError::InvalidTemplate(_) => "INVALID_TEMPLATE",
            WorkflowError::InvalidStatus(_) => "INVALID_STATUS",
            WorkflowError::ValidationError(_) => "VALIDATION_ERROR",
            WorkflowError::Forbidden(_) => "FORBIDDEN",
            WorkflowError::Conflict(_) => "CONFLICT",
            WorkflowError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Whether the caller can fix this by changing the request.
    ///
    /// `InconsistentState` and storage failures are server faults.
    pub fn is_user_error(&self) -> bool {
        !matches!(
            self,
            WorkflowError::InconsistentState(_) | WorkflowError::Storage(_)
        )
    }
}
