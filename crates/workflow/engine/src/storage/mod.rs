//! Storage layer for the workflow engine
//!
//! Any backend works as long as `commit` is atomic and reads are
//! consistent at a point in time.

mod memory;
mod traits;
mod unit_of_work;

pub use memory::InMemoryWorkflowStore;
pub use traits::{
    AssignmentStorage, CommitStorage, StorageError, StorageResult, TemplateStorage,
    TransitionStorage, WorkflowStorage, WorkflowStore,
};
pub use unit_of_work::{RevisionExpectation, UnitOfWork};
