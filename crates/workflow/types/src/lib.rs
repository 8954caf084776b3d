//! Workflow domain types
//!
//! Plain data for the workflow orchestration engine:
//!
//! - [`WorkflowTemplate`]: ordered step definitions
//! - [`StatusTemplate`]: optional custom status vocabularies
//! - [`Workflow`]: a running instance with a step pointer and lifecycle status
//! - [`Assignment`]: who holds a step
//! - [`Transition`]: append-only audit ledger entries
//!
//! Status dimensions are closed enums; legality of lifecycle operations is
//! decided by [`WorkflowStatus::permits`].

#![deny(unsafe_code)]

pub mod assignment;
pub mod error;
pub mod identity;
pub mod ids;
pub mod instance;
pub mod notification;
pub mod status;
pub mod template;
pub mod transition;

pub use assignment::{active_for_step, latest_for_step, Assignment, AssignmentStatus};
pub use error::{WorkflowError, WorkflowResult};
pub use identity::{Role, User};
pub use ids::*;
pub use instance::{progress_for, LifecycleOperation, Priority, Workflow, WorkflowStatus};
pub use notification::{Notification, NotificationType};
pub use status::{StatusItem, StatusTemplate};
pub use template::{TemplateStep, Visibility, WorkflowTemplate};
pub use transition::{pre_archive_status, Transition, TransitionType};
