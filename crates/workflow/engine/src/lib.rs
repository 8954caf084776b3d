//! Workflow orchestration engine
//!
//! Moves workflow instances through the ordered steps of their templates,
//! tracks who holds each step and records every change in an append-only
//! ledger.
//!
//! # Architecture
//!
//! - [`WorkflowOrchestrator`]: the only writer of workflow state
//! - [`TemplateCatalog`]: authoring and lookup of workflow and status templates
//! - [`WorkflowStore`]: storage seam with an atomic [`UnitOfWork`] commit
//! - [`Directory`]: users, teams and roles
//! - [`NotificationSink`]: best-effort notification delivery
//! - [`DeadlineSweep`]: periodic deadline reminders behind a run-lock
//!
//! Visibility, deadline signals and workload are pure functions over
//! stored state; see [`visibility`] and [`analytics`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use workflow_engine::*;
//! use workflow_types::*;
//!
//! # tokio_test_block_on(async {
//! let store = Arc::new(InMemoryWorkflowStore::new());
//! let directory = Arc::new(InMemoryDirectory::with_users([
//!     User::new("ana", "Ana"),
//!     User::new("bruno", "Bruno"),
//! ]));
//! let catalog = TemplateCatalog::new(store.clone(), directory.clone());
//! let orchestrator = WorkflowOrchestrator::new(
//!     store,
//!     directory,
//!     Arc::new(InMemoryNotifier::new()),
//!     EngineConfig::default(),
//! );
//!
//! let ana = UserId::new("ana");
//! let template = catalog
//!     .create_template(NewTemplate::new("Review").step("Draft").step("Approve"), &ana)
//!     .await
//!     .unwrap();
//! let wf = orchestrator
//!     .create_workflow(NewWorkflow::new(template.id, "Q3 report"), &ana)
//!     .await
//!     .unwrap();
//!
//! let wf = orchestrator
//!     .advance_to_next_step(&wf.id, Some(UserId::new("bruno")), "draft ready", &ana)
//!     .await
//!     .unwrap();
//! assert_eq!(wf.current_step, 2);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

#![deny(unsafe_code)]

pub mod analytics;
pub mod catalog;
pub mod config;
pub mod directory;
pub mod locks;
pub mod notifier;
pub mod orchestrator;
pub mod storage;
pub mod sweep;
pub mod view;
pub mod visibility;

pub use analytics::{DeadlineSignals, UserWorkload, WorkflowStats};
pub use catalog::{NewStatusItem, NewStatusTemplate, NewStep, NewTemplate, TemplateCatalog};
pub use config::EngineConfig;
pub use directory::{Directory, InMemoryDirectory};
pub use locks::WorkflowLocks;
pub use notifier::{InMemoryNotifier, NotificationSink, NotifyError};
pub use orchestrator::WorkflowOrchestrator;
pub use storage::{InMemoryWorkflowStore, StorageError, UnitOfWork, WorkflowStore};
pub use sweep::{DeadlineSweep, SweepOutcome, SweepReport};
pub use view::{NewWorkflow, WorkflowFilter, WorkflowView};
pub use visibility::Viewer;
