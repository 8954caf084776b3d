//! Workflow daemon library
//!
//! This module provides the components behind `workflowd`:
//! - REST API handlers over the orchestrator and template catalog
//! - Periodic deadline sweep scheduler
//! - Configuration loading
//! - Server lifecycle management

pub mod api;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod server;

pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError, DaemonResult};
pub use scheduler::Scheduler;
pub use server::Server;
