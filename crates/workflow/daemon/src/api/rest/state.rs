//! Application state for API handlers

use std::sync::Arc;
use workflow_engine::{DeadlineSweep, Directory, TemplateCatalog, WorkflowOrchestrator};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Workflow mutations and queries
    pub orchestrator: WorkflowOrchestrator,

    /// Template and status template catalog
    pub catalog: TemplateCatalog,

    /// Deadline sweep, shared with the scheduler so both use one run-lock
    pub sweep: Arc<DeadlineSweep>,

    /// User directory, for role checks outside the engine
    pub directory: Arc<dyn Directory>,

    /// Daemon version
    pub version: String,

    /// Daemon start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        orchestrator: WorkflowOrchestrator,
        catalog: TemplateCatalog,
        sweep: Arc<DeadlineSweep>,
        directory: Arc<dyn Directory>,
    ) -> Self {
        Self {
            orchestrator,
            catalog,
            sweep,
            directory,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Uptime as `1d 2h`, `3h 4m`, `5m 6s` or `7s`
    pub fn uptime(&self) -> String {
        let secs = (chrono::Utc::now() - self.started_at).num_seconds().max(0);
        let (days, hours, mins) = (secs / 86_400, secs % 86_400 / 3600, secs % 3600 / 60);

        match (days, hours, mins) {
            (0, 0, 0) => format!("{}s", secs),
            (0, 0, m) => format!("{}m {}s", m, secs % 60),
            (0, h, m) => format!("{}h {}m", h, m),
            (d, h, _) => format!("{}d {}h", d, h),
        }
    }
}
