//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use crate::scheduler::Scheduler;
use std::sync::Arc;
use tokio::net::TcpListener;
use workflow_engine::{
    DeadlineSweep, InMemoryDirectory, InMemoryNotifier, InMemoryWorkflowStore, TemplateCatalog,
    WorkflowOrchestrator,
};

/// Workflow daemon server
pub struct Server {
    config: DaemonConfig,
    state: AppState,
    scheduler: Arc<Scheduler>,
}

impl Server {
    /// Build the in-memory stack and apply the configured seeds
    pub async fn new(config: DaemonConfig) -> DaemonResult<Self> {
        let state = build_state(&config).await?;
        let scheduler = Scheduler::new(config.scheduler.clone(), state.sweep.clone());

        Ok(Self {
            config,
            state,
            scheduler,
        })
    }

    /// Run the server
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;
        let app = create_router(self.state.clone(), self.config.server.enable_cors);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Workflow daemon listening on {}", addr);

        let sweep_handle = self.scheduler.start();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("Workflow daemon shutting down");

        self.scheduler.stop();
        if let Some(handle) = sweep_handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Scheduler task ended abnormally");
            }
        }

        Ok(())
    }
}

/// Wire the engine over in-memory adapters and apply seeds from `config`
pub async fn build_state(config: &DaemonConfig) -> DaemonResult<AppState> {
    let store = Arc::new(InMemoryWorkflowStore::new());
    let directory = Arc::new(InMemoryDirectory::with_users(
        config.directory.users.iter().cloned(),
    ));
    let notifier = Arc::new(InMemoryNotifier::new());

    let catalog = TemplateCatalog::new(store.clone(), directory.clone());
    for seed in &config.templates {
        let template = catalog
            .create_template(seed.template.clone(), &seed.owner)
            .await?;
        tracing::debug!(template_id = %template.id, name = %template.name, "Seeded template");
    }

    let orchestrator = WorkflowOrchestrator::new(
        store.clone(),
        directory.clone(),
        notifier.clone(),
        config.engine.clone(),
    );
    let sweep = Arc::new(DeadlineSweep::new(
        store,
        notifier,
        config.scheduler.deadline_window_days,
    ));

    tracing::info!(
        users = directory.user_count().await,
        templates = config.templates.len(),
        "Engine ready"
    );
    Ok(AppState::new(orchestrator, catalog, sweep, directory))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
