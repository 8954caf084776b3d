//! workflowd - Workflow orchestration daemon
//!
//! Serves the workflow engine over REST and runs the periodic deadline
//! sweep.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workflow_daemon::{DaemonConfig, DaemonError, DaemonResult, Server};

/// Workflow daemon CLI
#[derive(Parser)]
#[command(name = "workflowd")]
#[command(about = "Workflow orchestration daemon", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "WORKFLOW_CONFIG")]
    config: Option<String>,

    /// Listen address, overrides the configuration
    #[arg(short, long, env = "WORKFLOW_LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level, overrides the configuration
    #[arg(long, env = "WORKFLOW_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "WORKFLOW_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing; RUST_LOG wins over the configured level
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.server.listen_addr,
        users = config.directory.users.len(),
        sweep_enabled = config.scheduler.deadline_sweep_enabled,
        "Starting workflowd"
    );

    let server = Server::new(config).await?;
    server.run().await
}
