//! Configuration for workflowd
//!
//! Layered as built-in defaults, then an optional file, then environment
//! variables such as `WORKFLOW_SERVER__LISTEN_ADDR=0.0.0.0:9000`.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use workflow_engine::{EngineConfig, NewTemplate};
use workflow_types::{User, UserId};

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Engine thresholds
    #[serde(default)]
    pub engine: EngineConfig,

    /// Scheduler configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Directory seed
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Templates authored at startup
    #[serde(default)]
    pub templates: Vec<SeedTemplate>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            enable_cors: true,
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Run the deadline sweep periodically
    #[serde(default = "default_true")]
    pub deadline_sweep_enabled: bool,

    /// Deadline sweep interval in seconds
    #[serde(default = "default_sweep_interval")]
    pub deadline_sweep_interval_secs: u64,

    /// Remind about deadlines at most this many days ahead
    #[serde(default = "default_deadline_window")]
    pub deadline_window_days: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            deadline_sweep_enabled: true,
            deadline_sweep_interval_secs: default_sweep_interval(),
            deadline_window_days: default_deadline_window(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Users known to the in-memory directory at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub users: Vec<User>,
}

/// A template authored on behalf of `owner` when the daemon starts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedTemplate {
    pub owner: UserId,
    pub template: NewTemplate,
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    3600
}

fn default_deadline_window() -> i64 {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // WORKFLOW_<SECTION>__<KEY>
        builder = builder.add_source(
            config::Environment::with_prefix("WORKFLOW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.server.listen_addr.port(), 8080);
        assert!(config.server.enable_cors);
        assert_eq!(config.engine, EngineConfig::default());
        assert!(config.directory.users.is_empty());
        assert!(config.templates.is_empty());
    }

    #[test]
    fn test_scheduler_defaults() {
        let config = SchedulerConfig::default();
        assert!(config.deadline_sweep_enabled);
        assert_eq!(config.deadline_sweep_interval_secs, 3600);
        assert_eq!(config.deadline_window_days, 3);
    }

    #[test]
    fn test_logging_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(!config.json);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = DaemonConfig::load(None).unwrap();
        assert_eq!(config.scheduler.deadline_sweep_interval_secs, 3600);
        assert_eq!(config.engine.workload_threshold, 10);
    }

    #[test]
    fn test_partial_json_document() {
        let config: DaemonConfig = serde_json::from_str(
            r#"{
                "engine": { "workload_threshold": 5 },
                "directory": { "users": [
                    { "id": "ana", "name": "Ana", "roles": ["admin"], "teams": ["ops"] }
                ] },
                "templates": [
                    { "owner": "ana", "template": { "name": "Intake", "steps": [{ "name": "Triage" }] } }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.engine.workload_threshold, 5);
        assert_eq!(config.engine.near_deadline_days, 3);
        assert_eq!(config.directory.users[0].id, UserId::new("ana"));
        assert!(config.directory.users[0].active);
        assert_eq!(config.templates[0].template.steps.len(), 1);
        assert!(config.scheduler.deadline_sweep_enabled);
    }
}
