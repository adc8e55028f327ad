//! Per-service configuration resolved from the environment.
//!
//! Each of the three services (coordinator, data agent, report agent)
//! carries its own small config struct built with `from_env()` plus
//! fluent overrides for the values the CLI supplies. Resolution order is
//! explicit value → environment variable → default. Provider credentials
//! live separately in [`crate::agent::LlmConfig`].

use std::path::PathBuf;

/// Default MCP endpoint of the data agent.
pub const DEFAULT_DATA_AGENT_URL: &str = "http://127.0.0.1:8001/mcp";

/// Default MCP endpoint of the report agent.
pub const DEFAULT_REPORT_AGENT_URL: &str = "http://127.0.0.1:8002/mcp";

/// Default base URL embedded in report download links.
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://127.0.0.1:8002";

/// Default directory for generated spreadsheet files.
pub const DEFAULT_REPORTS_DIR: &str = "reports";

/// Default SQLite database holding return orders and the semantic index.
pub const DEFAULT_ROW_STORE_DB: &str = "customer-data.db";

/// Default SQLite database holding coordinator conversation checkpoints.
pub const DEFAULT_CHECKPOINT_DB: &str = "checkpoints_coordinator.db";

/// Default model when a request does not name one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Default bound on reasoning-loop round-trips per request.
pub const DEFAULT_MAX_ITERATIONS: usize = 35;

/// Coordinator service configuration.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// MCP endpoint of the data agent.
    pub data_agent_url: String,
    /// MCP endpoint of the report agent.
    pub report_agent_url: String,
    /// Checkpoint database path.
    pub checkpoint_db: PathBuf,
    /// Model used when a request does not specify one.
    pub default_model: String,
    /// Bound on reasoning-loop round-trips per request.
    pub max_iterations: usize,
    /// Snapshots retained per session; `None` keeps every snapshot.
    pub checkpoint_keep: Option<usize>,
}

impl CoordinatorConfig {
    /// Builds the config from environment variables with defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            data_agent_url: std::env::var("DATA_AGENT_URL")
                .unwrap_or_else(|_| DEFAULT_DATA_AGENT_URL.to_string()),
            report_agent_url: std::env::var("REPORT_AGENT_URL")
                .unwrap_or_else(|_| DEFAULT_REPORT_AGENT_URL.to_string()),
            checkpoint_db: std::env::var("RETURNSIGHT_CHECKPOINT_DB")
                .map_or_else(|_| PathBuf::from(DEFAULT_CHECKPOINT_DB), PathBuf::from),
            default_model: std::env::var("RETURNSIGHT_DEFAULT_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            max_iterations: parse_env("RETURNSIGHT_MAX_ITERATIONS")
                .unwrap_or(DEFAULT_MAX_ITERATIONS),
            checkpoint_keep: parse_env("RETURNSIGHT_CHECKPOINT_KEEP"),
        }
    }

    /// Sets the checkpoint database path.
    #[must_use]
    pub fn checkpoint_db(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint_db = path.into();
        self
    }

    /// Sets the iteration bound.
    #[must_use]
    pub fn max_iterations(mut self, bound: usize) -> Self {
        self.max_iterations = bound;
        self
    }
}

/// Data agent service configuration.
#[derive(Debug, Clone)]
pub struct DataAgentConfig {
    /// SQLite database holding return orders and the semantic index.
    pub db_path: PathBuf,
}

impl DataAgentConfig {
    /// Builds the config from environment variables with defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            db_path: std::env::var("RETURNSIGHT_DB")
                .map_or_else(|_| PathBuf::from(DEFAULT_ROW_STORE_DB), PathBuf::from),
        }
    }

    /// Sets the database path.
    #[must_use]
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }
}

/// Report agent service configuration.
#[derive(Debug, Clone)]
pub struct ReportAgentConfig {
    /// Directory for generated spreadsheet files.
    pub reports_dir: PathBuf,
    /// Base URL embedded in download links.
    pub public_base_url: String,
    /// Model used for the findings narrative.
    pub findings_model: String,
    /// Reports older than this many days are swept at startup; `None`
    /// keeps every report.
    pub report_ttl_days: Option<u64>,
}

impl ReportAgentConfig {
    /// Builds the config from environment variables with defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            reports_dir: std::env::var("REPORTS_DIR")
                .map_or_else(|_| PathBuf::from(DEFAULT_REPORTS_DIR), PathBuf::from),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_PUBLIC_BASE_URL.to_string()),
            findings_model: std::env::var("RETURNSIGHT_FINDINGS_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            report_ttl_days: parse_env("RETURNSIGHT_REPORT_TTL_DAYS"),
        }
    }

    /// Sets the reports directory.
    #[must_use]
    pub fn reports_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.reports_dir = dir.into();
        self
    }

    /// Sets the public base URL.
    #[must_use]
    pub fn public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = url.into();
        self
    }
}

/// Reads and parses an environment variable, ignoring unset or
/// unparseable values.
fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinator_overrides() {
        let config = CoordinatorConfig::from_env()
            .checkpoint_db("/tmp/ckpt.db")
            .max_iterations(5);
        assert_eq!(config.checkpoint_db, PathBuf::from("/tmp/ckpt.db"));
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.default_model, DEFAULT_MODEL);
    }

    #[test]
    fn test_data_agent_override() {
        let config = DataAgentConfig::from_env().db_path("orders.db");
        assert_eq!(config.db_path, PathBuf::from("orders.db"));
    }

    #[test]
    fn test_report_agent_defaults() {
        let config = ReportAgentConfig::from_env()
            .reports_dir("out")
            .public_base_url("https://reports.example.com");
        assert_eq!(config.reports_dir, PathBuf::from("out"));
        assert_eq!(config.public_base_url, "https://reports.example.com");
        assert_eq!(config.findings_model, DEFAULT_MODEL);
    }

    #[test]
    fn test_parse_env_ignores_garbage() {
        // Unset variable parses to None rather than erroring.
        let value: Option<usize> = parse_env("RETURNSIGHT_TEST_UNSET_VARIABLE");
        assert!(value.is_none());
    }
}
