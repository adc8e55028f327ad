//! Error types for the returnsight crate.
//!
//! Each layer owns an error enum ([`StorageError`], [`AgentError`],
//! [`ReportError`], [`CommandError`]) and the top-level [`Error`] wraps them
//! for callers that cross layers, such as the CLI dispatcher.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error wrapping the per-layer error enums.
#[derive(Debug, Error)]
pub enum Error {
    /// SQLite-backed storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// LLM or tool-loop failure.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Report generation failure.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// CLI command failure.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Errors from the SQLite row store, semantic index, and checkpoint store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying SQLite failure, including constraint violations.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Checkpoint state could not be serialized or deserialized.
    #[error("checkpoint serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A blocking storage task panicked or was cancelled.
    #[error("blocking task join error: {message}")]
    TaskJoin {
        /// Join error description.
        message: String,
    },
}

/// Errors from LLM providers, tool discovery, and the reasoning loop.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The provider API request failed.
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Error description from the provider.
        message: String,
        /// HTTP status code, when the provider surfaced one.
        status: Option<u16>,
    },

    /// No API key was found in the environment or configuration.
    #[error("no API key found (set OPENAI_API_KEY or RETURNSIGHT_API_KEY)")]
    ApiKeyMissing,

    /// The configured provider name is not recognized.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// Provider name that was requested.
        name: String,
    },

    /// Connecting to a subordinate agent or listing its tools failed.
    #[error("tool discovery against {agent} failed: {message}")]
    ToolDiscovery {
        /// Remote agent label.
        agent: String,
        /// Error description.
        message: String,
    },

    /// A tool invocation failed before a result could be produced.
    #[error("tool '{name}' execution failed: {message}")]
    ToolExecution {
        /// Tool name.
        name: String,
        /// Error description.
        message: String,
    },

    /// Reading or writing conversation checkpoints failed.
    #[error("checkpoint access failed: {message}")]
    Checkpoint {
        /// Error description.
        message: String,
    },
}

/// Errors from report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Workbook construction or save failure.
    #[error("workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    /// The findings model call failed.
    #[error("findings generation failed: {message}")]
    Findings {
        /// Error description.
        message: String,
    },

    /// A blocking report task panicked or was cancelled.
    #[error("blocking task join error: {message}")]
    TaskJoin {
        /// Join error description.
        message: String,
    },

    /// Filesystem failure while writing or sweeping report files.
    #[error("report I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command started but did not complete.
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),

    /// An argument failed validation beyond what clap enforces.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_wraps_into_top_level() {
        let err: Error = StorageError::TaskJoin {
            message: "cancelled".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Storage(_)));
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn api_key_missing_names_both_env_vars() {
        let msg = AgentError::ApiKeyMissing.to_string();
        assert!(msg.contains("OPENAI_API_KEY"));
        assert!(msg.contains("RETURNSIGHT_API_KEY"));
    }

    #[test]
    fn tool_execution_includes_tool_name() {
        let err = AgentError::ToolExecution {
            name: "retrieve_data".to_string(),
            message: "connection refused".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("retrieve_data"));
        assert!(msg.contains("connection refused"));
    }
}
