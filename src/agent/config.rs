//! LLM connection configuration with builder pattern and environment
//! variable support.
//!
//! Configuration is resolved in order: explicit values → environment
//! variables → defaults. Service-level settings (ports, database paths,
//! iteration bounds) live in [`crate::config`]; this struct covers only
//! what a provider needs to talk to an API.

use std::path::PathBuf;

use crate::error::AgentError;

/// Default provider name.
const DEFAULT_PROVIDER: &str = "openai";

/// Configuration for LLM provider access.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Directory containing prompt template files.
    ///
    /// When set, system prompts load from markdown files in this directory,
    /// falling back to compiled-in defaults for any missing files.
    pub prompt_dir: Option<PathBuf>,
}

impl LlmConfig {
    /// Creates a new builder for `LlmConfig`.
    #[must_use]
    pub fn builder() -> LlmConfigBuilder {
        LlmConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`LlmConfig`].
#[derive(Debug, Clone, Default)]
pub struct LlmConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    prompt_dir: Option<PathBuf>,
}

impl LlmConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = std::env::var("RETURNSIGHT_PROVIDER").ok();
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("OPENAI_API_KEY")
                .or_else(|_| std::env::var("RETURNSIGHT_API_KEY"))
                .ok();
        }
        if self.base_url.is_none() {
            self.base_url = std::env::var("OPENAI_BASE_URL")
                .or_else(|_| std::env::var("RETURNSIGHT_BASE_URL"))
                .ok();
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = std::env::var("RETURNSIGHT_PROMPT_DIR")
                .ok()
                .map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Builds the [`LlmConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set.
    pub fn build(self) -> Result<LlmConfig, AgentError> {
        let api_key = self.api_key.ok_or(AgentError::ApiKeyMissing)?;

        Ok(LlmConfig {
            provider: self.provider.unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            api_key,
            base_url: self.base_url,
            prompt_dir: self.prompt_dir,
        })
    }
}
