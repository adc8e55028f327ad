//! Provider registry and factory.
//!
//! Maps provider names to concrete [`LlmProvider`] implementations.

use crate::agent::config::LlmConfig;
use crate::agent::provider::LlmProvider;
use crate::agent::providers::OpenAiProvider;
use crate::error::AgentError;

/// Creates an [`LlmProvider`] based on the configured provider name.
///
/// # Supported Providers
///
/// - `"openai"` (default) — OpenAI-compatible APIs via `async-openai`
///
/// # Errors
///
/// Returns [`AgentError::UnsupportedProvider`] for unknown provider names.
pub fn create_provider(config: &LlmConfig) -> Result<Box<dyn LlmProvider>, AgentError> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiProvider::new(config))),
        other => Err(AgentError::UnsupportedProvider {
            name: other.to_string(),
        }),
    }
}
