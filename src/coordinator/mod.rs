//! Coordinator agent: the single user-facing entry point.
//!
//! Each `/run_agent` request walks a fixed state machine:
//!
//! ```text
//! INIT → TOOL_DISCOVERY → REASONING_LOOP → FINALIZE
//! ```
//!
//! Discovery connects to the data agent and report agent MCP endpoints
//! and merges their catalogs with one local clock tool; either catalog
//! being unreachable fails the request. The reasoning loop restores the
//! session from its newest checkpoint and delegates all tool selection
//! to the model. Finalization reads the newest checkpoint back and
//! returns the latest assistant message that carries no tool calls.

pub mod discovery;
pub mod routes;

pub use routes::{RunAgentParams, serve};

use std::fmt;
use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use tracing::info;

use crate::agent::message::{system_message, user_message};
use crate::agent::{
    ChatMessage, ChatRequest, LlmProvider, PromptSet, Role, ToolDefinition, ToolHandler,
    ToolRegistry, agentic_loop,
};
use crate::config::CoordinatorConfig;
use crate::coordinator::discovery::RemoteAgent;
use crate::error::{AgentError, Error};
use crate::storage::CheckpointStore;

use async_trait::async_trait;

/// Returned when no terminal assistant message exists for the session.
pub const NO_OUTPUT_SENTINEL: &str = "No output generated";

/// Coordinator service state shared across requests.
pub struct Coordinator {
    config: CoordinatorConfig,
    provider: Arc<dyn LlmProvider>,
    store: CheckpointStore,
    prompts: PromptSet,
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("config", &self.config)
            .field("provider", &self.provider.name())
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    /// Creates the coordinator, opening its checkpoint store.
    ///
    /// # Errors
    ///
    /// Returns an error when the checkpoint database cannot be opened.
    pub fn new(
        config: CoordinatorConfig,
        provider: Arc<dyn LlmProvider>,
        prompts: PromptSet,
    ) -> Result<Self, Error> {
        let store = CheckpointStore::open(
            config.checkpoint_db.clone(),
            "coordinator",
            config.checkpoint_keep,
        )?;
        Ok(Self {
            config,
            provider,
            store,
            prompts,
        })
    }

    /// Handles one user request end to end and returns the final answer.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ToolDiscovery`] when a subordinate agent is
    /// unreachable, and propagates provider and checkpoint failures from
    /// the reasoning loop. Loop exhaustion is not an error; it yields the
    /// [`NO_OUTPUT_SENTINEL`].
    pub async fn run(&self, params: &RunAgentParams) -> Result<String, AgentError> {
        let model = params
            .model
            .clone()
            .unwrap_or_else(|| self.config.default_model.clone());
        let session_id = params.session_id.as_str();

        // Both catalogs must be reachable; no partial tool set proceeds.
        let data_agent = RemoteAgent::connect("data-agent", &self.config.data_agent_url).await?;
        let report_agent =
            RemoteAgent::connect("report-agent", &self.config.report_agent_url).await?;

        let mut registry = ToolRegistry::new();
        for (definition, handler) in data_agent.tools().await? {
            registry.register(definition, Arc::new(handler));
        }
        for (definition, handler) in report_agent.tools().await? {
            registry.register(definition, Arc::new(handler));
        }
        registry.register(current_time_definition(), Arc::new(TaiwanTimeTool));

        info!(
            session = session_id,
            model,
            tools = registry.len(),
            "starting reasoning loop"
        );

        // Restore the session's prior conversation, then append the new
        // user message. The system instruction is attached fresh each
        // time; snapshots never contain it.
        let mut messages = vec![system_message(&self.prompts.coordinator)];
        if let Some(snapshot) = self.latest_snapshot(session_id).await? {
            messages.extend(snapshot);
        }
        messages.push(user_message(&params.user_query));

        let mut request = ChatRequest {
            model,
            messages,
            temperature: None,
            max_tokens: None,
            json_mode: false,
            tools: registry.definitions(),
        };

        let loop_result = agentic_loop(
            self.provider.as_ref(),
            &mut request,
            &registry,
            &self.store,
            session_id,
            self.config.max_iterations,
        )
        .await;

        data_agent.shutdown().await;
        report_agent.shutdown().await;
        loop_result?;

        let snapshot = self.latest_snapshot(session_id).await?;
        Ok(snapshot
            .as_deref()
            .and_then(extract_final_answer)
            .unwrap_or_else(|| NO_OUTPUT_SENTINEL.to_string()))
    }

    async fn latest_snapshot(
        &self,
        session_id: &str,
    ) -> Result<Option<Vec<ChatMessage>>, AgentError> {
        self.store
            .latest_async(session_id)
            .await
            .map_err(|e| AgentError::Checkpoint {
                message: e.to_string(),
            })
    }
}

/// Scans a snapshot in reverse for the newest assistant message with no
/// tool calls. Empty answer text counts as no output.
#[must_use]
pub fn extract_final_answer(messages: &[ChatMessage]) -> Option<String> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant && m.tool_calls.is_empty())
        .map(|m| m.content.clone())
        .filter(|content| !content.is_empty())
}

/// Local utility tool: current time at UTC+8 (Asia/Taipei).
struct TaiwanTimeTool;

#[async_trait]
impl ToolHandler for TaiwanTimeTool {
    async fn invoke(&self, _arguments: &str) -> Result<String, AgentError> {
        Ok(taiwan_now())
    }
}

fn taiwan_now() -> String {
    let now = FixedOffset::east_opt(8 * 3600).map_or_else(
        || Utc::now().fixed_offset(),
        |tz| Utc::now().with_timezone(&tz),
    );
    now.format("%Y-%m-%d %H:%M:%S UTC%:z").to_string()
}

fn current_time_definition() -> ToolDefinition {
    ToolDefinition {
        name: "get_current_time_in_taiwan".to_string(),
        description: "Gets the current time in Taiwan time zone (Asia/Taipei, UTC+8)".to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {},
            "required": [],
        }),
    }
}
