//! Checkpointed reasoning loop.
//!
//! Drives the LLM ↔ tool execution round-trip: sends a request to the model,
//! executes any tool calls in the response, appends results, and repeats
//! until the model produces a final text response or the iteration limit is
//! reached. After every model turn and every batch of tool results the full
//! conversation (minus the system instruction) is checkpointed, so a caller
//! can always recover the session's state from the newest snapshot even if
//! the process dies mid-loop.

use tracing::{debug, warn};

use super::message::{ChatMessage, ChatRequest, Role, assistant_message, tool_message};
use super::provider::LlmProvider;
use super::tool::ToolRegistry;
use crate::error::AgentError;
use crate::storage::CheckpointStore;

/// Runs the reasoning loop: model → tool calls → tool results → model → …
///
/// Continues until the model responds without tool calls (a terminal
/// answer) or `max_iterations` is reached. Hitting the bound is not an
/// error: the loop returns normally and the caller extracts whatever
/// terminal answer the newest snapshot holds.
///
/// # Arguments
///
/// * `provider` - LLM provider to call.
/// * `request` - Chat request carrying the restored conversation (mutated
///   in place with assistant and tool messages).
/// * `registry` - Dispatches tool calls to their handlers.
/// * `store` - Checkpoint store receiving a snapshot per step.
/// * `session_id` - Session the snapshots belong to.
/// * `max_iterations` - Bound on model round-trips.
///
/// # Errors
///
/// Propagates provider failures and checkpoint write failures. Tool
/// failures do not abort the loop; they flow back to the model as error
/// results.
#[allow(clippy::future_not_send)]
pub async fn agentic_loop(
    provider: &dyn LlmProvider,
    request: &mut ChatRequest,
    registry: &ToolRegistry,
    store: &CheckpointStore,
    session_id: &str,
    max_iterations: usize,
) -> Result<(), AgentError> {
    for iteration in 0..max_iterations {
        let response = provider.chat(request).await?;

        // No tool calls means the model produced its final answer.
        if response.tool_calls.is_empty() {
            request
                .messages
                .push(assistant_message(&response.content, Vec::new()));
            checkpoint(store, session_id, request).await?;
            debug!(iteration, "reasoning loop completed with final text response");
            return Ok(());
        }

        debug!(
            iteration,
            tool_count = response.tool_calls.len(),
            "executing tool calls"
        );

        request.messages.push(assistant_message(
            &response.content,
            response.tool_calls.clone(),
        ));
        checkpoint(store, session_id, request).await?;

        for call in &response.tool_calls {
            let result = registry.execute(call).await;
            debug!(
                tool = call.name,
                call_id = call.id,
                is_error = result.is_error,
                "tool execution complete"
            );
            request
                .messages
                .push(tool_message(&result.tool_call_id, &result.content));
        }
        checkpoint(store, session_id, request).await?;
    }

    warn!(
        max_iterations,
        session = session_id,
        "reasoning loop hit iteration bound without a terminal answer"
    );
    Ok(())
}

/// Snapshot content for a request: the conversation without the system
/// instruction, which is re-attached fresh on every session start.
#[must_use]
pub fn conversation(request: &ChatRequest) -> Vec<ChatMessage> {
    request
        .messages
        .iter()
        .filter(|m| m.role != Role::System)
        .cloned()
        .collect()
}

async fn checkpoint(
    store: &CheckpointStore,
    session_id: &str,
    request: &ChatRequest,
) -> Result<(), AgentError> {
    store
        .append_async(session_id, conversation(request))
        .await
        .map_err(|e| AgentError::Checkpoint {
            message: e.to_string(),
        })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::message::{
        ChatRequest, ChatResponse, TokenUsage, system_message, user_message,
    };
    use crate::agent::tool::{ToolCall, ToolDefinition, ToolHandler, ToolRegistry};
    use crate::error::AgentError;
    use crate::storage::CheckpointStore;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Mock provider that returns tool calls on the first N calls,
    /// then a final text response.
    struct MockToolProvider {
        call_count: AtomicUsize,
        tool_rounds: usize,
    }

    impl MockToolProvider {
        fn new(tool_rounds: usize) -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                tool_rounds,
            }
        }
    }

    #[async_trait]
    impl LlmProvider for MockToolProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            let count = self.call_count.fetch_add(1, Ordering::SeqCst);

            if count < self.tool_rounds {
                // Return a tool call
                Ok(ChatResponse {
                    content: String::new(),
                    usage: TokenUsage::default(),
                    tool_calls: vec![ToolCall {
                        id: format!("call_{count}"),
                        name: "retrieve_data".to_string(),
                        arguments: r#"{"query":"recent returns"}"#.to_string(),
                    }],
                    finish_reason: Some("tool_calls".to_string()),
                })
            } else {
                // Return final text
                Ok(ChatResponse {
                    content: "Final answer based on tool results.".to_string(),
                    usage: TokenUsage {
                        prompt_tokens: 100,
                        completion_tokens: 20,
                        total_tokens: 120,
                    },
                    tool_calls: Vec::new(),
                    finish_reason: Some("stop".to_string()),
                })
            }
        }
    }

    struct StaticTool;

    #[async_trait]
    impl ToolHandler for StaticTool {
        async fn invoke(&self, _arguments: &str) -> Result<String, AgentError> {
            Ok("order_id: 1001".to_string())
        }
    }

    fn setup_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(
            ToolDefinition {
                name: "retrieve_data".to_string(),
                description: "test retrieval".to_string(),
                parameters: serde_json::json!({"type": "object", "properties": {}}),
            },
            Arc::new(StaticTool),
        );
        registry
    }

    fn setup_store(dir: &TempDir) -> CheckpointStore {
        CheckpointStore::open(dir.path().join("checkpoints.db"), "coordinator", None)
            .unwrap_or_else(|e| panic!("open failed: {e}"))
    }

    fn setup_request() -> ChatRequest {
        ChatRequest {
            model: "test".to_string(),
            messages: vec![
                system_message("You are a coordinator agent."),
                user_message("list recent returns"),
            ],
            temperature: None,
            max_tokens: None,
            json_mode: false,
            tools: Vec::new(),
        }
    }

    fn temp_dir() -> TempDir {
        tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"))
    }

    #[tokio::test]
    async fn single_tool_round() {
        let dir = temp_dir();
        let store = setup_store(&dir);
        let registry = setup_registry();
        let provider = MockToolProvider::new(1);
        let mut request = setup_request();

        agentic_loop(&provider, &mut request, &registry, &store, "s", 10)
            .await
            .unwrap_or_else(|e| panic!("agentic_loop failed: {e}"));

        // system + user + assistant(tool_calls) + tool(result) + assistant(final)
        assert_eq!(request.messages.len(), 5);
        assert_eq!(
            request.messages[4].content,
            "Final answer based on tool results."
        );
        // One snapshot after the tool-call turn, one after results, one final.
        assert_eq!(
            store
                .snapshot_count("s")
                .unwrap_or_else(|e| panic!("count failed: {e}")),
            3
        );
    }

    #[tokio::test]
    async fn multiple_rounds() {
        let dir = temp_dir();
        let store = setup_store(&dir);
        let registry = setup_registry();
        let provider = MockToolProvider::new(3);
        let mut request = setup_request();

        agentic_loop(&provider, &mut request, &registry, &store, "s", 10)
            .await
            .unwrap_or_else(|e| panic!("agentic_loop failed: {e}"));

        // 2 initial + 3 rounds * 2 (assistant + tool) + final assistant = 9
        assert_eq!(request.messages.len(), 9);
    }

    #[tokio::test]
    async fn no_tools_needed() {
        let dir = temp_dir();
        let store = setup_store(&dir);
        let registry = setup_registry();
        let provider = MockToolProvider::new(0);
        let mut request = setup_request();

        agentic_loop(&provider, &mut request, &registry, &store, "s", 10)
            .await
            .unwrap_or_else(|e| panic!("agentic_loop failed: {e}"));

        // system + user + final assistant
        assert_eq!(request.messages.len(), 3);
        assert_eq!(
            store
                .snapshot_count("s")
                .unwrap_or_else(|e| panic!("count failed: {e}")),
            1
        );
    }

    #[tokio::test]
    async fn iteration_bound_returns_normally() {
        let dir = temp_dir();
        let store = setup_store(&dir);
        let registry = setup_registry();
        // Provider always returns tool calls (100 rounds > max of 2)
        let provider = MockToolProvider::new(100);
        let mut request = setup_request();

        let result = agentic_loop(&provider, &mut request, &registry, &store, "s", 2).await;
        assert!(result.is_ok(), "bound exhaustion must not be an error");

        // Two full rounds, no terminal assistant message.
        assert_eq!(request.messages.len(), 6);
        assert!(
            request
                .messages
                .iter()
                .all(|m| m.role != Role::Assistant || !m.tool_calls.is_empty())
        );
        // Each round checkpointed twice.
        assert_eq!(
            store
                .snapshot_count("s")
                .unwrap_or_else(|e| panic!("count failed: {e}")),
            4
        );
    }

    #[tokio::test]
    async fn snapshots_exclude_the_system_message() {
        let dir = temp_dir();
        let store = setup_store(&dir);
        let registry = setup_registry();
        let provider = MockToolProvider::new(1);
        let mut request = setup_request();

        agentic_loop(&provider, &mut request, &registry, &store, "s", 10)
            .await
            .unwrap_or_else(|e| panic!("agentic_loop failed: {e}"));

        let snapshot = store
            .latest("s")
            .unwrap_or_else(|e| panic!("latest failed: {e}"))
            .unwrap_or_else(|| panic!("expected a snapshot"));
        assert!(snapshot.iter().all(|m| m.role != Role::System));
        assert_eq!(snapshot.len(), request.messages.len() - 1);
    }

    #[tokio::test]
    async fn tool_errors_flow_back_as_results() {
        let dir = temp_dir();
        let store = setup_store(&dir);
        // Empty registry: the requested tool is unknown.
        let registry = ToolRegistry::new();
        let provider = MockToolProvider::new(1);
        let mut request = setup_request();

        agentic_loop(&provider, &mut request, &registry, &store, "s", 10)
            .await
            .unwrap_or_else(|e| panic!("agentic_loop failed: {e}"));

        let tool_result = request
            .messages
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap_or_else(|| panic!("expected a tool message"));
        assert_eq!(tool_result.content, "Unknown tool: retrieve_data");
    }
}
