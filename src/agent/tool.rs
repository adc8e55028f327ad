//! Tool types and the dispatch registry for function-calling.
//!
//! The coordinator does not know its tools at compile time: it discovers
//! them from the subordinate agents at session start and registers one
//! handler per remote tool, plus local tools such as the clock. The
//! [`ToolRegistry`] pairs each discovered [`ToolDefinition`] with a
//! [`ToolHandler`] and dispatches [`ToolCall`]s by name.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// A tool definition that can be sent to an LLM for function-calling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (the dispatch key).
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: serde_json::Value,
}

/// A tool call requested by the LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call (assigned by the provider).
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON-encoded arguments for the tool.
    pub arguments: String,
}

/// The result of executing a tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this result corresponds to.
    pub tool_call_id: String,
    /// Result content (tool output on success, error message on failure).
    pub content: String,
    /// Whether this result represents an error.
    pub is_error: bool,
}

/// Executes one tool against its JSON-encoded arguments.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Runs the tool and returns its text output.
    async fn invoke(&self, arguments: &str) -> Result<String, AgentError>;
}

struct RegisteredTool {
    definition: ToolDefinition,
    handler: Arc<dyn ToolHandler>,
}

/// Name-keyed set of tools available to one reasoning session.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .tools
            .iter()
            .map(|t| t.definition.name.as_str())
            .collect();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool. A duplicate name shadows the earlier entry for
    /// definitions but dispatch still finds the first registration, so
    /// callers should register each name once.
    pub fn register(&mut self, definition: ToolDefinition, handler: Arc<dyn ToolHandler>) {
        self.tools.push(RegisteredTool {
            definition,
            handler,
        });
    }

    /// Definitions to advertise to the model.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition.clone()).collect()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` when no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Dispatches a tool call by name.
    ///
    /// Never fails: an unknown name or a handler error becomes a
    /// [`ToolResult`] with `is_error` set, which flows back to the model as
    /// a tool message instead of aborting the reasoning loop.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.tools.iter().find(|t| t.definition.name == call.name) else {
            return ToolResult {
                tool_call_id: call.id.clone(),
                content: format!("Unknown tool: {}", call.name),
                is_error: true,
            };
        };
        match tool.handler.invoke(&call.arguments).await {
            Ok(content) => ToolResult {
                tool_call_id: call.id.clone(),
                content,
                is_error: false,
            },
            Err(e) => ToolResult {
                tool_call_id: call.id.clone(),
                content: format!("Tool {} failed: {e}", call.name),
                is_error: true,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl ToolHandler for EchoTool {
        async fn invoke(&self, arguments: &str) -> Result<String, AgentError> {
            Ok(format!("echo: {arguments}"))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl ToolHandler for FailingTool {
        async fn invoke(&self, _arguments: &str) -> Result<String, AgentError> {
            Err(AgentError::ToolExecution {
                name: "broken".to_string(),
                message: "connection refused".to_string(),
            })
        }
    }

    fn definition(name: &str) -> ToolDefinition {
        ToolDefinition {
            name: name.to_string(),
            description: format!("test tool {name}"),
            parameters: json!({"type": "object", "properties": {}}),
        }
    }

    #[tokio::test]
    async fn dispatches_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(definition("echo"), Arc::new(EchoTool));

        let result = registry
            .execute(&ToolCall {
                id: "call_1".to_string(),
                name: "echo".to_string(),
                arguments: r#"{"query":"x"}"#.to_string(),
            })
            .await;
        assert!(!result.is_error);
        assert_eq!(result.tool_call_id, "call_1");
        assert_eq!(result.content, r#"echo: {"query":"x"}"#);
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_result_not_a_failure() {
        let registry = ToolRegistry::new();
        let result = registry
            .execute(&ToolCall {
                id: "call_1".to_string(),
                name: "missing".to_string(),
                arguments: "{}".to_string(),
            })
            .await;
        assert!(result.is_error);
        assert_eq!(result.content, "Unknown tool: missing");
    }

    #[tokio::test]
    async fn handler_error_maps_to_error_result() {
        let mut registry = ToolRegistry::new();
        registry.register(definition("broken"), Arc::new(FailingTool));

        let result = registry
            .execute(&ToolCall {
                id: "call_9".to_string(),
                name: "broken".to_string(),
                arguments: "{}".to_string(),
            })
            .await;
        assert!(result.is_error);
        assert!(result.content.contains("broken"));
        assert!(result.content.contains("connection refused"));
    }

    #[test]
    fn definitions_reflect_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(definition("retrieve_data"), Arc::new(EchoTool));
        registry.register(definition("insert_return"), Arc::new(EchoTool));

        let names: Vec<String> = registry
            .definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["retrieve_data", "insert_return"]);
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }
}
