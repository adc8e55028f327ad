//! MCP client side of the coordinator: subordinate agent connections and
//! remote tool adapters.
//!
//! Each subordinate agent (data agent, report agent) is reached over MCP
//! streamable HTTP. Its advertised tools are wrapped as [`RemoteTool`]
//! handlers so the reasoning loop can dispatch to them through the same
//! registry as local tools.

use std::borrow::Cow;

use async_trait::async_trait;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, ClientCapabilities, ClientInfo, Implementation,
    JsonObject, ProtocolVersion,
};
use rmcp::service::RunningService;
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::{Peer, RoleClient, ServiceExt};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::agent::{ToolDefinition, ToolHandler};
use crate::error::AgentError;

/// Live connection to one subordinate agent's MCP endpoint.
pub struct RemoteAgent {
    label: &'static str,
    service: RunningService<RoleClient, ClientInfo>,
}

impl std::fmt::Debug for RemoteAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteAgent")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl RemoteAgent {
    /// Connects to an agent's MCP endpoint and completes the handshake.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ToolDiscovery`] when the endpoint is
    /// unreachable or the handshake fails.
    pub async fn connect(label: &'static str, url: &str) -> Result<Self, AgentError> {
        let transport = StreamableHttpClientTransport::from_uri(url.to_string());
        let client_info = ClientInfo {
            meta: None,
            protocol_version: ProtocolVersion::default(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: format!("returnsight-coordinator/{label}"),
                title: None,
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
        };

        let service =
            client_info
                .serve(transport)
                .await
                .map_err(|e| AgentError::ToolDiscovery {
                    agent: label.to_string(),
                    message: e.to_string(),
                })?;

        info!(agent = label, url, "connected to subordinate agent");
        Ok(Self { label, service })
    }

    /// Fetches the agent's tool catalog as (definition, handler) pairs.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ToolDiscovery`] when the catalog cannot be
    /// listed.
    pub async fn tools(&self) -> Result<Vec<(ToolDefinition, RemoteTool)>, AgentError> {
        let tools =
            self.service
                .list_all_tools()
                .await
                .map_err(|e| AgentError::ToolDiscovery {
                    agent: self.label.to_string(),
                    message: e.to_string(),
                })?;

        debug!(agent = self.label, count = tools.len(), "fetched tool catalog");

        let peer = self.service.peer().clone();
        Ok(tools
            .into_iter()
            .map(|tool| {
                let definition = ToolDefinition {
                    name: tool.name.to_string(),
                    description: tool.description.as_deref().unwrap_or_default().to_string(),
                    parameters: Value::Object((*tool.input_schema).clone()),
                };
                let handler = RemoteTool {
                    peer: peer.clone(),
                    name: tool.name.to_string(),
                };
                (definition, handler)
            })
            .collect())
    }

    /// Closes the connection and stops its background task.
    pub async fn shutdown(self) {
        if let Err(e) = self.service.cancel().await {
            warn!(agent = self.label, error = %e, "agent connection shutdown failed");
        }
    }
}

/// Tool handler that forwards invocations to a subordinate agent.
///
/// Holds a cloned peer handle, so it stays valid for as long as the
/// owning [`RemoteAgent`] connection is alive.
#[derive(Clone)]
pub struct RemoteTool {
    peer: Peer<RoleClient>,
    name: String,
}

impl std::fmt::Debug for RemoteTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTool")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ToolHandler for RemoteTool {
    async fn invoke(&self, arguments: &str) -> Result<String, AgentError> {
        let arguments = parse_arguments(&self.name, arguments)?;
        let result = self
            .peer
            .call_tool(CallToolRequestParam {
                meta: None,
                name: Cow::Owned(self.name.clone()),
                arguments,
                task: None,
            })
            .await
            .map_err(|e| AgentError::ToolExecution {
                name: self.name.clone(),
                message: e.to_string(),
            })?;

        Ok(text_content(&result))
    }
}

/// Parses the model-supplied argument string into an MCP argument object.
///
/// Empty and `null` arguments become `None`; anything that is valid JSON
/// but not an object is rejected, since MCP tool arguments are always
/// named.
fn parse_arguments(tool: &str, raw: &str) -> Result<Option<JsonObject>, AgentError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(Value::Null) => Ok(None),
        Ok(other) => Err(AgentError::ToolExecution {
            name: tool.to_string(),
            message: format!("arguments must be a JSON object, got: {other}"),
        }),
        Err(e) => Err(AgentError::ToolExecution {
            name: tool.to_string(),
            message: format!("invalid argument JSON: {e}"),
        }),
    }
}

/// Joins the text blocks of a tool result into one string.
fn text_content(result: &CallToolResult) -> String {
    let Ok(value) = serde_json::to_value(result) else {
        return String::new();
    };
    let Some(items) = value.get("content").and_then(Value::as_array) else {
        return String::new();
    };

    items
        .iter()
        .filter_map(|item| item.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use rmcp::model::Content;

    #[test]
    fn test_parse_arguments_empty_is_none() {
        let parsed = parse_arguments("retrieve_data", "")
            .unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert!(parsed.is_none());

        let parsed = parse_arguments("retrieve_data", "   ")
            .unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert!(parsed.is_none());
    }

    #[test]
    fn test_parse_arguments_null_is_none() {
        let parsed = parse_arguments("return_all_data", "null")
            .unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert!(parsed.is_none());
    }

    #[test]
    fn test_parse_arguments_object() {
        let parsed = parse_arguments("retrieve_data", r#"{"query": "defective", "k_n": 5}"#)
            .unwrap_or_else(|e| panic!("parse failed: {e}"))
            .unwrap_or_else(|| panic!("expected an object"));
        assert_eq!(parsed.get("query"), Some(&Value::from("defective")));
        assert_eq!(parsed.get("k_n"), Some(&Value::from(5)));
    }

    #[test]
    fn test_parse_arguments_rejects_non_objects() {
        let err = parse_arguments("retrieve_data", "[1, 2]").unwrap_err();
        assert!(err.to_string().contains("retrieve_data"));

        let err = parse_arguments("retrieve_data", "not json at all {").unwrap_err();
        assert!(err.to_string().contains("retrieve_data"));
    }

    #[test]
    fn test_text_content_single_block() {
        let result = CallToolResult::success(vec![Content::text("No return orders found.")]);
        assert_eq!(text_content(&result), "No return orders found.");
    }

    #[test]
    fn test_text_content_joins_blocks() {
        let result =
            CallToolResult::success(vec![Content::text("first"), Content::text("second")]);
        assert_eq!(text_content(&result), "first\nsecond");
    }

    #[test]
    fn test_text_content_empty() {
        let result = CallToolResult::success(Vec::new());
        assert_eq!(text_content(&result), "");
    }
}
