//! HTTP surface of the coordinator service.
//!
//! One endpoint: `POST /run_agent` with query-string parameters, returning
//! the agent's final answer as plain text. Orchestration-level failures
//! (unreachable subordinate agent, provider errors) become a 500 with a
//! plain-text reason; everything the tools themselves report flows back
//! as normal answer text.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::post;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use super::Coordinator;

/// Query parameters of `POST /run_agent`.
#[derive(Debug, Clone, Deserialize)]
pub struct RunAgentParams {
    /// Model override; the configured default applies when omitted.
    pub model: Option<String>,
    /// Natural-language request for the agent.
    #[serde(default)]
    pub user_query: String,
    /// Conversation identity for checkpoint restore.
    #[serde(default = "default_session_id")]
    pub session_id: String,
}

fn default_session_id() -> String {
    "default_session".to_string()
}

/// Builds the coordinator router.
pub fn router(coordinator: Arc<Coordinator>) -> Router {
    Router::new()
        .route("/run_agent", post(run_agent))
        .layer(TraceLayer::new_for_http())
        .with_state(coordinator)
}

async fn run_agent(
    State(coordinator): State<Arc<Coordinator>>,
    Query(params): Query<RunAgentParams>,
) -> Result<String, (StatusCode, String)> {
    coordinator.run(&params).await.map_err(|e| {
        error!(error = %e, session = params.session_id, "agent run failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Agent error: {e}"),
        )
    })
}

/// Binds the coordinator service and serves until ctrl-c.
///
/// # Errors
///
/// Returns an error when the listener cannot bind or the server fails.
pub async fn serve(coordinator: Coordinator, host: &str, port: u16) -> anyhow::Result<()> {
    let router = router(Arc::new(coordinator));
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr, "coordinator listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::message::{ChatRequest, ChatResponse};
    use crate::agent::{LlmProvider, PromptSet};
    use crate::config::CoordinatorConfig;
    use crate::error::AgentError;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    struct UnusedProvider;

    #[async_trait]
    impl LlmProvider for UnusedProvider {
        fn name(&self) -> &'static str {
            "unused"
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            Err(AgentError::ApiRequest {
                message: "no provider in tests".to_string(),
                status: None,
            })
        }
    }

    fn test_coordinator(dir: &tempfile::TempDir) -> Coordinator {
        let config = CoordinatorConfig {
            // Ports in the reserved range so discovery fails fast.
            data_agent_url: "http://127.0.0.1:9/mcp".to_string(),
            report_agent_url: "http://127.0.0.1:9/mcp".to_string(),
            checkpoint_db: dir.path().join("checkpoints.db"),
            default_model: "gpt-4.1-mini".to_string(),
            max_iterations: 3,
            checkpoint_keep: None,
        };
        Coordinator::new(config, Arc::new(UnusedProvider), PromptSet::defaults())
            .unwrap_or_else(|e| panic!("coordinator init failed: {e}"))
    }

    #[test]
    fn test_params_defaults() {
        let params: RunAgentParams =
            serde_json::from_value(serde_json::json!({"user_query": "list returns"}))
                .unwrap_or_else(|e| panic!("deserialize failed: {e}"));
        assert!(params.model.is_none());
        assert_eq!(params.user_query, "list returns");
        assert_eq!(params.session_id, "default_session");
    }

    #[test]
    fn test_params_empty_query_allowed() {
        let params: RunAgentParams = serde_json::from_value(serde_json::json!({}))
            .unwrap_or_else(|e| panic!("deserialize failed: {e}"));
        assert_eq!(params.user_query, "");
    }

    #[tokio::test]
    async fn test_unreachable_agent_returns_server_error() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
        let app = router(Arc::new(test_coordinator(&dir)));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/run_agent?user_query=hello")
                    .body(Body::empty())
                    .unwrap_or_else(|e| panic!("request build failed: {e}")),
            )
            .await
            .unwrap_or_else(|e| panic!("request failed: {e}"));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_else(|e| panic!("body read failed: {e}"));
        let text = String::from_utf8_lossy(&body);
        assert!(text.starts_with("Agent error:"), "{text}");
    }

    #[tokio::test]
    async fn test_wrong_method_rejected() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
        let app = router(Arc::new(test_coordinator(&dir)));

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/run_agent?user_query=hello")
                    .body(Body::empty())
                    .unwrap_or_else(|e| panic!("request build failed: {e}")),
            )
            .await
            .unwrap_or_else(|e| panic!("request failed: {e}"));

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
