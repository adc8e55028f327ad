//! Data agent service: the storage-backed MCP tool server.
//!
//! Serves the MCP endpoint at `/mcp` (streamable HTTP) next to a plain
//! `GET /ping` health route. On startup the index journal is replayed so
//! a crash between a row insert and its semantic-index write never
//! leaves an unindexed order behind.

pub mod params;
pub mod server;

pub use server::DataAgentServer;

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::DataAgentConfig;
use crate::storage::replay_index_backlog;

/// Binds the data agent service and serves until ctrl-c.
///
/// # Errors
///
/// Returns an error when the database cannot be opened, the journal
/// replay fails, or the listener cannot bind.
pub async fn serve(config: DataAgentConfig, host: &str, port: u16) -> anyhow::Result<()> {
    let server = DataAgentServer::new(&config)?;

    // Re-apply index writes a crash may have left pending.
    let store = server.store().clone();
    let index = server.index().clone();
    let replayed =
        tokio::task::spawn_blocking(move || replay_index_backlog(&store, &index)).await??;
    if replayed > 0 {
        info!(replayed, "replayed pending index writes");
    }

    let ct = CancellationToken::new();
    let router = build_router(server, &ct);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr, db = %config.db_path.display(), "data agent listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            ct.cancel();
        })
        .await?;
    Ok(())
}

fn build_router(server: DataAgentServer, ct: &CancellationToken) -> Router {
    let mcp_service = StreamableHttpService::new(
        move || Ok(server.clone()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            cancellation_token: ct.child_token(),
            ..Default::default()
        },
    );

    Router::new()
        .route("/ping", get(ping))
        .nest_service("/mcp", mcp_service)
        .layer(TraceLayer::new_for_http())
}

async fn ping() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_ping_reports_ok() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
        let config = DataAgentConfig {
            db_path: dir.path().join("orders.db"),
        };
        let server =
            DataAgentServer::new(&config).unwrap_or_else(|e| panic!("server init failed: {e}"));
        let app = build_router(server, &CancellationToken::new());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .body(Body::empty())
                    .unwrap_or_else(|e| panic!("request build failed: {e}")),
            )
            .await
            .unwrap_or_else(|e| panic!("request failed: {e}"));

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_else(|e| panic!("body read failed: {e}"));
        let value: serde_json::Value =
            serde_json::from_slice(&body).unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert_eq!(value, json!({"status": "ok"}));
    }
}
