//! Report agent service.
//!
//! One process, one port, two surfaces: the MCP endpoint at `/mcp` exposing
//! the `generate_excel_report` tool, and the plain HTTP file routes
//! (`/ping`, `/files`, `/download`) that make the generated workbooks
//! reachable from the URLs embedded in tool results.

pub mod routes;
pub mod server;

pub use server::{GenerateReportParams, ReportAgentServer};

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use axum::Router;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::agent::{LlmConfig, PromptSet, create_provider};
use crate::config::ReportAgentConfig;
use crate::report::ReportGenerator;
use crate::report::workbook::REPORT_FILE_PREFIX;

/// Runs the report agent until interrupted.
///
/// # Errors
///
/// Returns an error when the provider cannot be constructed, the reports
/// directory cannot be created or the listener fails to bind.
pub async fn serve(config: ReportAgentConfig, host: &str, port: u16) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&config.reports_dir).await?;

    if let Some(ttl_days) = config.report_ttl_days {
        let removed = sweep_expired_reports(&config.reports_dir, ttl_days).await?;
        if removed > 0 {
            info!(removed, ttl_days, "removed expired reports");
        }
    }

    let llm = LlmConfig::from_env()?;
    let provider = create_provider(&llm)?;
    let prompts = PromptSet::load(llm.prompt_dir.as_deref());
    let generator = Arc::new(ReportGenerator::new(Arc::from(provider), &config, prompts.findings));
    let server = ReportAgentServer::new(generator);

    let ct = CancellationToken::new();
    let router = build_router(server, &config, &ct);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        addr,
        reports_dir = %config.reports_dir.display(),
        "report agent listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            ct.cancel();
        })
        .await?;

    Ok(())
}

fn build_router(
    server: ReportAgentServer,
    config: &ReportAgentConfig,
    ct: &CancellationToken,
) -> Router {
    let mcp_service = StreamableHttpService::new(
        move || Ok(server.clone()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            cancellation_token: ct.child_token(),
            ..Default::default()
        },
    );

    routes::http_router(config.reports_dir.clone())
        .nest_service("/mcp", mcp_service)
        .layer(TraceLayer::new_for_http())
}

/// Deletes generated workbooks older than `ttl_days`.
///
/// Only files matching the generator's own naming pattern are considered;
/// anything else in the directory is left alone.
async fn sweep_expired_reports(dir: &Path, ttl_days: u64) -> std::io::Result<usize> {
    let ttl = Duration::from_secs(ttl_days * 24 * 60 * 60);
    let now = SystemTime::now();
    let mut removed = 0;

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_report = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(REPORT_FILE_PREFIX) && n.ends_with(".xlsx"));
        if !is_report {
            continue;
        }
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        if now.duration_since(modified).is_ok_and(|age| age > ttl)
            && tokio::fs::remove_file(&path).await.is_ok()
        {
            removed += 1;
        }
    }

    Ok(removed)
}
