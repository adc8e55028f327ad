//! CLI command implementations.
//!
//! Each service command resolves its configuration from the environment
//! plus CLI overrides, then drives the matching `serve` future on a fresh
//! runtime until the process is interrupted. `seed` is the only command
//! that completes on its own.

use std::path::Path;
use std::sync::Arc;

use crate::agent::{LlmConfig, PromptSet, create_provider};
use crate::cli::parser::{Cli, Commands};
use crate::config::{CoordinatorConfig, DataAgentConfig, ReportAgentConfig};
use crate::coordinator::{self, Coordinator};
use crate::embedding::create_embedder;
use crate::error::{CommandError, Result};
use crate::storage::{ReturnOrder, RowStore, SemanticIndex, seed_return_order};
use crate::{data_agent, report_agent};

/// Executes the CLI command.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    match &cli.command {
        Commands::Coordinator {
            host,
            port,
            checkpoint_db,
            max_iterations,
        } => cmd_coordinator(host, *port, checkpoint_db, *max_iterations),
        Commands::DataAgent {
            host,
            port,
            db_path,
        } => cmd_data_agent(host, *port, db_path),
        Commands::ReportAgent {
            host,
            port,
            reports_dir,
        } => cmd_report_agent(host, *port, reports_dir),
        Commands::Seed { csv, db_path } => cmd_seed(csv, db_path),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}")).into()
    })
}

fn cmd_coordinator(
    host: &str,
    port: u16,
    checkpoint_db: &Path,
    max_iterations: usize,
) -> Result<String> {
    let config = CoordinatorConfig::from_env()
        .checkpoint_db(checkpoint_db)
        .max_iterations(max_iterations);
    let llm = LlmConfig::from_env()?;
    let provider = create_provider(&llm)?;
    let prompts = PromptSet::load(llm.prompt_dir.as_deref());
    let coordinator = Coordinator::new(config, Arc::from(provider), prompts)?;

    let rt = runtime()?;
    rt.block_on(coordinator::routes::serve(coordinator, host, port))
        .map_err(|e| CommandError::ExecutionFailed(format!("Coordinator error: {e}")))?;

    Ok(String::new())
}

fn cmd_data_agent(host: &str, port: u16, db_path: &Path) -> Result<String> {
    let config = DataAgentConfig::from_env().db_path(db_path);

    let rt = runtime()?;
    rt.block_on(data_agent::serve(config, host, port))
        .map_err(|e| CommandError::ExecutionFailed(format!("Data agent error: {e}")))?;

    Ok(String::new())
}

fn cmd_report_agent(host: &str, port: u16, reports_dir: &Path) -> Result<String> {
    let config = ReportAgentConfig::from_env().reports_dir(reports_dir);

    let rt = runtime()?;
    rt.block_on(report_agent::serve(config, host, port))
        .map_err(|e| CommandError::ExecutionFailed(format!("Report agent error: {e}")))?;

    Ok(String::new())
}

fn cmd_seed(csv: &Path, db_path: &Path) -> Result<String> {
    let mut reader = csv::Reader::from_path(csv).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to open {}: {e}", csv.display()))
    })?;

    let store = RowStore::open(db_path)?;
    let index = SemanticIndex::open(db_path, create_embedder())?;

    let mut seeded = 0usize;
    for row in reader.deserialize::<ReturnOrder>() {
        let order =
            row.map_err(|e| CommandError::InvalidArgument(format!("Bad CSV row: {e}")))?;
        seed_return_order(&store, &index, &order)?;
        seeded += 1;
    }

    Ok(format!(
        "Seeded {seeded} return orders from {}\n",
        csv.display()
    ))
}
