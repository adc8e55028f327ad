//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config;

/// ReturnSight: multi-agent customer return-order management.
///
/// Runs the coordinator service and its two MCP tool servers, plus a
/// seeding helper for loading return orders from CSV.
#[derive(Parser, Debug)]
#[command(name = "returnsight")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the coordinator HTTP service.
    ///
    /// Accepts user queries on POST /run_agent and answers them by
    /// driving the data and report agents over MCP.
    #[command(after_help = r#"Examples:
  returnsight coordinator                        # Listen on 127.0.0.1:8000
  returnsight coordinator --port 9000
  DATA_AGENT_URL=http://10.0.0.5:8001/mcp returnsight coordinator
  curl -X POST 'http://127.0.0.1:8000/run_agent?user_query=how+many+returns+were+approved'
"#)]
    Coordinator {
        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to.
        #[arg(long, default_value = "8000")]
        port: u16,

        /// Path to the conversation checkpoint database.
        #[arg(
            long,
            env = "RETURNSIGHT_CHECKPOINT_DB",
            default_value = config::DEFAULT_CHECKPOINT_DB
        )]
        checkpoint_db: PathBuf,

        /// Maximum reasoning-loop round-trips per request.
        #[arg(
            long,
            env = "RETURNSIGHT_MAX_ITERATIONS",
            default_value_t = config::DEFAULT_MAX_ITERATIONS
        )]
        max_iterations: usize,
    },

    /// Start the data agent MCP server.
    ///
    /// Exposes `retrieve_data`, `return_all_data`, and `insert_return`
    /// over the return-order database.
    #[command(after_help = r#"Examples:
  returnsight data-agent                         # Listen on 127.0.0.1:8001
  returnsight data-agent --db-path orders.db
  RETURNSIGHT_DB=/var/lib/returnsight/orders.db returnsight data-agent
"#)]
    DataAgent {
        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to.
        #[arg(long, default_value = "8001")]
        port: u16,

        /// Path to the return-order database.
        #[arg(long, env = "RETURNSIGHT_DB", default_value = config::DEFAULT_ROW_STORE_DB)]
        db_path: PathBuf,
    },

    /// Start the report agent MCP server and file host.
    ///
    /// Exposes `generate_excel_report` plus the /files and /download
    /// routes serving the generated workbooks.
    #[command(after_help = r#"Examples:
  returnsight report-agent                       # Listen on 127.0.0.1:8002
  returnsight report-agent --reports-dir /srv/reports
  PUBLIC_BASE_URL=https://reports.example.com returnsight report-agent
"#)]
    ReportAgent {
        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to.
        #[arg(long, default_value = "8002")]
        port: u16,

        /// Directory for generated spreadsheet files.
        #[arg(long, env = "REPORTS_DIR", default_value = config::DEFAULT_REPORTS_DIR)]
        reports_dir: PathBuf,
    },

    /// Seed the return-order database from a CSV file.
    ///
    /// Upserts by order_id, so re-running with the same file is safe.
    #[command(after_help = r#"Examples:
  returnsight seed data/returns.csv
  returnsight seed data/returns.csv --db-path orders.db

Expected CSV header:
  order_id,product,category,return_reason,cost,approved_flag,store_name,date
"#)]
    Seed {
        /// Path to the CSV file.
        csv: PathBuf,

        /// Path to the return-order database.
        #[arg(long, env = "RETURNSIGHT_DB", default_value = config::DEFAULT_ROW_STORE_DB)]
        db_path: PathBuf,
    },
}
