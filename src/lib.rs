//! ReturnSight: multi-agent customer return-order management.
//!
//! Three cooperating services, all runnable from the same binary:
//!
//! ```text
//!                    POST /run_agent
//!                          │
//!                  ┌───────▼────────┐
//!                  │  coordinator   │  reasoning loop + checkpoints
//!                  └───┬────────┬───┘
//!              MCP     │        │     MCP
//!          ┌───────────▼──┐  ┌──▼─────────────┐
//!          │  data agent  │  │  report agent  │
//!          │ retrieve_data│  │ generate_excel │
//!          │ insert_return│  │ /files /download│
//!          └──────┬───────┘  └───────┬────────┘
//!                 ▼                  ▼
//!          customer-data.db     reports/*.xlsx
//! ```
//!
//! The coordinator discovers the subordinate agents' tools over MCP at
//! request time and lets the model drive them through the reasoning loop.
//! Neither subordinate runs a model loop of its own; the report agent
//! calls the model exactly once per report, for the findings narrative.
//!
//! Conversation history is checkpointed after every message, so a session
//! resumed after a crash or restart picks up where it left off.

pub mod agent;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod data_agent;
pub mod embedding;
pub mod error;
pub mod record;
pub mod report;
pub mod report_agent;
pub mod storage;

pub use error::{Error, Result};
