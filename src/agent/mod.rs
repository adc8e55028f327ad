//! LLM provider plumbing and the checkpointed reasoning loop.
//!
//! Provides the conversation types, tool registry, and provider
//! abstraction the coordinator builds on, backed by OpenAI-compatible
//! APIs.
//!
//! # Architecture
//!
//! ```text
//! User query → Coordinator
//!   ├── restore conversation from newest checkpoint
//!   ├── agentic_loop (model ↔ tools, snapshot per step)
//!   │   ├── remote tools (data agent, report agent over MCP)
//!   │   └── local tools (Taiwan clock)
//!   └── final answer from the newest snapshot
//! ```

pub mod agentic_loop;
pub mod client;
pub mod config;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod tool;

// Re-export key types
pub use agentic_loop::{agentic_loop, conversation};
pub use client::create_provider;
pub use config::LlmConfig;
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use tool::{ToolCall, ToolDefinition, ToolHandler, ToolRegistry, ToolResult};
