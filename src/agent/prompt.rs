//! System prompts and template builders for agents.
//!
//! The coordinator prompt defines the delegation policy for the reasoning
//! loop; the findings prompt drives the report agent's insight generation.
//! Both can be overridden by dropping markdown files into a prompt
//! directory, falling back to the compiled-in defaults per file.

use std::path::Path;

/// System prompt for the coordinator agent.
pub const COORDINATOR_SYSTEM_PROMPT: &str = "\
You are a coordinator agent for managing customer return orders and warranties.
You have access to data tools ('retrieve_data', 'insert_return', 'return_all_data') for retrieving stored return orders or inserting new ones, and to 'generate_excel_report' for generating Excel reports from return-order data.
Use 'get_current_time_in_taiwan' for any time-related queries (e.g., filtering by recent dates in Taiwan time, which is UTC+8).

Delegate based on the user query:
- For retrieving returns (e.g., 'list defective headphones'), use 'retrieve_data' with a focused query, or 'return_all_data' when the user wants everything.
- For inserting new returns (e.g., 'add a return for order 1101'), use 'insert_return' with every field filled from the query.
- For generating reports (e.g., 'create a report on all returns'), first retrieve the necessary data with the data tools, then pass the retrieved data string directly and unmodified to 'generate_excel_report'.
- Always include relevant dates in Taiwan time if time-sensitive.
- Respond with the final result from the tools or a confirmation.

You must not ask any confirmation questions to the user. Make your best guess based on the query and proceed with the appropriate tool calls.";

/// Instruction prefix for the findings model call.
///
/// [`build_findings_prompt`] appends the summary; the model returns one
/// finding per line.
pub const FINDINGS_PROMPT: &str = "\
Analyze the following summary of customer return orders and generate 5-10 key findings or insights. \
Focus on trends, common issues, potential business impacts, and recommendations.";

/// Filename for the coordinator prompt template.
const COORDINATOR_FILENAME: &str = "coordinator.md";
/// Filename for the findings prompt template.
const FINDINGS_FILENAME: &str = "findings.md";

/// A set of system prompts for the agents.
///
/// Loaded from external template files when available, falling back to
/// compiled-in defaults. Use [`PromptSet::load`] to resolve the prompt
/// directory from configuration or the environment.
#[derive(Debug, Clone)]
pub struct PromptSet {
    /// System prompt for the coordinator agent.
    pub coordinator: String,
    /// Instruction prefix for the findings model call.
    pub findings: String,
}

impl PromptSet {
    /// Loads prompts from the given directory, falling back to compiled-in
    /// defaults.
    ///
    /// Resolution order for `prompt_dir`:
    /// 1. Explicit `prompt_dir` argument (from configuration)
    /// 2. `RETURNSIGHT_PROMPT_DIR` environment variable
    ///
    /// Each file is loaded independently — a missing file uses its default.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir.map(std::path::PathBuf::from).or_else(|| {
            std::env::var("RETURNSIGHT_PROMPT_DIR")
                .ok()
                .map(std::path::PathBuf::from)
        });

        let load_file = |filename: &str, default: &str| -> String {
            resolved_dir
                .as_ref()
                .map(|dir| dir.join(filename))
                .and_then(|path| std::fs::read_to_string(&path).ok())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            coordinator: load_file(COORDINATOR_FILENAME, COORDINATOR_SYSTEM_PROMPT),
            findings: load_file(FINDINGS_FILENAME, FINDINGS_PROMPT),
        }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            coordinator: COORDINATOR_SYSTEM_PROMPT.to_string(),
            findings: FINDINGS_PROMPT.to_string(),
        }
    }
}

/// Builds the findings user message from the instruction prefix and a
/// rendered summary.
#[must_use]
pub fn build_findings_prompt(template: &str, summary: &str) -> String {
    format!("{template} Summary: {summary}")
}
