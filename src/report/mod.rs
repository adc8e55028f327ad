//! Report synthesis: parsed records → summary → findings → spreadsheet.
//!
//! [`ReportGenerator::generate`] is the full pipeline behind the report
//! agent's `generate_excel_report` tool. It follows the tool contract of
//! the rest of the system: it never fails — every failure path is
//! converted into a descriptive string result so the calling reasoning
//! loop can react to it as content.

pub mod summary;
pub mod workbook;

pub use summary::{ReportSummary, summarize};

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::agent::message::user_message;
use crate::agent::prompt::build_findings_prompt;
use crate::agent::{ChatRequest, LlmProvider};
use crate::config::ReportAgentConfig;
use crate::error::ReportError;
use crate::record::{self, ParsedRecord};

/// Result string when the input text contains no parseable records.
pub const EMPTY_DATA_MESSAGE: &str = "Error: No valid data provided to generate report.";

/// Generates spreadsheet reports from raw return-order text.
pub struct ReportGenerator {
    provider: Arc<dyn LlmProvider>,
    reports_dir: PathBuf,
    public_base_url: String,
    findings_model: String,
    findings_prompt: String,
}

impl fmt::Debug for ReportGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportGenerator")
            .field("provider", &self.provider.name())
            .field("reports_dir", &self.reports_dir)
            .field("public_base_url", &self.public_base_url)
            .field("findings_model", &self.findings_model)
            .finish_non_exhaustive()
    }
}

impl ReportGenerator {
    /// Creates a generator writing into the configured reports directory.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        config: &ReportAgentConfig,
        findings_prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            reports_dir: config.reports_dir.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            findings_model: config.findings_model.clone(),
            findings_prompt: findings_prompt.into(),
        }
    }

    /// Runs the full report pipeline on a raw data string.
    ///
    /// Returns a success message carrying a view URL and a download URL,
    /// or a descriptive error string. Never fails.
    pub async fn generate(&self, data: &str) -> String {
        let records = record::parse(data);
        if records.is_empty() {
            return EMPTY_DATA_MESSAGE.to_string();
        }

        match self.build_report(records).await {
            Ok(message) => message,
            Err(e) => {
                error!(error = %e, "report generation failed");
                format!("Error generating report: {e}")
            }
        }
    }

    async fn build_report(&self, records: Vec<ParsedRecord>) -> Result<String, ReportError> {
        let summary = summarize(&records);
        let findings = self.request_findings(&summary).await?;

        let file_name = workbook::generate_file_name();
        let path = self.reports_dir.join(&file_name);
        debug!(file = %path.display(), rows = records.len(), "writing report workbook");

        let reports_dir = self.reports_dir.clone();
        let write_path = path.clone();
        tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&reports_dir)?;
            workbook::write_workbook(&write_path, &records, &summary, &findings)
        })
        .await
        .map_err(|e| ReportError::TaskJoin {
            message: e.to_string(),
        })??;

        info!(file = file_name, "report generated");
        Ok(format!(
            "Report generated successfully. View at {base}/files/{file_name} \
             or download at {base}/download/{file_name}",
            base = self.public_base_url
        ))
    }

    /// Asks the LLM for a findings narrative over the summary and splits
    /// its response into non-empty lines.
    async fn request_findings(&self, summary: &ReportSummary) -> Result<Vec<String>, ReportError> {
        let request = ChatRequest {
            model: self.findings_model.clone(),
            messages: vec![user_message(&build_findings_prompt(
                &self.findings_prompt,
                &summary.to_string(),
            ))],
            temperature: None,
            max_tokens: None,
            json_mode: false,
            tools: Vec::new(),
        };

        let response = self
            .provider
            .chat(&request)
            .await
            .map_err(|e| ReportError::Findings {
                message: e.to_string(),
            })?;

        Ok(response
            .content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}
