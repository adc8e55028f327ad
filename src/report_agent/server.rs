//! MCP tool server of the report agent.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::report::ReportGenerator;

/// Parameters for the `generate_excel_report` MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerateReportParams {
    /// Raw return-order text, as produced by the data agent's tools.
    pub data: String,
}

/// Report agent MCP server.
#[derive(Clone)]
pub struct ReportAgentServer {
    tool_router: ToolRouter<Self>,
    generator: Arc<ReportGenerator>,
}

#[tool_router]
impl ReportAgentServer {
    /// Full report pipeline: parse, summarize, findings, spreadsheet.
    #[tool(
        name = "generate_excel_report",
        description = "Generates an Excel report with Summary and Findings from the provided return orders data string."
    )]
    async fn generate_excel_report(
        &self,
        Parameters(params): Parameters<GenerateReportParams>,
    ) -> Result<CallToolResult, McpError> {
        // The generator never fails; failures arrive as descriptive text.
        let result = self.generator.generate(&params.data).await;
        Ok(CallToolResult::success(vec![Content::text(result)]))
    }
}

#[tool_handler]
impl ServerHandler for ReportAgentServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "returnsight-report-agent".to_string(),
                title: Some("ReturnSight Report Agent".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Generates spreadsheet reports over customer return orders. Pass the raw \
                 data string from the data agent to `generate_excel_report` unmodified."
                    .to_string(),
            ),
        }
    }
}

impl ReportAgentServer {
    /// Creates the server around a shared report generator.
    #[must_use]
    pub fn new(generator: Arc<ReportGenerator>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            generator,
        }
    }
}
