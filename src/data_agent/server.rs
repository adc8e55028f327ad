//! MCP tool server of the data agent.
//!
//! Exposes `retrieve_data`, `return_all_data` and `insert_return` over
//! MCP. Storage work runs on the blocking pool via `spawn_blocking`; the
//! tools themselves never fail on domain errors — every failure path
//! becomes a descriptive string result the calling model can react to.

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};

use crate::config::DataAgentConfig;
use crate::embedding::create_embedder;
use crate::storage::{ReturnOrder, RowStore, SemanticIndex, insert_return_order};

use super::params::{InsertReturnParams, RetrieveDataParams};

/// Result string when the row store holds no orders.
pub const NO_ORDERS_MESSAGE: &str = "No return orders found.";

/// Data agent MCP server.
#[derive(Clone)]
pub struct DataAgentServer {
    tool_router: ToolRouter<Self>,
    store: RowStore,
    index: SemanticIndex,
}

#[tool_router]
impl DataAgentServer {
    /// Similarity search over the semantic index.
    #[tool(
        name = "retrieve_data",
        description = "Retrieves return orders relevant to the query from the semantic index. Returns up to k_n matched text chunks joined by blank lines."
    )]
    async fn retrieve_data(
        &self,
        Parameters(params): Parameters<RetrieveDataParams>,
    ) -> Result<CallToolResult, McpError> {
        let index = self.index.clone();
        let text =
            tokio::task::spawn_blocking(move || retrieve_outcome(&index, &params.query, params.k_n))
                .await
                .map_err(|e| McpError::internal_error(format!("Task join error: {e}"), None))?;

        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Full dump of the row store as parseable text blocks.
    #[tool(
        name = "return_all_data",
        description = "Returns every stored return order as blocks of key: value lines, one block per order."
    )]
    async fn return_all_data(&self) -> Result<CallToolResult, McpError> {
        let store = self.store.clone();
        let text = tokio::task::spawn_blocking(move || dump_outcome(&store))
            .await
            .map_err(|e| McpError::internal_error(format!("Task join error: {e}"), None))?;

        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Insert of one order into the row store and the semantic index.
    #[tool(
        name = "insert_return",
        description = "Inserts a new return order into the database and returns the current list of return orders."
    )]
    async fn insert_return(
        &self,
        Parameters(params): Parameters<InsertReturnParams>,
    ) -> Result<CallToolResult, McpError> {
        let store = self.store.clone();
        let index = self.index.clone();
        let text = tokio::task::spawn_blocking(move || insert_outcome(&store, &index, params))
            .await
            .map_err(|e| McpError::internal_error(format!("Task join error: {e}"), None))?;

        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[tool_handler]
impl ServerHandler for DataAgentServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "returnsight-data-agent".to_string(),
                title: Some("ReturnSight Data Agent".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Stores customer return orders and serves similarity search over them. \
                 Use `retrieve_data` for queries, `insert_return` for new orders, and \
                 `return_all_data` for a full dump."
                    .to_string(),
            ),
        }
    }
}

impl DataAgentServer {
    /// Opens both stores and builds the tool router.
    ///
    /// # Errors
    ///
    /// Returns an error when the database cannot be opened.
    pub fn new(config: &DataAgentConfig) -> Result<Self, crate::error::Error> {
        let store = RowStore::open(&config.db_path)?;
        let index = SemanticIndex::open(&config.db_path, create_embedder())?;
        Ok(Self {
            tool_router: Self::tool_router(),
            store,
            index,
        })
    }

    pub(crate) fn store(&self) -> &RowStore {
        &self.store
    }

    pub(crate) fn index(&self) -> &SemanticIndex {
        &self.index
    }
}

pub(crate) fn retrieve_outcome(index: &SemanticIndex, query: &str, k_n: usize) -> String {
    match index.search(query, k_n) {
        Ok(text) => text,
        Err(e) => format!("Error retrieving data: {e}"),
    }
}

pub(crate) fn dump_outcome(store: &RowStore) -> String {
    match store.fetch_all() {
        Ok(orders) if orders.is_empty() => NO_ORDERS_MESSAGE.to_string(),
        Ok(orders) => orders
            .iter()
            .map(ReturnOrder::projection)
            .collect::<Vec<_>>()
            .join("\n\n"),
        Err(e) => format!("Error reading data: {e}"),
    }
}

pub(crate) fn insert_outcome(
    store: &RowStore,
    index: &SemanticIndex,
    params: InsertReturnParams,
) -> String {
    let order = ReturnOrder {
        order_id: params.order_id,
        product: params.product,
        category: params.category,
        return_reason: params.return_reason,
        cost: params.cost,
        approved_flag: params.approved_flag,
        store_name: params.store_name,
        date: params.date,
    };

    match insert_return_order(store, index, &order) {
        Ok(listing) => {
            format!("Return order inserted successfully. Current return orders:\n{listing}")
        }
        Err(e) => format!("Error inserting data: {e}"),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::record;
    use tempfile::TempDir;

    fn open_both(dir: &TempDir) -> (RowStore, SemanticIndex) {
        let path = dir.path().join("orders.db");
        let store = RowStore::open(&path).unwrap_or_else(|e| panic!("open failed: {e}"));
        let index = SemanticIndex::open(&path, create_embedder())
            .unwrap_or_else(|e| panic!("open failed: {e}"));
        (store, index)
    }

    fn params(order_id: &str) -> InsertReturnParams {
        InsertReturnParams {
            order_id: order_id.to_string(),
            product: "Tablet".to_string(),
            category: "Electronics".to_string(),
            return_reason: "cracked screen".to_string(),
            cost: 450.0,
            approved_flag: "Yes".to_string(),
            store_name: "Sunnyvale Town".to_string(),
            date: "2025-01-03".to_string(),
        }
    }

    #[test]
    fn test_dump_empty_store() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
        let (store, _) = open_both(&dir);
        assert_eq!(dump_outcome(&store), "No return orders found.");
    }

    #[test]
    fn test_insert_confirmation_lists_orders() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
        let (store, index) = open_both(&dir);

        let result = insert_outcome(&store, &index, params("1101"));
        assert!(
            result.starts_with("Return order inserted successfully. Current return orders:\n"),
            "{result}"
        );
        assert!(result.contains(
            "Order ID: 1101, Product: Tablet, Store: Sunnyvale Town, Date: 2025-01-03"
        ));
    }

    #[test]
    fn test_duplicate_insert_reports_error() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
        let (store, index) = open_both(&dir);

        insert_outcome(&store, &index, params("1101"));
        let result = insert_outcome(&store, &index, params("1101"));
        assert!(result.starts_with("Error inserting data:"), "{result}");
        // The stored row is untouched.
        assert_eq!(
            store
                .count()
                .unwrap_or_else(|e| panic!("count failed: {e}")),
            1
        );
    }

    #[test]
    fn test_dump_round_trips_through_the_parser() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
        let (store, index) = open_both(&dir);
        insert_outcome(&store, &index, params("1101"));
        insert_outcome(&store, &index, params("1102"));

        let dump = dump_outcome(&store);
        let records = record::parse(&dump);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("order_id"), Some("1101"));
        assert_eq!(records[1].get("order_id"), Some("1102"));
        assert_eq!(records[0].get("cost"), Some("450"));
    }

    #[test]
    fn test_retrieve_finds_inserted_order() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
        let (store, index) = open_both(&dir);
        insert_outcome(&store, &index, params("1101"));

        let result = retrieve_outcome(&index, "cracked tablet screen", 10);
        assert!(result.contains("order_id: 1101"), "{result}");
    }

    #[test]
    fn test_retrieve_empty_index_is_empty_string() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
        let (_, index) = open_both(&dir);
        assert_eq!(retrieve_outcome(&index, "anything", 10), "");
    }
}
