//! MCP tool parameter types for the data agent.
//!
//! `schemars` derives the JSON Schemas the MCP protocol advertises for
//! each tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `retrieve_data` MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RetrieveDataParams {
    /// Natural-language query to match against stored return orders.
    pub query: String,

    /// Maximum number of matched chunks to return.
    #[serde(default = "default_k_n")]
    pub k_n: usize,
}

pub(crate) fn default_k_n() -> usize {
    10
}

/// Parameters for the `insert_return` MCP tool. One field per row-store
/// column.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InsertReturnParams {
    /// Unique order identifier.
    pub order_id: String,

    /// Product name.
    pub product: String,

    /// Product category.
    pub category: String,

    /// Why the product was returned.
    pub return_reason: String,

    /// Cost of the returned product.
    pub cost: f64,

    /// Whether the return was approved ("Yes"/"No").
    pub approved_flag: String,

    /// Store the product was returned to.
    pub store_name: String,

    /// Return date (YYYY-MM-DD).
    pub date: String,
}
