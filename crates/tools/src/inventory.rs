//! Inventory tools — stock lookup and adjustment.

use std::sync::Arc;

use async_trait::async_trait;
use concierge_core::backend::CommerceBackend;
use concierge_core::error::ToolError;
use concierge_core::tool::{Tool, ToolResult};
use serde_json::json;
use tracing::debug;

use crate::args;
use crate::names;

pub struct CheckInventoryTool {
    backend: Arc<dyn CommerceBackend>,
}

impl CheckInventoryTool {
    pub fn new(backend: Arc<dyn CommerceBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for CheckInventoryTool {
    fn name(&self) -> &str {
        names::CHECK_INVENTORY
    }

    fn description(&self) -> &str {
        "Check the inventory status for a product ID. Returns name, stock level, price, SKU, warehouse location and reorder threshold."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "product_id": {
                    "type": "integer",
                    "description": "The ID of the product to check"
                }
            },
            "required": ["product_id"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let product_id = args::integer(&arguments, "product_id")?;
        match self.backend.get_inventory(product_id).await {
            Ok(item) => Ok(ToolResult::json(json!(item))),
            Err(e) => args::backend_failure(self.name(), e),
        }
    }
}

pub struct ListInventoryTool {
    backend: Arc<dyn CommerceBackend>,
}

impl ListInventoryTool {
    pub fn new(backend: Arc<dyn CommerceBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for ListInventoryTool {
    fn name(&self) -> &str {
        names::LIST_INVENTORY
    }

    fn description(&self) -> &str {
        "List every product in the catalogue with its stock level and price."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        match self.backend.list_inventory().await {
            Ok(items) => Ok(ToolResult::json(json!({ "count": items.len(), "items": items }))),
            Err(e) => args::backend_failure(self.name(), e),
        }
    }
}

pub struct UpdateInventoryTool {
    backend: Arc<dyn CommerceBackend>,
}

impl UpdateInventoryTool {
    pub fn new(backend: Arc<dyn CommerceBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for UpdateInventoryTool {
    fn name(&self) -> &str {
        names::UPDATE_INVENTORY
    }

    fn description(&self) -> &str {
        "Change the stock level of a product. Use a negative quantity_change to reserve or remove stock and a positive one to restock."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "product_id": {
                    "type": "integer",
                    "description": "The ID of the product to update"
                },
                "quantity_change": {
                    "type": "integer",
                    "description": "Signed change in quantity (e.g. -1 to reserve one unit)"
                }
            },
            "required": ["product_id", "quantity_change"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let product_id = args::integer(&arguments, "product_id")?;
        let delta = args::integer(&arguments, "quantity_change")?;
        debug!(product_id, delta, "Adjusting inventory");
        match self.backend.adjust_inventory(product_id, delta).await {
            Ok(item) => Ok(ToolResult::json(json!(item))),
            Err(e) => args::backend_failure(self.name(), e),
        }
    }
}
